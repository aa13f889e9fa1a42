//! Per-session sliding-window rate limiter for inbound frames.

use std::{collections::VecDeque, time::Duration};

use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_messages: usize,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_messages: 30,
            window: Duration::from_secs(60),
        }
    }
}

#[derive(Debug)]
pub struct SlidingWindowLimiter {
    config: RateLimitConfig,
    hits: VecDeque<Instant>,
}

impl SlidingWindowLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            hits: VecDeque::with_capacity(config.max_messages),
        }
    }

    /// Record a frame at `now`. Over the limit, returns how long until the
    /// oldest hit leaves the window; the frame is not recorded.
    pub fn check(&mut self, now: Instant) -> Result<(), Duration> {
        while let Some(oldest) = self.hits.front() {
            if now.duration_since(*oldest) >= self.config.window {
                self.hits.pop_front();
            } else {
                break;
            }
        }

        if self.hits.len() >= self.config.max_messages {
            let retry_after = self
                .hits
                .front()
                .map(|oldest| self.config.window.saturating_sub(now.duration_since(*oldest)))
                .unwrap_or(self.config.window);
            return Err(retry_after);
        }

        self.hits.push_back(now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_messages: usize, window_secs: u64) -> SlidingWindowLimiter {
        SlidingWindowLimiter::new(RateLimitConfig {
            max_messages,
            window: Duration::from_secs(window_secs),
        })
    }

    #[test]
    fn test_frames_over_limit_are_refused() {
        // テスト項目: 窓の中で上限を超えたフレームは拒否され、再試行までの時間が返る
        // given (前提条件):
        let mut limiter = limiter(3, 60);
        let start = Instant::now();
        for i in 0..3 {
            limiter.check(start + Duration::from_secs(i)).unwrap();
        }

        // when (操作):
        let result = limiter.check(start + Duration::from_secs(10));

        // then (期待する結果):
        assert_eq!(result, Err(Duration::from_secs(50)));
    }

    #[test]
    fn test_window_slides() {
        // テスト項目: 古いフレームが窓から外れると再び受け付ける
        // given (前提条件):
        let mut limiter = limiter(2, 60);
        let start = Instant::now();
        limiter.check(start).unwrap();
        limiter.check(start + Duration::from_secs(30)).unwrap();
        assert!(limiter.check(start + Duration::from_secs(59)).is_err());

        // when (操作):
        let result = limiter.check(start + Duration::from_secs(60));

        // then (期待する結果):
        assert!(result.is_ok());
        assert!(limiter.check(start + Duration::from_secs(61)).is_err());
    }
}
