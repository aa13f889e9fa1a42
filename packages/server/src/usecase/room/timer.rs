//! ターンタイマーとルームの時計
//!
//! タイマーはルームに直接触れません。締め切りを過ぎると
//! `RoomCommand::TimerExpired` をルーム自身のキューに積むので、
//! 期限切れはユーザーのコマンドと順番どおりに処理されます。

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use kkutu_shared::time::Clock;
use tokio::{
    sync::{Notify, mpsc},
    task::JoinHandle,
    time::{Instant, sleep_until},
};

use super::actor::RoomCommand;
use crate::domain::Timestamp;

/// Wall-clock milliseconds anchored to the tokio clock.
///
/// Reading time through tokio keeps rooms testable with `tokio::time::pause`.
#[derive(Debug, Clone, Copy)]
pub struct RoomClock {
    origin: Instant,
    origin_millis: i64,
}

impl RoomClock {
    pub fn new(origin_millis: i64) -> Self {
        Self {
            origin: Instant::now(),
            origin_millis,
        }
    }

    pub fn now(&self) -> Timestamp {
        Timestamp::new(self.now_millis())
    }

    /// tokio instant corresponding to `timestamp`
    pub fn instant_at(&self, timestamp: Timestamp) -> Instant {
        let offset = timestamp.value().saturating_sub(self.origin_millis).max(0);
        self.origin + Duration::from_millis(u64::try_from(offset).unwrap_or(0))
    }
}

impl Clock for RoomClock {
    fn now_millis(&self) -> i64 {
        let elapsed = i64::try_from(self.origin.elapsed().as_millis()).unwrap_or(i64::MAX);
        self.origin_millis.saturating_add(elapsed)
    }
}

#[derive(Debug)]
struct TimerState {
    deadline: Instant,
    fired: bool,
}

#[derive(Debug)]
struct Armed {
    arm_id: u64,
    state: Arc<Mutex<TimerState>>,
    changed: Arc<Notify>,
    task: JoinHandle<()>,
}

/// One live timer per room
#[derive(Debug)]
pub struct TurnTimer {
    commands: mpsc::UnboundedSender<RoomCommand>,
    armed: Option<Armed>,
    next_arm_id: u64,
}

impl TurnTimer {
    pub fn new(commands: mpsc::UnboundedSender<RoomCommand>) -> Self {
        Self {
            commands,
            armed: None,
            next_arm_id: 0,
        }
    }

    /// Arm for `deadline`, replacing any previous arming.
    pub fn arm(&mut self, deadline: Instant) -> u64 {
        self.cancel();
        self.next_arm_id += 1;
        let arm_id = self.next_arm_id;

        let state = Arc::new(Mutex::new(TimerState {
            deadline,
            fired: false,
        }));
        let changed = Arc::new(Notify::new());
        let task = tokio::spawn(expire_at(
            arm_id,
            Arc::clone(&state),
            Arc::clone(&changed),
            self.commands.clone(),
        ));
        self.armed = Some(Armed {
            arm_id,
            state,
            changed,
            task,
        });
        arm_id
    }

    /// Push the deadline back. Returns false once the timer has fired.
    pub fn extend(&mut self, by: Duration) -> bool {
        let Some(armed) = &self.armed else {
            return false;
        };
        {
            let Ok(mut state) = armed.state.lock() else {
                return false;
            };
            if state.fired {
                return false;
            }
            state.deadline += by;
        }
        armed.changed.notify_one();
        true
    }

    pub fn cancel(&mut self) {
        if let Some(armed) = self.armed.take() {
            armed.task.abort();
        }
    }

    pub fn remaining(&self) -> Duration {
        self.armed
            .as_ref()
            .and_then(|armed| armed.state.lock().ok().map(|s| s.deadline))
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
            .unwrap_or_default()
    }

    /// Whether an expiry carrying `arm_id` belongs to the live arming.
    pub fn is_current(&self, arm_id: u64) -> bool {
        self.armed.as_ref().is_some_and(|a| a.arm_id == arm_id)
    }

    /// Forget the fired arming without aborting anything.
    pub fn acknowledge(&mut self, arm_id: u64) {
        if self.is_current(arm_id) {
            self.armed = None;
        }
    }
}

impl Drop for TurnTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn expire_at(
    arm_id: u64,
    state: Arc<Mutex<TimerState>>,
    changed: Arc<Notify>,
    commands: mpsc::UnboundedSender<RoomCommand>,
) {
    loop {
        let Ok(deadline) = state.lock().map(|s| s.deadline) else {
            return;
        };
        tokio::select! {
            _ = sleep_until(deadline) => {
                let fire = match state.lock() {
                    Ok(mut s) if Instant::now() >= s.deadline => {
                        s.fired = true;
                        true
                    }
                    Ok(_) => false,
                    Err(_) => return,
                };
                if fire {
                    let _ = commands.send(RoomCommand::TimerExpired { arm_id });
                    return;
                }
            }
            _ = changed.notified() => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timer() -> (TurnTimer, mpsc::UnboundedReceiver<RoomCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (TurnTimer::new(tx), rx)
    }

    fn expired_id(command: Option<RoomCommand>) -> Option<u64> {
        match command {
            Some(RoomCommand::TimerExpired { arm_id }) => Some(arm_id),
            _ => None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_once_at_deadline() {
        // テスト項目: 締め切りで一度だけ期限切れコマンドが積まれる
        // given (前提条件):
        let (mut timer, mut rx) = timer();
        let arm_id = timer.arm(Instant::now() + Duration::from_secs(30));

        // when (操作):
        tokio::time::sleep(Duration::from_secs(31)).await;

        // then (期待する結果):
        assert_eq!(expired_id(rx.recv().await), Some(arm_id));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_extend_moves_deadline() {
        // テスト項目: 延長すると元の締め切りでは発火せず、延長後の締め切りで発火する
        // given (前提条件):
        let (mut timer, mut rx) = timer();
        timer.arm(Instant::now() + Duration::from_secs(5));

        // when (操作):
        assert!(timer.extend(Duration::from_secs(15)));
        tokio::time::sleep(Duration::from_secs(6)).await;

        // then (期待する結果):
        assert!(rx.try_recv().is_err());
        assert_eq!(timer.remaining(), Duration::from_secs(14));
        tokio::time::sleep(Duration::from_secs(15)).await;
        assert!(expired_id(rx.recv().await).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_extend_after_fire_has_no_effect() {
        // テスト項目: 発火後の延長は効果がない
        // given (前提条件):
        let (mut timer, mut rx) = timer();
        timer.arm(Instant::now() + Duration::from_secs(1));
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(expired_id(rx.recv().await).is_some());

        // when (操作):
        let extended = timer.extend(Duration::from_secs(10));

        // then (期待する結果):
        assert!(!extended);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_replaces_previous() {
        // テスト項目: 再設定すると以前のタイマーは発火しない
        // given (前提条件):
        let (mut timer, mut rx) = timer();
        let first = timer.arm(Instant::now() + Duration::from_secs(1));

        // when (操作):
        let second = timer.arm(Instant::now() + Duration::from_secs(3));
        tokio::time::sleep(Duration::from_secs(4)).await;

        // then (期待する結果):
        assert_eq!(expired_id(rx.recv().await), Some(second));
        assert!(!timer.is_current(first));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_fire() {
        // テスト項目: キャンセルすると発火しない
        // given (前提条件):
        let (mut timer, mut rx) = timer();
        timer.arm(Instant::now() + Duration::from_secs(1));

        // when (操作):
        timer.cancel();
        tokio::time::sleep(Duration::from_secs(2)).await;

        // then (期待する結果):
        assert!(rx.try_recv().is_err());
        assert_eq!(timer.remaining(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_room_clock_follows_tokio_time() {
        // テスト項目: ルームの時計は tokio の時間に追従する
        // given (前提条件):
        let clock = RoomClock::new(1_000_000);

        // when (操作):
        tokio::time::advance(Duration::from_millis(2_500)).await;

        // then (期待する結果):
        assert_eq!(clock.now(), Timestamp::new(1_002_500));
        assert_eq!(
            clock.instant_at(Timestamp::new(1_010_000)) - clock.instant_at(Timestamp::new(1_000_000)),
            Duration::from_secs(10)
        );
    }
}
