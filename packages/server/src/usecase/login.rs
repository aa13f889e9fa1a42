//! UseCase: ログイン
//!
//! ニックネームを ID プロバイダで解決し、セッションを発行します。
//! プロバイダが一時的に使えない場合は上限付きの指数バックオフで再試行します。

use std::{sync::Arc, time::Duration};

use kkutu_shared::time::Clock;

use super::error::LoginError;
use crate::domain::{
    IdentityError, IdentityProvider, Nickname, Session, SessionRepository, Timestamp,
};

/// 再試行の方針
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_millis(200),
        }
    }
}

/// ログインのユースケース
pub struct LoginUseCase {
    identity: Arc<dyn IdentityProvider>,
    sessions: Arc<dyn SessionRepository>,
    clock: Arc<dyn Clock>,
    retry: RetryPolicy,
}

impl LoginUseCase {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        sessions: Arc<dyn SessionRepository>,
        clock: Arc<dyn Clock>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            identity,
            sessions,
            clock,
            retry,
        }
    }

    /// ログインを実行
    ///
    /// # Returns
    ///
    /// * `Ok(Session)` - 発行されたセッション（同じユーザーの古いセッションは無効化済み）
    /// * `Err(LoginError)` - ニックネーム不正、拒否、またはプロバイダ不通
    pub async fn execute(&self, nickname: String) -> Result<Session, LoginError> {
        let nickname = Nickname::new(nickname)?;

        let mut attempt = 0;
        let user_id = loop {
            attempt += 1;
            match self.identity.authenticate(&nickname).await {
                Ok(user_id) => break user_id,
                Err(IdentityError::Unavailable(reason)) => {
                    tracing::warn!(
                        attempt,
                        max_attempts = self.retry.attempts,
                        "Identity provider unavailable: {}",
                        reason
                    );
                    if attempt >= self.retry.attempts {
                        return Err(LoginError::RetryLater);
                    }
                    tokio::time::sleep(self.retry.base_delay * 2u32.saturating_pow(attempt - 1))
                        .await;
                }
                Err(e) => return Err(LoginError::Rejected(e.to_string())),
            }
        };

        let now = Timestamp::new(self.clock.now_millis());
        let session = self.sessions.create(user_id, nickname, now).await;
        tracing::info!(user_id = %session.user_id, "Session created");
        Ok(session)
    }
}
