//! UseCase: トークン認証とログアウト

use std::sync::Arc;

use kkutu_shared::time::Clock;

use super::error::AuthError;
use crate::domain::{AuthenticatedUser, SessionRepository, SessionToken, Timestamp};

/// セッショントークンを検証するユースケース
pub struct AuthenticateUseCase {
    sessions: Arc<dyn SessionRepository>,
    clock: Arc<dyn Clock>,
}

impl AuthenticateUseCase {
    pub fn new(sessions: Arc<dyn SessionRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { sessions, clock }
    }

    /// トークン文字列からユーザーを解決
    pub async fn execute(&self, token: Option<&str>) -> Result<AuthenticatedUser, AuthError> {
        let token = token.ok_or(AuthError::MissingToken)?;
        let token =
            SessionToken::new(token.to_string()).map_err(|_| AuthError::MalformedToken)?;
        let now = Timestamp::new(self.clock.now_millis());
        let session = self.sessions.get(&token, now).await?;
        Ok(AuthenticatedUser::from(&session))
    }

    /// セッションを削除（ログアウト）
    pub async fn logout(&self, token: Option<&str>) -> Result<(), AuthError> {
        let token = token.ok_or(AuthError::MissingToken)?;
        let token =
            SessionToken::new(token.to_string()).map_err(|_| AuthError::MalformedToken)?;
        self.sessions.delete(&token).await?;
        Ok(())
    }
}
