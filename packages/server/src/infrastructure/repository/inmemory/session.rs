//! InMemory Session Repository 実装
//!
//! ドメイン層が定義する SessionRepository trait の具体的な実装。
//! トークンとユーザーの 2 つの HashMap で管理します。
//! プロセスが再起動するとセッションは全て失われます。

use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use rand::RngCore;
use tokio::sync::Mutex;

use crate::domain::{
    Nickname, RepositoryError, Session, SessionRepository, SessionToken, Timestamp, UserId,
};

/// トークンのバイト数（256 bit）
const TOKEN_BYTES: usize = 32;

#[derive(Debug, Default)]
struct Sessions {
    by_token: HashMap<String, Session>,
    by_user: HashMap<UserId, String>,
}

/// インメモリ Session Repository 実装
pub struct InMemorySessionRepository {
    sessions: Mutex<Sessions>,
    ttl: Duration,
}

impl InMemorySessionRepository {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(Sessions::default()),
            ttl,
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.by_token.len()
    }
}

/// 推測不能なトークンを生成
fn generate_token() -> SessionToken {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    SessionToken::from_bytes(&bytes)
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn create(&self, user_id: UserId, nickname: Nickname, now: Timestamp) -> Session {
        let ttl_ms = i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX);
        let session = Session {
            token: generate_token(),
            user_id,
            nickname,
            created_at: now,
            expires_at: now.plus_millis(ttl_ms),
        };

        let mut sessions = self.sessions.lock().await;
        if let Some(previous) = sessions
            .by_user
            .insert(user_id, session.token.as_str().to_string())
        {
            sessions.by_token.remove(&previous);
            tracing::debug!(user_id = %user_id, "Revoked previous session");
        }
        sessions
            .by_token
            .insert(session.token.as_str().to_string(), session.clone());
        session
    }

    async fn get(&self, token: &SessionToken, now: Timestamp) -> Result<Session, RepositoryError> {
        let sessions = self.sessions.lock().await;
        let session = sessions
            .by_token
            .get(token.as_str())
            .ok_or(RepositoryError::SessionNotFound)?;
        if session.is_expired(now) {
            return Err(RepositoryError::SessionExpired);
        }
        Ok(session.clone())
    }

    async fn delete(&self, token: &SessionToken) -> Result<(), RepositoryError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .by_token
            .remove(token.as_str())
            .ok_or(RepositoryError::SessionNotFound)?;
        if sessions.by_user.get(&session.user_id).map(String::as_str) == Some(token.as_str()) {
            sessions.by_user.remove(&session.user_id);
        }
        Ok(())
    }

    async fn purge_expired(&self, now: Timestamp) -> usize {
        let mut sessions = self.sessions.lock().await;
        let expired: Vec<(String, UserId)> = sessions
            .by_token
            .iter()
            .filter(|(_, s)| s.is_expired(now))
            .map(|(token, s)| (token.clone(), s.user_id))
            .collect();
        for (token, user_id) in &expired {
            sessions.by_token.remove(token);
            if sessions.by_user.get(user_id) == Some(token) {
                sessions.by_user.remove(user_id);
            }
        }
        expired.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nickname(name: &str) -> Nickname {
        Nickname::new(name.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_token_is_256_bit_hex() {
        // テスト項目: トークンは 64 文字の 16 進数で、毎回異なる
        // given (前提条件):
        let repo = InMemorySessionRepository::new(Duration::from_secs(60));

        // when (操作):
        let a = repo.create(UserId::new(1), nickname("a"), Timestamp::new(0)).await;
        let b = repo.create(UserId::new(2), nickname("b"), Timestamp::new(0)).await;

        // then (期待する結果):
        assert_eq!(a.token.as_str().len(), 64);
        assert!(a.token.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a.token, b.token);
    }

    #[tokio::test]
    async fn test_create_revokes_previous_session() {
        // テスト項目: 同じユーザーで再ログインすると古いセッションは無効になる
        // given (前提条件):
        let repo = InMemorySessionRepository::new(Duration::from_secs(60));
        let old = repo.create(UserId::new(1), nickname("a"), Timestamp::new(0)).await;

        // when (操作):
        let new = repo.create(UserId::new(1), nickname("a"), Timestamp::new(10)).await;

        // then (期待する結果):
        assert_eq!(
            repo.get(&old.token, Timestamp::new(20)).await,
            Err(RepositoryError::SessionNotFound)
        );
        assert!(repo.get(&new.token, Timestamp::new(20)).await.is_ok());
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_expired_session_is_rejected_and_purged() {
        // テスト項目: TTL を過ぎたセッションは使えず、purge で削除される
        // given (前提条件):
        let repo = InMemorySessionRepository::new(Duration::from_secs(60));
        let session = repo.create(UserId::new(1), nickname("a"), Timestamp::new(0)).await;
        repo.create(UserId::new(2), nickname("b"), Timestamp::new(30_000)).await;

        // when (操作):
        let result = repo.get(&session.token, Timestamp::new(60_000)).await;
        let purged = repo.purge_expired(Timestamp::new(60_000)).await;

        // then (期待する結果):
        assert_eq!(result, Err(RepositoryError::SessionExpired));
        assert_eq!(purged, 1);
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_delete_unknown_token() {
        // テスト項目: 存在しないトークンの削除はエラーになる
        // given (前提条件):
        let repo = InMemorySessionRepository::new(Duration::from_secs(60));
        let session = repo.create(UserId::new(1), nickname("a"), Timestamp::new(0)).await;
        repo.delete(&session.token).await.unwrap();

        // when (操作):
        let result = repo.delete(&session.token).await;

        // then (期待する結果):
        assert_eq!(result, Err(RepositoryError::SessionNotFound));
    }
}
