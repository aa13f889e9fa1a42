//! ゲスト用 Identity Provider
//!
//! ニックネームごとに安定したユーザー ID を払い出します。
//! 永続化はしないため、プロセスが再起動すると ID は振り直されます。

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::domain::{IdentityError, IdentityProvider, Nickname, UserId};

pub struct GuestIdentityProvider {
    users: DashMap<String, UserId>,
    next_id: AtomicI64,
}

impl GuestIdentityProvider {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for GuestIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for GuestIdentityProvider {
    async fn authenticate(&self, nickname: &Nickname) -> Result<UserId, IdentityError> {
        let user_id = *self
            .users
            .entry(nickname.as_str().to_string())
            .or_insert_with(|| UserId::new(self.next_id.fetch_add(1, Ordering::Relaxed)));
        tracing::debug!(user_id = %user_id, nickname = nickname.as_str(), "Guest identity resolved");
        Ok(user_id)
    }
}
