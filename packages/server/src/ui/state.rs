//! Shared application state.

use std::{sync::Arc, time::Duration};

use kkutu_shared::time::Clock;

use super::rate_limit::RateLimitConfig;
use crate::{
    domain::MessagePusher,
    usecase::{AuthenticateUseCase, LoginUseCase, RoomManager},
};

/// Connection hub settings
#[derive(Debug, Clone, Copy)]
pub struct HubConfig {
    pub rate_limit: RateLimitConfig,
    /// Silence before a heartbeat ping; a second silent period closes the socket
    pub idle_timeout: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            rate_limit: RateLimitConfig::default(),
            idle_timeout: Duration::from_secs(60),
        }
    }
}

pub struct AppState {
    /// LoginUseCase（ゲストログイン）
    pub login_usecase: Arc<LoginUseCase>,
    /// AuthenticateUseCase（トークン検証とログアウト）
    pub authenticate_usecase: Arc<AuthenticateUseCase>,
    /// RoomManager（ルームの作成・検索・一覧）
    pub room_manager: Arc<RoomManager>,
    /// MessagePusher（接続の登録とイベント送信）
    pub message_pusher: Arc<dyn MessagePusher>,
    pub clock: Arc<dyn Clock>,
    pub hub: HubConfig,
}
