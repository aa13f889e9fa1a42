//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::{GameError, RepositoryError, RoomConfigError, RoomId, ValueObjectError};

/// ログイン処理のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoginError {
    #[error("invalid nickname: {0}")]
    InvalidNickname(#[from] ValueObjectError),

    #[error("identity provider rejected the login: {0}")]
    Rejected(String),

    #[error("identity provider is unavailable, retry later")]
    RetryLater,
}

/// トークン認証のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("session token is missing")]
    MissingToken,

    #[error("session token is malformed")]
    MalformedToken,

    #[error("session is invalid: {0}")]
    InvalidSession(#[from] RepositoryError),
}

/// ルーム管理のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomManagerError {
    #[error("room {0} not found")]
    RoomNotFound(RoomId),

    #[error("invalid room title: {0}")]
    InvalidTitle(#[from] ValueObjectError),

    #[error("invalid room settings: {0}")]
    InvalidConfig(#[from] RoomConfigError),

    #[error("you already own {limit} waiting rooms")]
    TooManyRooms { limit: usize },

    #[error("server room limit of {limit} reached")]
    ServerFull { limit: usize },

    #[error("server is shutting down")]
    ShuttingDown,

    #[error(transparent)]
    Game(#[from] GameError),
}

impl RoomManagerError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::RoomNotFound(_) => "room_not_found",
            Self::InvalidTitle(_) | Self::InvalidConfig(_) => "invalid_room_settings",
            Self::TooManyRooms { .. } => "too_many_rooms",
            Self::ServerFull { .. } => "server_full",
            Self::ShuttingDown => "shutting_down",
            Self::Game(e) => e.code(),
        }
    }
}
