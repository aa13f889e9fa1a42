//! HTTP API の DTO

use serde::{Deserialize, Serialize};

/// `GET /api/health` のレスポンス
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub rooms: usize,
    pub connections: usize,
    pub timestamp: i64,
}

/// `POST /api/session` のリクエスト
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub nickname: String,
}

/// `POST /api/session` のレスポンス
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: i64,
    pub nickname: String,
    pub expires_at: i64,
}

/// ルーム一覧の 1 件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSummaryDto {
    pub room_id: u64,
    pub title: String,
    pub game_mode: String,
    pub status: String,
    pub player_count: usize,
    pub max_players: usize,
    pub owner_user_id: Option<i64>,
    pub created_at: i64,
}

/// `GET /api/rooms` のクエリ
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RoomListQuery {
    #[serde(default)]
    pub status: Option<String>,
}

/// `GET /api/rooms` のレスポンス
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomListResponse {
    pub rooms: Vec<RoomSummaryDto>,
}

/// エラーレスポンス
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}
