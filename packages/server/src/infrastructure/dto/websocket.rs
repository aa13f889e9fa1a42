//! WebSocket メッセージの DTO
//!
//! 全てのフレームは `{type, data, request_id?, timestamp?}` のエンベロープで送受信します。
//!
//! - 受信（client → server）: `ClientMessage`
//! - 送信（server → client）: `ServerMessage`

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{GameMode, score::ScoreBreakdown};

// ========================================
// Inbound (client → server)
// ========================================

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    r#type: String,
    #[serde(default)]
    data: serde_json::Value,
    #[serde(default)]
    request_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PingData {
    #[serde(default)]
    pub t: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreateRoomData {
    pub title: String,
    #[serde(default)]
    pub game_mode: Option<GameMode>,
    #[serde(default)]
    pub max_players: Option<usize>,
    #[serde(default)]
    pub turn_time_limit_s: Option<u64>,
    #[serde(default)]
    pub max_rounds: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JoinRoomData {
    pub room_id: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SubmitWordData {
    pub word: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UseItemData {
    pub item_id: String,
    #[serde(default)]
    pub target_user_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatData {
    pub text: String,
}

/// クライアントから届くメッセージ
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    Ping(PingData),
    CreateRoom(CreateRoomData),
    JoinRoom(JoinRoomData),
    LeaveRoom,
    ToggleReady,
    StartGame,
    SubmitWord(SubmitWordData),
    UseItem(UseItemData),
    Chat(ChatData),
    EndGame,
}

/// 受信したフレーム（メッセージと相関 ID）
#[derive(Debug, Clone, PartialEq)]
pub struct InboundFrame {
    pub message: ClientMessage,
    pub request_id: Option<String>,
}

/// 受信フレームのパースエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InboundError {
    #[error("malformed message: {0}")]
    Malformed(String),

    #[error("unknown message type '{0}'")]
    UnknownType(String),

    #[error("invalid data for '{message_type}': {reason}")]
    InvalidData {
        message_type: String,
        reason: String,
        request_id: Option<String>,
    },
}

impl InboundError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "malformed_message",
            Self::UnknownType(_) => "unknown_type",
            Self::InvalidData { .. } => "invalid_data",
        }
    }
}

fn data<T: for<'de> Deserialize<'de>>(
    message_type: &str,
    value: serde_json::Value,
    request_id: &Option<String>,
) -> Result<T, InboundError> {
    // `{}` payloads may be omitted entirely
    let value = if value.is_null() {
        serde_json::Value::Object(serde_json::Map::new())
    } else {
        value
    };
    serde_json::from_value(value).map_err(|e| InboundError::InvalidData {
        message_type: message_type.to_string(),
        reason: e.to_string(),
        request_id: request_id.clone(),
    })
}

/// テキストフレームをクライアントメッセージにパース
pub fn parse_client_message(text: &str) -> Result<InboundFrame, InboundError> {
    let raw: RawEnvelope =
        serde_json::from_str(text).map_err(|e| InboundError::Malformed(e.to_string()))?;
    let RawEnvelope {
        r#type,
        data: payload,
        request_id,
    } = raw;

    let message = match r#type.as_str() {
        "ping" => ClientMessage::Ping(data(&r#type, payload, &request_id)?),
        "create_room" => ClientMessage::CreateRoom(data(&r#type, payload, &request_id)?),
        "join_room" => ClientMessage::JoinRoom(data(&r#type, payload, &request_id)?),
        "leave_room" => ClientMessage::LeaveRoom,
        "toggle_ready" => ClientMessage::ToggleReady,
        "start_game" => ClientMessage::StartGame,
        "submit_word" => ClientMessage::SubmitWord(data(&r#type, payload, &request_id)?),
        "use_item" => ClientMessage::UseItem(data(&r#type, payload, &request_id)?),
        "chat" => ClientMessage::Chat(data(&r#type, payload, &request_id)?),
        "end_game" => ClientMessage::EndGame,
        _ => return Err(InboundError::UnknownType(r#type)),
    };

    Ok(InboundFrame {
        message,
        request_id,
    })
}

// ========================================
// Outbound (server → client)
// ========================================

/// 参加者情報
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantDto {
    pub user_id: i64,
    pub nickname: String,
    pub status: String,
    pub is_owner: bool,
    pub score: i64,
    pub joined_at: i64,
    pub inventory: BTreeMap<String, u32>,
}

/// 進行中のゲームの状態
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameDto {
    pub last_word: String,
    pub last_char: String,
    pub round: u32,
    pub current_user_id: i64,
    pub turn_deadline: i64,
    pub used_words: usize,
}

/// ルームのスナップショット
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomDto {
    pub room_id: u64,
    pub title: String,
    pub status: String,
    pub game_mode: String,
    pub max_players: usize,
    pub turn_time_limit_s: u64,
    pub max_rounds: u32,
    pub participants: Vec<ParticipantDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game: Option<GameDto>,
}

/// アイテム効果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EffectDto {
    ExtraTime { added_ms: i64, turn_deadline: i64 },
    ScoreMultiplier { factor: f64 },
    SkipTurn { skipped_user_id: i64 },
    WordHint { count: usize },
    Immunity { until: i64 },
    ScreenDistraction { duration_s: f64, targets: Vec<i64> },
    Blocked { target_user_id: i64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankDto {
    pub rank: usize,
    pub user_id: i64,
    pub nickname: String,
    pub score: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerStatsDto {
    pub user_id: i64,
    pub score: i64,
    pub words_accepted: u32,
    pub words_submitted: u32,
    pub max_combo: u32,
    pub timeouts: u32,
    pub items_used: u32,
    pub left: bool,
}

/// サーバーから送るメッセージ
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    Pong {
        #[serde(skip_serializing_if = "Option::is_none")]
        t: Option<i64>,
    },
    Connected {
        user_id: i64,
        nickname: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        room_id: Option<u64>,
    },
    RoomJoined(RoomDto),
    RoomState(RoomDto),
    RoomLeft {
        room_id: u64,
    },
    ParticipantJoined(ParticipantDto),
    ParticipantLeft {
        user_id: i64,
        nickname: String,
    },
    ReadyToggled {
        user_id: i64,
        ready: bool,
    },
    OwnerChanged {
        user_id: i64,
    },
    GameStarted {
        seed_word: String,
        turn_order: Vec<i64>,
        first_turn_user_id: i64,
        turn_deadline: i64,
    },
    TurnStarted {
        user_id: i64,
        last_char: String,
        round: u32,
        deadline: i64,
    },
    TimerTick {
        user_id: i64,
        remaining_s: u64,
        remaining_ms: i64,
    },
    WordAccepted {
        user_id: i64,
        word: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        definition: Option<String>,
        score_breakdown: ScoreBreakdown,
        total_score: i64,
    },
    WordRejected {
        user_id: i64,
        word: String,
        reason: String,
    },
    TurnTimeout {
        user_id: i64,
    },
    ItemUsed {
        user_id: i64,
        item_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        target_user_id: Option<i64>,
        effect: EffectDto,
    },
    ItemRejected {
        reason: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        remaining_ms: Option<i64>,
    },
    WordHint {
        candidates: Vec<String>,
    },
    GameOver {
        reason: String,
        ranks: Vec<RankDto>,
        per_player_stats: Vec<PlayerStatsDto>,
    },
    Chat {
        user_id: i64,
        nickname: String,
        text: String,
    },
    Error {
        code: String,
        message: String,
    },
    RateLimited {
        retry_after_s: u64,
    },
    RoomDestroyed {
        reason: String,
    },
    ServerShutdown {},
}

impl ServerMessage {
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// 送信エンベロープ
#[derive(Debug, Serialize)]
pub struct ServerEnvelope<'a> {
    #[serde(flatten)]
    pub message: &'a ServerMessage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<&'a str>,
    pub timestamp: i64,
}

impl<'a> ServerEnvelope<'a> {
    pub fn new(message: &'a ServerMessage, timestamp: i64) -> Self {
        Self {
            message,
            request_id: None,
            timestamp,
        }
    }

    pub fn with_request_id(mut self, request_id: Option<&'a str>) -> Self {
        self.request_id = request_id;
        self
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
