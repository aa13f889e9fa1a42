//! ドメインエラー定義
//!
//! コマンドの境界を越えるエラーは、クライアントが翻訳に使う
//! snake_case の `code()` を持ちます。

use thiserror::Error;

/// Value object construction errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("nickname must not be empty")]
    NicknameEmpty,

    #[error("nickname must be at most {0} characters")]
    NicknameTooLong(usize),

    #[error("session token is malformed")]
    MalformedToken,

    #[error("chat message must not be empty")]
    ChatEmpty,

    #[error("chat message must be at most {0} characters")]
    ChatTooLong(usize),

    #[error("room title must not be empty")]
    TitleEmpty,

    #[error("room title must be at most {0} characters")]
    TitleTooLong(usize),
}

/// Reasons an item use is refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ItemRejection {
    #[error("item is not in the catalog")]
    UnknownItem,

    #[error("no item of this kind left in inventory")]
    OutOfStock,

    #[error("item is on cooldown for another {remaining_ms} ms")]
    CooldownActive { remaining_ms: i64 },

    #[error("item can only be used on your own turn")]
    NotYourTurn,

    #[error("item target is not allowed")]
    InvalidTarget,

    #[error("item cannot be used in the current phase")]
    WrongPhase,
}

impl ItemRejection {
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownItem => "unknown_item",
            Self::OutOfStock => "out_of_stock",
            Self::CooldownActive { .. } => "cooldown_active",
            Self::NotYourTurn => "not_your_turn",
            Self::InvalidTarget => "invalid_target",
            Self::WrongPhase => "wrong_phase",
        }
    }
}

/// Engine command failures (authorization, precondition and validation)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("user is not a participant of this room")]
    NotInRoom,

    #[error("user already joined this room")]
    AlreadyInRoom,

    #[error("room is full")]
    RoomFull,

    #[error("only the room owner can do this")]
    NotOwner,

    #[error("it is not your turn")]
    NotYourTurn,

    #[error("at least two participants are required")]
    NotEnoughPlayers,

    #[error("every participant must be ready")]
    PlayersNotReady,

    #[error("a game is in progress")]
    GameInProgress,

    #[error("no game is in progress")]
    GameNotInProgress,

    #[error("the turn deadline has passed")]
    TurnExpired,

    #[error("dictionary has no usable seed word")]
    NoSeedWord,

    #[error("item rejected: {0}")]
    ItemRejected(ItemRejection),

    #[error("room is closed")]
    RoomClosed,
}

impl GameError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotInRoom => "not_in_room",
            Self::AlreadyInRoom => "already_in_room",
            Self::RoomFull => "room_full",
            Self::NotOwner => "not_owner",
            Self::NotYourTurn => "not_your_turn",
            Self::NotEnoughPlayers => "not_enough_players",
            Self::PlayersNotReady => "players_not_ready",
            Self::GameInProgress => "game_in_progress",
            Self::GameNotInProgress => "game_not_in_progress",
            Self::TurnExpired => "turn_expired",
            Self::NoSeedWord => "no_seed_word",
            Self::ItemRejected(rejection) => rejection.code(),
            Self::RoomClosed => "room_closed",
        }
    }
}

impl From<ItemRejection> for GameError {
    fn from(value: ItemRejection) -> Self {
        Self::ItemRejected(value)
    }
}

/// Engine invariant violations; fatal for the affected room
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("room has participants but {owners} owners")]
    OwnerCount { owners: usize },

    #[error("room has {count} participants, capacity is {max}")]
    OverCapacity { count: usize, max: usize },

    #[error("game state present while room is not playing")]
    StrayGameState,

    #[error("room is playing without game state")]
    MissingGameState,

    #[error("last word is missing from the used set")]
    LastWordNotUsed,

    #[error("turn index {index} is out of range for {len} players")]
    TurnIndexOutOfRange { index: usize, len: usize },

    #[error("turn holder {0} is not an active participant")]
    InactiveTurnHolder(i64),

    #[error("turn deadline is not after the turn start")]
    DeadlineBeforeStart,
}

/// Room settings outside the accepted ranges
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomConfigError {
    #[error("max_players must be between {min} and {max}")]
    MaxPlayers { min: usize, max: usize },

    #[error("turn_time_limit_s must be between {min} and {max}")]
    TurnTimeLimit { min: u64, max: u64 },

    #[error("max_rounds must be between {min} and {max}")]
    MaxRounds { min: u32, max: u32 },

    #[error("word length bounds are invalid")]
    WordLength,
}

/// Repository errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("session not found")]
    SessionNotFound,

    #[error("session expired")]
    SessionExpired,
}

/// Identity provider errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),

    #[error("user {0} not found")]
    UserNotFound(i64),

    #[error("invalid nickname: {0}")]
    InvalidNickname(#[from] ValueObjectError),
}

/// Message push errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("client '{0}' not found")]
    ClientNotFound(String),

    #[error("push failed: {0}")]
    PushFailed(String),

    #[error("user {0} already has an open connection")]
    AlreadyConnected(i64),
}

/// Static resource loading errors
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("invalid item catalog: {0}")]
    Catalog(#[from] serde_json::Error),

    #[error("{0} contains no entries")]
    Empty(&'static str),
}
