//! Domain 層
//!
//! ゲームのルールと、外側の層が実装する trait を定義します。
//! ソケットや時計には直接触れません。

pub mod entity;
pub mod error;
pub mod game;
pub mod item;
pub mod lexicon;
pub mod message_pusher;
pub mod repository;
pub mod score;
pub mod value_object;

pub use entity::{
    AuthenticatedUser, GameMode, ModeRules, ModeTable, Participant, ParticipantStatus, RoomConfig,
    RoomSettings, RoomStatus, RoomSummary, Session,
};
pub use error::{
    GameError, IdentityError, InvariantViolation, ItemRejection, LoadError, MessagePushError,
    RepositoryError, RoomConfigError, ValueObjectError,
};
pub use game::{GameRoom, Notice, Outcome, RoomEvent, TimerDirective};
pub use item::{ItemCatalog, ItemDefinition, ItemKind, TargetPolicy};
pub use lexicon::{Dictionary, InitialSoundTable, Lexicon};
pub use message_pusher::{ConnectionId, MessagePusher, OutboundFrame, PusherChannel};
pub use repository::{IdentityProvider, SessionRepository};
pub use value_object::{
    ChatText, ItemId, Nickname, RoomId, RoomTitle, SessionToken, Timestamp, UserId,
};
