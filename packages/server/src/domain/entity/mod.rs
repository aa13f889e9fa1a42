pub mod participant;
pub mod room;
pub mod session;

pub use participant::{Effect, EffectExpiry, Participant, ParticipantStatus};
pub use room::{GameMode, ModeRules, ModeTable, RoomConfig, RoomSettings, RoomStatus, RoomSummary};
pub use session::{AuthenticatedUser, Session};
