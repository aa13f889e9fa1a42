//! ルームごとのアクター・ハンドル・ターンタイマー

pub mod actor;
pub mod handle;
pub mod timer;

#[cfg(test)]
mod tests;

pub use actor::{RoomActor, RoomCommand};
pub use handle::RoomHandle;
pub use timer::{RoomClock, TurnTimer};
