//! しりとりゲームエンジン
//!
//! `GameRoom` は 1 ルームの全状態を持ち、各コマンドを通常のメソッドとして
//! 公開します。コマンドは配信する通知とターンタイマーへの指示を返すだけで、
//! I/O は行いません。

pub mod event;
mod items;
mod play;
pub mod room;
pub mod state;


pub use event::{
    AppliedEffect, Audience, GameOverReason, GameView, Notice, Outcome, ParticipantView,
    RankEntry, RoomEvent, RoomSnapshot, TimerDirective,
};
pub use room::GameRoom;
pub use state::WordChainState;
