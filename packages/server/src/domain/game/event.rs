//! ルームコマンドの結果（配信する通知とタイマーへの指示）

use crate::domain::{
    entity::{GameMode, ParticipantStatus, RoomStatus},
    lexicon::RejectReason,
    score::ScoreBreakdown,
    value_object::{ItemId, RoomId, Timestamp, UserId},
};

/// Who receives a notice
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    Room,
    User(UserId),
    AllExcept(UserId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub audience: Audience,
    pub event: RoomEvent,
}

impl Notice {
    pub fn room(event: RoomEvent) -> Self {
        Self {
            audience: Audience::Room,
            event,
        }
    }

    pub fn user(user_id: UserId, event: RoomEvent) -> Self {
        Self {
            audience: Audience::User(user_id),
            event,
        }
    }

    pub fn all_except(user_id: UserId, event: RoomEvent) -> Self {
        Self {
            audience: Audience::AllExcept(user_id),
            event,
        }
    }
}

/// Instruction for the room's turn timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimerDirective {
    #[default]
    Keep,
    Arm { deadline: Timestamp },
    Extend { by_ms: i64 },
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Outcome {
    pub notices: Vec<Notice>,
    pub timer: TimerDirective,
}

impl Outcome {
    pub(crate) fn push(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    /// Later directives win, except that `Keep` never overrides
    pub(crate) fn set_timer(&mut self, directive: TimerDirective) {
        if directive != TimerDirective::Keep {
            self.timer = directive;
        }
    }

    pub fn events(&self) -> impl Iterator<Item = &RoomEvent> {
        self.notices.iter().map(|n| &n.event)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOverReason {
    MaxRounds,
    LastStanding,
    OwnerEnded,
}

impl GameOverReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MaxRounds => "MAX_ROUNDS",
            Self::LastStanding => "LAST_STANDING",
            Self::OwnerEnded => "OWNER_ENDED",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantView {
    pub user_id: UserId,
    pub nickname: String,
    pub status: ParticipantStatus,
    pub is_owner: bool,
    pub score: i64,
    pub joined_at: Timestamp,
    pub inventory: Vec<(ItemId, u32)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameView {
    pub last_word: String,
    pub last_char: char,
    pub round: u32,
    pub current_user_id: UserId,
    pub turn_deadline: Timestamp,
    pub used_words: usize,
}

/// Full room state sent to a member on join or reset
#[derive(Debug, Clone, PartialEq)]
pub struct RoomSnapshot {
    pub room_id: RoomId,
    pub title: String,
    pub status: RoomStatus,
    pub game_mode: GameMode,
    pub max_players: usize,
    pub turn_time_limit_s: u64,
    pub max_rounds: u32,
    pub participants: Vec<ParticipantView>,
    pub game: Option<GameView>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankEntry {
    pub rank: usize,
    pub user_id: UserId,
    pub nickname: String,
    pub score: i64,
    pub words_accepted: u32,
    pub words_submitted: u32,
    pub max_combo: u32,
    pub timeouts: u32,
    pub items_used: u32,
    pub left: bool,
}

/// Visible result of an item use
#[derive(Debug, Clone, PartialEq)]
pub enum AppliedEffect {
    ExtraTime { added_ms: i64, turn_deadline: Timestamp },
    ScoreMultiplier { factor: f64 },
    SkipTurn { skipped_user_id: UserId },
    WordHint { count: usize },
    Immunity { until: Timestamp },
    ScreenDistraction { duration_s: f64, targets: Vec<UserId> },
    /// A hostile item hit an immune target and did nothing
    Blocked { target_user_id: UserId },
}

#[derive(Debug, Clone, PartialEq)]
pub enum RoomEvent {
    RoomJoined {
        room: RoomSnapshot,
    },
    RoomState {
        room: RoomSnapshot,
    },
    ParticipantJoined {
        participant: ParticipantView,
    },
    RoomLeft {
        room_id: RoomId,
    },
    ParticipantLeft {
        user_id: UserId,
        nickname: String,
    },
    ReadyToggled {
        user_id: UserId,
        ready: bool,
    },
    OwnerChanged {
        user_id: UserId,
    },
    GameStarted {
        seed_word: String,
        turn_order: Vec<UserId>,
        first_user_id: UserId,
        turn_deadline: Timestamp,
    },
    TurnStarted {
        user_id: UserId,
        last_char: char,
        round: u32,
        turn_deadline: Timestamp,
    },
    WordAccepted {
        user_id: UserId,
        word: String,
        definition: Option<String>,
        breakdown: ScoreBreakdown,
        total_score: i64,
    },
    WordRejected {
        user_id: UserId,
        word: String,
        reason: RejectReason,
    },
    TurnTimeout {
        user_id: UserId,
    },
    ItemUsed {
        user_id: UserId,
        item_id: ItemId,
        target_user_id: Option<UserId>,
        effect: AppliedEffect,
    },
    WordHint {
        candidates: Vec<String>,
    },
    TimerTick {
        user_id: UserId,
        remaining_ms: i64,
    },
    GameOver {
        reason: GameOverReason,
        ranks: Vec<RankEntry>,
    },
    Chat {
        user_id: UserId,
        nickname: String,
        text: String,
    },
    RoomDestroyed {
        reason: String,
    },
    ServerShutdown,
}
