//! ルーム設定・ゲームモード・公開用のルーム概要

use serde::{Deserialize, Serialize};

use crate::domain::{
    error::RoomConfigError,
    lexicon::dictionary::{MAX_WORD_CHARS, MIN_WORD_CHARS},
    value_object::{RoomId, RoomTitle, Timestamp, UserId},
};

pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 8;
pub const DEFAULT_MAX_PLAYERS: usize = 4;
pub const MIN_TURN_SECS: u64 = 5;
pub const MAX_TURN_SECS: u64 = 120;
pub const MIN_ROUNDS: u32 = 1;
pub const MAX_ROUNDS: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameMode {
    Classic,
    Blitz,
    Marathon,
    Speed,
}

impl GameMode {
    pub const ALL: [GameMode; 4] = [Self::Classic, Self::Blitz, Self::Marathon, Self::Speed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Classic => "CLASSIC",
            Self::Blitz => "BLITZ",
            Self::Marathon => "MARATHON",
            Self::Speed => "SPEED",
        }
    }

    /// Built-in rules for the mode
    pub fn default_rules(&self) -> ModeRules {
        match self {
            Self::Classic => ModeRules::new(30, 10, 2, 10, 1.0),
            Self::Blitz => ModeRules::new(10, 5, 2, 6, 1.5),
            Self::Marathon => ModeRules::new(45, 20, 2, 20, 1.0),
            Self::Speed => ModeRules::new(15, 10, 2, 8, 1.2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeRules {
    pub turn_time_limit_s: u64,
    pub max_rounds: u32,
    pub min_word_len: usize,
    pub max_word_len: usize,
    pub score_multiplier: f64,
}

impl ModeRules {
    pub const fn new(
        turn_time_limit_s: u64,
        max_rounds: u32,
        min_word_len: usize,
        max_word_len: usize,
        score_multiplier: f64,
    ) -> Self {
        Self {
            turn_time_limit_s,
            max_rounds,
            min_word_len,
            max_word_len,
            score_multiplier,
        }
    }
}

/// Rules for every mode, after operator overrides
#[derive(Debug, Clone)]
pub struct ModeTable {
    classic: ModeRules,
    blitz: ModeRules,
    marathon: ModeRules,
    speed: ModeRules,
}

impl Default for ModeTable {
    fn default() -> Self {
        Self {
            classic: GameMode::Classic.default_rules(),
            blitz: GameMode::Blitz.default_rules(),
            marathon: GameMode::Marathon.default_rules(),
            speed: GameMode::Speed.default_rules(),
        }
    }
}

impl ModeTable {
    pub fn rules(&self, mode: GameMode) -> ModeRules {
        match mode {
            GameMode::Classic => self.classic,
            GameMode::Blitz => self.blitz,
            GameMode::Marathon => self.marathon,
            GameMode::Speed => self.speed,
        }
    }

    pub fn with_turn_time(mut self, mode: GameMode, secs: u64) -> Self {
        let rules = match mode {
            GameMode::Classic => &mut self.classic,
            GameMode::Blitz => &mut self.blitz,
            GameMode::Marathon => &mut self.marathon,
            GameMode::Speed => &mut self.speed,
        };
        rules.turn_time_limit_s = secs.clamp(MIN_TURN_SECS, MAX_TURN_SECS);
        self
    }
}

/// Optional per-room settings supplied by the creator
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoomSettings {
    pub max_players: Option<usize>,
    pub game_mode: Option<GameMode>,
    pub turn_time_limit_s: Option<u64>,
    pub max_rounds: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoomConfig {
    pub title: RoomTitle,
    pub max_players: usize,
    pub game_mode: GameMode,
    pub turn_time_limit_s: u64,
    pub max_rounds: u32,
    pub min_word_len: usize,
    pub max_word_len: usize,
    pub score_multiplier: f64,
}

impl RoomConfig {
    /// Resolve settings against the mode table
    pub fn resolve(
        title: RoomTitle,
        settings: &RoomSettings,
        modes: &ModeTable,
    ) -> Result<Self, RoomConfigError> {
        let game_mode = settings.game_mode.unwrap_or(GameMode::Classic);
        let rules = modes.rules(game_mode);

        let max_players = settings.max_players.unwrap_or(DEFAULT_MAX_PLAYERS);
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&max_players) {
            return Err(RoomConfigError::MaxPlayers {
                min: MIN_PLAYERS,
                max: MAX_PLAYERS,
            });
        }

        let turn_time_limit_s = settings.turn_time_limit_s.unwrap_or(rules.turn_time_limit_s);
        if !(MIN_TURN_SECS..=MAX_TURN_SECS).contains(&turn_time_limit_s) {
            return Err(RoomConfigError::TurnTimeLimit {
                min: MIN_TURN_SECS,
                max: MAX_TURN_SECS,
            });
        }

        let max_rounds = settings.max_rounds.unwrap_or(rules.max_rounds);
        if !(MIN_ROUNDS..=MAX_ROUNDS).contains(&max_rounds) {
            return Err(RoomConfigError::MaxRounds {
                min: MIN_ROUNDS,
                max: MAX_ROUNDS,
            });
        }

        let min_word_len = rules.min_word_len.max(MIN_WORD_CHARS);
        let max_word_len = rules.max_word_len.min(MAX_WORD_CHARS);
        if min_word_len > max_word_len {
            return Err(RoomConfigError::WordLength);
        }

        Ok(Self {
            title,
            max_players,
            game_mode,
            turn_time_limit_s,
            max_rounds,
            min_word_len,
            max_word_len,
            score_multiplier: rules.score_multiplier,
        })
    }

    pub fn turn_time_limit_ms(&self) -> i64 {
        i64::try_from(self.turn_time_limit_s)
            .unwrap_or(i64::MAX / 1000)
            .saturating_mul(1000)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomStatus {
    Waiting,
    Playing,
    Finished,
}

impl RoomStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "WAITING",
            Self::Playing => "PLAYING",
            Self::Finished => "FINISHED",
        }
    }
}

/// Listing view of a room, published by its actor after every command
#[derive(Debug, Clone, PartialEq)]
pub struct RoomSummary {
    pub room_id: RoomId,
    pub title: String,
    pub game_mode: GameMode,
    pub status: RoomStatus,
    pub player_count: usize,
    pub max_players: usize,
    pub owner: Option<UserId>,
    pub created_at: Timestamp,
}
