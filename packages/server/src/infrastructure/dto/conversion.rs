//! Conversion logic between DTOs and domain types.

use crate::domain::{
    ItemId, RoomEvent, RoomSettings, RoomStatus, RoomSummary, UserId,
    game::event::{AppliedEffect, GameView, ParticipantView, RankEntry, RoomSnapshot},
};
use crate::infrastructure::dto::{http, websocket as dto};

// ========================================
// DTO → Domain
// ========================================

impl From<&dto::CreateRoomData> for RoomSettings {
    fn from(data: &dto::CreateRoomData) -> Self {
        Self {
            max_players: data.max_players,
            game_mode: data.game_mode,
            turn_time_limit_s: data.turn_time_limit_s,
            max_rounds: data.max_rounds,
        }
    }
}

impl dto::UseItemData {
    pub fn item_id(&self) -> ItemId {
        ItemId::new(self.item_id.clone())
    }

    pub fn target(&self) -> Option<UserId> {
        self.target_user_id.map(UserId::new)
    }
}

/// クエリ文字列のステータス（大文字小文字は区別しない）
pub fn parse_room_status(value: &str) -> Option<RoomStatus> {
    match value.to_ascii_uppercase().as_str() {
        "WAITING" => Some(RoomStatus::Waiting),
        "PLAYING" => Some(RoomStatus::Playing),
        "FINISHED" => Some(RoomStatus::Finished),
        _ => None,
    }
}

// ========================================
// Domain → DTO
// ========================================

impl From<&ParticipantView> for dto::ParticipantDto {
    fn from(view: &ParticipantView) -> Self {
        Self {
            user_id: view.user_id.value(),
            nickname: view.nickname.clone(),
            status: view.status.as_str().to_string(),
            is_owner: view.is_owner,
            score: view.score,
            joined_at: view.joined_at.value(),
            inventory: view
                .inventory
                .iter()
                .map(|(id, count)| (id.as_str().to_string(), *count))
                .collect(),
        }
    }
}

impl From<&GameView> for dto::GameDto {
    fn from(view: &GameView) -> Self {
        Self {
            last_word: view.last_word.clone(),
            last_char: view.last_char.to_string(),
            round: view.round,
            current_user_id: view.current_user_id.value(),
            turn_deadline: view.turn_deadline.value(),
            used_words: view.used_words,
        }
    }
}

impl From<&RoomSnapshot> for dto::RoomDto {
    fn from(room: &RoomSnapshot) -> Self {
        Self {
            room_id: room.room_id.value(),
            title: room.title.clone(),
            status: room.status.as_str().to_string(),
            game_mode: room.game_mode.as_str().to_string(),
            max_players: room.max_players,
            turn_time_limit_s: room.turn_time_limit_s,
            max_rounds: room.max_rounds,
            participants: room.participants.iter().map(Into::into).collect(),
            game: room.game.as_ref().map(Into::into),
        }
    }
}

impl From<&AppliedEffect> for dto::EffectDto {
    fn from(effect: &AppliedEffect) -> Self {
        match effect {
            AppliedEffect::ExtraTime {
                added_ms,
                turn_deadline,
            } => Self::ExtraTime {
                added_ms: *added_ms,
                turn_deadline: turn_deadline.value(),
            },
            AppliedEffect::ScoreMultiplier { factor } => Self::ScoreMultiplier { factor: *factor },
            AppliedEffect::SkipTurn { skipped_user_id } => Self::SkipTurn {
                skipped_user_id: skipped_user_id.value(),
            },
            AppliedEffect::WordHint { count } => Self::WordHint { count: *count },
            AppliedEffect::Immunity { until } => Self::Immunity {
                until: until.value(),
            },
            AppliedEffect::ScreenDistraction {
                duration_s,
                targets,
            } => Self::ScreenDistraction {
                duration_s: *duration_s,
                targets: targets.iter().map(UserId::value).collect(),
            },
            AppliedEffect::Blocked { target_user_id } => Self::Blocked {
                target_user_id: target_user_id.value(),
            },
        }
    }
}

impl From<&RankEntry> for dto::RankDto {
    fn from(entry: &RankEntry) -> Self {
        Self {
            rank: entry.rank,
            user_id: entry.user_id.value(),
            nickname: entry.nickname.clone(),
            score: entry.score,
        }
    }
}

impl From<&RankEntry> for dto::PlayerStatsDto {
    fn from(entry: &RankEntry) -> Self {
        Self {
            user_id: entry.user_id.value(),
            score: entry.score,
            words_accepted: entry.words_accepted,
            words_submitted: entry.words_submitted,
            max_combo: entry.max_combo,
            timeouts: entry.timeouts,
            items_used: entry.items_used,
            left: entry.left,
        }
    }
}

/// Seconds shown on the countdown (rounded up so "0" means expired)
fn remaining_secs(remaining_ms: i64) -> u64 {
    u64::try_from(remaining_ms.max(0)).unwrap_or(0).div_ceil(1000)
}

impl From<&RoomEvent> for dto::ServerMessage {
    fn from(event: &RoomEvent) -> Self {
        match event {
            RoomEvent::RoomJoined { room } => Self::RoomJoined(room.into()),
            RoomEvent::RoomState { room } => Self::RoomState(room.into()),
            RoomEvent::ParticipantJoined { participant } => {
                Self::ParticipantJoined(participant.into())
            }
            RoomEvent::RoomLeft { room_id } => Self::RoomLeft {
                room_id: room_id.value(),
            },
            RoomEvent::ParticipantLeft { user_id, nickname } => Self::ParticipantLeft {
                user_id: user_id.value(),
                nickname: nickname.clone(),
            },
            RoomEvent::ReadyToggled { user_id, ready } => Self::ReadyToggled {
                user_id: user_id.value(),
                ready: *ready,
            },
            RoomEvent::OwnerChanged { user_id } => Self::OwnerChanged {
                user_id: user_id.value(),
            },
            RoomEvent::GameStarted {
                seed_word,
                turn_order,
                first_user_id,
                turn_deadline,
            } => Self::GameStarted {
                seed_word: seed_word.clone(),
                turn_order: turn_order.iter().map(UserId::value).collect(),
                first_turn_user_id: first_user_id.value(),
                turn_deadline: turn_deadline.value(),
            },
            RoomEvent::TurnStarted {
                user_id,
                last_char,
                round,
                turn_deadline,
            } => Self::TurnStarted {
                user_id: user_id.value(),
                last_char: last_char.to_string(),
                round: *round,
                deadline: turn_deadline.value(),
            },
            RoomEvent::WordAccepted {
                user_id,
                word,
                definition,
                breakdown,
                total_score,
            } => Self::WordAccepted {
                user_id: user_id.value(),
                word: word.clone(),
                definition: definition.clone(),
                score_breakdown: *breakdown,
                total_score: *total_score,
            },
            RoomEvent::WordRejected {
                user_id,
                word,
                reason,
            } => Self::WordRejected {
                user_id: user_id.value(),
                word: word.clone(),
                reason: reason.code().to_string(),
            },
            RoomEvent::TurnTimeout { user_id } => Self::TurnTimeout {
                user_id: user_id.value(),
            },
            RoomEvent::ItemUsed {
                user_id,
                item_id,
                target_user_id,
                effect,
            } => Self::ItemUsed {
                user_id: user_id.value(),
                item_id: item_id.as_str().to_string(),
                target_user_id: target_user_id.map(|id| id.value()),
                effect: effect.into(),
            },
            RoomEvent::WordHint { candidates } => Self::WordHint {
                candidates: candidates.clone(),
            },
            RoomEvent::TimerTick {
                user_id,
                remaining_ms,
            } => Self::TimerTick {
                user_id: user_id.value(),
                remaining_s: remaining_secs(*remaining_ms),
                remaining_ms: *remaining_ms,
            },
            RoomEvent::GameOver { reason, ranks } => Self::GameOver {
                reason: reason.as_str().to_string(),
                ranks: ranks.iter().map(Into::into).collect(),
                per_player_stats: ranks.iter().map(Into::into).collect(),
            },
            RoomEvent::Chat {
                user_id,
                nickname,
                text,
            } => Self::Chat {
                user_id: user_id.value(),
                nickname: nickname.clone(),
                text: text.clone(),
            },
            RoomEvent::RoomDestroyed { reason } => Self::RoomDestroyed {
                reason: reason.clone(),
            },
            RoomEvent::ServerShutdown => Self::ServerShutdown {},
        }
    }
}

impl From<&RoomSummary> for http::RoomSummaryDto {
    fn from(summary: &RoomSummary) -> Self {
        Self {
            room_id: summary.room_id.value(),
            title: summary.title.clone(),
            game_mode: summary.game_mode.as_str().to_string(),
            status: summary.status.as_str().to_string(),
            player_count: summary.player_count,
            max_players: summary.max_players,
            owner_user_id: summary.owner.map(|id| id.value()),
            created_at: summary.created_at.value(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        GameMode, ParticipantStatus, RoomId, Timestamp,
        game::event::GameOverReason,
        lexicon::RejectReason,
    };

    fn rank(rank: usize, user_id: i64, score: i64, left: bool) -> RankEntry {
        RankEntry {
            rank,
            user_id: UserId::new(user_id),
            nickname: format!("user{user_id}"),
            score,
            words_accepted: 3,
            words_submitted: 4,
            max_combo: 2,
            timeouts: 1,
            items_used: 0,
            left,
        }
    }

    #[test]
    fn test_room_snapshot_to_dto() {
        // テスト項目: ルームのスナップショットが DTO に変換される
        // given (前提条件):
        let snapshot = RoomSnapshot {
            room_id: RoomId::new(7),
            title: "끝말잇기".to_string(),
            status: RoomStatus::Playing,
            game_mode: GameMode::Blitz,
            max_players: 4,
            turn_time_limit_s: 10,
            max_rounds: 5,
            participants: vec![ParticipantView {
                user_id: UserId::new(1),
                nickname: "철수".to_string(),
                status: ParticipantStatus::Playing,
                is_owner: true,
                score: 115,
                joined_at: Timestamp::new(100),
                inventory: vec![(ItemId::new("extra_time"), 1)],
            }],
            game: Some(GameView {
                last_word: "사과".to_string(),
                last_char: '과',
                round: 1,
                current_user_id: UserId::new(1),
                turn_deadline: Timestamp::new(10_000),
                used_words: 1,
            }),
        };

        // when (操作):
        let dto: dto::RoomDto = (&snapshot).into();

        // then (期待する結果):
        assert_eq!(dto.room_id, 7);
        assert_eq!(dto.status, "PLAYING");
        assert_eq!(dto.game_mode, "BLITZ");
        assert_eq!(dto.participants[0].inventory.get("extra_time"), Some(&1));
        assert_eq!(dto.game.unwrap().last_char, "과");
    }

    #[test]
    fn test_word_rejected_uses_reason_code() {
        // テスト項目: 不採用の理由は安定したコードで送られる
        // given (前提条件):
        let event = RoomEvent::WordRejected {
            user_id: UserId::new(2),
            word: "과자".to_string(),
            reason: RejectReason::UnknownWord,
        };

        // when (操作):
        let message: dto::ServerMessage = (&event).into();

        // then (期待する結果):
        assert_eq!(
            message,
            dto::ServerMessage::WordRejected {
                user_id: 2,
                word: "과자".to_string(),
                reason: "UNKNOWN_WORD".to_string(),
            }
        );
    }

    #[test]
    fn test_timer_tick_rounds_seconds_up() {
        // テスト項目: 残り時間の秒表示は切り上げになる
        // given (前提条件):
        let event = RoomEvent::TimerTick {
            user_id: UserId::new(1),
            remaining_ms: 20_001,
        };

        // when (操作):
        let message: dto::ServerMessage = (&event).into();

        // then (期待する結果):
        assert!(matches!(
            message,
            dto::ServerMessage::TimerTick {
                remaining_s: 21,
                remaining_ms: 20_001,
                ..
            }
        ));
    }

    #[test]
    fn test_game_over_carries_per_player_stats() {
        // テスト項目: game_over は順位と個人成績の両方を持つ
        // given (前提条件):
        let event = RoomEvent::GameOver {
            reason: GameOverReason::MaxRounds,
            ranks: vec![rank(1, 1, 200, false), rank(2, 2, 90, true)],
        };

        // when (操作):
        let message: dto::ServerMessage = (&event).into();

        // then (期待する結果):
        let dto::ServerMessage::GameOver {
            reason,
            ranks,
            per_player_stats,
        } = message
        else {
            panic!("expected game_over");
        };
        assert_eq!(reason, "MAX_ROUNDS");
        assert_eq!(ranks[1].rank, 2);
        assert_eq!(per_player_stats[1].words_submitted, 4);
        assert!(per_player_stats[1].left);
    }

    #[test]
    fn test_parse_room_status() {
        // テスト項目: クエリのステータスは大文字小文字を区別せずに解釈される
        // given (前提条件):
        let values = ["waiting", "PLAYING", "Finished", "gone"];

        // when (操作):
        let parsed: Vec<_> = values.iter().map(|v| parse_room_status(v)).collect();

        // then (期待する結果):
        assert_eq!(
            parsed,
            vec![
                Some(RoomStatus::Waiting),
                Some(RoomStatus::Playing),
                Some(RoomStatus::Finished),
                None
            ]
        );
    }
}
