//! Participant エンティティ

use std::collections::BTreeMap;

use crate::domain::{
    item::ItemKind,
    value_object::{ItemId, Nickname, Timestamp, UserId},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantStatus {
    Waiting,
    Ready,
    Playing,
    Left,
}

impl ParticipantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "WAITING",
            Self::Ready => "READY",
            Self::Playing => "PLAYING",
            Self::Left => "LEFT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EffectExpiry {
    /// Consumed by the holder's next accepted word
    NextAcceptedWord,
    At(Timestamp),
}

/// An item effect currently attached to a participant
#[derive(Debug, Clone, PartialEq)]
pub struct Effect {
    pub source_item_id: ItemId,
    pub kind: ItemKind,
    pub magnitude: f64,
    pub expires: EffectExpiry,
    pub target_user_id: UserId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    pub user_id: UserId,
    pub nickname: Nickname,
    pub status: ParticipantStatus,
    pub is_owner: bool,
    pub joined_at: Timestamp,
    pub score: i64,
    pub words_submitted: u32,
    pub words_accepted: u32,
    pub consecutive_success: u32,
    pub max_consecutive_success: u32,
    pub timeouts: u32,
    pub items_used: u32,
    pub inventory: BTreeMap<ItemId, u32>,
    pub cooldowns: BTreeMap<ItemId, Timestamp>,
    pub active_effects: Vec<Effect>,
    pub immunity_until: Option<Timestamp>,
}

impl Participant {
    pub fn new(
        user_id: UserId,
        nickname: Nickname,
        joined_at: Timestamp,
        inventory: BTreeMap<ItemId, u32>,
    ) -> Self {
        Self {
            user_id,
            nickname,
            status: ParticipantStatus::Waiting,
            is_owner: false,
            joined_at,
            score: 0,
            words_submitted: 0,
            words_accepted: 0,
            consecutive_success: 0,
            max_consecutive_success: 0,
            timeouts: 0,
            items_used: 0,
            inventory,
            cooldowns: BTreeMap::new(),
            active_effects: Vec::new(),
            immunity_until: None,
        }
    }

    /// Still taking part (has not left the running game)
    pub fn is_active(&self) -> bool {
        self.status != ParticipantStatus::Left
    }

    pub fn is_immune(&self, now: Timestamp) -> bool {
        self.immunity_until.is_some_and(|until| until > now)
    }

    pub fn item_count(&self, item_id: &ItemId) -> u32 {
        self.inventory.get(item_id).copied().unwrap_or(0)
    }

    /// Remaining cooldown in milliseconds, if any
    pub fn cooldown_remaining(&self, item_id: &ItemId, now: Timestamp) -> Option<i64> {
        self.cooldowns
            .get(item_id)
            .filter(|deadline| **deadline > now)
            .map(|deadline| deadline.millis_since(now))
    }

    /// Product of pending score multipliers
    pub fn pending_multiplier(&self) -> f64 {
        self.active_effects
            .iter()
            .filter(|e| e.kind == ItemKind::ScoreMultiplier)
            .map(|e| e.magnitude)
            .product()
    }

    pub fn consume_one_shot_effects(&mut self) {
        self.active_effects
            .retain(|e| e.expires != EffectExpiry::NextAcceptedWord);
    }

    pub fn drop_expired_effects(&mut self, now: Timestamp) {
        self.active_effects.retain(|e| match e.expires {
            EffectExpiry::At(at) => at > now,
            EffectExpiry::NextAcceptedWord => true,
        });
    }

    /// Record a rejected submission
    pub fn record_rejection(&mut self) {
        self.words_submitted += 1;
        self.consecutive_success = 0;
    }

    /// Record an accepted submission worth `points`
    pub fn record_acceptance(&mut self, points: i64) {
        self.words_submitted += 1;
        self.words_accepted += 1;
        self.consecutive_success += 1;
        self.max_consecutive_success = self.max_consecutive_success.max(self.consecutive_success);
        self.score += points.max(0);
    }

    pub fn record_timeout(&mut self) {
        self.timeouts += 1;
        self.consecutive_success = 0;
    }

    /// Clear per-game state. Inventory is kept.
    pub fn reset_for_new_game(&mut self, status: ParticipantStatus) {
        self.status = status;
        self.score = 0;
        self.words_submitted = 0;
        self.words_accepted = 0;
        self.consecutive_success = 0;
        self.max_consecutive_success = 0;
        self.timeouts = 0;
        self.items_used = 0;
        self.cooldowns.clear();
        self.active_effects.clear();
        self.immunity_until = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant() -> Participant {
        let mut inventory = BTreeMap::new();
        inventory.insert(ItemId::new("word_hint"), 2);
        Participant::new(
            UserId::new(1),
            Nickname::new("alice".to_string()).unwrap(),
            Timestamp::new(0),
            inventory,
        )
    }

    #[test]
    fn test_acceptance_tracks_streak_and_score() {
        // テスト項目: 連続正解数と最大連続正解数、スコアが更新される
        // given (前提条件):
        let mut p = participant();

        // when (操作):
        p.record_acceptance(100);
        p.record_acceptance(50);
        p.record_rejection();
        p.record_acceptance(10);

        // then (期待する結果):
        assert_eq!(p.score, 160);
        assert_eq!(p.consecutive_success, 1);
        assert_eq!(p.max_consecutive_success, 2);
        assert_eq!(p.words_submitted, 4);
        assert_eq!(p.words_accepted, 3);
    }

    #[test]
    fn test_pending_multiplier_is_product() {
        // テスト項目: 未消費のスコア倍率は乗算で合成され、消費後は 1.0 に戻る
        // given (前提条件):
        let mut p = participant();
        for magnitude in [2.0, 1.5] {
            p.active_effects.push(Effect {
                source_item_id: ItemId::new("double_score"),
                kind: ItemKind::ScoreMultiplier,
                magnitude,
                expires: EffectExpiry::NextAcceptedWord,
                target_user_id: p.user_id,
            });
        }

        // when (操作):
        let before = p.pending_multiplier();
        p.consume_one_shot_effects();

        // then (期待する結果):
        assert_eq!(before, 3.0);
        assert_eq!(p.pending_multiplier(), 1.0);
    }

    #[test]
    fn test_reset_keeps_inventory() {
        // テスト項目: ゲーム終了後のリセットでインベントリは保持される
        // given (前提条件):
        let mut p = participant();
        p.record_acceptance(100);
        p.cooldowns
            .insert(ItemId::new("word_hint"), Timestamp::new(50_000));

        // when (操作):
        p.reset_for_new_game(ParticipantStatus::Waiting);

        // then (期待する結果):
        assert_eq!(p.score, 0);
        assert!(p.cooldowns.is_empty());
        assert_eq!(p.item_count(&ItemId::new("word_hint")), 2);
    }

    #[test]
    fn test_cooldown_remaining() {
        // テスト項目: クールダウンの残り時間が計算され、期限後は None になる
        // given (前提条件):
        let mut p = participant();
        let item = ItemId::new("word_hint");
        p.cooldowns.insert(item.clone(), Timestamp::new(10_000));

        // when (操作) / then (期待する結果):
        assert_eq!(p.cooldown_remaining(&item, Timestamp::new(4_000)), Some(6_000));
        assert_eq!(p.cooldown_remaining(&item, Timestamp::new(10_000)), None);
    }
}
