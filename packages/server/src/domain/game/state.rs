//! ゲーム中（PLAYING）だけ存在するしりとりの状態

use std::collections::HashSet;

use crate::domain::value_object::{Timestamp, UserId};

#[derive(Debug, Clone, PartialEq)]
pub struct WordChainState {
    pub seed_word: String,
    pub last_word: String,
    pub last_char: char,
    pub used_words: HashSet<String>,
    /// Accepted words in order, seed first
    pub history: Vec<String>,
    /// Active players in rotation order
    pub turn_order: Vec<UserId>,
    pub current_turn_index: usize,
    pub round: u32,
    pub turn_started_at: Timestamp,
    pub turn_deadline: Timestamp,
    /// Extra positions to skip on the next advance
    pub pending_skips: usize,
}

impl WordChainState {
    pub fn new(
        seed_word: String,
        last_char: char,
        turn_order: Vec<UserId>,
        now: Timestamp,
        turn_time_limit_ms: i64,
    ) -> Self {
        let mut used_words = HashSet::new();
        used_words.insert(seed_word.clone());
        Self {
            last_word: seed_word.clone(),
            history: vec![seed_word.clone()],
            seed_word,
            last_char,
            used_words,
            turn_order,
            current_turn_index: 0,
            round: 1,
            turn_started_at: now,
            turn_deadline: now.plus_millis(turn_time_limit_ms),
            pending_skips: 0,
        }
    }

    pub fn current_user(&self) -> Option<UserId> {
        self.turn_order.get(self.current_turn_index).copied()
    }

    /// Who one more skip would pass over on the next advance
    pub fn next_skipped(&self) -> Option<UserId> {
        let len = self.turn_order.len();
        if len == 0 {
            return None;
        }
        let index = (self.current_turn_index + 1 + self.pending_skips) % len;
        self.turn_order.get(index).copied()
    }

    pub fn record_word(&mut self, word: &str, last_char: char) {
        self.used_words.insert(word.to_string());
        self.history.push(word.to_string());
        self.last_word = word.to_string();
        self.last_char = last_char;
    }

    /// Move past the current holder (and any pending skips).
    ///
    /// Returns true when the rotation wrapped past the end.
    pub fn advance(&mut self) -> bool {
        let len = self.turn_order.len();
        if len == 0 {
            return false;
        }
        let step = 1 + self.pending_skips;
        self.pending_skips = 0;
        let raw = self.current_turn_index + step;
        let wraps = raw / len;
        self.current_turn_index = raw % len;
        self.round = self
            .round
            .saturating_add(u32::try_from(wraps).unwrap_or(u32::MAX));
        wraps > 0
    }

    /// Remove a player from the rotation.
    ///
    /// Returns true when the removed player held the turn. The index then
    /// points at whoever follows them, which is the next holder.
    pub fn remove_player(&mut self, user_id: UserId) -> bool {
        let Some(position) = self.turn_order.iter().position(|u| *u == user_id) else {
            return false;
        };
        self.turn_order.remove(position);
        let held_turn = position == self.current_turn_index;
        if position < self.current_turn_index {
            self.current_turn_index -= 1;
        }
        if self.current_turn_index >= self.turn_order.len() {
            self.current_turn_index = 0;
            if held_turn {
                self.round = self.round.saturating_add(1);
            }
        }
        held_turn
    }

    pub fn start_turn(&mut self, now: Timestamp, turn_time_limit_ms: i64) {
        self.turn_started_at = now;
        self.turn_deadline = now.plus_millis(turn_time_limit_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(players: &[i64]) -> WordChainState {
        WordChainState::new(
            "이론".to_string(),
            '론',
            players.iter().map(|p| UserId::new(*p)).collect(),
            Timestamp::new(0),
            30_000,
        )
    }

    #[test]
    fn test_advance_wraps_round() {
        // テスト項目: 最後の手番から進むとラウンドが増える
        // given (前提条件):
        let mut s = state(&[1, 2]);

        // when (操作):
        let first = s.advance();
        let second = s.advance();

        // then (期待する結果):
        assert!(!first);
        assert!(second);
        assert_eq!(s.current_turn_index, 0);
        assert_eq!(s.round, 2);
    }

    #[test]
    fn test_advance_applies_pending_skips() {
        // テスト項目: スキップ予約があると次の手番を飛ばす
        // given (前提条件):
        let mut s = state(&[1, 2, 3]);
        s.pending_skips = 1;

        // when (操作):
        s.advance();

        // then (期待する結果):
        assert_eq!(s.current_user(), Some(UserId::new(3)));
        assert_eq!(s.pending_skips, 0);
    }

    #[test]
    fn test_next_skipped_accounts_for_pending_skips() {
        // テスト項目: 次に飛ばされるプレイヤーは予約済みのスキップを考慮して決まる
        // given (前提条件):
        let mut s = state(&[1, 2, 3, 4]);

        // when (操作):
        let first = s.next_skipped();
        s.pending_skips = 1;
        let second = s.next_skipped();

        // then (期待する結果):
        assert_eq!(first, Some(UserId::new(2)));
        assert_eq!(second, Some(UserId::new(3)));
    }

    #[test]
    fn test_remove_player_before_current_keeps_holder() {
        // テスト項目: 手番より前のプレイヤーが抜けても手番は変わらない
        // given (前提条件):
        let mut s = state(&[1, 2, 3]);
        s.current_turn_index = 2;

        // when (操作):
        let held = s.remove_player(UserId::new(1));

        // then (期待する結果):
        assert!(!held);
        assert_eq!(s.current_user(), Some(UserId::new(3)));
    }

    #[test]
    fn test_remove_turn_holder_passes_to_next() {
        // テスト項目: 手番のプレイヤーが抜けると次のプレイヤーに手番が移る
        // given (前提条件):
        let mut s = state(&[1, 2, 3]);
        s.current_turn_index = 2;

        // when (操作):
        let held = s.remove_player(UserId::new(3));

        // then (期待する結果):
        assert!(held);
        assert_eq!(s.current_user(), Some(UserId::new(1)));
        assert_eq!(s.round, 2);
    }
}
