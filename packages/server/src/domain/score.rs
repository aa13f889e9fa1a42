//! 受理された単語の得点計算
//!
//! 純粋関数です。同じ入力からは常にビット単位で同じ内訳が得られます。

use serde::Serialize;

use super::lexicon::DictionaryEntry;

const BASE_PER_CHAR: i64 = 10;
const DIFFICULTY_WEIGHT: i64 = 5;
const SPEED_PER_SECOND: f64 = 2.0;
const SPEED_CAP: f64 = 50.0;
const COMBO_STEP: f64 = 0.1;
const COMBO_CAP: f64 = 3.0;
const COMBO_BONUS_PER_STREAK: i64 = 10;
const RARITY_WEIGHT: f64 = 0.5;
const LENGTH_BONUS_FROM: usize = 4;
const LENGTH_BONUS_PER_CHAR: i64 = 5;

#[derive(Debug, Clone, Copy)]
pub struct ScoreInput<'a> {
    pub entry: &'a DictionaryEntry,
    pub response_time_ms: i64,
    pub turn_time_limit_s: u64,
    /// Streak of accepted words before this one
    pub consecutive_success: u32,
    /// Product of pending score-multiplier item effects (1.0 when none)
    pub item_multiplier: f64,
    pub mode_multiplier: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub base: i64,
    pub speed_bonus: f64,
    pub combo_bonus: i64,
    pub rarity_bonus: f64,
    pub length_bonus: i64,
    pub difficulty_bonus: i64,
    pub item_bonus: i64,
    pub combo_multiplier: f64,
    pub mode_multiplier: f64,
    pub total: i64,
}

pub fn calculate(input: &ScoreInput<'_>) -> ScoreBreakdown {
    let entry = input.entry;
    let length = i64::try_from(entry.length).unwrap_or(i64::MAX / BASE_PER_CHAR);

    let base = length * BASE_PER_CHAR;
    let difficulty_bonus = i64::from(entry.difficulty) * DIFFICULTY_WEIGHT;

    let response_s = input.response_time_ms.max(0) as f64 / 1000.0;
    let remaining_s = (input.turn_time_limit_s as f64 - response_s).max(0.0);
    let speed_bonus = (remaining_s * SPEED_PER_SECOND).min(SPEED_CAP);

    let combo_multiplier = (1.0 + COMBO_STEP * f64::from(input.consecutive_success)).min(COMBO_CAP);
    let combo_bonus = i64::from(input.consecutive_success) * COMBO_BONUS_PER_STREAK;

    let rarity_bonus = f64::from(100u8.saturating_sub(entry.frequency)) * RARITY_WEIGHT;
    let length_bonus = i64::try_from(entry.length.saturating_sub(LENGTH_BONUS_FROM))
        .unwrap_or(0)
        * LENGTH_BONUS_PER_CHAR;

    let item_multiplier = input.item_multiplier.max(1.0);
    let item_bonus =
        ((base + difficulty_bonus) as f64 + speed_bonus) * (item_multiplier - 1.0);
    let item_bonus = item_bonus.floor() as i64;

    let mode_multiplier = input.mode_multiplier.max(0.0);
    let subtotal = (base + difficulty_bonus + length_bonus + item_bonus) as f64
        + speed_bonus
        + rarity_bonus;
    let total = (subtotal * combo_multiplier * mode_multiplier).floor() as i64 + combo_bonus;

    ScoreBreakdown {
        base,
        speed_bonus,
        combo_bonus,
        rarity_bonus,
        length_bonus,
        difficulty_bonus,
        item_bonus,
        combo_multiplier,
        mode_multiplier,
        total: total.max(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(word: &str, difficulty: u8, frequency: u8) -> DictionaryEntry {
        DictionaryEntry {
            word: word.to_string(),
            first_char: word.chars().next().unwrap(),
            last_char: word.chars().last().unwrap(),
            length: word.chars().count(),
            frequency,
            difficulty,
            definition: None,
        }
    }

    fn input(entry: &DictionaryEntry) -> ScoreInput<'_> {
        ScoreInput {
            entry,
            response_time_ms: 3_000,
            turn_time_limit_s: 30,
            consecutive_success: 0,
            item_multiplier: 1.0,
            mode_multiplier: 1.0,
        }
    }

    #[test]
    fn test_happy_chain_score() {
        // テスト項目: 3 秒で 과일 (難易度 1, 頻度 20) を提出すると 115 点
        // given (前提条件):
        let word = entry("과일", 1, 20);

        // when (操作):
        let breakdown = calculate(&input(&word));

        // then (期待する結果):
        assert_eq!(breakdown.base, 20);
        assert_eq!(breakdown.difficulty_bonus, 5);
        assert_eq!(breakdown.speed_bonus, 50.0);
        assert_eq!(breakdown.rarity_bonus, 40.0);
        assert_eq!(breakdown.length_bonus, 0);
        assert_eq!(breakdown.combo_bonus, 0);
        assert_eq!(breakdown.total, 115);
    }

    #[test]
    fn test_combo_is_capped() {
        // テスト項目: コンボ倍率は 3.0 で頭打ちになる
        // given (前提条件):
        let word = entry("과일", 1, 100);
        let mut score_input = input(&word);
        score_input.consecutive_success = 50;

        // when (操作):
        let breakdown = calculate(&score_input);

        // then (期待する結果):
        assert_eq!(breakdown.combo_multiplier, 3.0);
        assert_eq!(breakdown.combo_bonus, 500);
    }

    #[test]
    fn test_item_and_mode_multipliers_compose() {
        // テスト項目: アイテム倍率とモード倍率が乗算で合成される
        // given (前提条件): 長い単語、遅い回答
        let word = entry("무지개다리", 2, 100);
        let mut score_input = input(&word);
        score_input.response_time_ms = 30_000;
        score_input.item_multiplier = 2.0;
        score_input.mode_multiplier = 1.5;

        // when (操作):
        let breakdown = calculate(&score_input);

        // then (期待する結果):
        // base 50, difficulty 10, speed 0, rarity 0, length 5, item 60
        assert_eq!(breakdown.item_bonus, 60);
        assert_eq!(breakdown.length_bonus, 5);
        assert_eq!(breakdown.total, ((50 + 10 + 5 + 60) as f64 * 1.5).floor() as i64);
    }

    #[test]
    fn test_calculation_is_deterministic() {
        // テスト項目: 同じ入力から同じ結果がビット単位で得られる
        // given (前提条件):
        let word = entry("소나기", 2, 45);
        let mut score_input = input(&word);
        score_input.response_time_ms = 7_321;
        score_input.consecutive_success = 3;
        score_input.item_multiplier = 1.5;

        // when (操作):
        let first = calculate(&score_input);
        let second = calculate(&score_input);

        // then (期待する結果):
        assert_eq!(first, second);
        assert_eq!(first.total.to_be_bytes(), second.total.to_be_bytes());
        assert_eq!(first.speed_bonus.to_bits(), second.speed_bonus.to_bits());
    }

    #[test]
    fn test_late_answer_has_no_speed_bonus() {
        // テスト項目: 制限時間を超えた回答時間ではスピードボーナスが 0
        // given (前提条件):
        let word = entry("과일", 1, 20);
        let mut score_input = input(&word);
        score_input.response_time_ms = 45_000;

        // when (操作):
        let breakdown = calculate(&score_input);

        // then (期待する結果):
        assert_eq!(breakdown.speed_bonus, 0.0);
    }
}
