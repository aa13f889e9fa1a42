//! ハングル音節の演算
//!
//! 完成形音節は U+AC00..=U+D7A3 にあり、
//! `0xAC00 + (initial * 21 + medial) * 28 + final` の順に並んでいます。

pub const SYLLABLE_FIRST: u32 = 0xAC00;
pub const SYLLABLE_LAST: u32 = 0xD7A3;

pub const INITIAL_COUNT: u32 = 19;
pub const MEDIAL_COUNT: u32 = 21;
pub const FINAL_COUNT: u32 = 28;

/// ㄴ
pub const INITIAL_NIEUN: u32 = 2;
/// ㄹ
pub const INITIAL_RIEUL: u32 = 5;
/// ㅇ
pub const INITIAL_IEUNG: u32 = 11;

/// ㅑ ㅕ ㅖ ㅛ ㅠ ㅣ
pub const PALATAL_MEDIALS: [u32; 6] = [2, 6, 7, 12, 17, 20];

/// Jamo indices of a precomposed syllable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Syllable {
    pub initial: u32,
    pub medial: u32,
    pub final_: u32,
}

pub fn is_syllable(c: char) -> bool {
    (SYLLABLE_FIRST..=SYLLABLE_LAST).contains(&(c as u32))
}

pub fn decompose(c: char) -> Option<Syllable> {
    if !is_syllable(c) {
        return None;
    }
    let offset = c as u32 - SYLLABLE_FIRST;
    Some(Syllable {
        initial: offset / (MEDIAL_COUNT * FINAL_COUNT),
        medial: (offset % (MEDIAL_COUNT * FINAL_COUNT)) / FINAL_COUNT,
        final_: offset % FINAL_COUNT,
    })
}

pub fn compose(syllable: Syllable) -> Option<char> {
    if syllable.initial >= INITIAL_COUNT
        || syllable.medial >= MEDIAL_COUNT
        || syllable.final_ >= FINAL_COUNT
    {
        return None;
    }
    let code = SYLLABLE_FIRST
        + (syllable.initial * MEDIAL_COUNT + syllable.medial) * FINAL_COUNT
        + syllable.final_;
    char::from_u32(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decompose_and_compose() {
        // テスト項目: 音節を分解して再合成すると元の音節に戻る
        // given (前提条件):
        let c = '론';

        // when (操作):
        let syllable = decompose(c).unwrap();

        // then (期待する結果): ㄹ + ㅗ + ㄴ
        assert_eq!(syllable.initial, INITIAL_RIEUL);
        assert_eq!(syllable.medial, 8);
        assert_eq!(syllable.final_, 4);
        assert_eq!(compose(syllable), Some('론'));
    }

    #[test]
    fn test_range_boundaries() {
        // テスト項目: 音節範囲の境界
        // given (前提条件) / when (操作) / then (期待する結果):
        assert!(is_syllable('가'));
        assert!(is_syllable('힣'));
        assert!(!is_syllable('ㄱ'));
        assert!(!is_syllable('a'));
        assert!(decompose('A').is_none());
    }
}
