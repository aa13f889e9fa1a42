//! しりとりの規則による単語の検証

use std::collections::HashSet;

use serde::Serialize;

use super::{Lexicon, dictionary::DictionaryEntry, hangul};

/// Why a submitted word was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectReason {
    NotKorean,
    TooShort,
    TooLong,
    ChainBroken,
    Duplicate,
    UnknownWord,
}

impl RejectReason {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotKorean => "NOT_KOREAN",
            Self::TooShort => "TOO_SHORT",
            Self::TooLong => "TOO_LONG",
            Self::ChainBroken => "CHAIN_BROKEN",
            Self::Duplicate => "DUPLICATE",
            Self::UnknownWord => "UNKNOWN_WORD",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Valid(DictionaryEntry),
    Invalid(RejectReason),
}

/// Per-room constraints a submission must satisfy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainRule {
    pub required_first_char: char,
    pub min_len: usize,
    pub max_len: usize,
}

/// Check `submitted` against the rule. The first failing check decides.
pub fn validate(
    submitted: &str,
    rule: &ChainRule,
    used_words: &HashSet<String>,
    lexicon: &Lexicon,
) -> Verdict {
    if !submitted.chars().all(hangul::is_syllable) {
        return Verdict::Invalid(RejectReason::NotKorean);
    }

    let length = submitted.chars().count();
    if length < rule.min_len {
        return Verdict::Invalid(RejectReason::TooShort);
    }
    if length > rule.max_len {
        return Verdict::Invalid(RejectReason::TooLong);
    }

    if used_words.contains(submitted) {
        return Verdict::Invalid(RejectReason::Duplicate);
    }

    let chained = submitted
        .chars()
        .next()
        .is_some_and(|first| lexicon.table.are_equivalent(first, rule.required_first_char));
    if !chained {
        return Verdict::Invalid(RejectReason::ChainBroken);
    }

    match lexicon.dictionary.lookup(submitted) {
        Some(entry) => Verdict::Valid(entry.clone()),
        None => Verdict::Invalid(RejectReason::UnknownWord),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::lexicon::test_support::sample_lexicon;

    fn rule(c: char) -> ChainRule {
        ChainRule {
            required_first_char: c,
            min_len: 2,
            max_len: 6,
        }
    }

    #[test]
    fn test_valid_chain() {
        // テスト項目: 前の単語の最後の文字で始まる辞書の単語は受理される
        // given (前提条件):
        let lexicon = sample_lexicon();

        // when (操作):
        let verdict = validate("과일", &rule('과'), &HashSet::new(), &lexicon);

        // then (期待する結果):
        assert!(matches!(verdict, Verdict::Valid(entry) if entry.word == "과일"));
    }

    #[test]
    fn test_initial_sound_equivalence() {
        // テスト項目: 론 で終わる単語の次に 논 で始まる単語を出せる
        // given (前提条件):
        let lexicon = sample_lexicon();

        // when (操作):
        let verdict = validate("논리", &rule('론'), &HashSet::new(), &lexicon);

        // then (期待する結果):
        assert!(matches!(verdict, Verdict::Valid(_)));
    }

    #[test]
    fn test_rejection_reasons() {
        // テスト項目: 各規則違反に対応する理由が返される
        // given (前提条件):
        let lexicon = sample_lexicon();
        let used: HashSet<String> = ["과일".to_string()].into_iter().collect();

        // when (操作) / then (期待する結果):
        let cases = [
            ("apple", '과', RejectReason::NotKorean),
            ("과", '과', RejectReason::TooShort),
            ("과일과일과일과", '과', RejectReason::TooLong),
            ("과일", '과', RejectReason::Duplicate),
            ("바나나", '과', RejectReason::ChainBroken),
            ("과녁판", '과', RejectReason::UnknownWord),
        ];
        for (word, c, expected) in cases {
            assert_eq!(
                validate(word, &rule(c), &used, &lexicon),
                Verdict::Invalid(expected),
                "word {word}"
            );
        }
    }

    #[test]
    fn test_first_failing_check_wins() {
        // テスト項目: 複数の違反がある場合、最初の規則の理由が返される
        // given (前提条件): 使用済みかつ連鎖も壊れている単語
        let lexicon = sample_lexicon();
        let used: HashSet<String> = ["바나나".to_string()].into_iter().collect();

        // when (操作):
        let verdict = validate("바나나", &rule('과'), &used, &lexicon);

        // then (期待する結果): DUPLICATE が CHAIN_BROKEN より先
        assert_eq!(verdict, Verdict::Invalid(RejectReason::Duplicate));
    }

    #[test]
    fn test_length_boundaries() {
        // テスト項目: 最小・最大長ちょうどは通過し、1 文字ずれると拒否される
        // given (前提条件):
        let lexicon = sample_lexicon();
        let tight = ChainRule {
            required_first_char: '기',
            min_len: 2,
            max_len: 2,
        };

        // when (操作) / then (期待する結果):
        assert!(matches!(
            validate("기차", &tight, &HashSet::new(), &lexicon),
            Verdict::Valid(_)
        ));
        assert_eq!(
            validate("기", &tight, &HashSet::new(), &lexicon),
            Verdict::Invalid(RejectReason::TooShort)
        );
        assert_eq!(
            validate("기차표", &tight, &HashSet::new(), &lexicon),
            Verdict::Invalid(RejectReason::TooLong)
        );
    }
}
