//! 辞書ローダー
//!
//! タブ区切りのテキスト（`word<TAB>definition<TAB>difficulty<TAB>frequency`）を読み込みます。
//! 空行と `#` で始まる行は無視します。definition は空でも構いません。
//! パスが指定されない場合はバイナリに同梱された辞書を使います。

use std::path::Path;

use crate::domain::{
    Dictionary, InitialSoundTable, Lexicon, LoadError, lexicon::DictionaryRecord,
};

/// 同梱の辞書データ
pub const BUNDLED_DICTIONARY: &str = include_str!("../../../data/dictionary.tsv");

const DEFAULT_DIFFICULTY: u8 = 1;
const DEFAULT_FREQUENCY: u8 = 50;

fn parse_number(
    field: Option<&str>,
    default: u8,
    line: usize,
    name: &str,
) -> Result<u8, LoadError> {
    match field.map(str::trim).filter(|f| !f.is_empty()) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| LoadError::Parse {
            line,
            reason: format!("{name} '{value}' is not a number in 0..=255"),
        }),
    }
}

/// TSV テキストを辞書レコードにパース
pub fn parse_dictionary(text: &str) -> Result<Vec<DictionaryRecord>, LoadError> {
    let mut records = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut fields = raw.split('\t');
        let word = fields.next().unwrap_or_default().trim();
        if word.is_empty() {
            return Err(LoadError::Parse {
                line,
                reason: "missing word".to_string(),
            });
        }
        let definition = fields
            .next()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);
        let difficulty = parse_number(fields.next(), DEFAULT_DIFFICULTY, line, "difficulty")?;
        let frequency = parse_number(fields.next(), DEFAULT_FREQUENCY, line, "frequency")?;

        records.push(DictionaryRecord {
            word: word.to_string(),
            definition,
            difficulty,
            frequency,
        });
    }
    Ok(records)
}

/// 辞書を読み込み、頭音法則テーブルと合わせた Lexicon を返す
pub fn load_lexicon(path: Option<&Path>) -> Result<Lexicon, LoadError> {
    let text = match path {
        Some(path) => std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?,
        None => BUNDLED_DICTIONARY.to_string(),
    };
    let table = InitialSoundTable::standard();
    let dictionary = Dictionary::from_records(parse_dictionary(&text)?, &table)?;
    tracing::info!(
        source = path.map_or_else(|| "bundled".to_string(), |p| p.display().to_string()),
        words = dictionary.len(),
        "Lexicon ready"
    );
    Ok(Lexicon::new(dictionary, table))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dictionary_lines() {
        // テスト項目: コメント行と空行を無視し、省略された列は既定値になる
        // given (前提条件):
        let text = "# word\tdefinition\tdifficulty\tfrequency\n\n사과\t과일의 한 종류\t1\t60\n과일\t\t2\n";

        // when (操作):
        let records = parse_dictionary(text).unwrap();

        // then (期待する結果):
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].definition.as_deref(), Some("과일의 한 종류"));
        assert_eq!(records[0].frequency, 60);
        assert_eq!(records[1].definition, None);
        assert_eq!(records[1].difficulty, 2);
        assert_eq!(records[1].frequency, DEFAULT_FREQUENCY);
    }

    #[test]
    fn test_parse_dictionary_reports_line_number() {
        // テスト項目: 数値でない列は行番号付きのエラーになる
        // given (前提条件):
        let text = "사과\t\t1\t60\n과일\t\tabc\t20\n";

        // when (操作):
        let result = parse_dictionary(text);

        // then (期待する結果):
        assert!(matches!(result, Err(LoadError::Parse { line: 2, .. })));
    }

    #[test]
    fn test_bundled_dictionary_loads() {
        // テスト項目: 同梱の辞書が読み込め、例題の単語を含む
        // given (前提条件):
        // when (操作):
        let lexicon = load_lexicon(None).unwrap();

        // then (期待する結果):
        assert!(lexicon.dictionary.len() > 100);
        for word in ["사과", "과일", "일기", "이론", "논리"] {
            assert!(lexicon.dictionary.lookup(word).is_some(), "{word} missing");
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        // テスト項目: 存在しないファイルは Io エラーになる
        // given (前提条件):
        let path = Path::new("/nonexistent/kkutu/dictionary.tsv");

        // when (操作):
        let result = load_lexicon(Some(path));

        // then (期待する結果):
        assert!(matches!(result, Err(LoadError::Io { .. })));
    }
}
