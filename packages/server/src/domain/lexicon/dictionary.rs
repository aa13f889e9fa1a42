//! メモリ上の韓国語辞書

use std::collections::{HashMap, HashSet};

use rand::{Rng, seq::SliceRandom};
use serde::Serialize;

use crate::domain::error::LoadError;

use super::{dueum::InitialSoundTable, hangul};

pub const MIN_WORD_CHARS: usize = 2;
pub const MAX_WORD_CHARS: usize = 20;

/// Seed words are short so the first player has room to answer.
const SEED_MAX_CHARS: usize = 3;

/// Raw tuple yielded by a dictionary source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryRecord {
    pub word: String,
    pub definition: Option<String>,
    pub difficulty: u8,
    pub frequency: u8,
}

/// A dictionary word with its derived fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DictionaryEntry {
    pub word: String,
    pub first_char: char,
    pub last_char: char,
    pub length: usize,
    /// 0..=100
    pub frequency: u8,
    /// 1..=3
    pub difficulty: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
}

impl DictionaryEntry {
    /// Derive an entry from a raw record, or `None` if the word is unusable.
    pub fn from_record(record: DictionaryRecord) -> Option<Self> {
        let word = record.word.trim().to_string();
        let length = word.chars().count();
        if !(MIN_WORD_CHARS..=MAX_WORD_CHARS).contains(&length)
            || !word.chars().all(hangul::is_syllable)
        {
            return None;
        }
        let first_char = word.chars().next()?;
        let last_char = word.chars().last()?;
        Some(Self {
            word,
            first_char,
            last_char,
            length,
            frequency: record.frequency.min(100),
            difficulty: record.difficulty.clamp(1, 3),
            definition: record.definition.filter(|d| !d.trim().is_empty()),
        })
    }
}

/// Read-only word lookup shared by every room
#[derive(Debug, Default)]
pub struct Dictionary {
    entries: HashMap<String, DictionaryEntry>,
    /// first char → words, most frequent first
    by_first_char: HashMap<char, Vec<String>>,
    seed_words: Vec<String>,
}

impl Dictionary {
    /// Build the dictionary. Unusable records are skipped; duplicates keep the first.
    pub fn from_records(
        records: impl IntoIterator<Item = DictionaryRecord>,
        table: &InitialSoundTable,
    ) -> Result<Self, LoadError> {
        let mut entries: HashMap<String, DictionaryEntry> = HashMap::new();
        let mut skipped = 0usize;
        for record in records {
            match DictionaryEntry::from_record(record) {
                Some(entry) => {
                    entries.entry(entry.word.clone()).or_insert(entry);
                }
                None => skipped += 1,
            }
        }
        if entries.is_empty() {
            return Err(LoadError::Empty("dictionary"));
        }
        if skipped > 0 {
            tracing::warn!(skipped, "Skipped unusable dictionary records");
        }

        let mut by_first_char: HashMap<char, Vec<String>> = HashMap::new();
        for entry in entries.values() {
            by_first_char
                .entry(entry.first_char)
                .or_default()
                .push(entry.word.clone());
        }
        for words in by_first_char.values_mut() {
            words.sort_by(|a, b| {
                let (ea, eb) = (&entries[a], &entries[b]);
                eb.frequency.cmp(&ea.frequency).then_with(|| a.cmp(b))
            });
        }

        let mut dictionary = Self {
            entries,
            by_first_char,
            seed_words: Vec::new(),
        };
        let mut seed_words: Vec<String> = dictionary
            .entries
            .values()
            .filter(|e| e.length <= SEED_MAX_CHARS && dictionary.chainable(e.last_char, table))
            .map(|e| e.word.clone())
            .collect();
        seed_words.sort();
        dictionary.seed_words = seed_words;

        tracing::info!(
            words = dictionary.entries.len(),
            seed_words = dictionary.seed_words.len(),
            "Dictionary loaded"
        );
        Ok(dictionary)
    }

    pub fn lookup(&self, word: &str) -> Option<&DictionaryEntry> {
        self.entries.get(word)
    }

    pub fn first_char_exists(&self, c: char) -> bool {
        self.by_first_char.contains_key(&c)
    }

    /// Whether some word starts with a character equivalent to `c`.
    pub fn chainable(&self, c: char, table: &InitialSoundTable) -> bool {
        table
            .equivalents(c)
            .iter()
            .any(|eq| self.first_char_exists(*eq))
    }

    /// Up to `limit` unused words that may follow `last_char`, most frequent first.
    pub fn candidates(
        &self,
        last_char: char,
        table: &InitialSoundTable,
        used: &HashSet<String>,
        limit: usize,
    ) -> Vec<&DictionaryEntry> {
        let mut found: Vec<&DictionaryEntry> = table
            .equivalents(last_char)
            .iter()
            .filter_map(|c| self.by_first_char.get(c))
            .flatten()
            .filter(|w| !used.contains(*w))
            .filter_map(|w| self.entries.get(w))
            .collect();
        found.sort_by(|a, b| {
            b.frequency
                .cmp(&a.frequency)
                .then_with(|| a.word.cmp(&b.word))
        });
        found.truncate(limit);
        found
    }

    /// Pick a random word that can start a game.
    pub fn random_seed<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&DictionaryEntry> {
        self.seed_words
            .choose(rng)
            .and_then(|w| self.entries.get(w))
    }

    /// Frequent words for a hint when no chain has started yet.
    pub fn seed_sample(&self, limit: usize) -> Vec<&DictionaryEntry> {
        let mut found: Vec<&DictionaryEntry> = self
            .seed_words
            .iter()
            .filter_map(|w| self.entries.get(w))
            .collect();
        found.sort_by(|a, b| b.frequency.cmp(&a.frequency).then_with(|| a.word.cmp(&b.word)));
        found.truncate(limit);
        found
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
