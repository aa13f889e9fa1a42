//! 韓国語辞書: 単語の検索・頭音法則・しりとりの規則

pub mod dictionary;
pub mod dueum;
pub mod hangul;
pub mod validator;

pub use dictionary::{Dictionary, DictionaryEntry, DictionaryRecord};
pub use dueum::InitialSoundTable;
pub use validator::{ChainRule, RejectReason, Verdict, validate};

/// Dictionary plus the equivalence table it was indexed with.
///
/// Built once at startup and shared read-only by every room.
#[derive(Debug)]
pub struct Lexicon {
    pub dictionary: Dictionary,
    pub table: InitialSoundTable,
}

impl Lexicon {
    pub fn new(dictionary: Dictionary, table: InitialSoundTable) -> Self {
        Self { dictionary, table }
    }
}
