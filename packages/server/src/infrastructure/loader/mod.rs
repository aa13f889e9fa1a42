//! 起動時に読み込む静的データのローダー

pub mod dictionary;
pub mod item_catalog;

pub use dictionary::load_lexicon;
pub use item_catalog::load_item_catalog;
