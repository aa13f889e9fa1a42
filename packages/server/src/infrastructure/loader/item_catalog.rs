//! アイテムカタログローダー
//!
//! `ItemDefinition` の JSON 配列を読み込みます。
//! パスが指定されない場合はバイナリに同梱されたカタログを使います。

use std::path::Path;

use crate::domain::{ItemCatalog, ItemDefinition, LoadError};

/// 同梱のアイテムカタログ
pub const BUNDLED_ITEMS: &str = include_str!("../../../data/items.json");

pub fn parse_item_catalog(text: &str) -> Result<ItemCatalog, LoadError> {
    let definitions: Vec<ItemDefinition> = serde_json::from_str(text)?;
    ItemCatalog::from_definitions(definitions)
}

pub fn load_item_catalog(path: Option<&Path>) -> Result<ItemCatalog, LoadError> {
    let text = match path {
        Some(path) => std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?,
        None => BUNDLED_ITEMS.to_string(),
    };
    let catalog = parse_item_catalog(&text)?;
    tracing::info!(items = catalog.len(), "Item catalog loaded");
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ItemId, ItemKind, TargetPolicy};

    #[test]
    fn test_bundled_catalog_loads() {
        // テスト項目: 同梱のカタログに 6 種類すべての効果が含まれる
        // given (前提条件):
        // when (操作):
        let catalog = load_item_catalog(None).unwrap();

        // then (期待する結果):
        let extra = catalog.get(&ItemId::new("extra_time")).unwrap();
        assert_eq!(extra.kind, ItemKind::ExtraTime);
        assert_eq!(extra.magnitude, 15.0);
        assert_eq!(extra.cooldown_s, 45);
        assert_eq!(extra.target_policy, TargetPolicy::SelfOnly);
        for kind in [
            ItemKind::ExtraTime,
            ItemKind::ScoreMultiplier,
            ItemKind::SkipTurn,
            ItemKind::WordHint,
            ItemKind::Immunity,
            ItemKind::ScreenDistraction,
        ] {
            assert!(catalog.iter().any(|d| d.kind == kind), "{kind:?} missing");
        }
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        // テスト項目: 未知の効果種別を含むカタログは読み込みエラーになる
        // given (前提条件):
        let text = r#"[{"item_id":"x","name":"X","kind":"TELEPORT","magnitude":1.0,
            "cooldown_s":1,"cost":1,"rarity":"COMMON","target_policy":"SELF"}]"#;

        // when (操作):
        let result = parse_item_catalog(text);

        // then (期待する結果):
        assert!(matches!(result, Err(LoadError::Catalog(_))));
    }
}
