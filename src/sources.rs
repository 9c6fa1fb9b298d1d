use crate::models::draft::ItemDraft;
use serde::Deserialize;
use std::path::PathBuf;

/// Where a sync batch comes from: an inline list authored in the effect, a
/// JSON file on disk, or a JSON string held in a host variable.
#[derive(Debug, Clone)]
pub enum ItemSource {
    Inline(Vec<ItemDraft>),
    File(PathBuf),
    Variable(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Batch {
    Bare(Vec<ItemDraft>),
    Wrapped { items: Vec<ItemDraft> },
}

impl ItemSource {
    /// Loads and parses the source into drafts ready for sync. Unreadable
    /// or malformed input is logged and degrades to an empty batch, so a
    /// broken file never fails the triggering action; sync is additive and
    /// an empty batch simply changes nothing.
    pub async fn resolve(&self) -> Vec<ItemDraft> {
        let drafts = match self {
            ItemSource::Inline(items) => items.clone(),
            ItemSource::File(path) => match tokio::fs::read_to_string(path).await {
                Ok(raw) => parse_batch(&raw),
                Err(e) => {
                    tracing::error!(path = %path.display(), error = %e, "unable to read loot item file");
                    Vec::new()
                }
            },
            ItemSource::Variable(payload) => parse_batch(payload),
        };

        // an entry with no label, value, or image cannot render on the
        // reveal; drop it before it reaches the record
        drafts.into_iter().filter(ItemDraft::has_identity).collect()
    }
}

/// Accepts either a bare array or a `{"items": [...]}` wrapper, since both
/// shapes circulate in hand-kept source files.
fn parse_batch(raw: &str) -> Vec<ItemDraft> {
    match serde_json::from_str::<Batch>(raw) {
        Ok(Batch::Bare(items)) => items,
        Ok(Batch::Wrapped { items }) => items,
        Err(e) => {
            tracing::error!(error = %e, "unable to parse loot item payload");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bare_arrays_and_wrappers_both_parse() {
        let bare = ItemSource::Variable(r#"[{"label":"Gold","weight":2}]"#.to_string());
        let items = bare.resolve().await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].label.as_deref(), Some("Gold"));

        let wrapped =
            ItemSource::Variable(r#"{"items":[{"label":"Gold"},{"label":"Silver"}]}"#.to_string());
        assert_eq!(wrapped.resolve().await.len(), 2);
    }

    #[tokio::test]
    async fn identityless_entries_are_dropped() {
        let source =
            ItemSource::Variable(r#"[{"weight":4},{"label":"Keeper"},{"subtitle":"x"}]"#.to_string());
        let items = source.resolve().await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].label.as_deref(), Some("Keeper"));
    }

    #[tokio::test]
    async fn garbage_payload_degrades_to_empty() {
        let source = ItemSource::Variable("not json at all".to_string());
        assert!(source.resolve().await.is_empty());
    }

    #[tokio::test]
    async fn missing_file_degrades_to_empty() {
        let source = ItemSource::File(PathBuf::from("/nonexistent/loot.json"));
        assert!(source.resolve().await.is_empty());
    }

    #[tokio::test]
    async fn quoted_numbers_survive_the_trip() {
        let source =
            ItemSource::Variable(r#"[{"label":"Gem","weight":"3","maxWins":"2"}]"#.to_string());
        let items = source.resolve().await;
        assert_eq!(items[0].weight, Some(3.0));
        assert_eq!(items[0].max_wins, Some(2.0));
    }
}
