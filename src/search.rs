//! Fuzzy lookup behind the reporting layer. Pure ranking over read views,
//! no engine dependency: callers feed it records or inventory views and get
//! back the same references, best match first.

use crate::models::lootbox::{InventoryView, LootBoxRecord};

const EXACT: f64 = 100.0;
const PREFIX: f64 = 60.0;
const SUBSTRING: f64 = 30.0;

/// When the best score beats the runner-up by this factor the result list
/// collapses to the single winner.
const CLEAR_WINNER: f64 = 1.5;

#[derive(Debug, Clone, Copy)]
pub struct SearchFields {
    pub ids: bool,
    pub names: bool,
}

impl Default for SearchFields {
    fn default() -> Self {
        Self {
            ids: true,
            names: true,
        }
    }
}

/// Boxes matching `query`, best first. An exact hit on id or display name
/// short-circuits to that box alone.
pub fn rank_boxes<'a>(
    boxes: &'a [LootBoxRecord],
    query: &str,
    fields: SearchFields,
) -> Vec<&'a LootBoxRecord> {
    rank(boxes, query, |b| {
        let mut targets = Vec::new();
        if fields.ids {
            targets.push(b.id.as_str());
        }
        if fields.names {
            targets.push(b.display_name.as_str());
        }
        targets
    })
}

/// Items matching `query` across id, label, and value, best first.
pub fn rank_items<'a>(inventory: &'a [InventoryView], query: &str) -> Vec<&'a InventoryView> {
    rank(inventory, query, |v| {
        vec![v.item.id.as_str(), v.item.label.as_str(), v.item.value.as_str()]
    })
}

fn rank<'a, T, F>(candidates: &'a [T], query: &str, targets: F) -> Vec<&'a T>
where
    F: Fn(&'a T) -> Vec<&'a str>,
{
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return candidates.iter().collect();
    }
    let tokens: Vec<&str> = query.split_whitespace().collect();

    // an exact full-query hit on any field wins outright
    for candidate in candidates {
        if targets(candidate).iter().any(|t| t.to_lowercase() == query) {
            return vec![candidate];
        }
    }

    let mut scored: Vec<(f64, usize, &'a T)> = candidates
        .iter()
        .filter_map(|candidate| {
            let fields = targets(candidate);
            let score: f64 = fields.iter().map(|t| score_target(t, &tokens)).sum();
            if score <= 0.0 {
                return None;
            }
            let shortest = fields.iter().map(|t| t.len()).min().unwrap_or(usize::MAX);
            Some((score, shortest, candidate))
        })
        .collect();

    // highest score first; a shorter target is the more specific match on
    // a tie
    scored.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.1.cmp(&b.1))
    });

    if scored.len() >= 2 && scored[0].0 > scored[1].0 * CLEAR_WINNER {
        return vec![scored[0].2];
    }

    scored.into_iter().map(|(_, _, c)| c).collect()
}

/// Per-token tiered score against one lowered target: exact beats prefix
/// beats substring. Tokens that miss contribute nothing.
fn score_target(target: &str, tokens: &[&str]) -> f64 {
    let target = target.to_lowercase();
    let words: Vec<&str> = target.split_whitespace().collect();

    tokens
        .iter()
        .map(|token| {
            if target == *token || words.iter().any(|w| w == token) {
                EXACT
            } else if target.starts_with(token) || words.iter().any(|w| w.starts_with(token)) {
                PREFIX
            } else if target.contains(token) {
                SUBSTRING
            } else {
                0.0
            }
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::lootbox::SourceKind;
    use chrono::Utc;
    use std::collections::HashMap;

    fn boxed(id: &str, name: &str) -> LootBoxRecord {
        let now = Utc::now();
        LootBoxRecord {
            id: id.to_string(),
            display_name: name.to_string(),
            source: SourceKind::Manager,
            props: Default::default(),
            items: HashMap::new(),
            created_at: now,
            updated_at: now,
            last_opened_at: None,
            last_selected_item_id: None,
            total_opens: 0,
            overlay_settings: Default::default(),
        }
    }

    #[test]
    fn exact_match_short_circuits() {
        let boxes = vec![
            boxed("grand-prize", "Grand Prize"),
            boxed("grand-prize-2", "Grand Prize Two"),
        ];
        let hits = rank_boxes(&boxes, "grand-prize", SearchFields::default());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "grand-prize");

        let by_name = rank_boxes(&boxes, "Grand Prize Two", SearchFields::default());
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].id, "grand-prize-2");
    }

    #[test]
    fn clear_winner_collapses_the_list() {
        let boxes = vec![boxed("daily", "Daily Drop"), boxed("weekly", "Weekly xdailyx")];
        // "daily" is exact on box one, only a substring on box two
        let hits = rank_boxes(&boxes, "daily", SearchFields::default());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "daily");
    }

    #[test]
    fn close_scores_keep_every_match_ordered() {
        let boxes = vec![
            boxed("mystery-a", "Mystery Alpha"),
            boxed("mystery-b", "Mystery Beta"),
        ];
        let hits = rank_boxes(&boxes, "mystery", SearchFields::default());
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn misses_are_filtered_and_empty_query_passes_through() {
        let boxes = vec![boxed("alpha", "Alpha"), boxed("beta", "Beta")];
        assert!(rank_boxes(&boxes, "gamma", SearchFields::default()).is_empty());
        assert_eq!(rank_boxes(&boxes, "  ", SearchFields::default()).len(), 2);
    }

    #[test]
    fn id_only_search_ignores_names() {
        let boxes = vec![boxed("alpha", "Shiny"), boxed("beta", "Alpha Things")];
        let hits = rank_boxes(
            &boxes,
            "alpha",
            SearchFields {
                ids: true,
                names: false,
            },
        );
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "alpha");
    }
}
