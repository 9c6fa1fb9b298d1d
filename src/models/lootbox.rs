use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Where a box's item data comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    List,
    File,
    Variable,
    #[default]
    Manager,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::List => "list",
            SourceKind::File => "file",
            SourceKind::Variable => "variable",
            SourceKind::Manager => "manager",
        }
    }
}

/// How an item's artwork is referenced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageMode {
    #[default]
    Url,
    Local,
}

/// Visual configuration for the reveal presentation. The engine only merges
/// and defaults these; rendering them is the overlay's business.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BoxProps {
    pub background_gradient_start: String,
    pub background_gradient_end: String,
    pub hide_background: bool,
    pub glow_color: String,
    pub accent_color: String,
    pub text_color: String,
    pub subtitle_color: String,
    pub value_color: String,
    pub font_family: String,
    pub reveal_delay_ms: u64,
    pub reveal_hold_ms: u64,
    pub show_confetti: bool,
}

impl Default for BoxProps {
    fn default() -> Self {
        Self {
            background_gradient_start: "#090e36".to_string(),
            background_gradient_end: "#2a0c41".to_string(),
            hide_background: false,
            glow_color: "#ff9f5a".to_string(),
            accent_color: "#ff54d7".to_string(),
            text_color: "#ffffff".to_string(),
            subtitle_color: "#ffa94d".to_string(),
            value_color: "#ffe8a3".to_string(),
            font_family: "'Montserrat', sans-serif".to_string(),
            reveal_delay_ms: 2200,
            reveal_hold_ms: 5200,
            show_confetti: true,
        }
    }
}

/// Per-box overlay dispatch settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OverlaySettings {
    /// How long the overlay stays on screen, in seconds
    pub length_seconds: u32,

    /// Delay before the reveal animation starts, in milliseconds
    pub duration_ms: u64,

    /// Pinned overlay instance, unset = whatever is connected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlay_instance: Option<String>,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            length_seconds: 15,
            duration_ms: 2200,
            overlay_instance: None,
        }
    }
}

/// A single weighted prize inside a box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    /// Slug, unique within the owning box
    pub id: String,

    /// Display text shown on the reveal
    pub label: String,

    /// Payload a downstream trigger consumes, e.g. a command string
    pub value: String,

    #[serde(default)]
    pub subtitle: String,

    /// Relative draw probability mass. Non-positive keeps the item out of
    /// the draw pool without deleting it.
    pub weight: f64,

    /// Win cap, `None` = unlimited
    #[serde(default)]
    pub max_wins: Option<u32>,

    /// Never exceeds `max_wins` when capped
    #[serde(default)]
    pub wins: u32,

    #[serde(default)]
    pub last_won_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub image_mode: ImageMode,

    #[serde(default)]
    pub image_url: String,

    #[serde(default)]
    pub image_file: String,

    #[serde(default)]
    pub accent_color: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    /// Stock left before the cap. `None` when uncapped. Always derived,
    /// never persisted.
    pub fn remaining(&self) -> Option<u32> {
        self.max_wins.map(|m| m.saturating_sub(self.wins))
    }

    pub fn is_depleted(&self) -> bool {
        self.max_wins.is_some_and(|m| self.wins >= m)
    }

    /// Whether the draw may select this item.
    pub fn is_eligible(&self) -> bool {
        self.weight > 0.0 && !self.is_depleted()
    }
}

/// One loot box: a named container of weighted prize items.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LootBoxRecord {
    /// Canonical slug, unique key. Immutable once created.
    pub id: String,

    pub display_name: String,

    pub source: SourceKind,

    #[serde(default)]
    pub props: BoxProps,

    #[serde(default)]
    pub items: HashMap<String, InventoryItem>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_opened_at: Option<DateTime<Utc>>,

    /// Cleared when the pointed-at item is removed; never dangles
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_selected_item_id: Option<String>,

    /// Incremented only on a successful draw
    #[serde(default)]
    pub total_opens: u64,

    #[serde(default)]
    pub overlay_settings: OverlaySettings,
}

impl LootBoxRecord {
    pub fn eligible_items(&self) -> Vec<&InventoryItem> {
        self.items.values().filter(|i| i.is_eligible()).collect()
    }

    pub fn depleted_count(&self) -> usize {
        self.items.values().filter(|i| i.is_depleted()).count()
    }

    /// Items still below their cap, weight ignored. Drives the
    /// depleted-notification count and the reporting "available" figure.
    pub fn undepleted_count(&self) -> usize {
        self.items.len() - self.depleted_count()
    }
}

/// An item annotated with its derived stock, as returned by inventory reads.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryView {
    #[serde(flatten)]
    pub item: InventoryItem,
    pub remaining: Option<u32>,
}

impl From<&InventoryItem> for InventoryView {
    fn from(item: &InventoryItem) -> Self {
        Self {
            remaining: item.remaining(),
            item: item.clone(),
        }
    }
}

/// Presentation-layer projection of an item: display and stock data without
/// the engine's bookkeeping timestamps.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientItem {
    pub id: String,
    pub label: String,
    pub value: String,
    pub subtitle: String,
    pub weight: f64,
    pub max_wins: Option<u32>,
    pub wins: u32,
    pub remaining: Option<u32>,
    pub last_won_at: Option<DateTime<Utc>>,
    pub image_mode: ImageMode,
    pub image_url: String,
    pub image_file: String,
    pub accent_color: String,
}

impl From<&InventoryItem> for ClientItem {
    fn from(item: &InventoryItem) -> Self {
        Self {
            id: item.id.clone(),
            label: item.label.clone(),
            value: item.value.clone(),
            subtitle: item.subtitle.clone(),
            weight: item.weight,
            max_wins: item.max_wins,
            wins: item.wins,
            remaining: item.remaining(),
            last_won_at: item.last_won_at,
            image_mode: item.image_mode,
            image_url: item.image_url.clone(),
            image_file: item.image_file.clone(),
            accent_color: item.accent_color.clone(),
        }
    }
}

/// A completed draw, parked for the reveal consumer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LootBoxSelection {
    pub loot_box_id: String,
    pub item: InventoryItem,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(weight: f64, max_wins: Option<u32>, wins: u32) -> InventoryItem {
        let now = Utc::now();
        InventoryItem {
            id: "sword".to_string(),
            label: "Sword".to_string(),
            value: "!give sword".to_string(),
            subtitle: String::new(),
            weight,
            max_wins,
            wins,
            last_won_at: None,
            image_mode: ImageMode::Url,
            image_url: String::new(),
            image_file: String::new(),
            accent_color: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn remaining_is_a_projection() {
        assert_eq!(item(1.0, None, 4).remaining(), None);
        assert_eq!(item(1.0, Some(10), 3).remaining(), Some(7));
        assert_eq!(item(1.0, Some(3), 3).remaining(), Some(0));
    }

    #[test]
    fn eligibility_needs_weight_and_stock() {
        assert!(item(1.0, None, 99).is_eligible());
        assert!(item(0.5, Some(2), 1).is_eligible());
        assert!(!item(0.0, None, 0).is_eligible());
        assert!(!item(-3.0, None, 0).is_eligible());
        assert!(!item(1.0, Some(2), 2).is_eligible());
    }

    #[test]
    fn zero_cap_is_born_depleted() {
        let it = item(1.0, Some(0), 0);
        assert!(it.is_depleted());
        assert_eq!(it.remaining(), Some(0));
    }

    #[test]
    fn client_item_carries_derived_stock() {
        let view = ClientItem::from(&item(2.0, Some(5), 2));
        assert_eq!(view.remaining, Some(3));
        assert_eq!(view.wins, 2);
    }
}
