//! Read-only text projections over the engine's views, for the host's
//! variable/template layer. Which columns appear is an explicit struct
//! rather than a free-text option list, so every caller states exactly
//! what it wants.

use crate::models::lootbox::{InventoryView, LootBoxRecord, LootBoxSelection};

/// "unlimited" for uncapped stock, the bare number otherwise.
pub fn format_remaining(remaining: Option<u32>) -> String {
    match remaining {
        None => "unlimited".to_string(),
        Some(n) => n.to_string(),
    }
}

/// Items the draw could still select if their weight allows: uncapped or
/// below cap.
pub fn available_count(inventory: &[InventoryView]) -> usize {
    inventory
        .iter()
        .filter(|v| v.remaining.is_none_or(|r| r > 0))
        .count()
}

#[derive(Debug, Clone, Copy)]
pub struct BoxListFields {
    pub ids: bool,
    pub names: bool,
    pub opens: bool,
}

impl Default for BoxListFields {
    fn default() -> Self {
        Self {
            ids: true,
            names: false,
            opens: false,
        }
    }
}

/// One line for all boxes: fields joined ` - ` per box, boxes joined `, `.
pub fn format_box_list(boxes: &[LootBoxRecord], fields: &BoxListFields) -> String {
    boxes
        .iter()
        .map(|b| {
            let mut parts = Vec::new();
            if fields.ids {
                parts.push(b.id.clone());
            }
            if fields.names {
                parts.push(b.display_name.clone());
            }
            if fields.opens {
                let opens = format!("{} opens", b.total_opens);
                parts.push(if fields.ids || fields.names {
                    opens
                } else {
                    b.total_opens.to_string()
                });
            }
            parts.join(" - ")
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InfoFields {
    pub display_name: bool,
    pub id: bool,
    pub total_opens: bool,
    pub item_count: bool,
    pub available_count: bool,
    pub last_opened: bool,
    pub pending: bool,
    pub exists: bool,
}

/// Summary line for one box, fields joined ` | `. A missing record renders
/// only the existence marker (when asked for), never a phantom summary.
pub fn format_box_info(
    record: Option<&LootBoxRecord>,
    has_pending: bool,
    fields: &InfoFields,
) -> String {
    let Some(record) = record else {
        return if fields.exists { "missing".to_string() } else { String::new() };
    };

    let mut parts = Vec::new();
    if fields.display_name {
        parts.push(record.display_name.clone());
    }
    if fields.id {
        parts.push(format!("ID: {}", record.id));
    }
    if fields.total_opens {
        parts.push(format!("{} opens", record.total_opens));
    }
    if fields.item_count {
        parts.push(format!("{} items", record.items.len()));
    }
    if fields.available_count {
        parts.push(format!("{} available", record.undepleted_count()));
    }
    if fields.last_opened {
        if let Some(at) = record.last_opened_at {
            parts.push(format!("last opened {}", at.to_rfc3339()));
        }
    }
    if fields.pending {
        parts.push(
            if has_pending {
                "pending selection"
            } else {
                "no pending selection"
            }
            .to_string(),
        );
    }
    if fields.exists {
        parts.push("exists".to_string());
    }
    parts.join(" | ")
}

#[derive(Debug, Clone, Copy)]
pub struct InventoryFields {
    pub ids: bool,
    pub names: bool,
    pub values: bool,
    pub weights: bool,
    pub wins: bool,
    pub remaining: bool,
    /// Hide items that are at their cap
    pub only_available: bool,
}

impl Default for InventoryFields {
    fn default() -> Self {
        Self {
            ids: true,
            names: false,
            values: false,
            weights: false,
            wins: false,
            remaining: false,
            only_available: false,
        }
    }
}

/// Inventory listing: fields joined ` - ` per item, items joined ` | `.
pub fn format_inventory(inventory: &[InventoryView], fields: &InventoryFields) -> String {
    inventory
        .iter()
        .filter(|v| !fields.only_available || v.remaining.is_none_or(|r| r > 0))
        .map(|v| {
            let mut parts = Vec::new();
            if fields.ids {
                parts.push(v.item.id.clone());
            }
            if fields.names {
                parts.push(v.item.label.clone());
            }
            if fields.values {
                parts.push(v.item.value.clone());
            }
            if fields.weights {
                parts.push(format!("weight: {}", v.item.weight));
            }
            if fields.wins {
                parts.push(format!("wins: {}", v.item.wins));
            }
            if fields.remaining {
                parts.push(format!("remaining: {}", format_remaining(v.remaining)));
            }
            parts.join(" - ")
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

/// The most recent draw, as shown to the operator.
pub fn format_last_selection(selection: &LootBoxSelection) -> String {
    format!(
        "{} - remaining: {}",
        selection.item.label,
        format_remaining(selection.item.remaining())
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::lootbox::{ImageMode, InventoryItem, SourceKind};
    use chrono::Utc;
    use std::collections::HashMap;

    fn view(id: &str, weight: f64, max_wins: Option<u32>, wins: u32) -> InventoryView {
        let now = Utc::now();
        let item = InventoryItem {
            id: id.to_string(),
            label: id.to_uppercase(),
            value: format!("!{id}"),
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
        };
        InventoryView::from(&item)
    }

    fn record(id: &str, opens: u64) -> LootBoxRecord {
        let now = Utc::now();
        LootBoxRecord {
            id: id.to_string(),
            display_name: format!("The {id}"),
            source: SourceKind::List,
            props: Default::default(),
            items: HashMap::new(),
            created_at: now,
            updated_at: now,
            last_opened_at: None,
            last_selected_item_id: None,
            total_opens: opens,
            overlay_settings: Default::default(),
        }
    }

    #[test]
    fn remaining_renders_unlimited() {
        assert_eq!(format_remaining(None), "unlimited");
        assert_eq!(format_remaining(Some(0)), "0");
        assert_eq!(format_remaining(Some(12)), "12");
    }

    #[test]
    fn box_list_joins_fields_and_boxes() {
        let boxes = vec![record("alpha", 3), record("beta", 0)];
        let line = format_box_list(
            &boxes,
            &BoxListFields {
                ids: true,
                names: true,
                opens: true,
            },
        );
        assert_eq!(line, "alpha - The alpha - 3 opens, beta - The beta - 0 opens");

        let opens_only = format_box_list(
            &boxes,
            &BoxListFields {
                ids: false,
                names: false,
                opens: true,
            },
        );
        assert_eq!(opens_only, "3, 0");
    }

    #[test]
    fn inventory_listing_honors_only_available() {
        let inventory = vec![view("gem", 2.0, Some(1), 1), view("coin", 1.0, None, 5)];
        let fields = InventoryFields {
            names: true,
            wins: true,
            remaining: true,
            only_available: true,
            ..Default::default()
        };
        let line = format_inventory(&inventory, &fields);
        assert_eq!(line, "coin - COIN - wins: 5 - remaining: unlimited");
    }

    #[test]
    fn missing_record_only_reports_absence() {
        let fields = InfoFields {
            exists: true,
            ..Default::default()
        };
        assert_eq!(format_box_info(None, false, &fields), "missing");
        assert_eq!(format_box_info(None, false, &InfoFields::default()), "");
    }

    #[test]
    fn info_line_collects_requested_fields() {
        let record = record("alpha", 7);
        let fields = InfoFields {
            display_name: true,
            id: true,
            total_opens: true,
            pending: true,
            ..Default::default()
        };
        assert_eq!(
            format_box_info(Some(&record), true, &fields),
            "The alpha | ID: alpha | 7 opens | pending selection"
        );
    }

    #[test]
    fn available_count_ignores_weight() {
        let inventory = vec![
            view("a", 0.0, None, 0),
            view("b", 1.0, Some(2), 2),
            view("c", 1.0, Some(2), 1),
        ];
        assert_eq!(available_count(&inventory), 2);
    }
}
