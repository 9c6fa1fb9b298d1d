use crate::models::lootbox::{InventoryItem, LootBoxRecord};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

/// Domain events published after an inventory mutation has been persisted.
/// Delivery is fire-and-forget: a failed or unheard emission never rolls
/// back or fails the mutation it describes.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum LootBoxEvent {
    #[serde(rename = "lootBoxOpened")]
    Opened(OpenedPayload),
    #[serde(rename = "lootBoxItemWon")]
    ItemWon(ItemWonPayload),
    #[serde(rename = "lootBoxEmpty")]
    Empty(EmptyPayload),
    #[serde(rename = "lootBoxItemDepleted")]
    ItemDepleted(ItemDepletedPayload),
}

impl LootBoxEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            LootBoxEvent::Opened(_) => "lootBoxOpened",
            LootBoxEvent::ItemWon(_) => "lootBoxItemWon",
            LootBoxEvent::Empty(_) => "lootBoxEmpty",
            LootBoxEvent::ItemDepleted(_) => "lootBoxItemDepleted",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenedPayload {
    pub loot_box_id: String,
    pub loot_box_name: String,
    pub item_id: String,
    pub item_label: String,
    pub item_value: String,
    pub item_subtitle: String,
    pub wins: u32,
    pub remaining: Option<u32>,
    pub max_wins: Option<u32>,
    pub weight: f64,
    pub total_opens: u64,
    pub timestamp: DateTime<Utc>,
}

impl OpenedPayload {
    pub fn new(record: &LootBoxRecord, item: &InventoryItem) -> Self {
        Self {
            loot_box_id: record.id.clone(),
            loot_box_name: record.display_name.clone(),
            item_id: item.id.clone(),
            item_label: item.label.clone(),
            item_value: item.value.clone(),
            item_subtitle: item.subtitle.clone(),
            wins: item.wins,
            remaining: item.remaining(),
            max_wins: item.max_wins,
            weight: item.weight,
            total_opens: record.total_opens,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemWonPayload {
    pub loot_box_id: String,
    pub loot_box_name: String,
    pub item_id: String,
    pub item_label: String,
    pub item_value: String,
    pub item_subtitle: String,
    pub wins: u32,
    pub remaining: Option<u32>,
    pub max_wins: Option<u32>,
    pub weight: f64,
    pub is_first_win: bool,
    pub total_opens: u64,
    pub timestamp: DateTime<Utc>,
}

impl ItemWonPayload {
    pub fn new(record: &LootBoxRecord, item: &InventoryItem, is_first_win: bool) -> Self {
        Self {
            loot_box_id: record.id.clone(),
            loot_box_name: record.display_name.clone(),
            item_id: item.id.clone(),
            item_label: item.label.clone(),
            item_value: item.value.clone(),
            item_subtitle: item.subtitle.clone(),
            wins: item.wins,
            remaining: item.remaining(),
            max_wins: item.max_wins,
            weight: item.weight,
            is_first_win,
            total_opens: record.total_opens,
            timestamp: Utc::now(),
        }
    }
}

/// Fired instead of a selection when every item is zero-weight, depleted,
/// or the box simply has no items.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmptyPayload {
    pub loot_box_id: String,
    pub loot_box_name: String,
    pub total_items: usize,
    pub depleted_items: usize,
    pub total_opens: u64,
    pub timestamp: DateTime<Utc>,
}

impl EmptyPayload {
    pub fn new(record: &LootBoxRecord) -> Self {
        Self {
            loot_box_id: record.id.clone(),
            loot_box_name: record.display_name.clone(),
            total_items: record.items.len(),
            depleted_items: record.depleted_count(),
            total_opens: record.total_opens,
            timestamp: Utc::now(),
        }
    }
}

/// Fired when a draw pushes an item to its cap. `remaining_items` counts
/// the items still below their caps after this draw.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDepletedPayload {
    pub loot_box_id: String,
    pub loot_box_name: String,
    pub item_id: String,
    pub item_label: String,
    pub item_value: String,
    pub max_wins: Option<u32>,
    pub total_opens: u64,
    pub remaining_items: usize,
    pub timestamp: DateTime<Utc>,
}

impl ItemDepletedPayload {
    pub fn new(record: &LootBoxRecord, item: &InventoryItem) -> Self {
        Self {
            loot_box_id: record.id.clone(),
            loot_box_name: record.display_name.clone(),
            item_id: item.id.clone(),
            item_label: item.label.clone(),
            item_value: item.value.clone(),
            max_wins: item.max_wins,
            total_opens: record.total_opens,
            remaining_items: record.undepleted_count(),
            timestamp: Utc::now(),
        }
    }
}

/// Outbound seam for notifications. The engine emits synchronously and
/// never waits on consumers.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: LootBoxEvent);
}

/// Fans events out on a tokio broadcast channel. Having no subscriber is
/// normal (an overlay may simply not be connected); the event is dropped
/// and noted at debug level.
pub struct BroadcastEmitter {
    tx: broadcast::Sender<LootBoxEvent>,
}

impl BroadcastEmitter {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LootBoxEvent> {
        self.tx.subscribe()
    }
}

impl EventSink for BroadcastEmitter {
    fn emit(&self, event: LootBoxEvent) {
        let kind = event.kind();
        if let Err(e) = self.tx.send(event) {
            tracing::debug!(event = kind, error = %e, "no listeners for loot box event");
        }
    }
}
