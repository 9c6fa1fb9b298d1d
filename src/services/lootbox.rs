use crate::error::{AppResult, DomainError};
use crate::events::{
    EmptyPayload, EventSink, ItemDepletedPayload, ItemWonPayload, LootBoxEvent, OpenedPayload,
};
use crate::ident::sanitize;
use crate::models::draft::{BoxDetailsUpdate, ItemDraft, ItemUpdate, SyncRequest, TimingUpdate};
use crate::models::lootbox::{
    InventoryItem, InventoryView, LootBoxRecord, LootBoxSelection, OverlaySettings, SourceKind,
};
use crate::state::pending::PendingSelections;
use crate::store::LootBoxStore;
use chrono::Utc;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// The inventory engine: sole writer of loot box records.
///
/// Every mutation is an unsynchronized read-modify-write against the store
/// (read latest record, compute, write the full record back). Two callers
/// racing on the same box id resolve last-writer-wins; the workload is a
/// single operator pressing buttons, so per-box serialization is left to a
/// stricter [`LootBoxStore`] implementation if one is ever needed.
pub struct LootBoxService {
    store: Arc<dyn LootBoxStore>,
    events: Arc<dyn EventSink>,
    pending: PendingSelections,
}

impl LootBoxService {
    pub fn new(
        store: Arc<dyn LootBoxStore>,
        events: Arc<dyn EventSink>,
        pending_ttl: Duration,
    ) -> Self {
        Self {
            store,
            events,
            pending: PendingSelections::with_ttl(pending_ttl),
        }
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub async fn list_loot_boxes(&self) -> AppResult<Vec<LootBoxRecord>> {
        self.store.ensure_root().await?;
        Ok(self.store.list().await?)
    }

    /// Looks a box up by any raw spelling of its id. An id that sanitizes
    /// down to nothing is simply not a box.
    pub async fn get_loot_box(&self, raw_id: &str) -> AppResult<Option<LootBoxRecord>> {
        let id = sanitize(raw_id);
        if id.is_empty() {
            return Ok(None);
        }
        Ok(self.store.get(&id).await?)
    }

    /// Every item of the box, annotated with its derived remaining stock.
    pub async fn get_inventory(&self, box_id: &str) -> AppResult<Option<Vec<InventoryView>>> {
        let Some(record) = self.get_loot_box(box_id).await? else {
            return Ok(None);
        };
        Ok(Some(record.items.values().map(InventoryView::from).collect()))
    }

    // ------------------------------------------------------------------
    // Sync
    // ------------------------------------------------------------------

    /// Upserts a box from a source batch. Incoming items merge field by
    /// field onto whatever the record already knows (wins and win history
    /// survive); items missing from the batch are left untouched, so a
    /// shrunken source file never deletes inventory by omission.
    pub async fn sync_loot_box(&self, req: SyncRequest) -> AppResult<LootBoxRecord> {
        let box_id = sanitize(&req.id);
        if box_id.is_empty() {
            return Err(DomainError::InvalidIdentifier(req.id));
        }

        self.store.ensure_root().await?;
        let now = Utc::now();
        let existing = self.store.get(&box_id).await?;
        let mut items = existing
            .as_ref()
            .map(|r| r.items.clone())
            .unwrap_or_default();

        for draft in &req.items {
            let item_id = assign_item_id(&items, draft);
            let current = items.get(&item_id).cloned();

            let max_wins = normalize_max_wins(draft.max_wins);
            let wins = current.as_ref().map(|c| c.wins).unwrap_or(0);
            let wins = match max_wins {
                None => wins,
                Some(cap) => wins.min(cap),
            };

            let merged = InventoryItem {
                id: item_id.clone(),
                label: pick_text(&draft.label, current.as_ref().map(|c| c.label.clone())),
                value: pick_text(&draft.value, current.as_ref().map(|c| c.value.clone())),
                subtitle: pick_text(&draft.subtitle, current.as_ref().map(|c| c.subtitle.clone())),
                weight: normalize_weight(draft.weight, current.as_ref().map(|c| c.weight)),
                max_wins,
                wins,
                last_won_at: current.as_ref().and_then(|c| c.last_won_at),
                image_mode: draft
                    .image_mode
                    .or(current.as_ref().map(|c| c.image_mode))
                    .unwrap_or_default(),
                image_url: pick_text(&draft.image_url, current.as_ref().map(|c| c.image_url.clone())),
                image_file: pick_text(
                    &draft.image_file,
                    current.as_ref().map(|c| c.image_file.clone()),
                ),
                accent_color: pick_text(
                    &draft.accent_color,
                    current.as_ref().map(|c| c.accent_color.clone()),
                ),
                created_at: current.as_ref().map(|c| c.created_at).unwrap_or(now),
                updated_at: now,
            };

            items.insert(item_id, merged);
        }

        let display_name = req
            .display_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .or_else(|| existing.as_ref().map(|r| r.display_name.clone()))
            .unwrap_or_else(|| box_id.clone());

        let record = LootBoxRecord {
            id: box_id,
            display_name,
            source: req.source,
            props: req.props,
            items,
            created_at: existing.as_ref().map(|r| r.created_at).unwrap_or(now),
            updated_at: now,
            last_opened_at: existing.as_ref().and_then(|r| r.last_opened_at),
            last_selected_item_id: existing
                .as_ref()
                .and_then(|r| r.last_selected_item_id.clone()),
            total_opens: existing.as_ref().map(|r| r.total_opens).unwrap_or(0),
            overlay_settings: req
                .overlay_settings
                .or_else(|| existing.map(|r| r.overlay_settings))
                .unwrap_or_default(),
        };

        self.store.put(&record).await?;
        tracing::debug!(box_id = %record.id, items = record.items.len(), source = record.source.as_str(), "loot box synced");
        Ok(record)
    }

    // ------------------------------------------------------------------
    // Item CRUD
    // ------------------------------------------------------------------

    /// Adds one item, creating the box on the fly if it does not exist yet.
    pub async fn add_item(&self, box_id: &str, draft: ItemDraft) -> AppResult<InventoryItem> {
        let id = sanitize(box_id);
        if id.is_empty() {
            return Err(DomainError::InvalidIdentifier(box_id.to_string()));
        }

        self.store.ensure_root().await?;
        let now = Utc::now();
        let mut record = match self.store.get(&id).await? {
            Some(record) => record,
            None => LootBoxRecord {
                id: id.clone(),
                display_name: id.clone(),
                source: SourceKind::Manager,
                props: Default::default(),
                items: HashMap::new(),
                created_at: now,
                updated_at: now,
                last_opened_at: None,
                last_selected_item_id: None,
                total_opens: 0,
                overlay_settings: OverlaySettings::default(),
            },
        };

        let item_id = assign_item_id(&record.items, &draft);
        let label = draft
            .label
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Item {}", record.items.len() + 1));

        let item = InventoryItem {
            id: item_id.clone(),
            label,
            value: draft.value.unwrap_or_default(),
            subtitle: draft.subtitle.unwrap_or_default(),
            weight: normalize_weight(draft.weight, None),
            max_wins: normalize_max_wins(draft.max_wins),
            wins: 0,
            last_won_at: None,
            image_mode: draft.image_mode.unwrap_or_default(),
            image_url: draft.image_url.unwrap_or_default(),
            image_file: draft.image_file.unwrap_or_default(),
            accent_color: draft.accent_color.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };

        record.items.insert(item_id, item.clone());
        record.updated_at = now;
        self.store.put(&record).await?;
        Ok(item)
    }

    /// Applies only the provided fields; wins are re-clamped against the
    /// possibly new cap. Absent box or item reads back as `None`.
    pub async fn update_item(
        &self,
        box_id: &str,
        item_id: &str,
        update: ItemUpdate,
    ) -> AppResult<Option<InventoryItem>> {
        let Some(mut record) = self.get_loot_box(box_id).await? else {
            return Ok(None);
        };

        let item_id = sanitize(item_id);
        let Some(item) = record.items.get_mut(&item_id) else {
            return Ok(None);
        };

        let now = Utc::now();
        if let Some(label) = &update.label {
            item.label = label.trim().to_string();
        }
        if let Some(value) = &update.value {
            item.value = value.clone();
        }
        if let Some(subtitle) = &update.subtitle {
            item.subtitle = subtitle.clone();
        }
        if let Some(weight) = update.weight {
            item.weight = normalize_weight(Some(weight), Some(item.weight));
        }
        if let Some(max_wins) = update.max_wins {
            item.max_wins = max_wins;
        }

        let requested_wins = update.wins.unwrap_or(item.wins);
        item.wins = match item.max_wins {
            None => requested_wins,
            Some(cap) => requested_wins.min(cap),
        };

        if let Some(last_won_at) = update.last_won_at {
            item.last_won_at = last_won_at;
        }
        if let Some(mode) = update.image_mode {
            item.image_mode = mode;
        }
        if let Some(url) = &update.image_url {
            item.image_url = url.clone();
        }
        if let Some(file) = &update.image_file {
            item.image_file = file.clone();
        }
        if let Some(color) = &update.accent_color {
            item.accent_color = color.clone();
        }
        item.updated_at = now;

        let updated = item.clone();
        record.updated_at = now;
        self.store.put(&record).await?;
        Ok(Some(updated))
    }

    pub async fn set_item_max_wins(
        &self,
        box_id: &str,
        item_id: &str,
        max_wins: Option<u32>,
    ) -> AppResult<Option<InventoryItem>> {
        self.update_item(box_id, item_id, ItemUpdate::max_wins(max_wins))
            .await
    }

    /// Removes the item and, if it was the box's last selection, clears
    /// that pointer so it never dangles.
    pub async fn remove_item(&self, box_id: &str, item_id: &str) -> AppResult<bool> {
        let Some(mut record) = self.get_loot_box(box_id).await? else {
            return Ok(false);
        };

        let item_id = sanitize(item_id);
        if item_id.is_empty() || record.items.remove(&item_id).is_none() {
            return Ok(false);
        }

        if record.last_selected_item_id.as_deref() == Some(item_id.as_str()) {
            record.last_selected_item_id = None;
        }

        record.updated_at = Utc::now();
        self.store.put(&record).await?;
        Ok(true)
    }

    /// Moves the cap so that `remaining` shifts by `delta` while `wins`
    /// stays fixed. Only meaningful for capped items; an unlimited item is
    /// returned unchanged with a warning, since inventing a cap here would
    /// corrupt the operator's intent.
    pub async fn adjust_item_remaining(
        &self,
        box_id: &str,
        item_id: &str,
        delta: i64,
    ) -> AppResult<Option<InventoryItem>> {
        let Some(record) = self.get_loot_box(box_id).await? else {
            return Ok(None);
        };

        let item_id = sanitize(item_id);
        let Some(current) = record.items.get(&item_id) else {
            return Ok(None);
        };

        let Some(remaining) = current.remaining() else {
            tracing::warn!(
                box_id = %record.id,
                item = %current.label,
                "cannot adjust stock for an unlimited item; set a max wins value first"
            );
            return Ok(Some(current.clone()));
        };

        // saturate at the ends of the range; an operator delta must never
        // wrap the cap or abort the call
        let new_remaining = u32::try_from(i64::from(remaining).saturating_add(delta).max(0))
            .unwrap_or(u32::MAX);
        let new_max_wins = current.wins.saturating_add(new_remaining);

        self.update_item(&record.id, &item_id, ItemUpdate::max_wins(Some(new_max_wins)))
            .await
    }

    // ------------------------------------------------------------------
    // Settings reconciliation
    // ------------------------------------------------------------------

    /// Merges only the defined fields onto the record, leaving everything
    /// else alone. Both the bulk editor and the single-setting editor land
    /// here, so they cannot clobber each other's unrelated fields. When
    /// nothing actually changes the record is returned as-is, without an
    /// `updated_at` bump or a write.
    pub async fn update_loot_box_details(
        &self,
        box_id: &str,
        update: BoxDetailsUpdate,
    ) -> AppResult<Option<LootBoxRecord>> {
        let Some(mut record) = self.get_loot_box(box_id).await? else {
            return Ok(None);
        };

        let mut changed = false;

        if let Some(name) = &update.display_name {
            let next = name.trim();
            let next = if next.is_empty() {
                record.id.clone()
            } else {
                next.to_string()
            };
            if next != record.display_name {
                record.display_name = next;
                changed = true;
            }
        }

        if let Some(overlay) = &update.overlay_settings {
            changed |= overlay.apply(&mut record.overlay_settings);
        }

        if let Some(props) = &update.props {
            changed |= props.apply(&mut record.props);
        }

        if !changed {
            return Ok(Some(record));
        }

        record.updated_at = Utc::now();
        self.store.put(&record).await?;
        Ok(Some(record))
    }

    /// Narrow editor for the overlay/reveal timing knobs; funnels into the
    /// same merge as [`Self::update_loot_box_details`].
    pub async fn update_timing(
        &self,
        box_id: &str,
        update: TimingUpdate,
    ) -> AppResult<Option<LootBoxRecord>> {
        self.update_loot_box_details(box_id, update.into()).await
    }

    // ------------------------------------------------------------------
    // Draw
    // ------------------------------------------------------------------

    /// Opens the box: weighted draw over the eligible items, bookkeeping,
    /// persistence, pending-cache handoff, notifications.
    ///
    /// An empty pool (no items, all zero-weight, or everything at cap) is a
    /// normal outcome: an `Empty` event fires and the caller gets `None`
    /// with no record change.
    pub async fn open_loot_box(&self, box_id: &str) -> AppResult<Option<LootBoxSelection>> {
        let Some(mut record) = self.get_loot_box(box_id).await? else {
            return Ok(None);
        };

        let selected_id = {
            let eligible: Vec<&InventoryItem> =
                record.items.values().filter(|i| i.is_eligible()).collect();
            if eligible.is_empty() {
                tracing::debug!(box_id = %record.id, items = record.items.len(), "loot box has nothing to draw");
                self.events.emit(LootBoxEvent::Empty(EmptyPayload::new(&record)));
                return Ok(None);
            }
            weighted_pick(&eligible).id.clone()
        };

        let now = Utc::now();
        // the id came out of the map one statement ago
        let Some(item) = record.items.get_mut(&selected_id) else {
            return Ok(None);
        };

        let is_first_win = item.wins == 0;
        item.wins = match item.max_wins {
            None => item.wins + 1,
            Some(cap) => (item.wins + 1).min(cap),
        };
        item.last_won_at = Some(now);
        item.updated_at = now;
        let selected = item.clone();

        record.last_opened_at = Some(now);
        record.last_selected_item_id = Some(selected_id);
        record.total_opens += 1;
        record.updated_at = now;

        self.store.put(&record).await?;

        let selection = LootBoxSelection {
            loot_box_id: record.id.clone(),
            item: selected.clone(),
            timestamp: now,
        };
        self.pending.store(selection.clone());

        self.events
            .emit(LootBoxEvent::Opened(OpenedPayload::new(&record, &selected)));
        self.events.emit(LootBoxEvent::ItemWon(ItemWonPayload::new(
            &record,
            &selected,
            is_first_win,
        )));
        if selected.is_depleted() {
            self.events.emit(LootBoxEvent::ItemDepleted(
                ItemDepletedPayload::new(&record, &selected),
            ));
        }

        Ok(Some(selection))
    }

    // ------------------------------------------------------------------
    // Reset / removal
    // ------------------------------------------------------------------

    /// Zeroes every item's win count and the box's open history. Caps,
    /// weights, and visuals stay as configured.
    pub async fn reset_loot_box(&self, box_id: &str) -> AppResult<Option<LootBoxRecord>> {
        let Some(mut record) = self.get_loot_box(box_id).await? else {
            return Ok(None);
        };

        let now = Utc::now();
        for item in record.items.values_mut() {
            item.wins = 0;
            item.last_won_at = None;
            item.updated_at = now;
        }
        record.last_opened_at = None;
        record.last_selected_item_id = None;
        record.updated_at = now;

        self.store.put(&record).await?;
        self.pending.evict(&record.id);
        Ok(Some(record))
    }

    /// Deletes the record and any parked draw. Reports whether anything
    /// was actually there.
    pub async fn remove_loot_box(&self, box_id: &str) -> AppResult<bool> {
        let id = sanitize(box_id);
        if id.is_empty() {
            return Ok(false);
        }

        let removed = self.store.delete(&id).await?;
        if removed {
            self.pending.evict(&id);
        }
        Ok(removed)
    }

    // ------------------------------------------------------------------
    // Pending-selection handoff
    // ------------------------------------------------------------------

    pub fn get_pending_selection(&self, box_id: &str) -> Option<LootBoxSelection> {
        self.pending.peek(&sanitize(box_id))
    }

    pub fn consume_pending_selection(&self, box_id: &str) -> Option<LootBoxSelection> {
        self.pending.consume(&sanitize(box_id))
    }
}

/// Incoming text beats existing text beats the type default.
fn pick_text(incoming: &Option<String>, existing: Option<String>) -> String {
    incoming
        .clone()
        .or(existing)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// Non-numeric, negative, or absent input means "unlimited"; anything valid
/// is floored to a whole cap.
fn normalize_max_wins(raw: Option<f64>) -> Option<u32> {
    let n = raw?;
    if !n.is_finite() || n < 0.0 {
        return None;
    }
    Some(n.floor() as u32)
}

/// A weight must be positive to mean anything; fall back to the existing
/// weight, then to 1.
fn normalize_weight(raw: Option<f64>, fallback: Option<f64>) -> f64 {
    if let Some(w) = raw {
        if w.is_finite() && w > 0.0 {
            return w;
        }
    }
    if let Some(w) = fallback {
        if w.is_finite() && w > 0.0 {
            return w;
        }
    }
    1.0
}

/// Resolves an incoming draft to an item the box already has: an explicit
/// id that exists wins, otherwise a case-insensitive exact match on both
/// label and value.
fn resolve_item_id(items: &HashMap<String, InventoryItem>, draft: &ItemDraft) -> Option<String> {
    if let Some(raw) = &draft.id {
        let explicit = sanitize(raw);
        if !explicit.is_empty() && items.contains_key(&explicit) {
            return Some(explicit);
        }
    }

    let fold = |v: &Option<String>| v.as_deref().unwrap_or("").trim().to_lowercase();
    let label = fold(&draft.label);
    let value = fold(&draft.value);

    items
        .values()
        .find(|existing| {
            existing.label.trim().to_lowercase() == label
                && existing.value.trim().to_lowercase() == value
        })
        .map(|existing| existing.id.clone())
}

/// Picks the id an incoming draft lands under: an existing identity match,
/// the draft's own free id, or a fresh slug from its label/value with
/// `-2`, `-3`, … suffixes until unique.
fn assign_item_id(items: &HashMap<String, InventoryItem>, draft: &ItemDraft) -> String {
    if let Some(existing) = resolve_item_id(items, draft) {
        return existing;
    }

    if let Some(raw) = &draft.id {
        let provided = sanitize(raw);
        if !provided.is_empty() && !items.contains_key(&provided) {
            return provided;
        }
    }

    let base = sanitize(draft.label.as_deref().unwrap_or(""));
    let base = if base.is_empty() {
        sanitize(draft.value.as_deref().unwrap_or(""))
    } else {
        base
    };
    let base = if base.is_empty() {
        format!("item-{}", Uuid::new_v4())
    } else {
        base
    };

    if !items.contains_key(&base) {
        return base;
    }

    let mut counter = 2;
    loop {
        let candidate = format!("{base}-{counter}");
        if !items.contains_key(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Cumulative-distribution draw. The ticket falls somewhere in the summed
/// weight mass; walking the pool and subtracting finds the owner. Never
/// called with an empty pool.
fn weighted_pick<'a>(pool: &[&'a InventoryItem]) -> &'a InventoryItem {
    let total: f64 = pool.iter().map(|i| i.weight).sum();
    let ticket = rand::rng().random_range(0.0..total);
    pick_by_ticket(pool, ticket)
}

fn pick_by_ticket<'a>(pool: &[&'a InventoryItem], mut ticket: f64) -> &'a InventoryItem {
    for item in pool {
        ticket -= item.weight;
        if ticket <= 0.0 {
            return item;
        }
    }
    // float drift can leave a sliver of ticket unspent; the last candidate
    // takes it
    pool[pool.len() - 1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::lootbox::ImageMode;

    fn item(id: &str, weight: f64) -> InventoryItem {
        let now = Utc::now();
        InventoryItem {
            id: id.to_string(),
            label: id.to_string(),
            value: String::new(),
            subtitle: String::new(),
            weight,
            max_wins: None,
            wins: 0,
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
    fn ticket_walk_matches_cumulative_bands() {
        let a = item("a", 1.0);
        let b = item("b", 2.0);
        let c = item("c", 3.0);
        let pool = vec![&a, &b, &c];

        assert_eq!(pick_by_ticket(&pool, 0.5).id, "a");
        assert_eq!(pick_by_ticket(&pool, 1.0).id, "a");
        assert_eq!(pick_by_ticket(&pool, 1.5).id, "b");
        assert_eq!(pick_by_ticket(&pool, 3.0).id, "b");
        assert_eq!(pick_by_ticket(&pool, 5.9).id, "c");
    }

    #[test]
    fn drifted_ticket_falls_to_last_candidate() {
        let a = item("a", 1.0);
        let b = item("b", 1.0);
        let pool = vec![&a, &b];

        assert_eq!(pick_by_ticket(&pool, 2.1).id, "b");
    }

    #[test]
    fn max_wins_normalization() {
        assert_eq!(normalize_max_wins(None), None);
        assert_eq!(normalize_max_wins(Some(-1.0)), None);
        assert_eq!(normalize_max_wins(Some(f64::NAN)), None);
        assert_eq!(normalize_max_wins(Some(0.0)), Some(0));
        assert_eq!(normalize_max_wins(Some(3.9)), Some(3));
    }

    #[test]
    fn weight_normalization_prefers_positive_incoming() {
        assert_eq!(normalize_weight(Some(2.5), Some(1.0)), 2.5);
        assert_eq!(normalize_weight(Some(0.0), Some(4.0)), 4.0);
        assert_eq!(normalize_weight(Some(-1.0), None), 1.0);
        assert_eq!(normalize_weight(None, Some(-2.0)), 1.0);
        assert_eq!(normalize_weight(None, None), 1.0);
    }

    #[test]
    fn identity_resolution_prefers_explicit_id_then_label_value() {
        let mut items = HashMap::new();
        let mut gold = item("gold", 1.0);
        gold.label = "Gold Bar".to_string();
        gold.value = "!give gold".to_string();
        items.insert(gold.id.clone(), gold);

        let by_id = ItemDraft {
            id: Some("Gold".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_item_id(&items, &by_id), Some("gold".to_string()));

        let by_pair = ItemDraft {
            label: Some("GOLD BAR".to_string()),
            value: Some("!GIVE GOLD".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_item_id(&items, &by_pair), Some("gold".to_string()));

        let same_label_other_value = ItemDraft {
            label: Some("Gold Bar".to_string()),
            value: Some("!give silver".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_item_id(&items, &same_label_other_value), None);
    }

    #[test]
    fn fresh_ids_come_from_label_and_dodge_collisions() {
        let mut items = HashMap::new();
        items.insert("mystery-prize".to_string(), item("mystery-prize", 1.0));

        let draft = ItemDraft {
            label: Some("Mystery Prize".to_string()),
            value: Some("something else".to_string()),
            ..Default::default()
        };
        assert_eq!(assign_item_id(&items, &draft), "mystery-prize-2");

        let blank = ItemDraft::default();
        assert!(assign_item_id(&items, &blank).starts_with("item-"));
    }
}
