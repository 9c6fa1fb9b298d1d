use crate::models::lootbox::LootBoxSelection;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Rendezvous buffer between "open" and "reveal": holds the most recent
/// draw per box for a bounded time. The two calls arrive on independent
/// trigger paths, so the draw has to wait somewhere until the reveal
/// consumer picks it up, and has to disappear if it never does.
///
/// Expired entries are swept on every access; there is no background timer.
pub struct PendingSelections {
    ttl: Duration,
    entries: Mutex<HashMap<String, PendingEntry>>,
}

struct PendingEntry {
    stored_at: Instant,
    selection: LootBoxSelection,
}

impl PendingSelections {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    /// TTL override, mainly for tests.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Parks a draw, replacing any earlier one for the same box.
    pub fn store(&self, selection: LootBoxSelection) {
        let mut entries = self.entries.lock();
        sweep(&mut entries, self.ttl);
        entries.insert(
            selection.loot_box_id.clone(),
            PendingEntry {
                stored_at: Instant::now(),
                selection,
            },
        );
    }

    /// Peeks without consuming.
    pub fn peek(&self, box_id: &str) -> Option<LootBoxSelection> {
        let mut entries = self.entries.lock();
        sweep(&mut entries, self.ttl);
        entries.get(box_id).map(|e| e.selection.clone())
    }

    /// Reads and removes in one step, so a reveal fires at most once per
    /// draw.
    pub fn consume(&self, box_id: &str) -> Option<LootBoxSelection> {
        let mut entries = self.entries.lock();
        sweep(&mut entries, self.ttl);
        entries.remove(box_id).map(|e| e.selection)
    }

    /// Drops a parked draw, if any. Used by reset and removal.
    pub fn evict(&self, box_id: &str) {
        self.entries.lock().remove(box_id);
    }
}

impl Default for PendingSelections {
    fn default() -> Self {
        Self::new()
    }
}

fn sweep(entries: &mut HashMap<String, PendingEntry>, ttl: Duration) {
    entries.retain(|_, e| e.stored_at.elapsed() < ttl);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::lootbox::{ImageMode, InventoryItem};
    use chrono::Utc;

    fn selection(box_id: &str) -> LootBoxSelection {
        let now = Utc::now();
        LootBoxSelection {
            loot_box_id: box_id.to_string(),
            item: InventoryItem {
                id: "coin".to_string(),
                label: "Coin".to_string(),
                value: String::new(),
                subtitle: String::new(),
                weight: 1.0,
                max_wins: None,
                wins: 1,
                last_won_at: Some(now),
                image_mode: ImageMode::Url,
                image_url: String::new(),
                image_file: String::new(),
                accent_color: String::new(),
                created_at: now,
                updated_at: now,
            },
            timestamp: now,
        }
    }

    #[test]
    fn consume_is_idempotent_once() {
        let cache = PendingSelections::new();
        cache.store(selection("chest"));

        assert!(cache.consume("chest").is_some());
        assert!(cache.consume("chest").is_none());
    }

    #[test]
    fn peek_leaves_the_entry() {
        let cache = PendingSelections::new();
        cache.store(selection("chest"));

        assert!(cache.peek("chest").is_some());
        assert!(cache.peek("chest").is_some());
        assert!(cache.consume("chest").is_some());
    }

    #[test]
    fn later_draw_replaces_earlier() {
        let cache = PendingSelections::new();
        let mut first = selection("chest");
        first.item.id = "old".to_string();
        cache.store(first);
        cache.store(selection("chest"));

        assert_eq!(cache.consume("chest").unwrap().item.id, "coin");
    }

    #[test]
    fn expired_entries_vanish_on_access() {
        let cache = PendingSelections::with_ttl(Duration::ZERO);
        cache.store(selection("chest"));

        assert!(cache.peek("chest").is_none());
        assert!(cache.consume("chest").is_none());
    }

    #[test]
    fn evict_clears_without_returning() {
        let cache = PendingSelections::new();
        cache.store(selection("chest"));
        cache.evict("chest");

        assert!(cache.consume("chest").is_none());
    }
}
