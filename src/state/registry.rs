use crate::config::Config;
use crate::events::{BroadcastEmitter, EventSink};
use crate::services::LootBoxService;
use crate::store::LootBoxStore;
use std::sync::Arc;

/// Process-wide wiring: one store, one engine, one event channel. Built
/// once at startup and passed by handle to every caller; nothing in here
/// is a module-level global.
pub struct Registry {
    pub store: Arc<dyn LootBoxStore>,
    pub lootbox: Arc<LootBoxService>,
    pub events: Arc<BroadcastEmitter>,
    pub config: Arc<Config>,
}

impl Registry {
    pub fn new(store: Arc<dyn LootBoxStore>, config: Arc<Config>) -> Self {
        let events = Arc::new(BroadcastEmitter::new(config.event_capacity));
        let sink: Arc<dyn EventSink> = events.clone();
        let lootbox = Arc::new(LootBoxService::new(
            store.clone(),
            sink,
            config.pending_ttl(),
        ));

        Self {
            store,
            lootbox,
            events,
            config,
        }
    }
}
