use lootcrate::actions::{ManagerAction, run_action};
use lootcrate::models::draft::{ItemDraft, SyncRequest};
use lootcrate::models::lootbox::SourceKind;
use lootcrate::reporting::{self, InventoryFields};
use lootcrate::store::{JsonFileStore, LootBoxStore};
use lootcrate::{Registry, config};
use std::sync::Arc;

/// Demo walkthrough: seed a box, open it, and hand the draw to a pretend
/// reveal consumer. The engine itself is a library; a host platform would
/// wire these same calls to its triggers.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cfg = Arc::new(config::Config::from_env()?);

    let store = Arc::new(JsonFileStore::open(&cfg.store_path).await?);
    store.ensure_root().await?;

    let registry = Arc::new(Registry::new(store, cfg));
    let engine = &registry.lootbox;

    let mut events = registry.events.subscribe();

    let record = engine
        .sync_loot_box(SyncRequest {
            id: "demo-crate".to_string(),
            display_name: Some("Demo Crate".to_string()),
            source: SourceKind::List,
            items: vec![
                ItemDraft {
                    label: Some("Golden Ticket".to_string()),
                    value: Some("!ticket".to_string()),
                    weight: Some(1.0),
                    max_wins: Some(1.0),
                    ..Default::default()
                },
                ItemDraft {
                    label: Some("Channel Points".to_string()),
                    value: Some("!points 500".to_string()),
                    weight: Some(9.0),
                    ..Default::default()
                },
            ],
            ..Default::default()
        })
        .await?;
    tracing::info!(box_id = %record.id, items = record.items.len(), "seeded demo loot box");

    let outcome = run_action(engine, &record.id, ManagerAction::Open).await;
    if outcome.success {
        tracing::info!(
            winning_item = %outcome.winning_item,
            winning_value = %outcome.winning_value,
            remaining = %outcome.remaining_stock,
            "loot box opened"
        );
    }

    // the reveal path picks the draw up out of band
    match engine.consume_pending_selection(&record.id) {
        Some(selection) => {
            tracing::info!(reveal = %reporting::format_last_selection(&selection), "reveal consumed");
        }
        None => tracing::warn!("no pending selection to reveal"),
    }

    if let Some(inventory) = engine.get_inventory(&record.id).await? {
        let fields = InventoryFields {
            names: true,
            wins: true,
            remaining: true,
            ..Default::default()
        };
        tracing::info!(inventory = %reporting::format_inventory(&inventory, &fields), "stock after draw");
    }

    while let Ok(event) = events.try_recv() {
        tracing::info!(payload = %serde_json::to_string(&event)?, "event");
    }

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, prelude::*};

    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info,lootcrate=debug"))
        .unwrap();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}
