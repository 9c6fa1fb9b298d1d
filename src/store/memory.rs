use crate::models::lootbox::LootBoxRecord;
use crate::store::repo::LootBoxStore;
use crate::store::StoreResult;
use dashmap::DashMap;

/// Keeps the whole box table in process memory. Used by the test suite and
/// by embedders that treat loot boxes as ephemeral.
#[derive(Default)]
pub struct MemoryStore {
    boxes: DashMap<String, LootBoxRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            boxes: DashMap::new(),
        }
    }
}

#[async_trait::async_trait]
impl LootBoxStore for MemoryStore {
    async fn ensure_root(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn get(&self, id: &str) -> StoreResult<Option<LootBoxRecord>> {
        Ok(self.boxes.get(id).map(|r| r.value().clone()))
    }

    async fn put(&self, record: &LootBoxRecord) -> StoreResult<()> {
        self.boxes.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn list(&self) -> StoreResult<Vec<LootBoxRecord>> {
        Ok(self.boxes.iter().map(|e| e.value().clone()).collect())
    }

    async fn delete(&self, id: &str) -> StoreResult<bool> {
        Ok(self.boxes.remove(id).is_some())
    }
}
