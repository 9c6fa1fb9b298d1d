use crate::models::lootbox::LootBoxRecord;
use crate::store::StoreResult;

/// Durable mapping from sanitized box id to its record.
///
/// Implementations pick their own medium; the engine relies only on
/// full-record get/put with last-writer-wins semantics. Merging partial
/// updates is the engine's job, never the store's. A read against an
/// uninitialized store reports absence, not an error.
#[async_trait::async_trait]
pub trait LootBoxStore: Send + Sync {
    /// Guarantees the root container exists. Idempotent, safe to call
    /// before every read.
    async fn ensure_root(&self) -> StoreResult<()>;

    async fn get(&self, id: &str) -> StoreResult<Option<LootBoxRecord>>;

    /// Full overwrite of the record at its id.
    async fn put(&self, record: &LootBoxRecord) -> StoreResult<()>;

    async fn list(&self) -> StoreResult<Vec<LootBoxRecord>>;

    /// Returns whether anything was actually deleted.
    async fn delete(&self, id: &str) -> StoreResult<bool>;
}
