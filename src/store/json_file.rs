use crate::models::lootbox::LootBoxRecord;
use crate::store::error::StoreError;
use crate::store::repo::LootBoxStore;
use crate::store::StoreResult;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const ROOT_KEY: &str = "lootboxes";

/// Single-document persistence: the whole box table lives under a
/// `lootboxes` root object in one pretty-printed JSON file, rewritten after
/// every mutation. Reads are served from memory once the document is
/// loaded. Suits a low-frequency, operator-driven workload; contended
/// writers belong behind a different implementation of the trait.
pub struct JsonFileStore {
    path: PathBuf,
    boxes: RwLock<BTreeMap<String, LootBoxRecord>>,
}

impl JsonFileStore {
    /// Opens the store at `path`, creating parent directories as needed. An
    /// existing document is loaded eagerly; the file itself is not written
    /// until [`LootBoxStore::ensure_root`] or the first mutation.
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let boxes = match tokio::fs::read_to_string(&path).await {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => parse_document(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            boxes: RwLock::new(boxes),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn flush(&self) -> StoreResult<()> {
        let bytes = {
            let boxes = self.boxes.read();
            let mut doc = serde_json::Map::new();
            doc.insert(ROOT_KEY.to_string(), serde_json::to_value(&*boxes)?);
            serde_json::to_vec_pretty(&Value::Object(doc))?
        };
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }
}

fn parse_document(raw: &str) -> StoreResult<BTreeMap<String, LootBoxRecord>> {
    let doc: Value = serde_json::from_str(raw)?;
    let Value::Object(obj) = doc else {
        return Err(StoreError::Corrupt("top level is not an object".to_string()));
    };
    match obj.get(ROOT_KEY) {
        None | Some(Value::Null) => Ok(BTreeMap::new()),
        Some(v) => Ok(serde_json::from_value(v.clone())?),
    }
}

#[async_trait::async_trait]
impl LootBoxStore for JsonFileStore {
    async fn ensure_root(&self) -> StoreResult<()> {
        if tokio::fs::try_exists(&self.path).await? {
            return Ok(());
        }
        self.flush().await
    }

    async fn get(&self, id: &str) -> StoreResult<Option<LootBoxRecord>> {
        Ok(self.boxes.read().get(id).cloned())
    }

    async fn put(&self, record: &LootBoxRecord) -> StoreResult<()> {
        self.boxes
            .write()
            .insert(record.id.clone(), record.clone());
        self.flush().await
    }

    async fn list(&self) -> StoreResult<Vec<LootBoxRecord>> {
        Ok(self.boxes.read().values().cloned().collect())
    }

    async fn delete(&self, id: &str) -> StoreResult<bool> {
        let removed = self.boxes.write().remove(id).is_some();
        if removed {
            self.flush().await?;
        }
        Ok(removed)
    }
}
