pub mod error;
pub mod json_file;
pub mod memory;
pub mod repo;

pub use error::StoreError;
pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use repo::LootBoxStore;

pub type StoreResult<T> = Result<T, StoreError>;
