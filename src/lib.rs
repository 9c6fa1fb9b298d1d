pub mod actions;
pub mod config;
pub mod error;
pub mod events;
pub mod ident;
pub mod models;
pub mod reporting;
pub mod search;
pub mod services;
pub mod sources;
pub mod state;
pub mod store;

// Convenient re-exports (so call sites can do `lootcrate::Registry`, etc.)
pub use error::{AppResult, DomainError};
pub use services::LootBoxService;
pub use state::{PendingSelections, Registry};
