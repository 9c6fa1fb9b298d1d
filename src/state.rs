pub mod pending;
pub mod registry;

pub use pending::PendingSelections;
pub use registry::Registry;
