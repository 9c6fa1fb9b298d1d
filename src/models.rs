pub mod draft;
pub mod lootbox;

pub use draft::{
    BoxDetailsUpdate, ItemDraft, ItemUpdate, OverlayPatch, PropsPatch, SyncRequest, TimingUpdate,
};
pub use lootbox::{
    BoxProps, ClientItem, ImageMode, InventoryItem, InventoryView, LootBoxRecord, LootBoxSelection,
    OverlaySettings, SourceKind,
};
