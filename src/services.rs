pub mod lootbox;

pub use lootbox::LootBoxService;
