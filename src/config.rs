use anyhow::Result;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

fn default_store_path() -> String {
    "data/lootboxes.json".to_string()
}

fn default_pending_ttl_secs() -> u64 {
    5 * 60
}

fn default_event_capacity() -> usize {
    64
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Path of the JSON document holding every loot box record
    #[serde(default = "default_store_path")]
    pub store_path: String,

    /// How long a drawn-but-unrevealed selection stays retrievable
    #[serde(default = "default_pending_ttl_secs")]
    pub pending_ttl_secs: u64,

    /// Buffer size of the domain event channel
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            pending_ttl_secs: default_pending_ttl_secs(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let cfg: Self = toml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::from_filename(".env");
        let cfg = Self {
            store_path: std::env::var("LOOTCRATE_STORE_PATH")
                .unwrap_or_else(|_| default_store_path()),
            pending_ttl_secs: std::env::var("LOOTCRATE_PENDING_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_pending_ttl_secs),
            event_capacity: std::env::var("LOOTCRATE_EVENT_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_event_capacity),
        };

        Ok(cfg)
    }

    pub fn pending_ttl(&self) -> Duration {
        Duration::from_secs(self.pending_ttl_secs)
    }
}
