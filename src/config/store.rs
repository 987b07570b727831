//! Document store configuration

use serde::{Deserialize, Serialize};

pub const DEFAULT_MONGO_URL: &str = "mongodb://localhost:27017";

/// MongoDB connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Connection string; falls back to `MONGO_URL`, then localhost
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default = "default_database")]
    pub database: String,
    /// Create the unique `uid` index on each collection before writing
    #[serde(default = "default_ensure_indexes")]
    pub ensure_indexes: bool,
}

fn default_database() -> String {
    "animals".to_string()
}

fn default_ensure_indexes() -> bool {
    true
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: None,
            database: default_database(),
            ensure_indexes: default_ensure_indexes(),
        }
    }
}

impl StoreConfig {
    pub fn connection_url(&self) -> &str {
        self.url.as_deref().unwrap_or(DEFAULT_MONGO_URL)
    }
}
