pub mod memory;
pub mod sqlite;

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

use crate::error::StorageError;

/// Fixed keys under which client state is kept.
pub mod keys {
    pub const FAVORITES: &str = "polyintel_favorites";
    pub const HISTORY: &str = "polyintel_history";
    pub const API_URL: &str = "polyintel_api_url";
    pub const AUTO_REFRESH: &str = "polyintel_auto_refresh";
    pub const REFRESH_INTERVAL: &str = "polyintel_refresh_interval";
    pub const THEME: &str = "polyintel_theme";
    pub const NOTIFICATIONS: &str = "polyintel_notifications";
}

/// Durable string key-value storage. Writes are synchronous.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
