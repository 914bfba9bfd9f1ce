use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};
use crate::api::types::TradeSignal;
use crate::error::StorageError;
use crate::store::notice::ErrorNotice;
use crate::storage::{keys, KeyValueStore};

/// Most recent active signals kept in memory
pub const MAX_SIGNALS: usize = 50;
/// Most recent signals kept in durable history
pub const MAX_HISTORY: usize = 500;

/// Client-side signal state. Active signals live in memory only; history and
/// favorites are written through to storage on every mutation.
pub struct SignalStore {
    storage: Arc<dyn KeyValueStore>,
    signals: Vec<TradeSignal>,
    history: Vec<TradeSignal>,
    favorites: Vec<String>,
    loading: bool,
    error: Option<ErrorNotice>,
}

impl SignalStore {
    /// Rehydrate history and favorites from storage
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Result<Self, StorageError> {
        let history: Vec<TradeSignal> = load_list(storage.as_ref(), keys::HISTORY)?;
        let favorites: Vec<String> = load_list(storage.as_ref(), keys::FAVORITES)?;

        debug!(
            history = history.len(),
            favorites = favorites.len(),
            "signal store loaded"
        );

        Ok(Self {
            storage,
            signals: Vec::new(),
            history,
            favorites,
            loading: false,
            error: None,
        })
    }

    pub fn signals(&self) -> &[TradeSignal] {
        &self.signals
    }

    pub fn history(&self) -> &[TradeSignal] {
        &self.history
    }

    pub fn favorites(&self) -> &[String] {
        &self.favorites
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_ref().map(|notice| notice.message())
    }

    pub fn add_signal(&mut self, signal: TradeSignal) {
        self.signals.insert(0, signal);
        self.signals.truncate(MAX_SIGNALS);
    }

    /// Drop every active signal for `market_id`
    pub fn remove_signal(&mut self, market_id: &str) {
        self.signals.retain(|s| s.market_id != market_id);
    }

    /// Stamp, prepend and persist. On a storage failure the in-memory history
    /// is left as it was and the error is returned.
    pub fn add_to_history(&mut self, mut signal: TradeSignal) -> Result<(), StorageError> {
        signal.timestamp = Some(Utc::now());

        let mut updated = Vec::with_capacity((self.history.len() + 1).min(MAX_HISTORY));
        updated.push(signal);
        updated.extend(self.history.iter().take(MAX_HISTORY - 1).cloned());

        save_list(self.storage.as_ref(), keys::HISTORY, &updated)?;
        self.history = updated;
        Ok(())
    }

    /// Add to history and, once that is persisted, to the active list with
    /// the same timestamp.
    pub fn record(&mut self, signal: TradeSignal) -> Result<(), StorageError> {
        self.add_to_history(signal)?;
        if let Some(stamped) = self.history.first().cloned() {
            self.add_signal(stamped);
        }
        Ok(())
    }

    /// Flip favorite membership and persist. Returns the new membership.
    pub fn toggle_favorite(&mut self, market_id: &str) -> Result<bool, StorageError> {
        let is_fav = self.is_favorite(market_id);
        let updated: Vec<String> = if is_fav {
            self.favorites.iter().filter(|id| *id != market_id).cloned().collect()
        } else {
            let mut updated = self.favorites.clone();
            updated.push(market_id.to_string());
            updated
        };

        save_list(self.storage.as_ref(), keys::FAVORITES, &updated)?;
        self.favorites = updated;
        Ok(!is_fav)
    }

    pub fn is_favorite(&self, market_id: &str) -> bool {
        self.favorites.iter().any(|id| id == market_id)
    }

    pub fn clear_signals(&mut self) {
        self.signals.clear();
    }

    pub fn clear_history(&mut self) -> Result<(), StorageError> {
        self.storage.remove(keys::HISTORY)?;
        self.history.clear();
        Ok(())
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn set_error(&mut self, error: Option<String>) {
        self.error = error.map(ErrorNotice::new);
    }

    /// Dismiss the error notice once it has been shown for `ttl`
    pub fn expire_error(&mut self, ttl: Duration) -> bool {
        if self.error.as_ref().is_some_and(|notice| notice.is_expired(ttl)) {
            self.error = None;
            return true;
        }
        false
    }
}

/// Read a JSON list. Missing keys are empty; corrupt values are empty too,
/// but the raw text is copied aside first (see [`preserve_corrupt`]).
fn load_list<T: DeserializeOwned>(
    storage: &dyn KeyValueStore,
    key: &str,
) -> Result<Vec<T>, StorageError> {
    let Some(raw) = storage.get(key)? else {
        return Ok(Vec::new());
    };

    match serde_json::from_str::<Vec<T>>(&raw) {
        Ok(list) => Ok(list),
        Err(e) => {
            warn!(key, error = %e, "stored data is corrupt, starting empty");

            match preserve_corrupt(storage, key, &raw) {
                Ok(backup) => warn!(key, backup = %backup, "corrupt data preserved"),
                Err(e) => error!(key, error = %e, "failed to preserve corrupt stored data"),
            }
            Ok(Vec::new())
        }
    }
}

/// Copy `raw` to the first free key of `<key>.corrupt`, `<key>.corrupt.1`,
/// `<key>.corrupt.2`, ... so earlier copies are never overwritten.
fn preserve_corrupt(
    storage: &dyn KeyValueStore,
    key: &str,
    raw: &str,
) -> Result<String, StorageError> {
    let mut backup_key = format!("{}.corrupt", key);
    let mut n = 0u32;
    while storage.get(&backup_key)?.is_some() {
        n += 1;
        backup_key = format!("{}.corrupt.{}", key, n);
    }

    storage.set(&backup_key, raw)?;
    Ok(backup_key)
}

fn save_list<T: Serialize>(
    storage: &dyn KeyValueStore,
    key: &str,
    list: &[T],
) -> Result<(), StorageError> {
    let encoded = serde_json::to_string(list).map_err(|source| StorageError::Encode {
        key: key.to_string(),
        source,
    })?;
    storage.set(key, &encoded)
}
