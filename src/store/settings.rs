use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;
use crate::api::client::DEFAULT_BASE_URL;
use crate::error::StorageError;
use crate::storage::{keys, KeyValueStore};

pub const MIN_REFRESH_INTERVAL_SECS: u64 = 10;
pub const MAX_REFRESH_INTERVAL_SECS: u64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Dark,
    Light,
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Dark => write!(f, "dark"),
            Theme::Light => write!(f, "light"),
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            other => Err(format!("unknown theme: {}", other)),
        }
    }
}

/// User preferences kept in durable storage
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_url: String,
    pub auto_refresh: bool,
    pub refresh_interval_secs: u64,
    pub theme: Theme,
    pub notifications: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_BASE_URL.to_string(),
            auto_refresh: false,
            refresh_interval_secs: 30,
            theme: Theme::Dark,
            notifications: true,
        }
    }
}

impl Settings {
    /// Read every preference, keeping the default for missing or unreadable keys
    pub fn load(storage: &dyn KeyValueStore) -> Result<Self, StorageError> {
        let defaults = Self::default();

        Ok(Self {
            api_url: storage
                .get(keys::API_URL)?
                .filter(|url| !url.trim().is_empty())
                .unwrap_or(defaults.api_url),
            auto_refresh: read_parsed(storage, keys::AUTO_REFRESH, defaults.auto_refresh)?,
            refresh_interval_secs: read_parsed(
                storage,
                keys::REFRESH_INTERVAL,
                defaults.refresh_interval_secs,
            )?,
            theme: read_parsed(storage, keys::THEME, defaults.theme)?,
            notifications: read_parsed(storage, keys::NOTIFICATIONS, defaults.notifications)?,
        })
    }

    /// Write every preference. The API URL is stored only when it differs
    /// from the default, so an unchanged URL never shadows the environment.
    pub fn save(&self, storage: &dyn KeyValueStore) -> Result<(), StorageError> {
        let api_url = self.api_url.trim();
        if api_url.is_empty() || api_url == DEFAULT_BASE_URL {
            storage.remove(keys::API_URL)?;
        } else {
            storage.set(keys::API_URL, api_url)?;
        }
        storage.set(keys::AUTO_REFRESH, &self.auto_refresh.to_string())?;
        storage.set(keys::REFRESH_INTERVAL, &self.refresh_interval_secs.to_string())?;
        storage.set(keys::THEME, &self.theme.to_string())?;
        storage.set(keys::NOTIFICATIONS, &self.notifications.to_string())?;
        Ok(())
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Whether the user stored an API URL of their own
    pub fn has_api_url_override(storage: &dyn KeyValueStore) -> Result<bool, StorageError> {
        Ok(storage
            .get(keys::API_URL)?
            .is_some_and(|url| !url.trim().is_empty()))
    }

    /// Refresh interval clamped to 10-300 seconds
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(
            self.refresh_interval_secs
                .clamp(MIN_REFRESH_INTERVAL_SECS, MAX_REFRESH_INTERVAL_SECS),
        )
    }
}

fn read_parsed<T>(storage: &dyn KeyValueStore, key: &str, default: T) -> Result<T, StorageError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let Some(raw) = storage.get(key)? else {
        return Ok(default);
    };

    match raw.trim().parse::<T>() {
        Ok(value) => Ok(value),
        Err(e) => {
            warn!(key, value = %raw, error = %e, "ignoring unreadable setting");
            Ok(default)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn test_defaults_on_empty_storage() {
        let storage = MemoryStorage::new();
        let settings = Settings::load(&storage).unwrap();

        assert_eq!(settings, Settings::default());
        assert_eq!(settings.api_url, "http://localhost:8000");
        assert!(!Settings::has_api_url_override(&storage).unwrap());
    }

    #[test]
    fn test_save_and_load() {
        let storage = MemoryStorage::new();
        let settings = Settings {
            api_url: "https://polyintel.example".to_string(),
            auto_refresh: true,
            refresh_interval_secs: 60,
            theme: Theme::Light,
            notifications: false,
        };
        settings.save(&storage).unwrap();

        assert_eq!(storage.get(keys::AUTO_REFRESH).unwrap().as_deref(), Some("true"));
        assert_eq!(storage.get(keys::THEME).unwrap().as_deref(), Some("light"));
        assert_eq!(Settings::load(&storage).unwrap(), settings);
        assert!(Settings::has_api_url_override(&storage).unwrap());
    }

    #[test]
    fn test_theme_change_keeps_env_api_url() {
        use crate::config::{resolve_base_url, Config, EnvConfig};

        let storage = MemoryStorage::new();
        storage.set(keys::API_URL, "https://stale.example").unwrap();

        let settings = Settings { theme: Theme::Light, ..Settings::default() };
        settings.save(&storage).unwrap();

        assert!(!Settings::has_api_url_override(&storage).unwrap());
        assert_eq!(storage.get(keys::API_URL).unwrap(), None);
        assert_eq!(Settings::load(&storage).unwrap(), settings);

        let env = EnvConfig {
            api_url: Some("https://prod.example".to_string()),
            api_timeout_ms: None,
        };
        let stored = Settings::has_api_url_override(&storage)
            .unwrap()
            .then(|| settings.api_url.clone());
        assert_eq!(
            resolve_base_url(stored.as_deref(), &env, &Config::default()),
            "https://prod.example"
        );
    }

    #[test]
    fn test_unreadable_values_fall_back() {
        let storage = MemoryStorage::new();
        storage.set(keys::AUTO_REFRESH, "maybe").unwrap();
        storage.set(keys::REFRESH_INTERVAL, "soon").unwrap();
        storage.set(keys::THEME, "solarized").unwrap();

        let settings = Settings::load(&storage).unwrap();
        assert!(!settings.auto_refresh);
        assert_eq!(settings.refresh_interval_secs, 30);
        assert_eq!(settings.theme, Theme::Dark);
    }

    #[test]
    fn test_refresh_interval_clamped() {
        let mut settings = Settings { refresh_interval_secs: 2, ..Settings::default() };
        assert_eq!(settings.refresh_interval(), Duration::from_secs(10));

        settings.refresh_interval_secs = 3600;
        assert_eq!(settings.refresh_interval(), Duration::from_secs(300));

        settings.reset();
        assert_eq!(settings.refresh_interval(), Duration::from_secs(30));
    }
}
