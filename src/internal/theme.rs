use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use strum_macros::{Display, EnumString};
use tracing::{info, warn};

/// Storage key of the theme preference.
pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ThemePreference {
    #[default]
    Light,
    Dark,
}

impl ThemePreference {
    /// Map the toggle control state: on means dark.
    pub fn from_toggle(dark: bool) -> Self {
        match dark {
            true => Self::Dark,
            false => Self::Light,
        }
    }

    pub fn is_dark(&self) -> bool {
        *self == Self::Dark
    }
}

/// Durable string key-value storage.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Key-value pairs kept as a JSON object in a single file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config_dir>/tui-news-app/storage.json`
    pub fn default_location() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("tui-news-app");
        info!(config_dir = %config_dir.display(), "Resolved config directory for storage");
        Ok(Self::new(config_dir.join("storage.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read storage file {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse storage file {}", self.path.display()))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        // A corrupt file is replaced rather than blocking every future write.
        let mut entries = self.read_all().unwrap_or_else(|e| {
            warn!(error = %e, "Discarding unreadable storage file");
            BTreeMap::new()
        });
        entries.insert(key.to_string(), value.to_string());

        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory {}", dir.display()))?;
        }
        let content =
            serde_json::to_string_pretty(&entries).context("Failed to serialize storage")?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write storage file {}", self.path.display()))?;
        info!(storage_file = %self.path.display(), key, "Saved storage entry");
        Ok(())
    }
}

/// In-memory store. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Reads and persists the light/dark preference.
pub struct ThemeService {
    store: Box<dyn KeyValueStore>,
    current: ThemePreference,
}

impl ThemeService {
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self {
            store: Box::new(store),
            current: ThemePreference::default(),
        }
    }

    /// Read the persisted preference. When nothing usable is stored, Light is
    /// returned and written back.
    pub fn get_preference(&mut self) -> ThemePreference {
        let stored = match self.store.get(THEME_KEY) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Failed to read theme preference");
                None
            }
        };

        let preference = match stored.as_deref().map(ThemePreference::from_str) {
            Some(Ok(preference)) => preference,
            Some(Err(_)) | None => {
                if let Some(value) = &stored {
                    warn!(value = %value, "Ignoring unrecognised theme preference");
                }
                let preference = ThemePreference::default();
                if let Err(e) = self.store.set(THEME_KEY, &preference.to_string()) {
                    warn!(error = %e, "Failed to persist default theme preference");
                }
                preference
            }
        };

        self.current = preference;
        preference
    }

    /// Switch to `preference` and persist it. The switch takes effect even if
    /// persisting fails; the error is returned for the caller to report.
    pub fn set_preference(&mut self, preference: ThemePreference) -> Result<()> {
        self.current = preference;
        info!(theme = %preference, "Theme preference changed");
        self.store
            .set(THEME_KEY, &preference.to_string())
            .context("Failed to persist theme preference")
    }

    /// Apply the toggle control state.
    pub fn toggle(&mut self, dark: bool) -> Result<ThemePreference> {
        let preference = ThemePreference::from_toggle(dark);
        self.set_preference(preference)?;
        Ok(preference)
    }

    pub fn current(&self) -> ThemePreference {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preference_strings() {
        assert_eq!(ThemePreference::Dark.to_string(), "dark");
        assert_eq!(ThemePreference::Light.to_string(), "light");
        assert_eq!("dark".parse::<ThemePreference>(), Ok(ThemePreference::Dark));
        assert!("sepia".parse::<ThemePreference>().is_err());
    }

    #[test]
    fn test_toggle_maps_control_state() {
        assert_eq!(ThemePreference::from_toggle(true), ThemePreference::Dark);
        assert_eq!(ThemePreference::from_toggle(false), ThemePreference::Light);
    }

    #[test]
    fn test_absent_defaults_to_light_and_persists() {
        let store = MemoryStore::default();
        let mut service = ThemeService::new(store.clone());

        assert_eq!(service.get_preference(), ThemePreference::Light);
        assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("light"));
    }

    #[test]
    fn test_round_trip_across_reload() {
        let store = MemoryStore::default();
        let mut service = ThemeService::new(store.clone());
        service.set_preference(ThemePreference::Dark).unwrap();

        let mut reloaded = ThemeService::new(store);
        assert_eq!(reloaded.get_preference(), ThemePreference::Dark);
    }

    #[test]
    fn test_unrecognised_value_resets_to_light() {
        let mut store = MemoryStore::default();
        store.set(THEME_KEY, "sepia").unwrap();
        let mut service = ThemeService::new(store.clone());

        assert_eq!(service.get_preference(), ThemePreference::Light);
        assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("light"));
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let mut service = ThemeService::new(FileStore::new(&path));
        assert_eq!(service.toggle(true).unwrap(), ThemePreference::Dark);

        let mut reloaded = ThemeService::new(FileStore::new(&path));
        assert_eq!(reloaded.get_preference(), ThemePreference::Dark);

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains(r#""theme": "dark""#));
    }

    #[test]
    fn test_file_store_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, r#"{"other": "value"}"#).unwrap();

        let mut store = FileStore::new(&path);
        store.set(THEME_KEY, "dark").unwrap();

        assert_eq!(store.get("other").unwrap().as_deref(), Some("value"));
        assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn test_file_store_replaces_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "{ not json").unwrap();

        let mut service = ThemeService::new(FileStore::new(&path));
        assert_eq!(service.get_preference(), ThemePreference::Light);
        assert_eq!(
            FileStore::new(&path).get(THEME_KEY).unwrap().as_deref(),
            Some("light")
        );
    }
}
