use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable holding the news API key.
pub const API_KEY_ENV: &str = "NEWS_API_KEY";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub network: NetworkConfig,
    pub logging: LoggingConfig,
    /// Optional JSON theme file with `light`/`dark` variants overriding the
    /// built-in palettes.
    pub theme_file: Option<String>,
    /// Override for the key-value file that stores the theme preference.
    /// Defaults to `<config_dir>/tui-news-app/storage.json`.
    pub storage_path: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct NetworkConfig {
    pub base_url: String,
    /// Country filter used by the headlines endpoint.
    pub country: String,
    pub page_size: u32,
    /// Takes precedence over `NEWS_API_KEY` when set.
    pub api_key: Option<String>,
    /// Lifetime of cached `"ok"` responses. `0` (the default) disables the
    /// cache, so every user action reaches the network.
    pub cache_ttl_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            base_url: "https://newsapi.org/v2".to_string(),
            country: "in".to_string(),
            page_size: 10,
            api_key: None,
            cache_ttl_secs: 0,
        }
    }
}

impl NetworkConfig {
    /// Resolve the API key: config first, then the environment at run time,
    /// then the environment the binary was built with.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty()))
            .or_else(|| option_env!("NEWS_API_KEY").map(str::to_string))
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub log_directory: Option<String>,
    /// Per-module overrides, e.g. `{"tui_news_app::api": "debug"}`.
    pub module_levels: BTreeMap<String, String>,
    /// Emit debug timings for cache lookups and frame rendering.
    pub enable_performance_metrics: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_directory: None,
            module_levels: BTreeMap::new(),
            enable_performance_metrics: false,
        }
    }
}

impl LoggingConfig {
    /// `EnvFilter` directives built from the configured levels.
    pub fn filter_directives(&self) -> String {
        let mut filter = self.level.clone();
        for (module, level) in &self.module_levels {
            filter.push_str(&format!(",{}={}", module, level));
        }
        filter
    }
}

impl AppConfig {
    /// Load `config.ron` from the working directory or next to the executable,
    /// falling back to defaults.
    pub fn load() -> Self {
        let mut candidates = vec![PathBuf::from("config.ron")];

        if let Ok(exe) = std::env::current_exe()
            && let Some(dir) = exe.parent()
        {
            candidates.push(dir.join("config.ron"));
        }

        for path in candidates.iter().filter(|p| p.exists()) {
            match Self::load_from(path) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    return config;
                }
                Err(e) => {
                    tracing::error!("Failed to load config at {}: {:#}", path.display(), e);
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Self::default()
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        ron::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }
}
