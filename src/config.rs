use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub catalog: CatalogConfig,

    pub streaming: StreamingConfig,

    pub content: ContentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// JSON file holding lists, ratings, manual entries and preferences.
    pub storage_path: String,

    pub log_level: String,

    /// "pretty" or "json"
    pub log_format: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Language used when none has been chosen yet.
    pub default_language: String,

    /// Maximum number of cached log entries kept in storage.
    pub log_book_capacity: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            storage_path: "data/allnime.json".to_string(),
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            worker_threads: 2,
            default_language: "en".to_string(),
            log_book_capacity: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub jikan_url: String,

    pub anilist_url: String,

    /// Request timeout in seconds (default: 10)
    pub request_timeout_seconds: u64,

    pub search_limit: u32,

    pub user_agent: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            jikan_url: "https://api.jikan.moe/v4".to_string(),
            anilist_url: "https://graphql.anilist.co".to_string(),
            request_timeout_seconds: 10,
            search_limit: 10,
            user_agent: "AllNime/1.0".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    pub enabled: bool,

    /// Candidate aggregator base URLs, probed in order.
    pub endpoints: Vec<String>,

    /// How long a responsive endpoint stays preferred (default: 300)
    pub healthy_endpoint_ttl_seconds: u64,

    /// Request timeout in seconds (default: 8)
    pub request_timeout_seconds: u64,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoints: vec!["https://api.consumet.org/anime/gogoanime".to_string()],
            healthy_endpoint_ttl_seconds: 300,
            request_timeout_seconds: 8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Show titles whose genres match `blocked_genres`.
    pub allow_adult: bool,

    /// Treat a profile without a birthday as adult. Off by default.
    pub assume_adult_when_unknown: bool,

    /// Case-insensitive substrings matched against genre names.
    pub blocked_genres: Vec<String>,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            allow_adult: false,
            assume_adult_when_unknown: false,
            blocked_genres: vec!["Hentai".to_string(), "Erotica".to_string()],
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![Self::default_config_path()];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("allnime").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".allnime").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("allnime.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        Self::create_default_at(&Self::default_config_path())
    }

    /// Writes the default config to `path` unless a file is already there.
    pub fn create_default_at(path: &Path) -> Result<bool> {
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.general.storage_path.trim().is_empty() {
            anyhow::bail!("general.storage_path cannot be empty");
        }

        if !matches!(self.general.log_format.as_str(), "pretty" | "json") {
            anyhow::bail!(
                "general.log_format must be \"pretty\" or \"json\", got \"{}\"",
                self.general.log_format
            );
        }

        for (name, raw) in [
            ("catalog.jikan_url", &self.catalog.jikan_url),
            ("catalog.anilist_url", &self.catalog.anilist_url),
        ] {
            url::Url::parse(raw).with_context(|| format!("Invalid {name}: {raw}"))?;
        }

        if self.catalog.request_timeout_seconds == 0 || self.streaming.request_timeout_seconds == 0
        {
            anyhow::bail!("Request timeouts must be > 0 seconds");
        }

        if self.catalog.search_limit == 0 || self.catalog.search_limit > 25 {
            anyhow::bail!("catalog.search_limit must be between 1 and 25");
        }

        if self.streaming.enabled {
            if self.streaming.endpoints.is_empty() {
                anyhow::bail!("streaming.endpoints cannot be empty when streaming is enabled");
            }
            for endpoint in &self.streaming.endpoints {
                url::Url::parse(endpoint)
                    .with_context(|| format!("Invalid streaming endpoint: {endpoint}"))?;
            }
        }

        Ok(())
    }
}
