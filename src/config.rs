use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::models::RankingType;
use crate::pagination::PAGE_SIZE;
use crate::paths::{PathResolver, DEFAULT_PATH_TEMPLATES};
use crate::region::DEFAULT_REGION;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Deployment root the candidate paths resolve against.
    pub base_url: String,
    /// Unpacked bundle on disk; takes precedence over `base_url` when set.
    pub data_dir: Option<PathBuf>,
    pub language: String,
    pub ranking_type: RankingType,
    pub default_region: String,
    pub page_size: usize,
    pub cache_ttl_secs: u64,
    pub request_timeout_secs: u64,
    pub path_templates: Vec<String>,
    pub extra_path_templates: Vec<String>,
    pub scroll_debounce_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5173/".to_string(),
            data_dir: None,
            language: "en".to_string(),
            ranking_type: RankingType::Total,
            default_region: DEFAULT_REGION.to_string(),
            page_size: PAGE_SIZE,
            cache_ttl_secs: 300,
            request_timeout_secs: 30,
            path_templates: DEFAULT_PATH_TEMPLATES.iter().map(|t| t.to_string()).collect(),
            extra_path_templates: Vec::new(),
            scroll_debounce_ms: 250,
        }
    }
}

impl AppConfig {
    /// `~/.airank`
    pub fn app_data_dir() -> Result<PathBuf, ConfigError> {
        let home = dirs_next::home_dir().ok_or(ConfigError::NoHome)?;
        Ok(home.join(".airank"))
    }

    /// Reads `~/.airank/config.json` if present, then applies `AIRANK_*` overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::app_data_dir()?.join("config.json");
        let mut config = Self::from_file(&path)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Defaults when `path` does not exist.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base) = lookup("AIRANK_BASE_URL") {
            self.base_url = base;
        }
        if let Some(dir) = lookup("AIRANK_DATA_DIR") {
            self.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(lang) = lookup("AIRANK_LANGUAGE") {
            self.language = lang;
        }
        if let Some(raw) = lookup("AIRANK_PAGE_SIZE") {
            match raw.parse::<usize>() {
                Ok(n) if n > 0 => self.page_size = n,
                _ => tracing::warn!(value = %raw, "ignoring invalid AIRANK_PAGE_SIZE"),
            }
        }
        if let Some(raw) = lookup("AIRANK_CACHE_TTL_SECS") {
            match raw.parse::<u64>() {
                Ok(n) => self.cache_ttl_secs = n,
                Err(_) => tracing::warn!(value = %raw, "ignoring invalid AIRANK_CACHE_TTL_SECS"),
            }
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn scroll_debounce(&self) -> Duration {
        Duration::from_millis(self.scroll_debounce_ms)
    }

    pub fn path_resolver(&self) -> PathResolver {
        PathResolver::new(self.path_templates.iter().cloned())
            .with_extra(self.extra_path_templates.iter().cloned())
    }
}
