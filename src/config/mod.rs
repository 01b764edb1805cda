//! Configuration management for orgmeta

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{Cache, CacheTtl, KeyPolicy, MemoryCache, SqliteCache};
use crate::client::{DataSets, DebugFlags};
use crate::error::{ConfigError, Result};

/// Environment variable overriding `heroku.api_key`
pub const HEROKU_API_KEY_ENV: &str = "HEROKU_API_KEY";

/// Library configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Object storage holding GitHub snapshots
    #[serde(default)]
    pub blob: BlobConfig,

    /// Heroku Platform API access
    #[serde(default)]
    pub heroku: HerokuConfig,

    /// Result caching
    #[serde(default)]
    pub cache: CacheConfig,

    /// Diagnostic output
    #[serde(default)]
    pub debug: DebugFlags,

    /// Skip all fetching; pipelines start empty
    #[serde(default)]
    pub offline: bool,
}

/// Object storage location of GitHub snapshots
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobConfig {
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// First path segment of the object keys
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Endpoint overrides per provider (e.g. a local S3-compatible store)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub endpoints: BTreeMap<String, String>,
}

fn default_provider() -> String {
    "s3".to_string()
}

fn default_bucket() -> String {
    "foxsec-metrics".to_string()
}

fn default_namespace() -> String {
    "github".to_string()
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            bucket: default_bucket(),
            namespace: default_namespace(),
            endpoints: BTreeMap::new(),
        }
    }
}

/// Heroku Platform API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HerokuConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// API key; `HEROKU_API_KEY` takes precedence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Items per page for list endpoints (1..=1000)
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Optional data sets to collect
    #[serde(default)]
    pub data_sets: DataSets,
}

fn default_api_url() -> String {
    crate::client::heroku::API_BASE_URL.to_string()
}

fn default_page_size() -> usize {
    crate::client::pagination::MAX_PAGE_SIZE
}

impl Default for HerokuConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: None,
            page_size: default_page_size(),
            data_sets: DataSets::default(),
        }
    }
}

impl HerokuConfig {
    /// Resolve the API key from the environment, then the file.
    pub fn resolve_api_key(&self) -> Result<String> {
        self.resolve_api_key_with(std::env::var(HEROKU_API_KEY_ENV).ok())
    }

    fn resolve_api_key_with(&self, env_key: Option<String>) -> Result<String> {
        env_key
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.api_key.clone())
            .ok_or_else(|| ConfigError::MissingApiKey.into())
    }
}

/// Which store backs the cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackend {
    Memory,
    #[default]
    Sqlite,
}

/// Result cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Caching is opt-in
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub backend: CacheBackend,

    /// SQLite cache directory (default: ~/.cache/orgmeta)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,

    /// Entry lifetime for the SQLite store
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    #[serde(default)]
    pub key_policy: KeyPolicy,
}

fn default_ttl_secs() -> u64 {
    CacheTtl::DEFAULT.as_secs()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            backend: CacheBackend::default(),
            dir: None,
            ttl_secs: default_ttl_secs(),
            key_policy: KeyPolicy::default(),
        }
    }
}

impl CacheConfig {
    /// Open the configured cache, or `None` when caching is disabled.
    pub fn open(&self) -> Result<Option<Arc<dyn Cache>>> {
        if !self.enabled {
            return Ok(None);
        }

        let cache: Arc<dyn Cache> = match self.backend {
            CacheBackend::Memory => Arc::new(MemoryCache::new()),
            CacheBackend::Sqlite => {
                let storage = match &self.dir {
                    Some(dir) => SqliteCache::open_at(dir)?,
                    None => SqliteCache::open()?,
                };
                Arc::new(storage.with_ttl(Duration::from_secs(self.ttl_secs)))
            }
        };
        Ok(Some(cache))
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::Invalid(
            "Could not determine home directory".to_string(),
        ))?;

        Ok(home.join(".orgmeta").join("config.yaml"))
    }

    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        Self::load_from(Self::default_path()?)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()).into());
        }

        let contents = std::fs::read_to_string(&path)?;
        let config: Config = serde_yaml::from_str(&contents).map_err(ConfigError::from)?;

        Ok(config)
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to(Self::default_path()?)
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents =
            serde_yaml::to_string(self).map_err(|e| ConfigError::SaveError(e.to_string()))?;

        std::fs::write(&path, contents)?;

        // The file may hold an API key
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&path)?.permissions();
            perms.set_mode(0o600);
            std::fs::set_permissions(&path, perms)?;
        }

        Ok(())
    }
}
