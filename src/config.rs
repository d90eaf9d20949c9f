use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::{KeyedCache, NotFoundPolicy, SnapshotCache, MAX_TTL};
use crate::plates::{Plate, PlateType};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub remote: RemoteConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
  /// Base URL of the plate service (e.g., "https://imaging.example.org/api/")
  pub url: String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
  /// Requester identity used when none is given on the command line
  pub requester: Option<String>,
}

impl RemoteConfig {
  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.timeout_secs)
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  /// Maximum number of plates kept in memory
  pub capacity: usize,
  /// How long a cached plate stays fresh
  pub ttl_secs: u64,
  /// How long the plate-type list stays fresh
  pub plate_type_ttl_secs: u64,
  /// Remember "plate not found" answers for `ttl_secs`
  pub cache_not_found: bool,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      capacity: 1000,
      ttl_secs: 15 * 60,
      plate_type_ttl_secs: 15 * 60,
      cache_not_found: false,
    }
  }
}

impl CacheConfig {
  pub fn plate_cache(&self) -> Result<KeyedCache<Plate>> {
    let capacity =
      NonZeroUsize::new(self.capacity).ok_or_else(|| eyre!("cache.capacity must be at least 1"))?;
    let policy = if self.cache_not_found {
      NotFoundPolicy::Cache
    } else {
      NotFoundPolicy::PassThrough
    };

    Ok(KeyedCache::new(capacity, Duration::from_secs(self.ttl_secs)).with_not_found_policy(policy))
  }

  pub fn plate_type_cache(&self) -> SnapshotCache<PlateType> {
    SnapshotCache::new(Duration::from_secs(self.plate_type_ttl_secs))
  }

  fn validate(&self) -> Result<()> {
    if self.capacity == 0 {
      return Err(eyre!("cache.capacity must be at least 1"));
    }
    if self.ttl_secs == 0 || self.plate_type_ttl_secs == 0 {
      return Err(eyre!("cache TTLs must be greater than zero"));
    }
    let max = MAX_TTL.as_secs();
    if self.ttl_secs > max || self.plate_type_ttl_secs > max {
      return Err(eyre!("cache TTLs must be at most {} seconds", max));
    }
    Ok(())
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
  /// Also write logs to this file
  pub file: Option<PathBuf>,
}

fn default_timeout_secs() -> u64 {
  30
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./plate-cache.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/plate-cache/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/plate-cache/config.yaml"
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("plate-cache.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("plate-cache").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::from_yaml(&contents)
      .map_err(|e| eyre!("Invalid config file {}: {}", path.display(), e))
  }

  pub fn from_yaml(contents: &str) -> Result<Self> {
    let config: Config =
      serde_yaml::from_str(contents).map_err(|e| eyre!("Failed to parse config: {}", e))?;
    config.validate()?;
    Ok(config)
  }

  fn validate(&self) -> Result<()> {
    url::Url::parse(&self.remote.url)
      .map_err(|e| eyre!("remote.url {} is not a valid URL: {}", self.remote.url, e))?;
    if self.remote.timeout_secs == 0 {
      return Err(eyre!("remote.timeout_secs must be greater than zero"));
    }
    self.cache.validate()
  }

  /// Get the plate service token from the environment, if one is set.
  ///
  /// Checks PLATE_CACHE_API_TOKEN.
  pub fn get_api_token() -> Option<String> {
    std::env::var("PLATE_CACHE_API_TOKEN")
      .ok()
      .filter(|token| !token.is_empty())
  }
}
