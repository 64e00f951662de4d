//! Configuration: TOML file, environment overrides and the local asset cache

pub mod repository;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::api::ResilienceConfig;
use crate::api::constants::{DEFAULT_ROOT_PARENT_ID, ENERGY_ATTRIBUTE_KEY};
use crate::energy::{DEFAULT_VARIABLE_CHUNK_SIZE, VariableTemplates};
use crate::hierarchy::DEFAULT_MAX_DEPTH;
use crate::pipeline::{EnergyOptions, VariableOptions};
use crate::sync::{DEFAULT_CHUNK_SIZE, SyncOptions};

/// Directory name under the platform config/data directories
pub const APP_DIR: &str = "assetsync";
const CONFIG_FILE: &str = "config.toml";
const CACHE_FILE: &str = "assets.db";

pub const ENV_API_URL: &str = "ASSETSYNC_API_URL";
pub const ENV_TOKEN: &str = "ASSETSYNC_TOKEN";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub sync: SyncConfig,
    pub energy: EnergyConfig,
    pub variables: VariablesConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Only ever read from the environment
    #[serde(skip)]
    pub token: Option<String>,
    pub timeout_secs: u64,
    /// 0 disables the limit
    pub max_concurrent_requests: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            token: None,
            timeout_secs: 15,
            max_concurrent_requests: 8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub chunk_size: usize,
    pub root_parent_id: String,
    pub max_depth: usize,
    pub chunk_concurrency: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            root_parent_id: DEFAULT_ROOT_PARENT_ID.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
            chunk_concurrency: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyConfig {
    pub attribute_key: String,
    pub update_concurrency: usize,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            attribute_key: ENERGY_ATTRIBUTE_KEY.to_string(),
            update_concurrency: 8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VariablesConfig {
    /// Adapter the variable topics are routed through; no variables without it
    pub adapter_id: Option<String>,
    pub chunk_size: usize,
    pub chunk_concurrency: usize,
    /// JSON template overrides per energy type
    pub templates: Option<PathBuf>,
}

impl Default for VariablesConfig {
    fn default() -> Self {
        Self {
            adapter_id: None,
            chunk_size: DEFAULT_VARIABLE_CHUNK_SIZE,
            chunk_concurrency: 1,
            templates: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Defaults to `<data_dir>/assetsync/assets.db`
    pub path: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

impl Config {
    /// `<config_dir>/assetsync/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load from `path`, or from the default location when `None`.
    ///
    /// An explicit path must exist; a missing default file yields defaults.
    /// Environment overrides are applied and the result validated.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => {
                    debug!("No config file found, using defaults");
                    Self::default()
                }
            },
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }

    /// Apply `ASSETSYNC_API_URL` / `ASSETSYNC_TOKEN` through `lookup`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.api.base_url = url;
        }
        if let Some(token) = lookup(ENV_TOKEN).filter(|v| !v.trim().is_empty()) {
            self.api.token = Some(token);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.sync.chunk_size == 0 {
            anyhow::bail!("sync.chunk_size must be greater than 0");
        }
        if self.sync.chunk_concurrency == 0 {
            anyhow::bail!("sync.chunk_concurrency must be greater than 0");
        }
        if self.sync.max_depth == 0 {
            anyhow::bail!("sync.max_depth must be greater than 0");
        }
        if self.energy.attribute_key.trim().is_empty() {
            anyhow::bail!("energy.attribute_key must not be empty");
        }
        if self.variables.chunk_size == 0 {
            anyhow::bail!("variables.chunk_size must be greater than 0");
        }
        if self.variables.chunk_concurrency == 0 {
            anyhow::bail!("variables.chunk_concurrency must be greater than 0");
        }
        Ok(())
    }

    /// Base URL and token, required by every command that talks to the service
    pub fn credentials(&self) -> Result<(&str, &str)> {
        if self.api.base_url.trim().is_empty() {
            anyhow::bail!(
                "No asset service URL configured (set api.base_url or {})",
                ENV_API_URL
            );
        }
        let token = self
            .api
            .token
            .as_deref()
            .with_context(|| format!("No access token found (set {})", ENV_TOKEN))?;
        Ok((&self.api.base_url, token))
    }

    pub fn resilience(&self) -> ResilienceConfig {
        ResilienceConfig::builder()
            .timeout(Duration::from_secs(self.api.timeout_secs))
            .max_concurrent_requests(self.api.max_concurrent_requests)
            .enable_concurrency_limiting(self.api.max_concurrent_requests > 0)
            .build()
    }

    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            chunk_size: self.sync.chunk_size,
            root_parent_id: self.sync.root_parent_id.clone(),
            chunk_concurrency: self.sync.chunk_concurrency,
        }
    }

    pub fn energy_options(&self) -> EnergyOptions {
        EnergyOptions {
            attribute_key: self.energy.attribute_key.clone(),
            update_concurrency: self.energy.update_concurrency,
        }
    }

    /// Variable settings, `None` when no adapter is configured
    pub fn variable_options(&self) -> Result<Option<VariableOptions>> {
        let Some(adapter_id) = self.variables.adapter_id.as_deref().map(str::trim) else {
            return Ok(None);
        };
        if adapter_id.is_empty() {
            return Ok(None);
        }

        let templates = match &self.variables.templates {
            Some(path) => VariableTemplates::from_json_file(path)?,
            None => VariableTemplates::default(),
        };

        Ok(Some(VariableOptions {
            adapter_id: adapter_id.to_string(),
            templates,
            chunk_size: self.variables.chunk_size,
            chunk_concurrency: self.variables.chunk_concurrency,
        }))
    }

    /// Cache database location, `None` when disabled or no data dir exists
    pub fn cache_path(&self) -> Option<PathBuf> {
        if !self.cache.enabled {
            return None;
        }
        self.cache
            .path
            .clone()
            .or_else(|| dirs::data_dir().map(|dir| dir.join(APP_DIR).join(CACHE_FILE)))
    }
}
