//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! The database connection string is referenced by env-var name in the
//! config and resolved at runtime.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

use crate::engine::loader::{CacheFailurePolicy, LoadOptions};
use crate::source::{jrdb, SourceKind};
use crate::storage::FileCache;

/// Env var that forces the cache to be bypassed when set.
pub const NO_CACHE_ENV: &str = "PADDOCK_NO_CACHE";

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub source: SourceConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    pub simulation: SimulationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    pub kind: SourceKind,
    #[serde(default = "default_database_url_env")]
    pub database_url_env: String,
    #[serde(default = "default_table")]
    pub table: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Cache file; defaults to the system temp directory.
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub on_failure: CacheFailurePolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
            on_failure: CacheFailurePolicy::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SimulationConfig {
    pub orders_file: PathBuf,
    /// Where to write per-wager results as JSON. Not written if unset.
    #[serde(default)]
    pub results_file: Option<PathBuf>,
}

fn default_database_url_env() -> String {
    "DB_STRING".to_string()
}

fn default_table() -> String {
    jrdb::DEFAULT_TABLE.to_string()
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }

    /// The configured cache, or `None` when caching is disabled.
    pub fn file_cache(&self) -> Option<FileCache> {
        if !self.cache.enabled {
            return None;
        }
        Some(match &self.cache.path {
            Some(path) => FileCache::new(path),
            None => FileCache::in_temp_dir(),
        })
    }

    /// Loader options. `no_cache` comes from the caller (env or flag).
    pub fn load_options(&self, no_cache: bool) -> LoadOptions {
        LoadOptions {
            no_cache,
            on_cache_failure: self.cache.on_failure,
        }
    }
}
