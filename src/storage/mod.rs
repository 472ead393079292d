//! Payout table cache.
//!
//! Saves and restores the normalized payout table so repeated simulations
//! skip the source query. The cache is a pure speed-up: a table read back
//! from it is identical to the one that was stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, warn};

use crate::payout::PayoutTable;

/// Default cache file name, created in the system temp directory.
const DEFAULT_CACHE_FILE: &str = ".paddock_payouts.json";

/// Envelope format version. Files with any other version are ignored.
const CACHE_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache I/O failed for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to (de)serialise cached table: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("In-memory cache lock poisoned")]
    Poisoned,
}

/// Store for a single serialized payout table.
pub trait PayoutCache: Send + Sync {
    /// Return the cached table, or `None` if nothing usable is stored.
    fn get(&self) -> Result<Option<PayoutTable>, CacheError>;

    /// Replace the cached table.
    fn put(&self, table: &PayoutTable) -> Result<(), CacheError>;

    /// Where the cache lives, for logging.
    fn describe(&self) -> String;
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheEnvelope {
    version: u32,
    created_at: DateTime<Utc>,
    table: PayoutTable,
}

// ---------------------------------------------------------------------------
// File cache
// ---------------------------------------------------------------------------

/// JSON file cache.
#[derive(Debug, Clone)]
pub struct FileCache {
    path: PathBuf,
}

impl FileCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Cache file in the system temp directory.
    pub fn in_temp_dir() -> Self {
        Self::new(std::env::temp_dir().join(DEFAULT_CACHE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the cache file if present.
    pub fn clear(&self) -> Result<(), CacheError> {
        if self.path.exists() {
            std::fs::remove_file(&self.path).map_err(|e| self.io_error(e))?;
            info!(path = %self.path.display(), "Payout cache cleared");
        }
        Ok(())
    }

    fn io_error(&self, source: std::io::Error) -> CacheError {
        CacheError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl PayoutCache for FileCache {
    fn get(&self) -> Result<Option<PayoutTable>, CacheError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No payout cache on disk");
            return Ok(None);
        }

        let json = std::fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        let envelope: CacheEnvelope = serde_json::from_str(&json)?;

        if envelope.version != CACHE_VERSION {
            warn!(
                path = %self.path.display(),
                found = envelope.version,
                expected = CACHE_VERSION,
                "Ignoring payout cache with unknown version"
            );
            return Ok(None);
        }

        info!(
            path = %self.path.display(),
            records = envelope.table.len(),
            created_at = %envelope.created_at,
            "Payout table loaded from cache"
        );
        Ok(Some(envelope.table))
    }

    fn put(&self, table: &PayoutTable) -> Result<(), CacheError> {
        let envelope = CacheEnvelope {
            version: CACHE_VERSION,
            created_at: Utc::now(),
            table: table.clone(),
        };
        let json = serde_json::to_string(&envelope)?;

        // Write beside the target and rename so readers never see a torn file.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;

        debug!(path = %self.path.display(), records = table.len(), "Payout table cached");
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

// ---------------------------------------------------------------------------
// Memory cache
// ---------------------------------------------------------------------------

/// In-process cache, for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryCache {
    slot: Mutex<Option<PayoutTable>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a table already cached.
    pub fn with_table(table: PayoutTable) -> Self {
        Self {
            slot: Mutex::new(Some(table)),
        }
    }
}

impl PayoutCache for MemoryCache {
    fn get(&self) -> Result<Option<PayoutTable>, CacheError> {
        let slot = self.slot.lock().map_err(|_| CacheError::Poisoned)?;
        Ok(slot.clone())
    }

    fn put(&self, table: &PayoutTable) -> Result<(), CacheError> {
        let mut slot = self.slot.lock().map_err(|_| CacheError::Poisoned)?;
        *slot = Some(table.clone());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
