//! Payout table loader.
//!
//! Returns the cached table when one is available, otherwise queries the
//! historical source, builds the table and refreshes the cache. The result
//! is the same table either way.

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::payout::builder;
use crate::payout::PayoutTable;
use crate::source::HistoricalSource;
use crate::storage::{CacheError, PayoutCache};
use crate::types::Result;

/// What to do when the cache cannot be read or written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheFailurePolicy {
    /// Log and carry on: rebuild from the source on a failed read, keep the
    /// freshly built table on a failed write.
    #[default]
    Rebuild,
    /// Surface the cache error to the caller.
    Abort,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Skip reading the cache. A configured cache is still refreshed.
    pub no_cache: bool,
    pub on_cache_failure: CacheFailurePolicy,
}

/// Where a loaded table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableOrigin {
    Cache,
    Source,
}

#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub table: PayoutTable,
    pub origin: TableOrigin,
}

pub struct PayoutLoader {
    source: Box<dyn HistoricalSource>,
    cache: Option<Box<dyn PayoutCache>>,
    options: LoadOptions,
}

impl PayoutLoader {
    pub fn new(source: Box<dyn HistoricalSource>) -> Self {
        Self {
            source,
            cache: None,
            options: LoadOptions::default(),
        }
    }

    pub fn with_cache(mut self, cache: Box<dyn PayoutCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_options(mut self, options: LoadOptions) -> Self {
        self.options = options;
        self
    }

    /// Load the payout table from the cache or the source.
    pub async fn load(&self) -> Result<LoadedTable> {
        if let Some(cache) = &self.cache {
            if self.options.no_cache {
                info!(cache = %cache.describe(), "Cache read bypassed");
            } else {
                match cache.get() {
                    Ok(Some(table)) => {
                        info!(
                            cache = %cache.describe(),
                            records = table.len(),
                            "Using cached payout table"
                        );
                        return Ok(LoadedTable {
                            table,
                            origin: TableOrigin::Cache,
                        });
                    }
                    Ok(None) => debug!(cache = %cache.describe(), "Cache miss"),
                    Err(e) => self.cache_failure("read", cache.as_ref(), e)?,
                }
            }
        }

        info!(source = self.source.name(), "Loading payouts from source");
        let rows = self.source.fetch_races().await?;
        let table = builder::build(rows)?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put(&table) {
                self.cache_failure("write", cache.as_ref(), e)?;
            }
        }

        Ok(LoadedTable {
            table,
            origin: TableOrigin::Source,
        })
    }

    fn cache_failure(&self, op: &str, cache: &dyn PayoutCache, err: CacheError) -> Result<()> {
        match self.options.on_cache_failure {
            CacheFailurePolicy::Rebuild => {
                warn!(op, cache = %cache.describe(), error = %err, "Payout cache failed, continuing");
                Ok(())
            }
            CacheFailurePolicy::Abort => Err(err.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
