//! Historical payout sources.
//!
//! Defines the `HistoricalSource` trait. Adapters map an external schema to
//! [`RawRaceRecord`]s so the builder never sees source-specific naming.
//! - JRDB payout table (SQLite via sqlx)

pub mod jrdb;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::SourceConfig;
use crate::payout::builder::RawRaceRecord;
use crate::types::{Result, SimError};

/// Abstraction over historical payout data.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HistoricalSource: Send + Sync {
    /// Fetch every race with its raw payout slots.
    async fn fetch_races(&self) -> Result<Vec<RawRaceRecord>>;

    /// Source name for logging.
    fn name(&self) -> &'static str;
}

/// Supported source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Jrdb,
    /// JV-Link data. Recognised in config but not implemented.
    Jvlink,
}

/// Open the source described by the config.
///
/// The database URL is read from the environment variable the config names.
/// No connection is made until the first query.
pub fn open(cfg: &SourceConfig) -> Result<Box<dyn HistoricalSource>> {
    match cfg.kind {
        SourceKind::Jrdb => {
            let url = std::env::var(&cfg.database_url_env).map_err(|_| {
                SimError::Config(format!(
                    "Environment variable not set: {}",
                    cfg.database_url_env
                ))
            })?;
            Ok(Box::new(jrdb::JrdbSource::connect_lazy(&url, &cfg.table)?))
        }
        SourceKind::Jvlink => Err(SimError::Config(
            "source kind 'jvlink' is not supported".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source_config(kind: SourceKind, env: &str) -> SourceConfig {
        SourceConfig {
            kind,
            database_url_env: env.to_string(),
            table: "d_jrdb_HJC".to_string(),
        }
    }

    #[test]
    fn test_jvlink_not_supported() {
        let result = open(&source_config(SourceKind::Jvlink, "UNUSED"));
        assert!(matches!(result, Err(SimError::Config(_))));
    }

    #[test]
    fn test_missing_env_is_config_error() {
        let result = open(&source_config(SourceKind::Jrdb, "PADDOCK_TEST_UNSET_DB_URL_ENV"));
        match result {
            Err(SimError::Config(msg)) => assert!(msg.contains("PADDOCK_TEST_UNSET_DB_URL_ENV")),
            Err(other) => panic!("expected config error, got {other}"),
            Ok(_) => panic!("expected config error"),
        }
    }

    #[tokio::test]
    async fn test_open_jrdb_is_lazy() {
        std::env::set_var("PADDOCK_TEST_LAZY_DB_URL", "sqlite::memory:");
        let source = open(&source_config(SourceKind::Jrdb, "PADDOCK_TEST_LAZY_DB_URL")).unwrap();
        assert_eq!(source.name(), "jrdb");
    }

    #[test]
    fn test_source_kind_deserialize() {
        #[derive(Deserialize)]
        struct Wrapper {
            kind: SourceKind,
        }
        let w: Wrapper = toml::from_str("kind = \"jrdb\"").unwrap();
        assert_eq!(w.kind, SourceKind::Jrdb);
        assert!(toml::from_str::<Wrapper>("kind = \"csv\"").is_err());
    }
}
