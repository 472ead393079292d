//! JRDB payout table adapter.
//!
//! Reads the HJC (払戻) table, one row per race, and maps its numbered
//! columns onto raw payout slots:
//!
//! - single-horse types: `win_{slot}`, `win_payout_{slot}`
//! - multi-horse types: `quinella_{slot}_{n}`, `quinella_payout_{slot}`
//!
//! Column naming lives only in this module.

use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::{debug, info};

use super::HistoricalSource;
use crate::payout::builder::{RawRaceRecord, RawSlot};
use crate::types::{BetType, Result, SimError};

/// Default JRDB payout table name.
pub const DEFAULT_TABLE: &str = "d_jrdb_HJC";

const RACE_KEY_COLUMN: &str = "race_key";

pub struct JrdbSource {
    pool: SqlitePool,
    table: String,
}

impl JrdbSource {
    /// Create a source without connecting; the pool connects on first query.
    pub fn connect_lazy(database_url: &str, table: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_lazy(database_url)?;
        Self::with_pool(pool, table)
    }

    /// Use an existing pool.
    pub fn with_pool(pool: SqlitePool, table: &str) -> Result<Self> {
        validate_table_name(table)?;
        Ok(Self {
            pool,
            table: table.to_string(),
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

#[async_trait]
impl HistoricalSource for JrdbSource {
    async fn fetch_races(&self) -> Result<Vec<RawRaceRecord>> {
        info!(table = %self.table, "Loading payouts from JRDB");

        let sql = format!("SELECT * FROM {}", self.table);
        let mut rows = sqlx::query(&sql).fetch(&self.pool);
        let mut races = Vec::new();

        while let Some(row) = rows.try_next().await? {
            races.push(map_row(&row)?);
        }

        info!(races = races.len(), "JRDB payout rows read");
        Ok(races)
    }

    fn name(&self) -> &'static str {
        "jrdb"
    }
}

// ---------------------------------------------------------------------------
// Column mapping
// ---------------------------------------------------------------------------

fn column_prefix(bet_type: BetType) -> Option<&'static str> {
    match bet_type {
        BetType::Win => Some("win"),
        BetType::Place => Some("place"),
        BetType::Quinella => Some("quinella"),
        BetType::Exacta => Some("exacta"),
        BetType::Wide => Some("wide"),
        BetType::Trio => Some("trio"),
        BetType::Trifecta => Some("trifecta"),
        BetType::Undefined => None,
    }
}

fn payout_column(prefix: &str, slot: usize) -> String {
    format!("{prefix}_payout_{slot}")
}

fn horse_columns(prefix: &str, slot: usize, arity: usize) -> Vec<String> {
    if arity == 1 {
        vec![format!("{prefix}_{slot}")]
    } else {
        (1..=arity).map(|n| format!("{prefix}_{slot}_{n}")).collect()
    }
}

/// Every slot column the adapter reads, in table order.
pub fn expected_columns() -> Vec<String> {
    let mut columns = Vec::new();
    for &bet_type in BetType::WAGERABLE {
        let (Some(prefix), Some(arity)) = (column_prefix(bet_type), bet_type.arity()) else {
            continue;
        };
        for slot in 1..=bet_type.slot_count() {
            columns.extend(horse_columns(prefix, slot, arity));
            columns.push(payout_column(prefix, slot));
        }
    }
    columns
}

fn map_row(row: &SqliteRow) -> Result<RawRaceRecord> {
    let race_key: String = row.try_get(RACE_KEY_COLUMN).map_err(|e| column_error("?", e))?;
    let mut slots = Vec::new();

    for &bet_type in BetType::WAGERABLE {
        let (Some(prefix), Some(arity)) = (column_prefix(bet_type), bet_type.arity()) else {
            continue;
        };
        for index in 1..=bet_type.slot_count() {
            let payout = read_int(row, &race_key, &payout_column(prefix, index))?;
            let horses = horse_columns(prefix, index, arity)
                .iter()
                .map(|column| read_int(row, &race_key, column))
                .collect::<Result<Vec<_>>>()?;
            slots.push(RawSlot {
                bet_type,
                index,
                horses,
                payout,
            });
        }
    }

    debug!(race_key = %race_key, slots = slots.len(), "Mapped JRDB row");
    Ok(RawRaceRecord { race_key, slots })
}

/// Tables written by dataframe exports store nullable integer columns as
/// REAL, so whole-valued floats are accepted as well.
fn read_int(row: &SqliteRow, race_key: &str, column: &str) -> Result<Option<i64>> {
    match row.try_get::<Option<i64>, _>(column) {
        Ok(value) => Ok(value),
        Err(sqlx::Error::ColumnDecode { .. }) => {
            let value = row
                .try_get::<Option<f64>, _>(column)
                .map_err(|e| column_error(race_key, e))?;
            value
                .map(|v| {
                    whole_number(v).ok_or_else(|| SimError::SourceSchema {
                        race_key: race_key.to_string(),
                        message: format!("column {column} holds non-integer value {v}"),
                    })
                })
                .transpose()
        }
        Err(e) => Err(column_error(race_key, e)),
    }
}

fn whole_number(value: f64) -> Option<i64> {
    let in_range = value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64;
    in_range.then(|| value as i64)
}

/// Missing or mistyped columns are schema problems; anything else is a
/// query failure.
fn column_error(race_key: &str, err: sqlx::Error) -> SimError {
    match err {
        sqlx::Error::ColumnNotFound(column) => SimError::SourceSchema {
            race_key: race_key.to_string(),
            message: format!("missing column {column}"),
        },
        sqlx::Error::ColumnDecode { index, source } => SimError::SourceSchema {
            race_key: race_key.to_string(),
            message: format!("column {index} has an unexpected type: {source}"),
        },
        other => SimError::Source(other),
    }
}

/// The table name is interpolated into SQL, so only plain identifiers pass.
fn validate_table_name(table: &str) -> Result<()> {
    let valid = !table.is_empty()
        && !table.starts_with(|c: char| c.is_ascii_digit())
        && table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(SimError::Config(format!("invalid source table name: {table:?}")))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
