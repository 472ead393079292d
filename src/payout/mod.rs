//! Normalized payout table.
//!
//! One entry per (race, bet type, winning combination), holding the payout
//! per 100 units staked. Built once by [`builder`], read-only afterwards.

pub mod builder;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::types::{BetType, CombinationKey};

/// Composite lookup key. Sorts by race, then bet type code, then combination.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PayoutKey {
    pub race_key: String,
    pub bet_type: BetType,
    pub combination: CombinationKey,
}

/// A single paid combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutRecord {
    pub race_key: String,
    pub bet_type: BetType,
    pub combination: CombinationKey,
    /// Payout per 100 units staked.
    #[serde(with = "rust_decimal::serde::str")]
    pub payout: Decimal,
}

/// Immutable lookup table of paid combinations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<PayoutRecord>", into = "Vec<PayoutRecord>")]
pub struct PayoutTable {
    entries: BTreeMap<PayoutKey, Decimal>,
}

impl PayoutTable {
    /// Payout per 100 staked for a combination, if it was paid.
    pub fn get(
        &self,
        race_key: &str,
        bet_type: BetType,
        combination: &CombinationKey,
    ) -> Option<Decimal> {
        let key = PayoutKey {
            race_key: race_key.to_string(),
            bet_type,
            combination: combination.clone(),
        };
        self.entries.get(&key).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct races with at least one paid combination.
    pub fn race_count(&self) -> usize {
        self.entries
            .keys()
            .map(|k| k.race_key.as_str())
            .collect::<BTreeSet<_>>()
            .len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PayoutKey, &Decimal)> {
        self.entries.iter()
    }

    /// All entries as owned records, in table order.
    pub fn records(&self) -> Vec<PayoutRecord> {
        self.entries
            .iter()
            .map(|(k, payout)| PayoutRecord {
                race_key: k.race_key.clone(),
                bet_type: k.bet_type,
                combination: k.combination.clone(),
                payout: *payout,
            })
            .collect()
    }

    /// Insert a record unless its key is already present.
    /// Returns false (and leaves the table unchanged) on a duplicate key.
    pub(crate) fn insert_new(&mut self, record: PayoutRecord) -> bool {
        let key = PayoutKey {
            race_key: record.race_key,
            bet_type: record.bet_type,
            combination: record.combination,
        };
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, record.payout);
        true
    }
}

impl From<Vec<PayoutRecord>> for PayoutTable {
    fn from(records: Vec<PayoutRecord>) -> Self {
        records.into_iter().collect()
    }
}

impl From<PayoutTable> for Vec<PayoutRecord> {
    fn from(table: PayoutTable) -> Self {
        table.records()
    }
}

impl FromIterator<PayoutRecord> for PayoutTable {
    fn from_iter<I: IntoIterator<Item = PayoutRecord>>(iter: I) -> Self {
        let mut table = PayoutTable::default();
        for record in iter {
            table.insert_new(record);
        }
        table
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
