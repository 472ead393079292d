//! Payout table builder.
//!
//! Flattens wide per-race records (a fixed number of numbered payout slots
//! per bet type) into the long-format [`PayoutTable`]. Slots with no
//! positive payout are not winning combinations and are skipped. Any slot
//! that is structurally malformed aborts the whole build.

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use super::{PayoutRecord, PayoutTable};
use crate::types::{BetType, CombinationKey, Result, SimError, MAX_HORSE_NUMBER};

// ---------------------------------------------------------------------------
// Raw input
// ---------------------------------------------------------------------------

/// One race as read from the historical source, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRaceRecord {
    pub race_key: String,
    pub slots: Vec<RawSlot>,
}

/// One numbered payout slot, e.g. the 2nd place payout.
///
/// Fields are nullable because source columns are.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSlot {
    pub bet_type: BetType,
    /// 1-based slot number within the bet type.
    pub index: usize,
    pub horses: Vec<Option<i64>>,
    /// Payout per 100 staked. Null counts as zero.
    pub payout: Option<i64>,
}

impl RawSlot {
    pub fn new(bet_type: BetType, index: usize, horses: &[i64], payout: i64) -> Self {
        Self {
            bet_type,
            index,
            horses: horses.iter().map(|h| Some(*h)).collect(),
            payout: Some(payout),
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Incremental builder, fed one race at a time.
#[derive(Debug, Default)]
pub struct PayoutTableBuilder {
    table: PayoutTable,
    rows: usize,
    skipped_slots: usize,
}

impl PayoutTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize one race into the table.
    ///
    /// Validates every slot of the row before inserting any of them, so a
    /// rejected row leaves the builder untouched.
    pub fn push_row(&mut self, row: RawRaceRecord) -> Result<()> {
        let mut emitted = Vec::new();
        let mut skipped = 0;
        for slot in &row.slots {
            match normalize_slot(&row.race_key, slot)? {
                Some(record) => emitted.push(record),
                None => skipped += 1,
            }
        }

        for record in emitted {
            let (bet_type, combination) = (record.bet_type, record.combination.clone());
            if !self.table.insert_new(record) {
                warn!(
                    race_key = %row.race_key,
                    %bet_type,
                    %combination,
                    "Duplicate payout combination, keeping first"
                );
            }
        }

        self.rows += 1;
        self.skipped_slots += skipped;
        Ok(())
    }

    /// Number of rows accepted so far.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Unpaid slots seen in accepted rows.
    pub fn skipped_slots(&self) -> usize {
        self.skipped_slots
    }

    pub fn finish(self) -> PayoutTable {
        info!(
            rows = self.rows,
            records = self.table.len(),
            skipped_slots = self.skipped_slots,
            "Payout table built"
        );
        self.table
    }
}

/// Build a payout table from raw race records.
///
/// Fails on the first malformed slot; no partial table is returned.
pub fn build<I>(rows: I) -> Result<PayoutTable>
where
    I: IntoIterator<Item = RawRaceRecord>,
{
    let mut builder = PayoutTableBuilder::new();
    for row in rows {
        builder.push_row(row)?;
    }
    Ok(builder.finish())
}

/// Turn one slot into a record, or `None` if it did not pay.
fn normalize_slot(race_key: &str, slot: &RawSlot) -> Result<Option<PayoutRecord>> {
    let schema_error = |message: String| SimError::SourceSchema {
        race_key: race_key.to_string(),
        message,
    };

    if slot.index == 0 || slot.index > slot.bet_type.slot_count() {
        return Err(schema_error(format!(
            "{} has no slot {} (expected 1..={})",
            slot.bet_type,
            slot.index,
            slot.bet_type.slot_count()
        )));
    }

    let payout = slot.payout.unwrap_or(0);
    if payout <= 0 {
        return Ok(None);
    }

    // slot_count() is zero for Undefined, so arity is always present here.
    let arity = slot.bet_type.arity().unwrap_or(0);
    if slot.horses.len() != arity {
        return Err(schema_error(format!(
            "{} slot {} has {} horse field(s), expected {}",
            slot.bet_type,
            slot.index,
            slot.horses.len(),
            arity
        )));
    }

    let mut horses = Vec::with_capacity(arity);
    for (pos, value) in slot.horses.iter().enumerate() {
        let horse = match value {
            Some(h) if (1..=i64::from(MAX_HORSE_NUMBER)).contains(h) => *h as u8,
            Some(h) => {
                return Err(schema_error(format!(
                    "{} slot {} horse {} out of range: {h}",
                    slot.bet_type,
                    slot.index,
                    pos + 1
                )))
            }
            None => {
                return Err(schema_error(format!(
                    "{} slot {} pays {payout} but horse {} is null",
                    slot.bet_type,
                    slot.index,
                    pos + 1
                )))
            }
        };
        horses.push(horse);
    }

    let combination = CombinationKey::new(slot.bet_type, &horses)
        .map_err(|e| schema_error(e.to_string()))?;

    debug!(race_key, bet_type = %slot.bet_type, %combination, payout, "Paid combination");

    Ok(Some(PayoutRecord {
        race_key: race_key.to_string(),
        bet_type: slot.bet_type,
        combination,
        payout: Decimal::from(payout),
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
