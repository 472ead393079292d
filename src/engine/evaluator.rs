//! Bet evaluator.
//!
//! Joins simulated wagers against the payout table. Each wager is
//! canonicalized exactly like the historical payouts were, looked up, and
//! scaled by its stake (payout rates are per 100 staked). A combination with
//! no payout record is a losing ticket, not an error.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};

use crate::payout::PayoutTable;
use crate::types::{BetOrder, CombinationKey, EvaluationResult, Result, SimError, Wager};

/// Stake unit the payout rates are quoted against.
const RATE_UNIT: Decimal = dec!(100);

/// Evaluates orders against a shared, read-only payout table.
///
/// Cheap to clone; clones share the table.
#[derive(Debug, Clone)]
pub struct BetEvaluator {
    table: Arc<PayoutTable>,
}

impl BetEvaluator {
    pub fn new(table: impl Into<Arc<PayoutTable>>) -> Self {
        Self {
            table: table.into(),
        }
    }

    pub fn table(&self) -> &PayoutTable {
        &self.table
    }

    /// Evaluate every wager of every order, in input order.
    ///
    /// All-or-nothing: the first invalid wager fails the whole batch.
    pub fn evaluate(&self, orders: &[BetOrder]) -> Result<Vec<EvaluationResult>> {
        let mut results = Vec::with_capacity(orders.iter().map(|o| o.wagers.len()).sum());

        for order in orders {
            for (index, wager) in order.wagers.iter().enumerate() {
                results.push(self.evaluate_wager(&order.race_key, index, wager)?);
            }
        }

        let hits = results.iter().filter(|r| r.is_hit()).count();
        info!(orders = orders.len(), wagers = results.len(), hits, "Orders evaluated");
        Ok(results)
    }

    /// Evaluate a single wager. `index` is its position within the order
    /// and is only used in error reports.
    pub fn evaluate_wager(
        &self,
        race_key: &str,
        index: usize,
        wager: &Wager,
    ) -> Result<EvaluationResult> {
        let invalid = |reason: String| SimError::InvalidWager {
            race_key: race_key.to_string(),
            index,
            reason,
        };

        let combination = validate(wager).map_err(invalid)?;
        let rate = self
            .table
            .get(race_key, wager.bet_type, &combination)
            .unwrap_or(Decimal::ZERO);
        let payout = rate
            .checked_mul(wager.stake)
            .map(|gross| gross / RATE_UNIT)
            .ok_or_else(|| invalid(format!("stake {} overflows payout", wager.stake)))?;

        debug!(
            race_key,
            bet_type = %wager.bet_type,
            %combination,
            stake = %wager.stake,
            %payout,
            "Wager evaluated"
        );

        Ok(EvaluationResult {
            race_key: race_key.to_string(),
            bet_type: wager.bet_type,
            combination,
            stake: wager.stake,
            payout,
            net: payout - wager.stake,
        })
    }
}

/// Check a wager and return its canonical key.
fn validate(wager: &Wager) -> std::result::Result<CombinationKey, String> {
    if wager.stake <= Decimal::ZERO {
        return Err(format!("stake must be positive, got {}", wager.stake));
    }
    if wager.selection.contains(&0) {
        return Err("horse number 0 is not a valid selection".to_string());
    }
    let distinct: BTreeSet<_> = wager.selection.iter().collect();
    if distinct.len() != wager.selection.len() {
        return Err(format!("selection repeats a horse: {:?}", wager.selection));
    }
    CombinationKey::new(wager.bet_type, &wager.selection).map_err(|e| e.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
