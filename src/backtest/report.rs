//! Simulation report.
//!
//! Aggregates per-wager evaluation results into totals: hit rate, return
//! percentage, and the worst peak-to-trough run of the cumulative P&L,
//! overall and per bet type.

use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::types::{BetType, EvaluationResult};

// ---------------------------------------------------------------------------
// Tally
// ---------------------------------------------------------------------------

/// Running totals for a group of wagers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Tally {
    pub wagers: usize,
    pub hits: usize,
    pub stake: Decimal,
    pub payout: Decimal,
    pub net: Decimal,
}

impl Tally {
    fn add(&mut self, result: &EvaluationResult) {
        self.wagers += 1;
        if result.is_hit() {
            self.hits += 1;
        }
        self.stake += result.stake;
        self.payout += result.payout;
        self.net += result.net;
    }

    /// Fraction of wagers that paid anything.
    pub fn hit_rate(&self) -> f64 {
        if self.wagers > 0 {
            self.hits as f64 / self.wagers as f64
        } else {
            0.0
        }
    }

    /// Payout as a percentage of stake (100 = break even).
    pub fn return_pct(&self) -> f64 {
        if self.stake > Decimal::ZERO {
            (self.payout / self.stake * dec!(100)).to_f64().unwrap_or(0.0)
        } else {
            0.0
        }
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "wagers={} hits={} ({:.1}%) stake={} payout={} net={} return={:.1}%",
            self.wagers,
            self.hits,
            self.hit_rate() * 100.0,
            self.stake,
            self.payout,
            self.net,
            self.return_pct(),
        )
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Summary of a simulation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SimulationReport {
    pub overall: Tally,
    pub by_bet_type: BTreeMap<BetType, Tally>,
    /// Distinct races wagered on.
    pub races: usize,
    /// Largest drop of cumulative net from a previous high, in input order.
    pub max_drawdown: Decimal,
    /// Largest single payout.
    pub best_payout: Decimal,
}

impl SimulationReport {
    pub fn from_results(results: &[EvaluationResult]) -> Self {
        let mut report = SimulationReport::default();
        let mut races = BTreeSet::new();
        let mut cumulative = Decimal::ZERO;
        let mut peak = Decimal::ZERO;

        for result in results {
            report.overall.add(result);
            report.by_bet_type.entry(result.bet_type).or_default().add(result);
            races.insert(result.race_key.as_str());

            cumulative += result.net;
            peak = peak.max(cumulative);
            report.max_drawdown = report.max_drawdown.max(peak - cumulative);
            report.best_payout = report.best_payout.max(result.payout);
        }

        report.races = races.len();
        report
    }
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "races={} {}", self.races, self.overall)?;
        for (bet_type, tally) in &self.by_bet_type {
            writeln!(f, "  {bet_type:<9} {tally}")?;
        }
        write!(
            f,
            "max_drawdown={} best_payout={}",
            self.max_drawdown, self.best_payout
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
