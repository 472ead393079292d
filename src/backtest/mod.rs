//! Simulation runs over historical payouts.
//!
//! Reads simulated orders from disk, evaluates them and writes per-wager
//! results back out.

pub mod report;

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};

use crate::engine::evaluator::BetEvaluator;
use crate::types::{BetOrder, EvaluationResult};

use report::SimulationReport;

/// Outcome of one simulation run.
#[derive(Debug, Clone)]
pub struct SimulationRun {
    pub results: Vec<EvaluationResult>,
    pub report: SimulationReport,
}

/// Evaluate orders and summarise the results.
pub fn run(evaluator: &BetEvaluator, orders: &[BetOrder]) -> Result<SimulationRun> {
    let results = evaluator
        .evaluate(orders)
        .context("Failed to evaluate orders")?;
    let report = SimulationReport::from_results(&results);
    info!(
        races = report.races,
        wagers = report.overall.wagers,
        hits = report.overall.hits,
        stake = %report.overall.stake,
        payout = %report.overall.payout,
        net = %report.overall.net,
        "Simulation complete"
    );
    Ok(SimulationRun { results, report })
}

/// Read orders from a JSON file.
pub fn load_orders(path: &Path) -> Result<Vec<BetOrder>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read orders from {}", path.display()))?;
    let orders: Vec<BetOrder> = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse orders from {}", path.display()))?;
    debug!(path = %path.display(), orders = orders.len(), "Orders loaded");
    Ok(orders)
}

/// Write per-wager results to a JSON file.
pub fn save_results(results: &[EvaluationResult], path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(results)
        .context("Failed to serialise results")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write results to {}", path.display()))?;
    info!(path = %path.display(), results = results.len(), "Results saved");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
