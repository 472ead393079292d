//! Core engine: load the payout table, then evaluate wagers against it.

pub mod loader;
pub mod evaluator;
