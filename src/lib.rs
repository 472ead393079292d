//! PADDOCK — Horse-race ticket P&L simulator
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod payout;
pub mod source;
pub mod storage;
pub mod engine;
pub mod backtest;
