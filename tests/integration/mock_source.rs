//! Mock historical source for integration testing.
//!
//! Provides a deterministic `HistoricalSource` implementation that serves
//! known race records from memory and counts how often it was queried.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use paddock::payout::builder::{RawRaceRecord, RawSlot};
use paddock::source::HistoricalSource;
use paddock::types::{BetType, Result, SimError};

/// An in-memory payout source.
///
/// Clones share the fetch counter and forced error, so a test can keep a
/// handle after boxing one into a loader.
#[derive(Clone)]
pub struct MockSource {
    races: Vec<RawRaceRecord>,
    fetches: Arc<AtomicUsize>,
    /// If set, `fetch_races` fails with a schema error carrying this message.
    force_error: Arc<Mutex<Option<String>>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::with_races(Self::default_races())
    }

    pub fn with_races(races: Vec<RawRaceRecord>) -> Self {
        Self {
            races,
            fetches: Arc::new(AtomicUsize::new(0)),
            force_error: Arc::new(Mutex::new(None)),
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn set_error(&self, msg: &str) {
        *self.force_error.lock().unwrap() = Some(msg.to_string());
    }

    /// Two races with a full spread of paid bet types.
    fn default_races() -> Vec<RawRaceRecord> {
        vec![
            RawRaceRecord {
                race_key: "R1".to_string(),
                slots: vec![
                    RawSlot::new(BetType::Win, 1, &[5], 250),
                    RawSlot::new(BetType::Win, 2, &[0], 0),
                    RawSlot::new(BetType::Place, 1, &[5], 120),
                    RawSlot::new(BetType::Place, 2, &[3], 180),
                    RawSlot::new(BetType::Place, 3, &[7], 450),
                    RawSlot::new(BetType::Quinella, 1, &[7, 3], 1200),
                    RawSlot::new(BetType::Exacta, 1, &[5, 3], 1870),
                    RawSlot::new(BetType::Wide, 1, &[3, 5], 390),
                    RawSlot::new(BetType::Wide, 2, &[7, 5], 1010),
                    RawSlot::new(BetType::Wide, 3, &[7, 3], 1460),
                    RawSlot::new(BetType::Trio, 1, &[7, 5, 3], 3320),
                    RawSlot::new(BetType::Trifecta, 1, &[5, 3, 7], 12840),
                ],
            },
            RawRaceRecord {
                race_key: "R2".to_string(),
                slots: vec![
                    RawSlot::new(BetType::Win, 1, &[11], 3560),
                    RawSlot::new(BetType::Quinella, 1, &[11, 2], 8830),
                ],
            },
        ]
    }
}

#[async_trait]
impl HistoricalSource for MockSource {
    async fn fetch_races(&self) -> Result<Vec<RawRaceRecord>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(msg) = self.force_error.lock().unwrap().clone() {
            return Err(SimError::SourceSchema {
                race_key: "mock".to_string(),
                message: msg,
            });
        }
        Ok(self.races.clone())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
