//! Shared types for the PADDOCK simulator.
//!
//! Bet types, combination keys, wagers and evaluation results are used by
//! both the payout table builder and the bet evaluator. The combination key
//! format is defined once, here, so historical payouts and simulated tickets
//! always produce identical keys for the same selection.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::storage::CacheError;

// ---------------------------------------------------------------------------
// Bet type
// ---------------------------------------------------------------------------

/// Wager category.
///
/// Declaration order matches the numeric codes used by the payout data, so
/// the derived `Ord` sorts tables the same way the source does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "BetTypeRepr")]
pub enum BetType {
    /// 単勝: first place.
    Win,
    /// 複勝: top two or three.
    Place,
    /// 馬連: first two, any order.
    Quinella,
    /// 馬単: first two, exact order.
    Exacta,
    /// ワイド: two horses both in the top three.
    Wide,
    /// 3連複: first three, any order.
    Trio,
    /// 3連単: first three, exact order.
    Trifecta,
    Undefined,
}

impl BetType {
    /// Every variant, including `Undefined`.
    pub const ALL: &'static [BetType] = &[
        BetType::Win,
        BetType::Place,
        BetType::Quinella,
        BetType::Exacta,
        BetType::Wide,
        BetType::Trio,
        BetType::Trifecta,
        BetType::Undefined,
    ];

    /// Types that can be wagered on and appear in payout records.
    pub const WAGERABLE: &'static [BetType] = &[
        BetType::Win,
        BetType::Place,
        BetType::Quinella,
        BetType::Exacta,
        BetType::Wide,
        BetType::Trio,
        BetType::Trifecta,
    ];

    /// Numeric code used by the historical data.
    pub fn code(self) -> u8 {
        match self {
            BetType::Win => 1,
            BetType::Place => 2,
            BetType::Quinella => 3,
            BetType::Exacta => 4,
            BetType::Wide => 5,
            BetType::Trio => 6,
            BetType::Trifecta => 7,
            BetType::Undefined => 9,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        BetType::ALL.iter().copied().find(|t| t.code() == code)
    }

    /// Number of horses in a selection. `None` for `Undefined`.
    pub fn arity(self) -> Option<usize> {
        match self {
            BetType::Win | BetType::Place => Some(1),
            BetType::Quinella | BetType::Exacta | BetType::Wide => Some(2),
            BetType::Trio | BetType::Trifecta => Some(3),
            BetType::Undefined => None,
        }
    }

    /// Whether the order of the selection matters.
    ///
    /// Order-insensitive selections are sorted ascending before keying.
    pub fn is_order_sensitive(self) -> bool {
        !matches!(self, BetType::Quinella | BetType::Wide | BetType::Trio)
    }

    /// Number of payout slots a race record carries for this type.
    pub fn slot_count(self) -> usize {
        match self {
            BetType::Win => 3,
            BetType::Place => 5,
            BetType::Quinella => 3,
            BetType::Exacta => 6,
            BetType::Wide => 7,
            BetType::Trio => 3,
            BetType::Trifecta => 6,
            BetType::Undefined => 0,
        }
    }
}

impl fmt::Display for BetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BetType::Win => "Win",
            BetType::Place => "Place",
            BetType::Quinella => "Quinella",
            BetType::Exacta => "Exacta",
            BetType::Wide => "Wide",
            BetType::Trio => "Trio",
            BetType::Trifecta => "Trifecta",
            BetType::Undefined => "Undefined",
        };
        f.pad(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown bet type: {0}")]
pub struct ParseBetTypeError(pub String);

/// Parse a bet type from its name (case-insensitive) or numeric code.
impl std::str::FromStr for BetType {
    type Err = ParseBetTypeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(code) = trimmed.parse::<u8>() {
            return BetType::from_code(code).ok_or_else(|| ParseBetTypeError(s.to_string()));
        }
        BetType::ALL
            .iter()
            .copied()
            .find(|t| t.to_string().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseBetTypeError(s.to_string()))
    }
}

/// Wire form accepted when deserializing: a name or a numeric code.
#[derive(Deserialize)]
#[serde(untagged)]
enum BetTypeRepr {
    Code(u8),
    Name(String),
}

impl TryFrom<BetTypeRepr> for BetType {
    type Error = ParseBetTypeError;

    fn try_from(repr: BetTypeRepr) -> std::result::Result<Self, Self::Error> {
        match repr {
            BetTypeRepr::Code(code) => {
                BetType::from_code(code).ok_or_else(|| ParseBetTypeError(code.to_string()))
            }
            BetTypeRepr::Name(name) => name.parse(),
        }
    }
}

// ---------------------------------------------------------------------------
// Combination key
// ---------------------------------------------------------------------------

/// Canonical lookup key for a selection, e.g. `"0307"` for horses 3 and 7.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CombinationKey(String);

/// Highest horse number that fits the two-digit key width.
pub const MAX_HORSE_NUMBER: u8 = 99;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    #[error("bet type Undefined has no selection format")]
    UndefinedBetType,

    #[error("{bet_type} takes {expected} horse(s), got {actual}")]
    Arity {
        bet_type: BetType,
        expected: usize,
        actual: usize,
    },

    #[error("horse number {0} does not fit in two digits")]
    HorseOutOfRange(u8),
}

impl CombinationKey {
    /// Build the key for a selection: canonical order, each horse
    /// zero-padded to two digits, concatenated.
    pub fn new(bet_type: BetType, selection: &[u8]) -> std::result::Result<Self, KeyError> {
        let expected = bet_type.arity().ok_or(KeyError::UndefinedBetType)?;
        if selection.len() != expected {
            return Err(KeyError::Arity {
                bet_type,
                expected,
                actual: selection.len(),
            });
        }
        if let Some(&horse) = selection.iter().find(|&&h| h > MAX_HORSE_NUMBER) {
            return Err(KeyError::HorseOutOfRange(horse));
        }

        let key = canonical_selection(bet_type, selection)
            .iter()
            .map(|h| format!("{h:02}"))
            .collect::<String>();
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CombinationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The selection in the order it is keyed by: sorted ascending for
/// order-insensitive types, unchanged otherwise.
pub fn canonical_selection(bet_type: BetType, selection: &[u8]) -> Vec<u8> {
    let mut horses = selection.to_vec();
    if !bet_type.is_order_sensitive() {
        horses.sort_unstable();
    }
    horses
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

/// A single simulated ticket.
///
/// Also accepts the legacy field names `comb` and `amount`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wager {
    #[serde(rename = "type", alias = "bet_type")]
    pub bet_type: BetType,
    #[serde(alias = "comb")]
    pub selection: Vec<u8>,
    #[serde(alias = "amount")]
    pub stake: Decimal,
}

impl Wager {
    pub fn new(bet_type: BetType, selection: Vec<u8>, stake: Decimal) -> Self {
        Self {
            bet_type,
            selection,
            stake,
        }
    }
}

impl fmt::Display for Wager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let horses: Vec<String> = self.selection.iter().map(|h| h.to_string()).collect();
        write!(f, "{} {} x{}", self.bet_type, horses.join("-"), self.stake)
    }
}

/// All tickets placed on one race.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetOrder {
    pub race_key: String,
    #[serde(alias = "votes")]
    pub wagers: Vec<Wager>,
}

impl BetOrder {
    pub fn new(race_key: impl Into<String>) -> Self {
        Self {
            race_key: race_key.into(),
            wagers: Vec::new(),
        }
    }

    pub fn with_wager(mut self, wager: Wager) -> Self {
        self.wagers.push(wager);
        self
    }

    pub fn total_stake(&self) -> Decimal {
        self.wagers.iter().map(|w| w.stake).sum()
    }
}

// ---------------------------------------------------------------------------
// Evaluation result
// ---------------------------------------------------------------------------

/// Outcome of one wager against the payout table.
///
/// Money fields serialize as decimal strings so results files stay exact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub race_key: String,
    pub bet_type: BetType,
    pub combination: CombinationKey,
    #[serde(with = "rust_decimal::serde::str")]
    pub stake: Decimal,
    /// Amount returned; zero for a losing ticket.
    #[serde(with = "rust_decimal::serde::str")]
    pub payout: Decimal,
    /// `payout - stake`
    #[serde(with = "rust_decimal::serde::str")]
    pub net: Decimal,
}

impl EvaluationResult {
    pub fn is_hit(&self) -> bool {
        self.payout > Decimal::ZERO
    }
}

impl fmt::Display for EvaluationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {} stake={} payout={} net={}",
            self.race_key, self.bet_type, self.combination, self.stake, self.payout, self.net,
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for PADDOCK.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("Source schema error (race {race_key}): {message}")]
    SourceSchema { race_key: String, message: String },

    #[error("Source query error: {0}")]
    Source(#[from] sqlx::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Invalid wager #{index} for race {race_key}: {reason}")]
    InvalidWager {
        race_key: String,
        index: usize,
        reason: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SimError>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
