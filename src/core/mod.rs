//! Core traits, common domain types, and library-wide result/error structures.

use crate::market::Market;

pub mod types;

pub use types::*;

/// Common trait implemented by every priceable instrument.
pub trait Instrument: std::fmt::Debug {
    /// Returns a short type identifier for diagnostics.
    fn instrument_type(&self) -> &str;
}

/// Pricing engine abstraction over an instrument type.
///
/// This is the only surface a calibration layer needs from the finite-difference
/// machinery: a model value for given market inputs.
pub trait PricingEngine<I: Instrument> {
    /// Prices an instrument under the provided market state.
    fn price(&self, instrument: &I, market: &Market) -> Result<PricingResult, FdError>;
}

/// Compact key set for engine diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagKey {
    CflDtMax,
    NumSpaceSteps,
    NumStoppingTimes,
    NumTimeSteps,
    SMax,
    Vol,
}

impl DiagKey {
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CflDtMax => "cfl_dt_max",
            Self::NumSpaceSteps => "num_space_steps",
            Self::NumStoppingTimes => "num_stopping_times",
            Self::NumTimeSteps => "num_time_steps",
            Self::SMax => "s_max",
            Self::Vol => "vol",
        }
    }
}

impl std::str::FromStr for DiagKey {
    type Err = ();

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        match key {
            "cfl_dt_max" => Ok(Self::CflDtMax),
            "num_space_steps" => Ok(Self::NumSpaceSteps),
            "num_stopping_times" => Ok(Self::NumStoppingTimes),
            "num_time_steps" => Ok(Self::NumTimeSteps),
            "s_max" => Ok(Self::SMax),
            "vol" => Ok(Self::Vol),
            _ => Err(()),
        }
    }
}

/// Inline diagnostics storage used in [`PricingResult`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    entries: [Option<(DiagKey, f64)>; 6],
}

impl Diagnostics {
    pub const CAPACITY: usize = 6;

    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.iter().flatten().count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(Option::is_none)
    }

    /// Inserts or overwrites a value, returning the previous one.
    ///
    /// Every [`DiagKey`] variant fits, so the store never overflows.
    #[inline]
    pub fn insert_key(&mut self, key: DiagKey, value: f64) -> Option<f64> {
        for (entry_key, existing) in self.entries.iter_mut().flatten() {
            if *entry_key == key {
                let prev = *existing;
                *existing = value;
                return Some(prev);
            }
        }

        if let Some(slot) = self.entries.iter_mut().find(|entry| entry.is_none()) {
            *slot = Some((key, value));
        }
        None
    }

    #[inline]
    fn iter_entries(&self) -> impl Iterator<Item = &(DiagKey, f64)> {
        self.entries.iter().filter_map(Option::as_ref)
    }

    #[inline]
    pub fn get_key(&self, key: DiagKey) -> Option<f64> {
        self.iter_entries()
            .find_map(|(entry_key, value)| (*entry_key == key).then_some(*value))
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<f64> {
        self.get_key(key.parse().ok()?)
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.iter_entries().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Unified engine result payload.
#[derive(Debug, Clone)]
pub struct PricingResult {
    /// Present value.
    pub price: f64,
    /// Engine-specific scalar diagnostics.
    pub diagnostics: Diagnostics,
}

/// Errors surfaced by operators, schemes, the stepping driver and engines.
#[derive(Debug, Clone, PartialEq)]
pub enum FdError {
    /// Input validation error (bad scalars, empty grids, zero step counts).
    InvalidInput(String),
    /// Two sizes that must agree do not.
    SizeMismatch { expected: usize, found: usize },
    /// A step condition rejected the state at `time`.
    ConditionFailed { time: f64, reason: String },
    /// Numerical issue (no stability estimate, CFL violation, invalid grid).
    NumericalError(String),
}

impl std::fmt::Display for FdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Self::SizeMismatch { expected, found } => {
                write!(f, "size mismatch: expected {expected}, found {found}")
            }
            Self::ConditionFailed { time, reason } => {
                write!(f, "step condition failed at t={time}: {reason}")
            }
            Self::NumericalError(msg) => write!(f, "numerical error: {msg}"),
        }
    }
}

impl std::error::Error for FdError {}
