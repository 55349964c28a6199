//! Simulation Cycle Numbers
//!
//! Cycles are numbered densely starting at 1. A cycle is displayed as
//! "cycle_0007" and serialized as a plain integer.
//!
//! # Example
//!
//! ```
//! use rae_events::Cycle;
//!
//! let cycle = Cycle::FIRST.next();
//! assert_eq!(cycle.get(), 2);
//! assert_eq!(cycle.to_string(), "cycle_0002");
//! assert_eq!(cycle.elapsed_since(Cycle::FIRST), 1);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A one-based simulation cycle number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Cycle(u32);

impl Cycle {
    /// The first cycle of every run.
    pub const FIRST: Cycle = Cycle(1);

    /// Creates a cycle number. Returns `None` for 0.
    pub fn new(number: u32) -> Option<Self> {
        (number > 0).then_some(Self(number))
    }

    /// Returns the raw cycle number.
    pub fn get(self) -> u32 {
        self.0
    }

    /// Returns the cycle that follows this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Number of cycles between `earlier` and this cycle.
    ///
    /// Saturates at 0 when `earlier` is actually later.
    pub fn elapsed_since(self, earlier: Cycle) -> u32 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cycle_{:04}", self.0)
    }
}

impl TryFrom<u32> for Cycle {
    type Error = ParseCycleError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Cycle::new(value).ok_or(ParseCycleError::Zero)
    }
}

impl From<Cycle> for u32 {
    fn from(cycle: Cycle) -> Self {
        cycle.0
    }
}

/// Error type for parsing cycle numbers.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseCycleError {
    /// Cycle numbers start at 1
    Zero,
    InvalidFormat(String),
}

impl fmt::Display for ParseCycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseCycleError::Zero => write!(f, "cycle numbers start at 1"),
            ParseCycleError::InvalidFormat(s) => {
                write!(f, "invalid cycle: '{}', expected 'cycle_N' or 'N'", s)
            }
        }
    }
}

impl std::error::Error for ParseCycleError {}

impl FromStr for Cycle {
    type Err = ParseCycleError;

    /// Parses "cycle_0007" or a bare "7".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("cycle_").unwrap_or(s);
        let number = digits
            .parse::<u32>()
            .map_err(|_| ParseCycleError::InvalidFormat(s.to_string()))?;
        Cycle::try_from(number)
    }
}
