//! Agent Archetypes
//!
//! The two fixed behavioural classes an agent can belong to.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Behavioural class of an agent, fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    /// Cooperates with partners it trusts enough
    Honest,
    /// Cooperates according to the configured good will of its scenario
    Strategic,
}

impl Archetype {
    /// All archetypes in reporting order.
    pub const ALL: [Archetype; 2] = [Archetype::Honest, Archetype::Strategic];
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Archetype::Honest => write!(f, "honest"),
            Archetype::Strategic => write!(f, "strategic"),
        }
    }
}

/// Error returned when an archetype name is not recognised.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseArchetypeError(pub String);

impl fmt::Display for ParseArchetypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid archetype: '{}', expected 'honest' or 'strategic'", self.0)
    }
}

impl std::error::Error for ParseArchetypeError {}

impl FromStr for Archetype {
    type Err = ParseArchetypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "honest" => Ok(Archetype::Honest),
            "strategic" => Ok(Archetype::Strategic),
            _ => Err(ParseArchetypeError(s.to_string())),
        }
    }
}
