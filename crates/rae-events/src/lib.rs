//! Shared data types for the reputation simulation.
//!
//! This crate contains pure data structures with no simulation logic.
//! It is a dependency for all other crates in the workspace.

pub mod archetype;
pub mod cycle;
pub mod history;

#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures;

pub use archetype::{Archetype, ParseArchetypeError};
pub use cycle::{Cycle, ParseCycleError};
pub use history::{HistoryError, TrustHistory, TrustSample};
