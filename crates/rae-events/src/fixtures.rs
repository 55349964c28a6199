//! Sample data fixtures for testing.
//!
//! Enable the `test-fixtures` feature to access these helpers.
//!
//! # Example
//!
//! ```ignore
//! // In your Cargo.toml:
//! // [dev-dependencies]
//! // rae-events = { path = "../rae-events", features = ["test-fixtures"] }
//!
//! use rae_events::fixtures;
//!
//! let history = fixtures::sample_history();
//! ```

use crate::{Archetype, Cycle, TrustHistory, TrustSample};

/// Returns a four-cycle trust history from the fixtures file.
///
/// Honest agents climb to full trust while strategic agents decline.
pub fn sample_history() -> TrustHistory {
    let json = include_str!("../tests/fixtures/sample_history.json");
    serde_json::from_str(json).expect("Failed to parse sample_history.json")
}

/// Builds a sample for `cycle` from explicit per-agent trust values.
pub fn sample_at(cycle: u32, honest: &[f64], strategic: &[f64]) -> TrustSample {
    let cycle = Cycle::new(cycle).expect("fixture cycles start at 1");
    let agents = honest
        .iter()
        .map(|&t| (Archetype::Honest, t))
        .chain(strategic.iter().map(|&t| (Archetype::Strategic, t)));
    TrustSample::from_population(cycle, agents)
}
