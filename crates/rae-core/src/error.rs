//! Error types for the simulation.

use rae_events::{Cycle, HistoryError};
use thiserror::Error;

use crate::components::AgentId;
use crate::config::ConfigError;

/// Conditions raised while aggregating reputation.
///
/// `InsufficientEvidence` and `DegenerateClustering` are resolved by the
/// engine's fallback policies; only `History` aborts a run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReputationError {
    #[error("no reports available to aggregate for {provider} in {cycle}")]
    InsufficientEvidence { provider: AgentId, cycle: Cycle },
    #[error("cannot split {providers} providers into two clusters: {distinct} distinct score(s)")]
    DegenerateClustering { providers: usize, distinct: usize },
    #[error("trust history rejected: {0}")]
    History(#[from] HistoryError),
}

/// Provider draws that cannot be satisfied by the current population.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssignmentError {
    #[error("population has {found} agents but provider bounds were validated for {expected}")]
    PopulationMismatch { expected: usize, found: usize },
    #[error("{receiver} needs {requested} providers but only {available} peers exist")]
    InsufficientPeers {
        receiver: AgentId,
        requested: usize,
        available: usize,
    },
}

/// Errors that abort a simulation run.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("reputation error: {0}")]
    Reputation(#[from] ReputationError),
    #[error("provider assignment failed: {0}")]
    Assignment(#[from] AssignmentError),
    #[error("simulation already finished after {cycles} cycle(s)")]
    Finished { cycles: u32 },
    #[error("{cycle} did not complete its trust assignment")]
    CycleIncomplete { cycle: Cycle },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
