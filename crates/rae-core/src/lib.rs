//! Reputation Aggregation Simulation Library
//!
//! Public API for running the marketplace simulation: configuration, the
//! ECS systems of one cycle, and the driver that chains them.

use bevy_ecs::prelude::*;
use rand::rngs::SmallRng;

pub mod components;
pub mod config;
pub mod error;
pub mod output;
pub mod setup;
pub mod simulation;
pub mod systems;

pub use components::*;
pub use config::{ConfigError, MpeConfig, ServicePolicy, StrategicPolicy};
pub use error::{AssignmentError, ReputationError, SimError};
pub use output::{read_report, write_report, SimulationReport, DEFAULT_REPORT_PATH};
pub use simulation::{SimPhase, Simulation};

/// Seeded random number generator resource
#[derive(Resource)]
pub struct SimRng(pub SmallRng);
