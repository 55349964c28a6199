//! Simulation Driver
//!
//! Owns the ECS world and runs one chained schedule per cycle, so a cycle's
//! provider assignment and negotiation always read the trust written by the
//! previous cycle.

use bevy_ecs::prelude::*;
use rae_events::{Cycle, TrustSample};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use uuid::Uuid;

use crate::components::agent::{snapshot_agents, Agent, AgentArchetype, AgentId, AgentState, Trust};
use crate::config::MpeConfig;
use crate::error::SimError;
use crate::output::SimulationReport;
use crate::setup::{get_spawn_summary, spawn_population};
use crate::systems::{
    advance_cycle, assign_providers_system, calculate_trust_system, cycle_ok, negotiate_services,
    regenerate_distributions, CycleClock, CycleDistributions, CycleFailure, CycleServices,
    NegotiationPolicy, ProviderAssignments, ProviderBounds, ReputationEngine,
};
use crate::SimRng;

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimPhase {
    Initializing,
    Cycling,
    Finished,
}

pub struct Simulation {
    world: World,
    schedule: Schedule,
    phase: SimPhase,
    seed: u64,
    run_id: Uuid,
}

impl Simulation {
    /// Validates `config`, spawns the population and builds the cycle schedule.
    pub fn new(config: MpeConfig, seed: u64) -> Result<Self, SimError> {
        config.validate()?;
        let bounds = ProviderBounds::from_config(&config)?;

        let mut world = World::new();
        world.insert_resource(SimRng(SmallRng::seed_from_u64(seed)));
        world.insert_resource(CycleClock::new());
        world.insert_resource(bounds);
        world.insert_resource(NegotiationPolicy::from_config(&config));
        world.insert_resource(CycleDistributions::default());
        world.insert_resource(ProviderAssignments::default());
        world.insert_resource(CycleServices::new());
        world.insert_resource(ReputationEngine::from_config(&config));
        world.insert_resource(CycleFailure::default());

        spawn_population(&mut world, &config);
        let summary = get_spawn_summary(&mut world);
        tracing::info!(
            "initialized {} for {} cycles (seed {})",
            summary,
            config.cycle_count,
            seed
        );
        world.insert_resource(config);

        let mut schedule = Schedule::default();
        schedule.add_systems(
            (
                advance_cycle,
                regenerate_distributions,
                assign_providers_system,
                negotiate_services.run_if(cycle_ok),
                calculate_trust_system.run_if(cycle_ok),
            )
                .chain(),
        );

        Ok(Self {
            world,
            schedule,
            phase: SimPhase::Initializing,
            seed,
            run_id: Uuid::new_v4(),
        })
    }

    pub fn phase(&self) -> SimPhase {
        self.phase
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn config(&self) -> &MpeConfig {
        self.world.resource::<MpeConfig>()
    }

    pub fn cycles_completed(&self) -> u32 {
        self.world.resource::<CycleClock>().elapsed()
    }

    pub fn assignments(&self) -> &ProviderAssignments {
        self.world.resource::<ProviderAssignments>()
    }

    pub fn engine(&self) -> &ReputationEngine {
        self.world.resource::<ReputationEngine>()
    }

    /// Current population, sorted by id.
    pub fn agents(&mut self) -> Vec<AgentState> {
        let mut query = self
            .world
            .query_filtered::<(&AgentId, &AgentArchetype, &Trust), With<Agent>>();
        snapshot_agents(query.iter(&self.world))
    }

    /// Runs one full cycle and returns its trust sample.
    pub fn step(&mut self) -> Result<TrustSample, SimError> {
        if self.phase == SimPhase::Finished {
            return Err(SimError::Finished {
                cycles: self.cycles_completed(),
            });
        }
        self.phase = SimPhase::Cycling;

        self.schedule.run(&mut self.world);

        if let Some(error) = self.world.resource_mut::<CycleFailure>().0.take() {
            self.phase = SimPhase::Finished;
            return Err(error);
        }

        let cycle = self
            .world
            .resource::<CycleClock>()
            .current()
            .unwrap_or(Cycle::FIRST);
        let Some(sample) = self.engine().trust_history().get(cycle).cloned() else {
            self.phase = SimPhase::Finished;
            return Err(SimError::CycleIncomplete { cycle });
        };

        tracing::debug!(
            "{}: honest {:?}, strategic {:?}",
            cycle,
            sample.mean_trust_honest,
            sample.mean_trust_strategic
        );

        if cycle.get() >= self.config().cycle_count {
            self.phase = SimPhase::Finished;
        }
        Ok(sample)
    }

    /// Runs every remaining cycle and returns the report.
    pub fn run(&mut self) -> Result<SimulationReport, SimError> {
        while self.phase != SimPhase::Finished {
            self.step()?;
        }
        Ok(self.report())
    }

    /// Report of the cycles completed so far.
    pub fn report(&mut self) -> SimulationReport {
        SimulationReport {
            run_id: self.run_id,
            seed: self.seed,
            cycles_completed: self.cycles_completed(),
            config: self.config().clone(),
            history: self.engine().trust_history().clone(),
            final_agents: self.agents(),
        }
    }

    /// Consumes the simulation, returning its report.
    pub fn finish(mut self) -> SimulationReport {
        let report = self.report();
        tracing::info!(
            "finished after {} cycles (run {})",
            report.cycles_completed,
            report.run_id
        );
        report
    }
}
