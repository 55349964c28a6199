//! Provider Assignment
//!
//! Every cycle each agent independently draws a fresh set of distinct
//! providers from the rest of the population.

use bevy_ecs::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;
use rae_events::Cycle;
use std::collections::BTreeMap;

use crate::components::agent::{Agent, AgentId};
use crate::config::{ConfigError, MpeConfig};
use crate::error::AssignmentError;
use crate::systems::{CycleClock, CycleFailure};
use crate::SimRng;

/// Validated bounds on how many providers an agent draws per cycle.
///
/// The count is drawn uniformly from `[k_min, k_max)`.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderBounds {
    k_min: usize,
    k_max: usize,
    agent_count: usize,
}

impl ProviderBounds {
    /// Rejects empty ranges and counts that would exceed the eligible peers.
    pub fn new(k_min: usize, k_max: usize, agent_count: usize) -> Result<Self, ConfigError> {
        let invalid = |reason| ConfigError::InvalidProviderBounds {
            k_min,
            k_max,
            agent_count,
            reason,
        };
        if k_max <= k_min {
            return Err(invalid("k_max must be greater than k_min"));
        }
        if k_max >= agent_count {
            return Err(invalid("k_max must be smaller than agent_count"));
        }
        Ok(Self {
            k_min,
            k_max,
            agent_count,
        })
    }

    pub fn from_config(config: &MpeConfig) -> Result<Self, ConfigError> {
        Self::new(config.k_min, config.k_max, config.agent_count)
    }

    pub fn k_min(&self) -> usize {
        self.k_min
    }

    pub fn k_max(&self) -> usize {
        self.k_max
    }

    /// Population size the bounds were validated against.
    pub fn agent_count(&self) -> usize {
        self.agent_count
    }

    pub fn contains(&self, count: usize) -> bool {
        (self.k_min..self.k_max).contains(&count)
    }
}

/// Resource: the provider relation of the current cycle.
///
/// Replaced wholesale every cycle; nothing carries over.
#[derive(Resource, Debug, Clone, Default)]
pub struct ProviderAssignments {
    cycle: Option<Cycle>,
    providers: BTreeMap<AgentId, Vec<AgentId>>,
}

impl ProviderAssignments {
    pub fn cycle(&self) -> Option<Cycle> {
        self.cycle
    }

    /// Providers drawn by `receiver` this cycle.
    pub fn providers_of(&self, receiver: AgentId) -> &[AgentId] {
        self.providers
            .get(&receiver)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Receivers and their providers, ordered by receiver id.
    pub fn iter(&self) -> impl Iterator<Item = (AgentId, &[AgentId])> {
        self.providers.iter().map(|(r, p)| (*r, p.as_slice()))
    }

    /// All `(receiver, provider)` edges of the cycle.
    pub fn edges(&self) -> impl Iterator<Item = (AgentId, AgentId)> + '_ {
        self.providers
            .iter()
            .flat_map(|(receiver, providers)| providers.iter().map(move |p| (*receiver, *p)))
    }

    pub fn edge_count(&self) -> usize {
        self.providers.values().map(Vec::len).sum()
    }

    pub fn receiver_count(&self) -> usize {
        self.providers.len()
    }
}

/// Draws the providers of one receiver.
///
/// Fails rather than truncating when the drawn count exceeds the eligible
/// peers.
pub fn draw_providers<R: Rng + ?Sized>(
    rng: &mut R,
    population: &[AgentId],
    receiver: AgentId,
    bounds: &ProviderBounds,
) -> Result<Vec<AgentId>, AssignmentError> {
    let count = rng.gen_range(bounds.k_min..bounds.k_max);
    let peers: Vec<AgentId> = population
        .iter()
        .copied()
        .filter(|id| *id != receiver)
        .collect();
    if count > peers.len() {
        return Err(AssignmentError::InsufficientPeers {
            receiver,
            requested: count,
            available: peers.len(),
        });
    }

    Ok(peers.choose_multiple(rng, count).copied().collect())
}

/// Draws providers for every agent of the population.
///
/// The population must be the one `bounds` were validated against.
pub fn assign_providers<R: Rng + ?Sized>(
    rng: &mut R,
    population: &[AgentId],
    bounds: &ProviderBounds,
    cycle: Cycle,
) -> Result<ProviderAssignments, AssignmentError> {
    if population.len() != bounds.agent_count {
        return Err(AssignmentError::PopulationMismatch {
            expected: bounds.agent_count,
            found: population.len(),
        });
    }

    let providers = population
        .iter()
        .map(|&receiver| {
            let providers = draw_providers(rng, population, receiver, bounds)?;
            Ok((receiver, providers))
        })
        .collect::<Result<_, AssignmentError>>()?;

    Ok(ProviderAssignments {
        cycle: Some(cycle),
        providers,
    })
}

/// System: Redraw the provider relation for the new cycle
pub fn assign_providers_system(
    clock: Res<CycleClock>,
    bounds: Res<ProviderBounds>,
    mut rng: ResMut<SimRng>,
    mut assignments: ResMut<ProviderAssignments>,
    mut failure: ResMut<CycleFailure>,
    query: Query<&AgentId, With<Agent>>,
) {
    let Some(cycle) = clock.current() else {
        return;
    };

    let mut population: Vec<AgentId> = query.iter().copied().collect();
    population.sort();

    match assign_providers(&mut rng.0, &population, &bounds, cycle) {
        Ok(drawn) => {
            *assignments = drawn;
            tracing::debug!(
                "{}: assigned {} provider edges to {} receivers",
                cycle,
                assignments.edge_count(),
                assignments.receiver_count()
            );
        }
        Err(e) => {
            tracing::error!("{}: {}", cycle, e);
            *assignments = ProviderAssignments::default();
            failure.0 = Some(e.into());
        }
    }
}
