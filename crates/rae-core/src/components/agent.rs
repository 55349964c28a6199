//! Agent Components
//!
//! Components for individual agents: identity, archetype, trust.

use bevy_ecs::prelude::*;
use rae_events::Archetype;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Marker component identifying an entity as an agent
#[derive(Component, Debug, Clone, Default)]
pub struct Agent;

/// Unique identifier for an agent, stable for the whole run
#[derive(
    Component, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AgentId(pub u32);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent_{:04}", self.0)
    }
}

/// Behavioural class of an agent - fixed at creation
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentArchetype(pub Archetype);

/// Current trust of an agent, always within [0, 1]
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Trust(f64);

impl Trust {
    pub fn new(value: f64) -> Self {
        Self(clamp_trust(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn set(&mut self, value: f64) {
        self.0 = clamp_trust(value);
    }
}

/// Clamps to [0, 1]; NaN collapses to 0.
pub fn clamp_trust(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Plain snapshot of one agent, read by negotiation and written by the
/// reputation engine outside the ECS world.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    pub id: AgentId,
    pub archetype: Archetype,
    pub trust: f64,
}

impl AgentState {
    pub fn new(id: u32, archetype: Archetype, trust: f64) -> Self {
        Self {
            id: AgentId(id),
            archetype,
            trust: clamp_trust(trust),
        }
    }

    pub fn honest(id: u32, trust: f64) -> Self {
        Self::new(id, Archetype::Honest, trust)
    }

    pub fn strategic(id: u32, trust: f64) -> Self {
        Self::new(id, Archetype::Strategic, trust)
    }
}

/// Collects the agents of a world into snapshots sorted by id.
pub fn snapshot_agents<'a>(
    agents: impl IntoIterator<Item = (&'a AgentId, &'a AgentArchetype, &'a Trust)>,
) -> Vec<AgentState> {
    let mut states: Vec<AgentState> = agents
        .into_iter()
        .map(|(id, archetype, trust)| AgentState {
            id: *id,
            archetype: archetype.0,
            trust: trust.value(),
        })
        .collect();
    states.sort_by_key(|s| s.id);
    states
}

/// Finds an agent in a snapshot sorted by id.
pub fn find_agent(states: &[AgentState], id: AgentId) -> Option<&AgentState> {
    states
        .binary_search_by_key(&id, |s| s.id)
        .ok()
        .map(|index| &states[index])
}
