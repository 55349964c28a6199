//! Agent Spawning
//!
//! The population is fixed for a whole run: the first `s_agent_count` ids are
//! Strategic, the rest Honest, and every agent starts at trust `V_0`.

use bevy_ecs::prelude::*;
use rae_events::Archetype;
use std::collections::BTreeMap;
use std::fmt;

use crate::components::agent::{Agent, AgentArchetype, AgentId, AgentState, Trust};
use crate::config::MpeConfig;

/// Builds the initial population as plain snapshots, sorted by id.
pub fn create_population(config: &MpeConfig) -> Vec<AgentState> {
    (0..config.agent_count)
        .map(|index| {
            let archetype = if index < config.s_agent_count {
                Archetype::Strategic
            } else {
                Archetype::Honest
            };
            AgentState::new(index as u32, archetype, config.v_0)
        })
        .collect()
}

/// Spawns one entity per agent and returns the entities in id order.
pub fn spawn_population(world: &mut World, config: &MpeConfig) -> Vec<Entity> {
    create_population(config)
        .into_iter()
        .map(|state| {
            world
                .spawn((
                    Agent,
                    state.id,
                    AgentArchetype(state.archetype),
                    Trust::new(state.trust),
                ))
                .id()
        })
        .collect()
}

/// Counts spawned agents per archetype.
pub fn get_spawn_summary(world: &mut World) -> SpawnSummary {
    let mut total_agents = 0;
    let mut by_archetype: BTreeMap<Archetype, u32> = BTreeMap::new();

    let mut query = world.query_filtered::<&AgentArchetype, With<Agent>>();
    for archetype in query.iter(world) {
        total_agents += 1;
        *by_archetype.entry(archetype.0).or_insert(0) += 1;
    }

    SpawnSummary {
        total_agents,
        by_archetype,
    }
}

/// Summary of spawned agents
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnSummary {
    pub total_agents: u32,
    pub by_archetype: BTreeMap<Archetype, u32>,
}

impl SpawnSummary {
    pub fn count(&self, archetype: Archetype) -> u32 {
        self.by_archetype.get(&archetype).copied().unwrap_or(0)
    }
}

impl fmt::Display for SpawnSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} agents", self.total_agents)?;
        for archetype in Archetype::ALL {
            write!(f, ", {} {}", self.count(archetype), archetype)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(agent_count: usize, s_agent_count: usize) -> MpeConfig {
        MpeConfig {
            agent_count,
            s_agent_count,
            k_min: 1,
            k_max: 2,
            v_0: 0.3,
            ..MpeConfig::default()
        }
    }

    #[test]
    fn test_strategic_agents_come_first() {
        let population = create_population(&config(5, 2));

        assert_eq!(population.len(), 5);
        assert_eq!(population[0].archetype, Archetype::Strategic);
        assert_eq!(population[1].archetype, Archetype::Strategic);
        assert!(population[2..]
            .iter()
            .all(|a| a.archetype == Archetype::Honest));
        assert!(population.iter().all(|a| a.trust == 0.3));
        let ids: Vec<u32> = population.iter().map(|a| a.id.0).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_spawn_summary() {
        let mut world = World::new();
        let entities = spawn_population(&mut world, &config(6, 1));
        assert_eq!(entities.len(), 6);

        let summary = get_spawn_summary(&mut world);
        assert_eq!(summary.total_agents, 6);
        assert_eq!(summary.count(Archetype::Strategic), 1);
        assert_eq!(summary.count(Archetype::Honest), 5);
        assert_eq!(summary.to_string(), "6 agents, 5 honest, 1 strategic");
    }

    #[test]
    fn test_spawned_components() {
        let mut world = World::new();
        let entities = spawn_population(&mut world, &config(3, 3));

        let id = world.get::<AgentId>(entities[2]).copied();
        let trust = world.get::<Trust>(entities[2]).map(Trust::value);
        assert_eq!(id, Some(AgentId(2)));
        assert_eq!(trust, Some(0.3));
    }
}
