//! Reputation Aggregation Engine
//!
//! Turns the reports of one cycle into updated trust for every agent:
//!
//! 1. the cycle's reports are appended to the history and a time-decayed
//!    aggregate score is computed for every provider that was reported on;
//! 2. providers are split into two clusters by score;
//! 3. the higher cluster gets trust 1.0, the lower one the ratio of the means;
//! 4. mean trust per archetype is recorded.
//!
//! The engine only ever looks at cycles that have already been appended.

use bevy_ecs::prelude::*;
use rae_events::{Cycle, HistoryError, TrustHistory, TrustSample};
use std::collections::{BTreeMap, HashMap};

use crate::components::agent::{
    clamp_trust, find_agent, snapshot_agents, Agent, AgentArchetype, AgentId, AgentState, Trust,
};
use crate::config::MpeConfig;
use crate::error::ReputationError;
use crate::systems::clustering::{two_means, Cluster, TwoClusters};
use crate::systems::cycle::CycleFailure;
use crate::systems::negotiation::{CycleServices, Service};

/// What a receiver reported about a provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportedService {
    pub receiver: AgentId,
    pub reported_services: f64,
}

/// Reports of one cycle, keyed by provider.
pub type CycleReports = BTreeMap<AgentId, Vec<ReportedService>>;

/// Most recent report of one receiver about one provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LastInteraction {
    pub cycle: Cycle,
    pub reported_services: f64,
}

/// How providers were grouped in a cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum TrustClasses {
    /// No provider was reported on
    Empty,
    /// All scores identical (or a single provider)
    Single(Cluster),
    Split(TwoClusters),
}

/// Everything the engine decided in one cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleOutcome {
    pub cycle: Cycle,
    /// Aggregate score per provider reported on this cycle
    pub scores: BTreeMap<AgentId, f64>,
    pub classes: TrustClasses,
    /// Trust given to the higher (or only) cluster
    pub high_trust: f64,
    /// Trust given to the lower cluster, if there was one
    pub low_trust: Option<f64>,
    pub sample: TrustSample,
}

/// Weight of a report `elapsed` cycles old from a reporter with `trust`.
pub fn decay_weight(trust: f64, delta: f64, elapsed: u32) -> f64 {
    let exponent = i32::try_from(elapsed).unwrap_or(i32::MAX);
    trust * delta.powi(exponent)
}

/// Resource: the reputation aggregation engine and its history.
#[derive(Resource, Debug, Clone)]
pub struct ReputationEngine {
    delta: f64,
    baseline_trust: f64,
    /// Append-only; index `i` holds cycle `i + 1`
    cycles_history: Vec<CycleReports>,
    /// (provider, receiver) -> latest report
    last_seen: HashMap<(AgentId, AgentId), LastInteraction>,
    trust_history: TrustHistory,
    last_outcome: Option<CycleOutcome>,
}

impl ReputationEngine {
    pub fn new(delta: f64, baseline_trust: f64) -> Self {
        Self {
            delta,
            baseline_trust,
            cycles_history: Vec::new(),
            last_seen: HashMap::new(),
            trust_history: TrustHistory::new(),
            last_outcome: None,
        }
    }

    pub fn from_config(config: &MpeConfig) -> Self {
        Self::new(config.delta, config.v_0)
    }

    /// Latest recorded cycle, if any.
    pub fn current_cycle(&self) -> Option<Cycle> {
        u32::try_from(self.cycles_history.len())
            .ok()
            .and_then(Cycle::new)
    }

    pub fn cycle_count(&self) -> usize {
        self.cycles_history.len()
    }

    pub fn cycle_reports(&self, cycle: Cycle) -> Option<&CycleReports> {
        self.cycles_history.get(cycle.get() as usize - 1)
    }

    pub fn last_interaction(&self, provider: AgentId, receiver: AgentId) -> Option<LastInteraction> {
        self.last_seen.get(&(provider, receiver)).copied()
    }

    pub fn trust_history(&self) -> &TrustHistory {
        &self.trust_history
    }

    pub fn last_outcome(&self) -> Option<&CycleOutcome> {
        self.last_outcome.as_ref()
    }

    /// Runs the full per-cycle update and writes new trust into `agents`.
    pub fn calculate_trust(
        &mut self,
        agent_services: &BTreeMap<AgentId, Vec<Service>>,
        agents: &mut [AgentState],
    ) -> Result<CycleOutcome, ReputationError> {
        let next = self.current_cycle().map_or(Cycle::FIRST, Cycle::next);
        let expected = self.trust_history.next_cycle();
        if next != expected {
            return Err(HistoryError::OutOfOrder {
                expected,
                got: next,
            }
            .into());
        }

        agents.sort_by_key(|a| a.id);

        let (cycle, scores) = self.report_services(agent_services, agents);
        let classes = self.perform_clustering(&scores);
        let (high_trust, low_trust) = Self::assign_trust(agents, &classes);
        let sample = self.update_trust_history_per_agent_type(cycle, agents)?;

        tracing::debug!(
            "{}: scored {} providers, high trust {:.3}, low trust {}",
            cycle,
            scores.len(),
            high_trust,
            low_trust.map_or("-".to_string(), |t| format!("{:.3}", t))
        );

        let outcome = CycleOutcome {
            cycle,
            scores,
            classes,
            high_trust,
            low_trust,
            sample,
        };
        self.last_outcome = Some(outcome.clone());
        Ok(outcome)
    }

    /// Appends the cycle's reports and scores every provider reported on.
    ///
    /// `agents` must be sorted by id; their current trust weights the reports.
    pub fn report_services(
        &mut self,
        agent_services: &BTreeMap<AgentId, Vec<Service>>,
        agents: &[AgentState],
    ) -> (Cycle, BTreeMap<AgentId, f64>) {
        let cycle = self.append_cycle(agent_services);

        let mut scores = BTreeMap::new();
        for (provider, services) in agent_services {
            if services.is_empty() {
                continue;
            }
            let score = match self.aggregate_score(*provider, agents, cycle) {
                Ok(score) => score,
                Err(e) => {
                    tracing::warn!("{}; falling back to baseline trust {}", e, self.baseline_trust);
                    self.baseline_trust
                }
            };
            scores.insert(*provider, score);
        }

        (cycle, scores)
    }

    fn append_cycle(&mut self, agent_services: &BTreeMap<AgentId, Vec<Service>>) -> Cycle {
        let cycle = self
            .current_cycle()
            .map(Cycle::next)
            .unwrap_or(Cycle::FIRST);

        let reports: CycleReports = agent_services
            .iter()
            .map(|(provider, services)| {
                let reports = services
                    .iter()
                    .map(|s| ReportedService {
                        receiver: s.receiver,
                        reported_services: s.reported_services,
                    })
                    .collect();
                (*provider, reports)
            })
            .collect();

        for (provider, provider_reports) in &reports {
            for report in provider_reports {
                self.last_seen.insert(
                    (*provider, report.receiver),
                    LastInteraction {
                        cycle,
                        reported_services: report.reported_services,
                    },
                );
            }
        }

        self.cycles_history.push(reports);
        cycle
    }

    /// Mean of the decayed, trust-weighted latest reports of every other
    /// agent about `provider`.
    pub fn aggregate_score(
        &self,
        provider: AgentId,
        agents: &[AgentState],
        cycle: Cycle,
    ) -> Result<f64, ReputationError> {
        let weighted: Vec<f64> = agents
            .iter()
            .filter(|agent| agent.id != provider)
            .filter_map(|agent| {
                let last = self.last_seen.get(&(provider, agent.id))?;
                let elapsed = cycle.elapsed_since(last.cycle);
                Some(decay_weight(agent.trust, self.delta, elapsed) * last.reported_services)
            })
            .collect();

        if weighted.is_empty() {
            return Err(ReputationError::InsufficientEvidence { provider, cycle });
        }
        Ok(weighted.iter().sum::<f64>() / weighted.len() as f64)
    }

    /// Splits scored providers into trust classes.
    pub fn perform_clustering(&self, scores: &BTreeMap<AgentId, f64>) -> TrustClasses {
        if scores.is_empty() {
            return TrustClasses::Empty;
        }
        match two_means(scores) {
            Ok(clusters) => TrustClasses::Split(clusters),
            Err(e) => {
                tracing::debug!("{}; treating all providers as one cluster", e);
                let members: Vec<AgentId> = scores.keys().copied().collect();
                let mean = scores.values().sum::<f64>() / scores.len() as f64;
                TrustClasses::Single(Cluster { members, mean })
            }
        }
    }

    /// Writes cluster trust into `agents`; agents outside every cluster keep
    /// their trust. Returns `(high_trust, low_trust)`.
    pub fn assign_trust(agents: &mut [AgentState], classes: &TrustClasses) -> (f64, Option<f64>) {
        let (high, low) = match classes {
            TrustClasses::Empty => return (1.0, None),
            TrustClasses::Single(cluster) => (cluster, None),
            TrustClasses::Split(clusters) => (&clusters.high, Some(&clusters.low)),
        };

        let high_trust = 1.0;
        let low_trust = low.map(|low| {
            if high.mean > 0.0 {
                clamp_trust(low.mean / high.mean)
            } else {
                high_trust
            }
        });

        for agent in agents.iter_mut() {
            if high.contains(agent.id) {
                agent.trust = high_trust;
            } else if let (Some(low), Some(trust)) = (low, low_trust) {
                if low.contains(agent.id) {
                    agent.trust = trust;
                }
            }
        }

        (high_trust, low_trust)
    }

    /// Records mean trust per archetype for `cycle`.
    pub fn update_trust_history_per_agent_type(
        &mut self,
        cycle: Cycle,
        agents: &[AgentState],
    ) -> Result<TrustSample, ReputationError> {
        let sample =
            TrustSample::from_population(cycle, agents.iter().map(|a| (a.archetype, a.trust)));
        self.trust_history.push(sample.clone())?;
        Ok(sample)
    }
}

/// System: Aggregate the cycle's reports and write back new trust
pub fn calculate_trust_system(
    mut engine: ResMut<ReputationEngine>,
    mut services: ResMut<CycleServices>,
    mut failure: ResMut<CycleFailure>,
    mut query: Query<(&AgentId, &AgentArchetype, &mut Trust), With<Agent>>,
) {
    let mut agents = snapshot_agents(query.iter());
    let services = services.take();

    match engine.calculate_trust(&services, &mut agents) {
        Ok(_) => {
            for (id, _, mut trust) in query.iter_mut() {
                if let Some(state) = find_agent(&agents, *id) {
                    trust.set(state.trust);
                }
            }
        }
        Err(e) => {
            tracing::error!("trust update failed: {}", e);
            failure.0 = Some(e.into());
        }
    }
}
