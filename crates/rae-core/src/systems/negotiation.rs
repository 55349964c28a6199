//! Service Negotiation
//!
//! For every provider→receiver edge of a cycle the provider first decides how
//! much of the available service it actually supplies, then the receiver
//! decides how much it reports. Both sides apply a threshold that depends on
//! their archetype, combined through the configured service policy.

use bevy_ecs::prelude::*;
use rand::Rng;
use rae_events::Archetype;
use std::collections::BTreeMap;

use crate::components::agent::{
    find_agent, snapshot_agents, Agent, AgentArchetype, AgentId, AgentState, Trust,
};
use crate::config::{MpeConfig, ServicePolicy, StrategicPolicy};
use crate::systems::distribution::CycleDistributions;
use crate::systems::providers::ProviderAssignments;
use crate::systems::CycleClock;
use crate::SimRng;

/// Outcome of one negotiation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Service {
    pub receiver: AgentId,
    pub provider: AgentId,
    pub available_services: f64,
    pub receiver_efficiency: f64,
    pub provided_services: f64,
    pub reported_services: f64,
}

/// Resource: negotiation rules derived from the configuration.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct NegotiationPolicy {
    pub service: ServicePolicy,
    pub strategic: StrategicPolicy,
    pub good_will_x: f64,
    pub good_will_y: f64,
    pub good_will_z: f64,
}

impl NegotiationPolicy {
    pub fn from_config(config: &MpeConfig) -> Self {
        Self {
            service: config.service_policy(),
            strategic: config.strategic_policy(),
            good_will_x: config.good_will_x,
            good_will_y: config.good_will_y,
            good_will_z: config.good_will_z,
        }
    }

    /// Honest agents cooperate fully with partners whose trust does not
    /// exceed `1 - good_will_x` and withhold otherwise.
    pub fn honest_threshold(&self, partner_trust: f64) -> f64 {
        if partner_trust <= 1.0 - self.good_will_x {
            1.0
        } else {
            0.0
        }
    }

    fn strategic_threshold(&self, good_will: f64) -> f64 {
        match self.strategic {
            StrategicPolicy::GoodWill => good_will,
            StrategicPolicy::FullCooperation => 1.0,
        }
    }

    pub fn provider_threshold(&self, provider: &AgentState, receiver: &AgentState) -> f64 {
        match provider.archetype {
            Archetype::Strategic => self.strategic_threshold(self.good_will_y),
            Archetype::Honest => self.honest_threshold(receiver.trust),
        }
    }

    pub fn receiver_threshold(&self, receiver: &AgentState, provider: &AgentState) -> f64 {
        match receiver.archetype {
            Archetype::Strategic => self.strategic_threshold(self.good_will_z),
            Archetype::Honest => self.honest_threshold(provider.trust),
        }
    }

    /// Provider politics.
    pub fn provide(&self, available_services: f64, provider_threshold: f64) -> f64 {
        match self.service {
            ServicePolicy::Multiplicative => available_services * provider_threshold,
            ServicePolicy::Capped => available_services.min(provider_threshold),
        }
    }

    /// Receiver politics.
    pub fn report(
        &self,
        receiver_efficiency: f64,
        provided_services: f64,
        receiver_threshold: f64,
    ) -> f64 {
        match self.service {
            ServicePolicy::Multiplicative => {
                receiver_efficiency * provided_services * receiver_threshold
            }
            ServicePolicy::Capped => (receiver_efficiency * provided_services).min(receiver_threshold),
        }
    }

    /// Runs both negotiation steps for one edge.
    ///
    /// The report is computed from what was actually provided, so provision
    /// always happens first.
    pub fn negotiate<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        distributions: &CycleDistributions,
        provider: &AgentState,
        receiver: &AgentState,
    ) -> Service {
        let available_services = distributions.available.draw(rng);
        let provided_services = self.provide(
            available_services,
            self.provider_threshold(provider, receiver),
        );

        let receiver_efficiency = distributions.efficiency.draw(rng);
        let reported_services = self.report(
            receiver_efficiency,
            provided_services,
            self.receiver_threshold(receiver, provider),
        );

        Service {
            receiver: receiver.id,
            provider: provider.id,
            available_services,
            receiver_efficiency,
            provided_services,
            reported_services,
        }
    }
}

/// Resource: services negotiated this cycle, keyed by provider.
#[derive(Resource, Debug, Clone, Default)]
pub struct CycleServices {
    by_provider: BTreeMap<AgentId, Vec<Service>>,
}

impl CycleServices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, service: Service) {
        self.by_provider
            .entry(service.provider)
            .or_default()
            .push(service);
    }

    pub fn by_provider(&self) -> &BTreeMap<AgentId, Vec<Service>> {
        &self.by_provider
    }

    pub fn iter(&self) -> impl Iterator<Item = &Service> {
        self.by_provider.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.by_provider.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_provider.is_empty()
    }

    /// Hands the cycle's services over, leaving this empty.
    pub fn take(&mut self) -> BTreeMap<AgentId, Vec<Service>> {
        std::mem::take(&mut self.by_provider)
    }
}

impl FromIterator<Service> for CycleServices {
    fn from_iter<T: IntoIterator<Item = Service>>(iter: T) -> Self {
        let mut services = CycleServices::new();
        for service in iter {
            services.push(service);
        }
        services
    }
}

/// Negotiates every edge of the assignment against a trust snapshot.
pub fn negotiate_cycle<R: Rng + ?Sized>(
    rng: &mut R,
    policy: &NegotiationPolicy,
    distributions: &CycleDistributions,
    assignments: &ProviderAssignments,
    agents: &[AgentState],
) -> CycleServices {
    assignments
        .edges()
        .filter_map(|(receiver_id, provider_id)| {
            match (find_agent(agents, receiver_id), find_agent(agents, provider_id)) {
                (Some(receiver), Some(provider)) => {
                    Some(policy.negotiate(rng, distributions, provider, receiver))
                }
                _ => {
                    tracing::warn!(
                        "skipping edge {} -> {}: agent missing from trust snapshot",
                        provider_id,
                        receiver_id
                    );
                    None
                }
            }
        })
        .collect()
}

/// System: Negotiate all services of the current cycle
pub fn negotiate_services(
    clock: Res<CycleClock>,
    policy: Res<NegotiationPolicy>,
    distributions: Res<CycleDistributions>,
    assignments: Res<ProviderAssignments>,
    mut rng: ResMut<SimRng>,
    mut services: ResMut<CycleServices>,
    query: Query<(&AgentId, &AgentArchetype, &Trust), With<Agent>>,
) {
    let agents = snapshot_agents(query.iter());

    *services = negotiate_cycle(&mut rng.0, &policy, &distributions, &assignments, &agents);

    if let Some(cycle) = clock.current() {
        tracing::debug!(
            "{}: negotiated {} services with {} providers",
            cycle,
            services.len(),
            services.by_provider().len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::distribution::ServiceDistribution;
    use crate::systems::providers::{assign_providers, ProviderBounds};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn policy(service: ServicePolicy, strategic: StrategicPolicy) -> NegotiationPolicy {
        NegotiationPolicy {
            service,
            strategic,
            good_will_x: 0.5,
            good_will_y: 0.3,
            good_will_z: 0.2,
        }
    }

    fn constant(available: f64, efficiency: f64) -> CycleDistributions {
        CycleDistributions {
            available: ServiceDistribution::from_sample(1.0, vec![available]),
            efficiency: ServiceDistribution::from_sample(1.0, vec![efficiency]),
        }
    }

    #[test]
    fn test_strategic_thresholds_by_scenario() {
        let strategic = AgentState::strategic(0, 0.5);
        let honest = AgentState::honest(1, 0.5);

        let good_will = policy(ServicePolicy::Capped, StrategicPolicy::GoodWill);
        assert_eq!(good_will.provider_threshold(&strategic, &honest), 0.3);
        assert_eq!(good_will.receiver_threshold(&strategic, &honest), 0.2);

        let cooperative = policy(ServicePolicy::Capped, StrategicPolicy::FullCooperation);
        assert_eq!(cooperative.provider_threshold(&strategic, &honest), 1.0);
        assert_eq!(cooperative.receiver_threshold(&strategic, &honest), 1.0);
    }

    #[test]
    fn test_honest_threshold_follows_partner_trust() {
        let rules = policy(ServicePolicy::Capped, StrategicPolicy::GoodWill);
        let honest = AgentState::honest(0, 0.9);

        let low = AgentState::strategic(1, 0.25);
        let high = AgentState::strategic(2, 0.75);
        assert_eq!(rules.provider_threshold(&honest, &low), 1.0);
        assert_eq!(rules.provider_threshold(&honest, &high), 0.0);
        assert_eq!(rules.receiver_threshold(&honest, &low), 1.0);
        assert_eq!(rules.receiver_threshold(&honest, &high), 0.0);

        // Trust exactly at 1 - good_will_x still cooperates.
        assert_eq!(rules.honest_threshold(0.5), 1.0);
        assert_eq!(rules.honest_threshold(0.5000001), 0.0);
    }

    #[test]
    fn test_low_trust_partner_is_served() {
        let mut rules = policy(ServicePolicy::Capped, StrategicPolicy::GoodWill);
        rules.good_will_x = 0.3;
        assert_eq!(rules.honest_threshold(0.25), 1.0);
        assert_eq!(rules.honest_threshold(0.0), 1.0);
        assert_eq!(rules.honest_threshold(1.0), 0.0);

        let mut rng = SmallRng::seed_from_u64(4);
        let distributions = constant(0.8, 0.5);
        let provider = AgentState::honest(0, 1.0);
        let receiver = AgentState::strategic(1, 0.25);
        let service = rules.negotiate(&mut rng, &distributions, &provider, &receiver);
        assert_eq!(service.provided_services, 0.8);
    }

    #[test]
    fn test_full_good_will_serves_only_untrusted() {
        let mut rules = policy(ServicePolicy::Capped, StrategicPolicy::GoodWill);
        rules.good_will_x = 1.0;
        assert_eq!(rules.honest_threshold(0.0), 1.0);
        assert_eq!(rules.honest_threshold(0.1), 0.0);
    }

    #[test]
    fn test_zero_good_will_serves_everyone() {
        let mut rules = policy(ServicePolicy::Capped, StrategicPolicy::GoodWill);
        rules.good_will_x = 0.0;
        assert_eq!(rules.honest_threshold(1.0), 1.0);
        assert_eq!(rules.honest_threshold(0.0), 1.0);
    }

    #[test]
    fn test_capped_policy() {
        let rules = policy(ServicePolicy::Capped, StrategicPolicy::GoodWill);
        assert_eq!(rules.provide(0.8, 0.3), 0.3);
        assert_eq!(rules.provide(0.2, 1.0), 0.2);
        assert_eq!(rules.report(0.5, 0.8, 1.0), 0.4);
        assert_eq!(rules.report(0.5, 0.8, 0.1), 0.1);
    }

    #[test]
    fn test_multiplicative_policy() {
        let rules = policy(ServicePolicy::Multiplicative, StrategicPolicy::GoodWill);
        assert_eq!(rules.provide(0.8, 0.5), 0.4);
        assert_eq!(rules.report(0.5, 0.4, 0.5), 0.1);
    }

    #[test]
    fn test_negotiate_reports_from_provided() {
        let mut rng = SmallRng::seed_from_u64(1);
        let rules = policy(ServicePolicy::Capped, StrategicPolicy::GoodWill);
        let distributions = constant(0.8, 0.5);

        let provider = AgentState::strategic(0, 0.5);
        let receiver = AgentState::honest(1, 0.5);
        let service = rules.negotiate(&mut rng, &distributions, &provider, &receiver);

        assert_eq!(service.provider, AgentId(0));
        assert_eq!(service.receiver, AgentId(1));
        assert_eq!(service.available_services, 0.8);
        assert_eq!(service.provided_services, 0.3);
        assert_eq!(service.receiver_efficiency, 0.5);
        assert_eq!(service.reported_services, 0.15);
    }

    #[test]
    fn test_zero_good_will_collapses_services() {
        let mut rng = SmallRng::seed_from_u64(2);
        let mut rules = policy(ServicePolicy::Capped, StrategicPolicy::GoodWill);
        rules.good_will_y = 0.0;
        rules.good_will_z = 0.0;
        let distributions = constant(0.9, 0.9);

        let strategic = AgentState::strategic(0, 0.5);
        let honest = AgentState::honest(1, 0.5);

        let as_provider = rules.negotiate(&mut rng, &distributions, &strategic, &honest);
        assert_eq!(as_provider.provided_services, 0.0);
        assert_eq!(as_provider.reported_services, 0.0);

        let as_receiver = rules.negotiate(&mut rng, &distributions, &honest, &strategic);
        assert!(as_receiver.provided_services > 0.0);
        assert_eq!(as_receiver.reported_services, 0.0);
    }

    #[test]
    fn test_edges_with_unknown_agents_are_skipped() {
        let mut rng = SmallRng::seed_from_u64(6);
        let rules = policy(ServicePolicy::Capped, StrategicPolicy::GoodWill);
        let distributions = constant(0.8, 0.5);

        let population: Vec<AgentId> = (0..4).map(AgentId).collect();
        let bounds = ProviderBounds::new(1, 3, 4).unwrap();
        let assignments = assign_providers(&mut rng, &population, &bounds, rae_events::Cycle::FIRST)
            .unwrap();
        // Agent 3 is not part of the snapshot.
        let agents: Vec<AgentState> = (0..3).map(|i| AgentState::honest(i, 0.5)).collect();

        let services = negotiate_cycle(&mut rng, &rules, &distributions, &assignments, &agents);

        let known = assignments
            .edges()
            .filter(|(r, p)| r.0 < 3 && p.0 < 3)
            .count();
        assert_eq!(services.len(), known);
        assert!(services
            .iter()
            .all(|s| s.provider != AgentId(3) && s.receiver != AgentId(3)));
    }

    #[test]
    fn test_cycle_services_keyed_by_provider() {
        let service = |provider, receiver, reported| Service {
            receiver: AgentId(receiver),
            provider: AgentId(provider),
            available_services: 1.0,
            receiver_efficiency: 1.0,
            provided_services: 1.0,
            reported_services: reported,
        };
        let mut services: CycleServices =
            vec![service(0, 1, 0.5), service(0, 2, 0.25), service(1, 0, 1.0)]
                .into_iter()
                .collect();

        assert_eq!(services.len(), 3);
        assert_eq!(services.by_provider()[&AgentId(0)].len(), 2);
        assert!(services.by_provider().get(&AgentId(2)).is_none());

        let taken = services.take();
        assert_eq!(taken.len(), 2);
        assert!(services.is_empty());
    }
}
