//! ECS Systems
//!
//! One cycle runs, in order: clock, distributions, provider assignment,
//! negotiation, trust aggregation.

pub mod clustering;
pub mod cycle;
pub mod distribution;
pub mod negotiation;
pub mod providers;
pub mod reputation;

pub use clustering::{two_means, Cluster, TwoClusters};
pub use cycle::{advance_cycle, cycle_ok, CycleClock, CycleFailure};
pub use distribution::{
    regenerate_distributions, CycleDistributions, ServiceDistribution, DISTRIBUTION_SAMPLE_SIZE,
};
pub use negotiation::{
    negotiate_cycle, negotiate_services, CycleServices, NegotiationPolicy, Service,
};
pub use providers::{
    assign_providers, assign_providers_system, draw_providers, ProviderAssignments, ProviderBounds,
};
pub use reputation::{
    calculate_trust_system, decay_weight, CycleOutcome, CycleReports,
    LastInteraction, ReportedService, ReputationEngine, TrustClasses,
};
