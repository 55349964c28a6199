//! Service Distributions
//!
//! Each cycle two empirical distributions are regenerated by inverse-transform
//! sampling: uniform variates `u` mapped through `u^(1/expo)`. Every
//! negotiation of the cycle draws independently from the same two samples.

use bevy_ecs::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;

use crate::config::MpeConfig;
use crate::SimRng;

/// Number of variates in each cycle-wide sample
pub const DISTRIBUTION_SAMPLE_SIZE: usize = 100_000;

/// An immutable, cheaply shareable empirical sample.
#[derive(Debug, Clone)]
pub struct ServiceDistribution {
    expo: f64,
    sample: Arc<[f64]>,
}

impl Default for ServiceDistribution {
    fn default() -> Self {
        Self::from_sample(1.0, Vec::new())
    }
}

impl ServiceDistribution {
    /// Draws `size` uniform variates and applies `u^(1/expo)`.
    ///
    /// `expo` must be positive; the configuration guarantees it.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R, expo: f64, size: usize) -> Self {
        let inverse = 1.0 / expo;
        let sample: Vec<f64> = (0..size).map(|_| rng.gen::<f64>().powf(inverse)).collect();
        Self {
            expo,
            sample: sample.into(),
        }
    }

    /// Wraps an explicit sample.
    pub fn from_sample(expo: f64, sample: Vec<f64>) -> Self {
        Self {
            expo,
            sample: sample.into(),
        }
    }

    /// One independent draw. An empty distribution draws 0.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.sample.choose(rng).copied().unwrap_or(0.0)
    }

    pub fn expo(&self) -> f64 {
        self.expo
    }

    pub fn len(&self) -> usize {
        self.sample.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sample.is_empty()
    }

    pub fn mean(&self) -> Option<f64> {
        (!self.sample.is_empty()).then(|| self.sample.iter().sum::<f64>() / self.sample.len() as f64)
    }
}

/// Resource: the two distributions of the current cycle.
#[derive(Resource, Debug, Clone, Default)]
pub struct CycleDistributions {
    /// Source of `available_services`, shape `expoA`
    pub available: ServiceDistribution,
    /// Source of `receiver_efficiency`, shape `expoG`
    pub efficiency: ServiceDistribution,
}

impl CycleDistributions {
    pub fn generate<R: Rng + ?Sized>(rng: &mut R, config: &MpeConfig, size: usize) -> Self {
        Self {
            available: ServiceDistribution::generate(rng, config.expo_a, size),
            efficiency: ServiceDistribution::generate(rng, config.expo_g, size),
        }
    }

    /// Replaces both samples with fresh full-size ones for a new cycle.
    pub fn regenerate<R: Rng + ?Sized>(&mut self, rng: &mut R, config: &MpeConfig) {
        *self = Self::generate(rng, config, DISTRIBUTION_SAMPLE_SIZE);
    }
}

/// System: Regenerate both distributions once per cycle
pub fn regenerate_distributions(
    config: Res<MpeConfig>,
    mut rng: ResMut<SimRng>,
    mut distributions: ResMut<CycleDistributions>,
) {
    distributions.regenerate(&mut rng.0, &config);
    tracing::trace!(
        "regenerated distributions, mean available {:?}, mean efficiency {:?}",
        distributions.available.mean(),
        distributions.efficiency.mean()
    );
}
