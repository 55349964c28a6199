//! Trust History Types
//!
//! Per-cycle trust statistics by archetype. This is the time series handed to
//! export and plotting consumers at the end of a run.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Archetype, Cycle};

/// Mean trust of each archetype at the end of one cycle.
///
/// A mean is `None` when the population has no agent of that archetype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustSample {
    pub cycle: Cycle,
    pub mean_trust_honest: Option<f64>,
    pub mean_trust_strategic: Option<f64>,
}

impl TrustSample {
    /// Builds a sample from `(archetype, trust)` pairs of the whole population.
    pub fn from_population(cycle: Cycle, agents: impl IntoIterator<Item = (Archetype, f64)>) -> Self {
        let mut honest = (0.0, 0usize);
        let mut strategic = (0.0, 0usize);

        for (archetype, trust) in agents {
            let acc = match archetype {
                Archetype::Honest => &mut honest,
                Archetype::Strategic => &mut strategic,
            };
            acc.0 += trust;
            acc.1 += 1;
        }

        let mean = |(sum, count): (f64, usize)| (count > 0).then(|| sum / count as f64);

        Self {
            cycle,
            mean_trust_honest: mean(honest),
            mean_trust_strategic: mean(strategic),
        }
    }

    /// Mean trust for one archetype.
    pub fn mean_for(&self, archetype: Archetype) -> Option<f64> {
        match archetype {
            Archetype::Honest => self.mean_trust_honest,
            Archetype::Strategic => self.mean_trust_strategic,
        }
    }
}

/// Append-only, dense sequence of trust samples starting at cycle 1.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TrustSample>", into = "Vec<TrustSample>")]
pub struct TrustHistory {
    samples: Vec<TrustSample>,
}

impl TrustHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cycle the next sample must carry.
    pub fn next_cycle(&self) -> Cycle {
        self.samples
            .last()
            .map(|s| s.cycle.next())
            .unwrap_or(Cycle::FIRST)
    }

    /// Appends a sample. Rejects gaps, repeats and reordering.
    pub fn push(&mut self, sample: TrustSample) -> Result<(), HistoryError> {
        let expected = self.next_cycle();
        if sample.cycle != expected {
            return Err(HistoryError::OutOfOrder {
                expected,
                got: sample.cycle,
            });
        }
        self.samples.push(sample);
        Ok(())
    }

    pub fn get(&self, cycle: Cycle) -> Option<&TrustSample> {
        self.samples.get(cycle.get() as usize - 1)
    }

    pub fn latest(&self) -> Option<&TrustSample> {
        self.samples.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrustSample> {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Flattens the history into `(cycle, honest, strategic)` rows.
    pub fn rows(&self) -> Vec<(u32, Option<f64>, Option<f64>)> {
        self.samples
            .iter()
            .map(|s| (s.cycle.get(), s.mean_trust_honest, s.mean_trust_strategic))
            .collect()
    }
}

impl TryFrom<Vec<TrustSample>> for TrustHistory {
    type Error = HistoryError;

    fn try_from(samples: Vec<TrustSample>) -> Result<Self, Self::Error> {
        let mut history = TrustHistory::new();
        for sample in samples {
            history.push(sample)?;
        }
        Ok(history)
    }
}

impl From<TrustHistory> for Vec<TrustSample> {
    fn from(history: TrustHistory) -> Self {
        history.samples
    }
}

/// Error raised when a sample would break the dense cycle ordering.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryError {
    OutOfOrder { expected: Cycle, got: Cycle },
}

impl fmt::Display for HistoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryError::OutOfOrder { expected, got } => {
                write!(f, "trust sample out of order: expected {}, got {}", expected, got)
            }
        }
    }
}

impl std::error::Error for HistoryError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn cycle(n: u32) -> Cycle {
        Cycle::new(n).unwrap()
    }

    #[test]
    fn test_sample_means_by_archetype() {
        let sample = TrustSample::from_population(
            Cycle::FIRST,
            vec![
                (Archetype::Honest, 1.0),
                (Archetype::Honest, 0.5),
                (Archetype::Strategic, 0.25),
            ],
        );
        assert_eq!(sample.mean_trust_honest, Some(0.75));
        assert_eq!(sample.mean_trust_strategic, Some(0.25));
    }

    #[test]
    fn test_sample_without_strategic_agents() {
        let sample = TrustSample::from_population(
            Cycle::FIRST,
            vec![(Archetype::Honest, 0.5), (Archetype::Honest, 0.5)],
        );
        assert_eq!(sample.mean_for(Archetype::Honest), Some(0.5));
        assert_eq!(sample.mean_for(Archetype::Strategic), None);
    }

    #[test]
    fn test_history_is_dense() {
        let mut history = TrustHistory::new();
        assert_eq!(history.next_cycle(), Cycle::FIRST);

        history
            .push(TrustSample::from_population(cycle(1), vec![]))
            .unwrap();
        history
            .push(TrustSample::from_population(cycle(2), vec![]))
            .unwrap();

        let err = history
            .push(TrustSample::from_population(cycle(4), vec![]))
            .unwrap_err();
        assert_eq!(
            err,
            HistoryError::OutOfOrder {
                expected: cycle(3),
                got: cycle(4)
            }
        );

        assert!(history
            .push(TrustSample::from_population(cycle(2), vec![]))
            .is_err());
        assert_eq!(history.len(), 2);
        assert_eq!(history.latest().unwrap().cycle, cycle(2));
    }

    #[test]
    fn test_history_deserialization_validates_order() {
        let json = r#"[
            {"cycle":1,"mean_trust_honest":0.5,"mean_trust_strategic":null},
            {"cycle":3,"mean_trust_honest":0.5,"mean_trust_strategic":null}
        ]"#;
        assert!(serde_json::from_str::<TrustHistory>(json).is_err());
    }

    #[test]
    fn test_rows() {
        let mut history = TrustHistory::new();
        history
            .push(TrustSample::from_population(
                cycle(1),
                vec![(Archetype::Honest, 1.0), (Archetype::Strategic, 0.0)],
            ))
            .unwrap();
        assert_eq!(history.rows(), vec![(1, Some(1.0), Some(0.0))]);
        assert_eq!(history.get(cycle(1)).unwrap().mean_trust_strategic, Some(0.0));
    }
}
