//! Two-Way Clustering
//!
//! Splits providers into a low and a high group by their aggregate scores.
//! In one dimension the optimal 2-means partition is a cut of the sorted
//! scores, so every cut between distinct values is scored by its within-cluster
//! sum of squares and the best one wins. Ties go to the lowest cut, which keeps
//! the result deterministic.

use std::collections::BTreeMap;

use crate::components::agent::AgentId;
use crate::error::ReputationError;

/// A group of providers and the mean of their scores.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub members: Vec<AgentId>,
    pub mean: f64,
}

impl Cluster {
    fn from_points(points: &[(AgentId, f64)]) -> Self {
        let sum: f64 = points.iter().map(|(_, score)| score).sum();
        Self {
            members: points.iter().map(|(id, _)| *id).collect(),
            mean: sum / points.len() as f64,
        }
    }

    pub fn contains(&self, id: AgentId) -> bool {
        self.members.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Result of a successful split; `low.mean < high.mean`.
#[derive(Debug, Clone, PartialEq)]
pub struct TwoClusters {
    pub low: Cluster,
    pub high: Cluster,
}

/// Partitions providers into two clusters by score.
///
/// Fails with [`ReputationError::DegenerateClustering`] when fewer than two
/// distinct scores exist.
pub fn two_means(scores: &BTreeMap<AgentId, f64>) -> Result<TwoClusters, ReputationError> {
    let mut points: Vec<(AgentId, f64)> = scores.iter().map(|(id, s)| (*id, *s)).collect();
    points.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

    let distinct = count_distinct(&points);
    if distinct < 2 {
        return Err(ReputationError::DegenerateClustering {
            providers: points.len(),
            distinct,
        });
    }

    // Prefix sums of scores and squared scores.
    let mut sum = vec![0.0; points.len() + 1];
    let mut sum_sq = vec![0.0; points.len() + 1];
    for (i, (_, score)) in points.iter().enumerate() {
        sum[i + 1] = sum[i] + score;
        sum_sq[i + 1] = sum_sq[i] + score * score;
    }
    let sse = |from: usize, to: usize| {
        let n = (to - from) as f64;
        let s = sum[to] - sum[from];
        (sum_sq[to] - sum_sq[from]) - s * s / n
    };

    let n = points.len();
    let mut best: Option<(usize, f64)> = None;
    for cut in 1..n {
        if points[cut - 1].1 == points[cut].1 {
            continue;
        }
        let cost = sse(0, cut) + sse(cut, n);
        if best.map_or(true, |(_, best_cost)| cost < best_cost) {
            best = Some((cut, cost));
        }
    }

    // At least two distinct values guarantee a valid cut.
    let cut = best.map(|(cut, _)| cut).unwrap_or(n / 2);

    Ok(TwoClusters {
        low: Cluster::from_points(&points[..cut]),
        high: Cluster::from_points(&points[cut..]),
    })
}

fn count_distinct(sorted: &[(AgentId, f64)]) -> usize {
    sorted
        .windows(2)
        .filter(|pair| pair[0].1 != pair[1].1)
        .count()
        + usize::from(!sorted.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(values: &[f64]) -> BTreeMap<AgentId, f64> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| (AgentId(i as u32), *v))
            .collect()
    }

    fn ids(cluster: &Cluster) -> Vec<u32> {
        cluster.members.iter().map(|id| id.0).collect()
    }

    #[test]
    fn test_obvious_split() {
        let clusters = two_means(&scores(&[0.9, 0.1, 0.85, 0.05, 0.95])).unwrap();
        assert_eq!(ids(&clusters.low), vec![3, 1]);
        assert_eq!(ids(&clusters.high), vec![2, 0, 4]);
        assert!((clusters.low.mean - 0.075).abs() < 1e-12);
        assert!((clusters.high.mean - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_outlier_isolated() {
        let clusters = two_means(&scores(&[0.0, 0.4, 0.42, 0.45, 0.5])).unwrap();
        assert_eq!(ids(&clusters.low), vec![0]);
        assert_eq!(clusters.high.len(), 4);
    }

    #[test]
    fn test_two_points() {
        let clusters = two_means(&scores(&[0.7, 0.2])).unwrap();
        assert_eq!(ids(&clusters.low), vec![1]);
        assert_eq!(ids(&clusters.high), vec![0]);
    }

    #[test]
    fn test_equal_scores_never_split() {
        let clusters = two_means(&scores(&[0.3, 0.3, 0.8])).unwrap();
        assert_eq!(ids(&clusters.low), vec![0, 1]);
        assert_eq!(ids(&clusters.high), vec![2]);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert_eq!(
            two_means(&scores(&[])),
            Err(ReputationError::DegenerateClustering {
                providers: 0,
                distinct: 0
            })
        );
        assert_eq!(
            two_means(&scores(&[0.4])),
            Err(ReputationError::DegenerateClustering {
                providers: 1,
                distinct: 1
            })
        );
        assert_eq!(
            two_means(&scores(&[0.4, 0.4, 0.4])),
            Err(ReputationError::DegenerateClustering {
                providers: 3,
                distinct: 1
            })
        );
    }

    #[test]
    fn test_low_mean_below_high_mean() {
        let clusters = two_means(&scores(&[0.31, 0.32, 0.33, 0.34, 0.35, 0.36])).unwrap();
        assert!(clusters.low.mean < clusters.high.mean);
        assert_eq!(clusters.low.len() + clusters.high.len(), 6);
    }
}
