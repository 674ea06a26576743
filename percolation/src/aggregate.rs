//! Monte Carlo aggregation of many independent trials at fixed (N, p).

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{check_probability, check_side, check_trials, Result};
use crate::trial::{run_trial_unchecked, TrialResult};

/// Statistics of the trials that share one outcome (percolating or not).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubgroupMetrics {
    pub count: usize,
    /// Largest-cluster size of every trial in the subgroup, in trial order.
    pub largest_cluster_sizes: Vec<usize>,
    /// Cluster count of every trial in the subgroup, in trial order.
    pub cluster_counts: Vec<usize>,
    /// 0 when the subgroup is empty.
    pub mean_largest_cluster: f64,
    /// 0 when the subgroup is empty.
    pub mean_cluster_count: f64,
}

impl SubgroupMetrics {
    fn push(&mut self, trial: &TrialResult) {
        self.count += 1;
        self.largest_cluster_sizes.push(trial.largest_cluster_size);
        self.cluster_counts.push(trial.cluster_count);
    }

    fn finish(mut self) -> Self {
        self.mean_largest_cluster = mean_or_zero(&self.largest_cluster_sizes);
        self.mean_cluster_count = mean_or_zero(&self.cluster_counts);
        self
    }

    pub fn max_largest_cluster(&self) -> Option<usize> {
        self.largest_cluster_sizes.iter().copied().max()
    }

    pub fn max_cluster_count(&self) -> Option<usize> {
        self.cluster_counts.iter().copied().max()
    }
}

/// Population-level metrics of M trials, split by outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateMetrics {
    pub trials: usize,
    pub percolation_probability: f64,
    pub non_percolation_probability: f64,
    pub percolating: SubgroupMetrics,
    pub non_percolating: SubgroupMetrics,
}

impl AggregateMetrics {
    /// Reduce a batch of trial results. The reduction only counts and sums, so
    /// the probabilities and means do not depend on the order of `trials`.
    pub fn from_trials(trials: &[TrialResult]) -> Self {
        let mut percolating = SubgroupMetrics::default();
        let mut non_percolating = SubgroupMetrics::default();
        for t in trials {
            if t.percolated {
                percolating.push(t);
            } else {
                non_percolating.push(t);
            }
        }

        let percolation_probability = if trials.is_empty() {
            0.0
        } else {
            percolating.count as f64 / trials.len() as f64
        };

        Self {
            trials: trials.len(),
            percolation_probability,
            non_percolation_probability: 1.0 - percolation_probability,
            percolating: percolating.finish(),
            non_percolating: non_percolating.finish(),
        }
    }
}

fn mean_or_zero(values: &[usize]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<usize>() as f64 / values.len() as f64
    }
}

/// Run `m` independent trials on N x N lattices at probability `p`.
///
/// One 64-bit seed per trial is drawn from `rng` up front; each trial then runs
/// on its own `ChaCha8Rng` across the rayon pool. For a given state of `rng`
/// the result is the same whatever the number of worker threads.
pub fn aggregate<R: Rng + ?Sized>(
    n: usize,
    p: f64,
    m: usize,
    rng: &mut R,
) -> Result<AggregateMetrics> {
    check_side(n)?;
    check_probability(p)?;
    check_trials(m)?;
    Ok(aggregate_unchecked(n, p, m, rng))
}

pub(crate) fn aggregate_unchecked<R: Rng + ?Sized>(
    n: usize,
    p: f64,
    m: usize,
    rng: &mut R,
) -> AggregateMetrics {
    let seeds: Vec<u64> = (0..m).map(|_| rng.random::<u64>()).collect();

    let results: Vec<TrialResult> = seeds
        .into_par_iter()
        .map(|seed| {
            let mut trial_rng = ChaCha8Rng::seed_from_u64(seed);
            run_trial_unchecked(n, p, &mut trial_rng)
        })
        .collect();

    let metrics = AggregateMetrics::from_trials(&results);
    tracing::debug!(
        n,
        p,
        m,
        percolation_probability = metrics.percolation_probability,
        "aggregated batch"
    );
    metrics
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trial(percolated: bool, largest: usize, clusters: usize) -> TrialResult {
        TrialResult {
            percolated,
            largest_cluster_size: largest,
            cluster_count: clusters,
        }
    }

    #[test]
    fn splits_by_outcome() {
        let m = AggregateMetrics::from_trials(&[
            trial(true, 40, 3),
            trial(false, 5, 10),
            trial(true, 60, 1),
            trial(false, 7, 12),
        ]);
        assert_eq!(m.trials, 4);
        assert_eq!(m.percolation_probability, 0.5);
        assert_eq!(m.non_percolation_probability, 0.5);
        assert_eq!(m.percolating.count, 2);
        assert_eq!(m.percolating.largest_cluster_sizes, vec![40, 60]);
        assert_eq!(m.percolating.mean_largest_cluster, 50.0);
        assert_eq!(m.percolating.mean_cluster_count, 2.0);
        assert_eq!(m.non_percolating.cluster_counts, vec![10, 12]);
        assert_eq!(m.non_percolating.mean_largest_cluster, 6.0);
        assert_eq!(m.non_percolating.mean_cluster_count, 11.0);
        assert_eq!(m.percolating.max_largest_cluster(), Some(60));
        assert_eq!(m.non_percolating.max_cluster_count(), Some(12));
    }

    #[test]
    fn empty_subgroup_means_fall_back_to_zero() {
        let m = AggregateMetrics::from_trials(&[trial(false, 3, 2), trial(false, 1, 1)]);
        assert_eq!(m.percolation_probability, 0.0);
        assert_eq!(m.non_percolation_probability, 1.0);
        assert_eq!(m.percolating.count, 0);
        assert_eq!(m.percolating.mean_largest_cluster, 0.0);
        assert_eq!(m.percolating.mean_cluster_count, 0.0);
        assert_eq!(m.percolating.max_largest_cluster(), None);
    }

    #[test]
    fn reduction_ignores_trial_order() {
        let mut trials = vec![
            trial(true, 9, 2),
            trial(false, 2, 4),
            trial(true, 11, 1),
            trial(false, 3, 5),
            trial(false, 1, 6),
        ];
        let forward = AggregateMetrics::from_trials(&trials);
        trials.reverse();
        let backward = AggregateMetrics::from_trials(&trials);
        assert_eq!(forward.percolation_probability, backward.percolation_probability);
        assert_eq!(
            forward.percolating.mean_largest_cluster,
            backward.percolating.mean_largest_cluster
        );
        assert_eq!(
            forward.non_percolating.mean_cluster_count,
            backward.non_percolating.mean_cluster_count
        );
    }

    #[test]
    fn counts_add_up_to_m() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for m in [1, 2, 17, 200] {
            let metrics = aggregate(20, 0.59, m, &mut rng).unwrap();
            assert_eq!(metrics.trials, m);
            assert_eq!(metrics.percolating.count + metrics.non_percolating.count, m);
            assert_eq!(metrics.percolating.largest_cluster_sizes.len(), metrics.percolating.count);
            let total = metrics.percolation_probability + metrics.non_percolation_probability;
            assert!((total - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn same_seed_same_metrics() {
        let a = aggregate(16, 0.6, 64, &mut ChaCha8Rng::seed_from_u64(8)).unwrap();
        let b = aggregate(16, 0.6, 64, &mut ChaCha8Rng::seed_from_u64(8)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_zero_trials() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(aggregate(8, 0.5, 0, &mut rng).is_err());
        assert!(aggregate(0, 0.5, 10, &mut rng).is_err());
        assert!(aggregate(8, 1.1, 10, &mut rng).is_err());
    }
}
