//! Population-level behaviour of the Monte Carlo estimates.
//!
//! These are statistical checks: every run is seeded, and bands are wide enough
//! that the seeded outcome sits far from their edges.

use percolation::{aggregate, find_threshold, MonteCarloSampler, ThresholdSearch};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

#[test]
fn percolation_probability_rises_with_p() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let ps = [0.1, 0.3, 0.5, 0.7, 0.9];
    let probs: Vec<f64> = ps
        .iter()
        .map(|&p| aggregate(32, p, 400, &mut rng).unwrap().percolation_probability)
        .collect();

    for pair in probs.windows(2) {
        assert!(pair[1] + 0.05 >= pair[0], "not monotone: {probs:?}");
    }
    assert!(probs[0] < 0.05, "{probs:?}");
    assert!(probs[4] > 0.95, "{probs:?}");
}

#[test]
fn extremes_are_exact_in_aggregate() {
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let empty = aggregate(16, 0.0, 50, &mut rng).unwrap();
    assert_eq!(empty.percolation_probability, 0.0);
    assert_eq!(empty.non_percolating.mean_cluster_count, 0.0);
    assert_eq!(empty.non_percolating.mean_largest_cluster, 0.0);
    assert_eq!(empty.percolating.count, 0);

    let full = aggregate(16, 1.0, 50, &mut rng).unwrap();
    assert_eq!(full.percolation_probability, 1.0);
    assert_eq!(full.percolating.mean_largest_cluster, 256.0);
    assert_eq!(full.percolating.mean_cluster_count, 1.0);
    assert_eq!(full.non_percolating.count, 0);
}

#[test]
fn percolating_trials_have_larger_clusters() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let m = aggregate(48, 0.59, 300, &mut rng).unwrap();
    assert!(m.percolating.count > 0 && m.non_percolating.count > 0);
    assert!(m.percolating.mean_largest_cluster > m.non_percolating.mean_largest_cluster);
}

#[test]
fn threshold_resamples_near_one_half() {
    let tolerance = 0.01;
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    // Average a few independent searches to damp the noise of any single one.
    let runs = 4;
    let mut sum = 0.0;
    for _ in 0..runs {
        sum += find_threshold(64, 500, tolerance, &mut rng).unwrap().threshold;
    }
    let p_star = sum / runs as f64;

    let resampled = aggregate(64, p_star, 5000, &mut rng).unwrap();
    assert!(
        (resampled.percolation_probability - 0.5).abs() <= 3.0 * tolerance,
        "p* = {p_star}, P(p*) = {}",
        resampled.percolation_probability
    );
}

#[test]
fn search_bracket_contains_estimate() {
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let mut sampler = MonteCarloSampler::new(24, 300, &mut rng).unwrap();
    let est = ThresholdSearch::with_tolerance(0.03).run(&mut sampler).unwrap();
    assert!(est.lower <= est.threshold && est.threshold <= est.upper);
    assert!((est.sampled_probability - 0.5).abs() <= 0.03);
    assert!(est.iterations >= 1);
}
