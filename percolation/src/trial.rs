//! One percolation trial: generate, label, detect, measure.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::cluster::{label, ClusterCatalog, LabeledLattice};
use crate::detect::detects_percolation;
use crate::error::{check_probability, check_side, Result};
use crate::lattice::{generate_unchecked, Lattice};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialResult {
    pub percolated: bool,
    pub largest_cluster_size: usize,
    pub cluster_count: usize,
}

/// A trial with its grids kept, for callers that draw the lattice.
#[derive(Debug, Clone, Serialize)]
pub struct TrialSnapshot {
    pub lattice: Lattice,
    /// `None` when the lattice had no occupied site and labeling was skipped.
    pub labeled: Option<LabeledLattice>,
    pub result: TrialResult,
}

/// Run a single trial on a fresh N x N lattice at occupation probability `p`.
pub fn run_trial<R: Rng + ?Sized>(n: usize, p: f64, rng: &mut R) -> Result<TrialResult> {
    check_side(n)?;
    check_probability(p)?;
    Ok(run_trial_unchecked(n, p, rng))
}

/// Like [`run_trial`], but keeps the occupancy and label grids.
pub fn run_trial_snapshot<R: Rng + ?Sized>(n: usize, p: f64, rng: &mut R) -> Result<TrialSnapshot> {
    check_side(n)?;
    check_probability(p)?;
    let lattice = generate_unchecked(n, p, rng);
    let (labeled, result) = measure(&lattice);
    Ok(TrialSnapshot {
        lattice,
        labeled,
        result,
    })
}

/// Measure an existing lattice.
pub fn evaluate(lattice: &Lattice) -> TrialResult {
    measure(lattice).1
}

pub(crate) fn run_trial_unchecked<R: Rng + ?Sized>(n: usize, p: f64, rng: &mut R) -> TrialResult {
    let lattice = generate_unchecked(n, p, rng);
    let result = evaluate(&lattice);
    tracing::trace!(
        n,
        p,
        percolated = result.percolated,
        largest = result.largest_cluster_size,
        clusters = result.cluster_count,
        "trial"
    );
    result
}

fn measure(lattice: &Lattice) -> (Option<LabeledLattice>, TrialResult) {
    // All-empty lattice: nothing to label.
    if lattice.is_empty() {
        return (None, TrialResult::default());
    }

    let labeled = label(lattice);
    let catalog = ClusterCatalog::from_labeled(&labeled);
    let result = TrialResult {
        percolated: detects_percolation(&labeled),
        largest_cluster_size: catalog.largest(),
        cluster_count: labeled.cluster_count(),
    };
    (Some(labeled), result)
}
