//! Site Percolation on the Square Lattice - Monte Carlo Threshold Estimation
//! =========================================================================
//! Occupies each site of an N x N lattice with probability p, labels the
//! 4-connected clusters, checks for a cluster spanning opposite boundaries and
//! aggregates many trials into percolation statistics. A bisection search over
//! p on the sampled percolation probability locates the finite-size threshold
//! pc(N), where percolation happens in half of the trials.
//!
//! Every routine that draws random numbers takes the generator as an argument;
//! nothing in this crate touches a process-wide RNG.

pub mod aggregate;
pub mod cluster;
pub mod config;
pub mod detect;
pub mod error;
pub mod lattice;
pub mod stats;
pub mod threshold;
pub mod trial;

pub use aggregate::{aggregate, AggregateMetrics, SubgroupMetrics};
pub use cluster::{label, ClusterCatalog, LabeledLattice};
pub use config::SimulationConfig;
pub use detect::{detects_percolation, spanning, Spanning};
pub use error::{Error, Result, StopReason, MAX_SIDE};
pub use lattice::{generate, Lattice};
pub use stats::FiveNumberSummary;
pub use threshold::{
    find_threshold, finite_size_thresholds, FiniteSizeThreshold, MonteCarloSampler,
    ProbabilitySampler, ThresholdEstimate, ThresholdSearch,
};
pub use trial::{evaluate, run_trial, run_trial_snapshot, TrialResult, TrialSnapshot};
