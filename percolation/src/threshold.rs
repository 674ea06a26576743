//! Finite-size threshold search.
//!
//! Bisection over p where the objective is the *sampled* percolation
//! probability. Every evaluation draws a fresh batch of trials, so the
//! objective is only monotone in expectation and an uncapped loop can wander
//! around the tolerance band forever. The search is therefore bounded by an
//! iteration cap and an optional wall-clock budget, and reports the best
//! midpoint seen when it gives up.

use std::time::{Duration, Instant};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::aggregate::aggregate_unchecked;
use crate::error::{check_side, check_trials, Error, Result, StopReason};

pub const DEFAULT_TOLERANCE: f64 = 0.01;
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// Target of the search: percolation in half of the trials.
const TARGET: f64 = 0.5;

/// Estimated finite-size threshold and the bracket it came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdEstimate {
    pub threshold: f64,
    pub lower: f64,
    pub upper: f64,
    /// Percolation probability sampled at `threshold` in the accepting step.
    pub sampled_probability: f64,
    pub iterations: usize,
}

/// Noisy objective evaluated by the search.
pub trait ProbabilitySampler {
    /// Sampled percolation probability at occupation probability `p`.
    fn sample(&mut self, p: f64) -> f64;
}

/// Objective backed by [`aggregate`](crate::aggregate::aggregate): `m` fresh
/// trials on an N x N lattice per call.
pub struct MonteCarloSampler<'a, R: Rng + ?Sized> {
    n: usize,
    m: usize,
    rng: &'a mut R,
}

impl<'a, R: Rng + ?Sized> MonteCarloSampler<'a, R> {
    pub fn new(n: usize, m: usize, rng: &'a mut R) -> Result<Self> {
        check_side(n)?;
        check_trials(m)?;
        Ok(Self { n, m, rng })
    }
}

impl<R: Rng + ?Sized> ProbabilitySampler for MonteCarloSampler<'_, R> {
    fn sample(&mut self, p: f64) -> f64 {
        aggregate_unchecked(self.n, p, self.m, &mut *self.rng).percolation_probability
    }
}

/// Bisection parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSearch {
    /// Accept x once |P(x) - 0.5| <= tolerance.
    pub tolerance: f64,
    pub max_iterations: usize,
    /// Wall-clock budget, checked between steps.
    pub time_budget: Option<Duration>,
}

impl Default for ThresholdSearch {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            time_budget: None,
        }
    }
}

impl ThresholdSearch {
    pub fn with_tolerance(tolerance: f64) -> Self {
        Self {
            tolerance,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(Error::invalid(
                "tolerance",
                format!("{} must be a positive finite number", self.tolerance),
            ));
        }
        if self.max_iterations == 0 {
            return Err(Error::invalid("max_iterations", "must be at least 1"));
        }
        Ok(())
    }

    /// Bisect [0, 1] on `sampler` until the sampled probability at the
    /// midpoint is within tolerance of 0.5.
    pub fn run<S: ProbabilitySampler + ?Sized>(
        &self,
        sampler: &mut S,
    ) -> Result<ThresholdEstimate> {
        self.validate()?;
        let started = Instant::now();

        let (mut a, mut b) = (0.0_f64, 1.0_f64);
        let mut x = 0.5 * (a + b);
        let mut best: Option<ThresholdEstimate> = None;

        for iteration in 1..=self.max_iterations {
            if let Some(budget) = self.time_budget {
                if started.elapsed() >= budget {
                    return Err(self.not_converged(StopReason::Deadline, iteration - 1, best, a, b));
                }
            }

            let prob = sampler.sample(x);
            let estimate = ThresholdEstimate {
                threshold: x,
                lower: a,
                upper: b,
                sampled_probability: prob,
                iterations: iteration,
            };
            tracing::debug!(iteration, a, b, x, prob, "bisection step");

            if (prob - TARGET).abs() <= self.tolerance {
                tracing::info!(
                    threshold = x,
                    sampled_probability = prob,
                    iterations = iteration,
                    "threshold converged"
                );
                return Ok(estimate);
            }

            let closer = best.map_or(true, |prev| {
                (prob - TARGET).abs() < (prev.sampled_probability - TARGET).abs()
            });
            if closer {
                best = Some(estimate);
            }

            if prob < TARGET {
                a = x;
            } else {
                b = x;
            }
            x = 0.5 * (a + b);
        }

        Err(self.not_converged(StopReason::IterationCap, self.max_iterations, best, a, b))
    }

    fn not_converged(
        &self,
        reason: StopReason,
        iterations: usize,
        best: Option<ThresholdEstimate>,
        a: f64,
        b: f64,
    ) -> Error {
        // Nothing sampled yet (budget already spent): report the open bracket.
        let best = best.unwrap_or(ThresholdEstimate {
            threshold: 0.5 * (a + b),
            lower: a,
            upper: b,
            sampled_probability: f64::NAN,
            iterations,
        });
        tracing::warn!(
            %reason,
            iterations,
            best_threshold = best.threshold,
            best_probability = best.sampled_probability,
            "threshold search stopped without converging"
        );
        Error::ThresholdNotConverged {
            reason,
            iterations,
            best,
        }
    }
}

/// Estimate pc(N) with `m` trials per bisection step and the default cap.
pub fn find_threshold<R: Rng + ?Sized>(
    n: usize,
    m: usize,
    tolerance: f64,
    rng: &mut R,
) -> Result<ThresholdEstimate> {
    let mut sampler = MonteCarloSampler::new(n, m, rng)?;
    ThresholdSearch::with_tolerance(tolerance).run(&mut sampler)
}

/// Outcome of the search for one lattice side.
#[derive(Debug, Clone, Serialize)]
pub struct FiniteSizeThreshold {
    pub n: usize,
    pub estimate: Option<ThresholdEstimate>,
    /// Set when the search gave up; `best` then holds the closest midpoint.
    pub stopped: Option<StopReason>,
    pub best: Option<ThresholdEstimate>,
}

/// Run one threshold search per lattice side in `sizes`.
///
/// A search that fails to converge is recorded rather than aborting the sweep;
/// parameter errors are returned immediately.
pub fn finite_size_thresholds<R: Rng + ?Sized>(
    sizes: &[usize],
    m: usize,
    search: &ThresholdSearch,
    rng: &mut R,
) -> Result<Vec<FiniteSizeThreshold>> {
    search.validate()?;
    check_trials(m)?;
    for &n in sizes {
        check_side(n)?;
    }

    let mut out = Vec::with_capacity(sizes.len());
    for &n in sizes {
        let mut sampler = MonteCarloSampler::new(n, m, &mut *rng)?;
        let entry = match search.run(&mut sampler) {
            Ok(estimate) => FiniteSizeThreshold {
                n,
                estimate: Some(estimate),
                stopped: None,
                best: None,
            },
            Err(Error::ThresholdNotConverged { reason, best, .. }) => FiniteSizeThreshold {
                n,
                estimate: None,
                stopped: Some(reason),
                best: Some(best),
            },
            Err(e) => return Err(e),
        };
        out.push(entry);
    }
    Ok(out)
}
