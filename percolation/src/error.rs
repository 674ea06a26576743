//! Error types for the percolation core.

use serde::Serialize;
use thiserror::Error;

use crate::threshold::ThresholdEstimate;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a threshold search stopped before meeting its tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StopReason {
    /// The maximum number of bisection steps was used up.
    IterationCap,
    /// The wall-clock budget ran out between two steps.
    Deadline,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::IterationCap => write!(f, "iteration cap reached"),
            StopReason::Deadline => write!(f, "time budget exhausted"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// A caller-supplied parameter is out of its domain.
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// Bisection stopped without the sampled probability landing within
    /// tolerance of 0.5. `best` is the midpoint whose sample came closest.
    #[error(
        "Threshold search did not converge after {iterations} iterations ({reason}); \
         best p = {:.5} with P = {:.4}",
        .best.threshold,
        .best.sampled_probability
    )]
    ThresholdNotConverged {
        reason: StopReason,
        iterations: usize,
        best: ThresholdEstimate,
    },

    /// Configuration file is inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Largest lattice side: every site label of an N x N grid must fit in `u32`.
pub const MAX_SIDE: usize = u16::MAX as usize;

/// Reject a lattice side of zero or above [`MAX_SIDE`].
pub(crate) fn check_side(n: usize) -> Result<()> {
    if n == 0 {
        return Err(Error::invalid("n", "lattice side must be at least 1"));
    }
    if n > MAX_SIDE {
        return Err(Error::invalid(
            "n",
            format!("lattice side {n} exceeds the maximum of {MAX_SIDE}"),
        ));
    }
    Ok(())
}

/// Reject an empty, non-square or oversized grid.
pub(crate) fn check_grid(name: &'static str, (rows, cols): (usize, usize)) -> Result<()> {
    if rows == 0 || rows != cols {
        return Err(Error::invalid(
            name,
            format!("expected a non-empty square grid, got {rows}x{cols}"),
        ));
    }
    check_side(rows)
}

/// Reject probabilities outside [0, 1], NaN included.
pub(crate) fn check_probability(p: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&p) {
        return Err(Error::invalid("p", format!("{p} is not in [0, 1]")));
    }
    Ok(())
}

/// Reject an empty batch of trials.
pub(crate) fn check_trials(m: usize) -> Result<()> {
    if m == 0 {
        return Err(Error::invalid("m", "at least one trial is required"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probability_bounds_are_inclusive() {
        assert!(check_probability(0.0).is_ok());
        assert!(check_probability(1.0).is_ok());
        assert!(check_probability(-1e-12).is_err());
        assert!(check_probability(1.0 + 1e-12).is_err());
        assert!(check_probability(f64::NAN).is_err());
    }

    #[test]
    fn grid_must_be_square_and_non_empty() {
        assert!(check_grid("labels", (3, 3)).is_ok());
        assert!(check_grid("labels", (3, 2)).is_err());
        assert!(check_grid("labels", (0, 0)).is_err());
    }

    #[test]
    fn zero_side_and_zero_trials_are_rejected() {
        assert!(matches!(
            check_side(0),
            Err(Error::InvalidParameter { name: "n", .. })
        ));
        assert!(matches!(
            check_trials(0),
            Err(Error::InvalidParameter { name: "m", .. })
        ));
        assert!(check_side(1).is_ok());
        assert!(check_side(MAX_SIDE).is_ok());
        assert!(check_side(MAX_SIDE + 1).is_err());
        assert!(check_trials(1).is_ok());
    }
}
