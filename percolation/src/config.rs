//! Simulation configuration, loadable from a JSON file.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{check_probability, check_side, check_trials, Error, Result};
use crate::threshold::{ThresholdSearch, DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE};

/// Lattice sides of the finite-size sweep.
pub const DEFAULT_SIZES: [usize; 6] = [16, 64, 128, 256, 512, 1024];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Lattice side N.
    pub lattice_size: usize,
    /// Occupation probability for fixed-p runs.
    pub probability: f64,
    /// Trials per batch (M).
    pub trials: usize,
    pub tolerance: f64,
    pub max_iterations: usize,
    /// Optional wall-clock budget per threshold search, in seconds.
    pub time_budget_secs: Option<f64>,
    pub seed: u64,
    /// Lattice sides of the finite-size sweep.
    pub sizes: Vec<usize>,
    pub out_dir: String,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            lattice_size: 64,
            probability: 0.6,
            trials: 500,
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            time_budget_secs: None,
            seed: 42,
            sizes: DEFAULT_SIZES.to_vec(),
            out_dir: "results".into(),
        }
    }
}

impl SimulationConfig {
    /// Read a JSON config; absent keys keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let cfg: Self = serde_json::from_str(&json)?;
        cfg.validate()?;
        tracing::debug!(path = %path.as_ref().display(), "loaded config");
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        check_side(self.lattice_size)?;
        check_probability(self.probability)?;
        check_trials(self.trials)?;
        if self.sizes.is_empty() {
            return Err(Error::Config("`sizes` must list at least one lattice side".into()));
        }
        for &n in &self.sizes {
            check_side(n)?;
        }
        self.threshold_search()?.validate()
    }

    pub fn threshold_search(&self) -> Result<ThresholdSearch> {
        let time_budget = match self.time_budget_secs {
            Some(secs) => Some(Duration::try_from_secs_f64(secs).map_err(|_| {
                Error::Config(format!(
                    "`time_budget_secs` must be a non-negative number of seconds \
                     representable as a duration, got {secs}"
                ))
            })?),
            None => None,
        };
        Ok(ThresholdSearch {
            tolerance: self.tolerance,
            max_iterations: self.max_iterations,
            time_budget,
        })
    }
}
