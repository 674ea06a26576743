//! Occupancy lattice generation.

use ndarray::Array2;
use rand::Rng;
use serde::Serialize;

use crate::error::{check_grid, check_probability, check_side, Result};

/// N x N grid of occupied (`true`) and empty (`false`) sites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Lattice {
    sites: Array2<bool>,
}

impl Lattice {
    /// Wrap an explicit occupancy grid. The grid must be square and non-empty.
    pub fn from_sites(sites: Array2<bool>) -> Result<Self> {
        check_grid("sites", sites.dim())?;
        Ok(Self { sites })
    }

    /// Lattice side N.
    #[inline]
    pub fn side(&self) -> usize {
        self.sites.nrows()
    }

    #[inline]
    pub fn sites(&self) -> &Array2<bool> {
        &self.sites
    }

    pub fn occupied_count(&self) -> usize {
        self.sites.iter().filter(|&&s| s).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.sites.iter().any(|&s| s)
    }
}

/// Generate an N x N lattice where each site is occupied independently with
/// probability `p`.
///
/// A site is occupied when a uniform draw in [0, 1) falls below `p`, so `p = 0`
/// never occupies and `p = 1` always does. Draws are taken in row-major order.
pub fn generate<R: Rng + ?Sized>(n: usize, p: f64, rng: &mut R) -> Result<Lattice> {
    check_side(n)?;
    check_probability(p)?;
    Ok(generate_unchecked(n, p, rng))
}

pub(crate) fn generate_unchecked<R: Rng + ?Sized>(n: usize, p: f64, rng: &mut R) -> Lattice {
    let sites = Array2::from_shape_simple_fn((n, n), || rng.random::<f64>() < p);
    Lattice { sites }
}
