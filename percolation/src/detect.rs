//! Boundary-spanning detection on a labeled lattice.
//!
//! A cluster label present on both of two opposite boundaries means one
//! connected cluster touches both, so the lattice percolates in that
//! direction. No path reconstruction is needed.

use std::collections::HashSet;

use ndarray::ArrayView1;
use serde::Serialize;

use crate::cluster::{LabeledLattice, EMPTY};

/// Which directions a lattice percolates in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Spanning {
    /// A cluster touches both row 0 and the last row.
    pub vertical: bool,
    /// A cluster touches both column 0 and the last column.
    pub horizontal: bool,
}

impl Spanning {
    #[inline]
    pub fn any(&self) -> bool {
        self.vertical || self.horizontal
    }
}

/// True when any cluster spans top-to-bottom or left-to-right.
pub fn detects_percolation(labeled: &LabeledLattice) -> bool {
    spanning(labeled).any()
}

pub fn spanning(labeled: &LabeledLattice) -> Spanning {
    let labels = labeled.labels();
    let last = labeled.side().saturating_sub(1);
    if labels.is_empty() {
        return Spanning::default();
    }
    Spanning {
        vertical: shares_cluster(labels.row(0), labels.row(last)),
        horizontal: shares_cluster(labels.column(0), labels.column(last)),
    }
}

/// Non-empty label intersection of two boundary lines.
fn shares_cluster(a: ArrayView1<'_, u32>, b: ArrayView1<'_, u32>) -> bool {
    let first: HashSet<u32> = a.iter().copied().filter(|&l| l != EMPTY).collect();
    if first.is_empty() {
        return false;
    }
    b.iter().any(|l| first.contains(l))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::label;
    use crate::lattice::{generate, Lattice};
    use ndarray::{array, Array2};
    use rand::seq::SliceRandom;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn labeled(rows: Array2<u8>) -> LabeledLattice {
        label(&Lattice::from_sites(rows.mapv(|v| v == 1)).unwrap())
    }

    #[test]
    fn vertical_path() {
        let s = spanning(&labeled(array![[0, 1, 0], [0, 1, 1], [0, 0, 1]]));
        assert!(s.vertical);
        assert!(!s.horizontal);
    }

    #[test]
    fn horizontal_path() {
        let s = spanning(&labeled(array![[0, 0, 0], [1, 1, 0], [0, 1, 1]]));
        assert!(!s.vertical);
        assert!(s.horizontal);
    }

    #[test]
    fn touching_both_boundaries_with_different_clusters_does_not_percolate() {
        let l = labeled(array![[1, 0, 0], [0, 0, 0], [1, 0, 0]]);
        assert_eq!(l.cluster_count(), 2);
        // Column 0 holds both clusters; column 2 is empty.
        assert!(!detects_percolation(&l));
    }

    #[test]
    fn empty_boundaries_are_not_a_match() {
        // Rows 0 and 2 are both all zero; label 0 must not count.
        let l = labeled(array![[0, 0, 0], [0, 1, 0], [0, 0, 0]]);
        assert!(!detects_percolation(&l));
    }

    #[test]
    fn single_occupied_site_percolates() {
        assert!(detects_percolation(&labeled(array![[1]])));
        assert!(!detects_percolation(&labeled(array![[0]])));
    }

    #[test]
    fn invariant_under_label_permutation() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..25 {
            let original = label(&generate(24, 0.58, &mut rng).unwrap());
            let k = original.cluster_count() as u32;
            let mut perm: Vec<u32> = (1..=k).map(|l| l * 1_000 + 3).collect();
            perm.shuffle(&mut rng);
            let relabeled = LabeledLattice::from_labels(
                original
                    .labels()
                    .mapv(|l| if l == EMPTY { EMPTY } else { perm[(l - 1) as usize] }),
            )
            .unwrap();
            assert_eq!(spanning(&original), spanning(&relabeled));
        }
    }
}
