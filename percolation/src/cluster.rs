//! Connected-component labeling over 4-neighbour (von Neumann) adjacency.
//!
//! Sites are indices into a flat row-major arena; clusters are union-find
//! roots. One pass unions every occupied site with its occupied right and
//! lower neighbours, a second pass hands out labels 1..k in the order roots
//! are first met during a raster scan. Both passes are iterative, so stack
//! depth does not grow with N.

use ndarray::Array2;
use serde::Serialize;

use crate::error::{check_grid, Result};
use crate::lattice::Lattice;

/// Label 0 marks an empty site.
pub const EMPTY: u32 = 0;

/// Per-site cluster labels of one lattice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabeledLattice {
    labels: Array2<u32>,
    cluster_count: usize,
}

impl LabeledLattice {
    /// Wrap an explicit label grid. The grid must be square and non-empty.
    /// `cluster_count` is taken as the number of distinct non-zero labels, so
    /// any positive integers may be used.
    pub fn from_labels(labels: Array2<u32>) -> Result<Self> {
        check_grid("labels", labels.dim())?;
        let mut seen: Vec<u32> = labels.iter().copied().filter(|&l| l != EMPTY).collect();
        seen.sort_unstable();
        seen.dedup();
        Ok(Self {
            labels,
            cluster_count: seen.len(),
        })
    }

    #[inline]
    pub fn labels(&self) -> &Array2<u32> {
        &self.labels
    }

    #[inline]
    pub fn side(&self) -> usize {
        self.labels.nrows()
    }

    #[inline]
    pub fn cluster_count(&self) -> usize {
        self.cluster_count
    }
}

/// Occupied-site count of each cluster, keyed by label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClusterCatalog {
    /// `(label, size)` pairs sorted by label.
    entries: Vec<(u32, usize)>,
}

impl ClusterCatalog {
    pub fn from_labeled(labeled: &LabeledLattice) -> Self {
        let labels = labeled.labels();
        let max = labels.iter().copied().max().unwrap_or(EMPTY) as usize;

        // Dense bincount when labels are compact (always true for `label`).
        if max <= labels.len() {
            let mut counts = vec![0usize; max + 1];
            for &l in labels.iter() {
                counts[l as usize] += 1;
            }
            let entries = counts
                .into_iter()
                .enumerate()
                .skip(1)
                .filter(|&(_, size)| size > 0)
                .map(|(l, size)| (l as u32, size))
                .collect();
            return Self { entries };
        }

        let mut sorted: Vec<u32> = labels.iter().copied().filter(|&l| l != EMPTY).collect();
        sorted.sort_unstable();
        let mut entries: Vec<(u32, usize)> = Vec::with_capacity(labeled.cluster_count());
        for label in sorted {
            match entries.last_mut() {
                Some((last, size)) if *last == label => *size += 1,
                _ => entries.push((label, 1)),
            }
        }
        Self { entries }
    }

    /// Number of clusters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Size of the largest cluster, 0 when there are none.
    pub fn largest(&self) -> usize {
        self.entries.iter().map(|&(_, s)| s).max().unwrap_or(0)
    }

    /// Sum of all cluster sizes; equals the occupied-site count of the lattice.
    pub fn total_sites(&self) -> usize {
        self.entries.iter().map(|&(_, s)| s).sum()
    }

    pub fn size_of(&self, label: u32) -> Option<usize> {
        self.entries
            .binary_search_by_key(&label, |&(l, _)| l)
            .ok()
            .map(|i| self.entries[i].1)
    }

    /// Cluster sizes in label order.
    pub fn sizes(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().map(|&(_, s)| s)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, usize)> + '_ {
        self.entries.iter().copied()
    }
}

/// Disjoint-set forest with path halving and union by size.
struct DisjointSets {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl DisjointSets {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    fn union(&mut self, a: usize, b: usize) {
        let mut ra = self.find(a);
        let mut rb = self.find(b);
        if ra == rb {
            return;
        }
        if self.size[ra] < self.size[rb] {
            std::mem::swap(&mut ra, &mut rb);
        }
        self.parent[rb] = ra;
        self.size[ra] += self.size[rb];
    }
}

/// Label the 4-connected clusters of `lattice`.
pub fn label(lattice: &Lattice) -> LabeledLattice {
    let n = lattice.side();
    let sites = lattice.sites();
    let mut sets = DisjointSets::new(n * n);

    for ((r, c), &occupied) in sites.indexed_iter() {
        if !occupied {
            continue;
        }
        let idx = r * n + c;
        if c + 1 < n && sites[[r, c + 1]] {
            sets.union(idx, idx + 1);
        }
        if r + 1 < n && sites[[r + 1, c]] {
            sets.union(idx, idx + n);
        }
    }

    // Root index -> assigned label, EMPTY until the root is first seen.
    let mut root_label = vec![EMPTY; n * n];
    let mut next = EMPTY;
    let mut labels = Array2::<u32>::zeros((n, n));

    for ((r, c), &occupied) in sites.indexed_iter() {
        if !occupied {
            continue;
        }
        let root = sets.find(r * n + c);
        if root_label[root] == EMPTY {
            next += 1;
            root_label[root] = next;
        }
        labels[[r, c]] = root_label[root];
    }

    LabeledLattice {
        labels,
        cluster_count: next as usize,
    }
}
