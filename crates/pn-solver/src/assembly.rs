//! Rank renumbering and sparse system assembly.

use pn_core::ElementId;
use pn_network::Network;

/// Assign contiguous solver ranks to the given nodes, clearing every other
/// node's rank. Returns the active-node count. Recomputed whenever the
/// active set changes; stale ranks are never reused.
pub fn assign_ranks(network: &mut Network, active: &[ElementId]) -> usize {
    for id in network.node_ids().collect::<Vec<_>>() {
        if let Some(n) = network[id].node_mut() {
            n.rank = None;
        }
    }
    for (rank, &id) in active.iter().enumerate() {
        if let Some(n) = network[id].node_mut() {
            n.rank = Some(rank);
        }
    }
    active.len()
}

/// Symmetric sparse system in CSR form, assembled row-by-row.
///
/// Rows are accumulated as (col, val) lists and compressed on `finish`;
/// duplicate coefficients on one (row, col) pair are summed.
#[derive(Clone, Debug)]
pub struct SparseSystem {
    n: usize,
    rows: Vec<Vec<(usize, f64)>>,
    pub rhs: Vec<f64>,
    offsets: Vec<usize>,
    cols: Vec<usize>,
    vals: Vec<f64>,
    compressed: bool,
}

impl SparseSystem {
    pub fn new(n: usize) -> Self {
        Self {
            n,
            rows: vec![Vec::new(); n],
            rhs: vec![0.0; n],
            offsets: Vec::new(),
            cols: Vec::new(),
            vals: Vec::new(),
            compressed: false,
        }
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn add(&mut self, row: usize, col: usize, val: f64) {
        debug_assert!(!self.compressed, "system already compressed");
        self.rows[row].push((col, val));
    }

    pub fn add_rhs(&mut self, row: usize, val: f64) {
        self.rhs[row] += val;
    }

    /// Compress accumulated entries into CSR arrays.
    pub fn finish(&mut self) {
        if self.compressed {
            return;
        }
        self.offsets = Vec::with_capacity(self.n + 1);
        self.offsets.push(0);
        for row in &mut self.rows {
            row.sort_by_key(|&(c, _)| c);
            let mut merged: Vec<(usize, f64)> = Vec::with_capacity(row.len());
            for &(c, v) in row.iter() {
                match merged.last_mut() {
                    Some(last) if last.0 == c => last.1 += v,
                    _ => merged.push((c, v)),
                }
            }
            for (c, v) in merged {
                self.cols.push(c);
                self.vals.push(v);
            }
            self.offsets.push(self.cols.len());
        }
        self.rows.clear();
        self.compressed = true;
    }

    /// y = A·x
    pub fn matvec(&self, x: &[f64], y: &mut [f64]) {
        debug_assert!(self.compressed);
        for row in 0..self.n {
            let mut acc = 0.0;
            for k in self.offsets[row]..self.offsets[row + 1] {
                acc += self.vals[k] * x[self.cols[k]];
            }
            y[row] = acc;
        }
    }

    /// Diagonal entries, for the Jacobi preconditioner.
    pub fn diagonal(&self) -> Vec<f64> {
        debug_assert!(self.compressed);
        let mut diag = vec![0.0; self.n];
        for row in 0..self.n {
            for k in self.offsets[row]..self.offsets[row + 1] {
                if self.cols[k] == row {
                    diag[row] = self.vals[k];
                }
            }
        }
        diag
    }

    /// Densify for the direct Cholesky backend.
    pub fn to_dense(&self) -> nalgebra::DMatrix<f64> {
        debug_assert!(self.compressed);
        let mut m = nalgebra::DMatrix::zeros(self.n, self.n);
        for row in 0..self.n {
            for k in self.offsets[row]..self.offsets[row + 1] {
                m[(row, self.cols[k])] = self.vals[k];
            }
        }
        m
    }
}
