//! Sparse matrix utilities shared across hexsge

use crate::core::error::{HexSgeError, Result};
use itertools::Itertools;
use nalgebra_sparse::ops::serial::{spmm_csr_pattern, spmm_csr_prealloc};
use nalgebra_sparse::ops::Op;
use nalgebra_sparse::{CooMatrix, CsrMatrix};

pub struct SparseOps;

impl SparseOps {
    /// Create a CSR matrix from triplets; duplicate coordinates are summed.
    pub fn from_triplets_u32(
        nrows: usize,
        ncols: usize,
        triplets: Vec<(usize, usize, u32)>,
    ) -> Result<CsrMatrix<u32>> {
        if nrows == 0 || ncols == 0 || triplets.is_empty() {
            return Ok(CsrMatrix::zeros(nrows, ncols));
        }

        for &(row, col, _) in &triplets {
            if row >= nrows || col >= ncols {
                return Err(HexSgeError::InvalidInput(format!(
                    "Index ({}, {}) exceeds matrix dimensions ({}, {})",
                    row, col, nrows, ncols
                )));
            }
        }

        let (row_indices, col_indices, values): (Vec<_>, Vec<_>, Vec<_>) =
            triplets.into_iter().multiunzip();

        let coo = CooMatrix::try_from_triplets(nrows, ncols, row_indices, col_indices, values)
            .map_err(|e| HexSgeError::SparseMatrix(format!("COO creation failed: {:?}", e)))?;

        Ok(CsrMatrix::from(&coo))
    }

    /// Build a 0/1 membership matrix with one row per group.
    ///
    /// `members[r]` lists the column indices belonging to row `r`; each list must be
    /// strictly increasing.
    pub fn membership_matrix(ncols: usize, members: &[&[usize]]) -> Result<CsrMatrix<u32>> {
        let nnz = members.iter().map(|m| m.len()).sum();
        let mut row_offsets = Vec::with_capacity(members.len() + 1);
        let mut col_indices = Vec::with_capacity(nnz);
        row_offsets.push(0);
        for row in members {
            col_indices.extend_from_slice(row);
            row_offsets.push(col_indices.len());
        }

        CsrMatrix::try_from_csr_data(members.len(), ncols, row_offsets, col_indices, vec![1u32; nnz])
            .map_err(|e| {
                HexSgeError::SparseMatrix(format!("Failed to create membership matrix: {:?}", e))
            })
    }

    /// Sparse product `a × b` with a dimension check.
    pub fn multiply(a: &CsrMatrix<u32>, b: &CsrMatrix<u32>) -> Result<CsrMatrix<u32>> {
        if a.ncols() != b.nrows() {
            return Err(HexSgeError::DimensionMismatch {
                expected: format!("{} rows on the right-hand side", a.ncols()),
                actual: format!("{}×{}", b.nrows(), b.ncols()),
            });
        }

        let pattern = spmm_csr_pattern(a.pattern(), b.pattern());
        let nnz = pattern.nnz();
        let mut product = CsrMatrix::try_from_pattern_and_values(pattern, vec![0u32; nnz])
            .map_err(|e| {
                HexSgeError::SparseMatrix(format!("Failed to create product matrix: {:?}", e))
            })?;

        // product = 0 * product + 1 * (a * b)
        spmm_csr_prealloc(0u32, &mut product, 1u32, Op::NoOp(a), Op::NoOp(b))
            .map_err(|e| HexSgeError::SparseMatrix(format!("Sparse product failed: {:?}", e)))?;
        Ok(product)
    }

    /// Row sums saturating at `u64::MAX`.
    pub fn compute_row_sums(matrix: &CsrMatrix<u32>) -> Vec<u64> {
        matrix
            .row_iter()
            .map(|row| {
                row.values()
                    .iter()
                    .fold(0u64, |acc, &val| acc.saturating_add(val as u64))
            })
            .collect()
    }
}

/// Trait extension for additional sparse matrix operations
pub trait SparseMatrixExt<T> {
    /// Nonzero `(row, col, value)` entries in row-major order, skipping explicit zeros.
    fn nonzero_triplets(&self) -> Vec<(usize, usize, T)>;
}

impl SparseMatrixExt<u32> for CsrMatrix<u32> {
    fn nonzero_triplets(&self) -> Vec<(usize, usize, u32)> {
        self.triplet_iter()
            .filter_map(|(row, col, &val)| if val > 0 { Some((row, col, val)) } else { None })
            .collect()
    }
}
