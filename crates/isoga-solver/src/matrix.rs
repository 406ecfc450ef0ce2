//! Matrix interface consumed by the sweep primitives and operators.
//!
//! The relaxation schemes only need a handful of capabilities from a matrix:
//! its shape, its diagonal, row-wise traversal of the stored entries (for the
//! Gauss-Seidel recurrences) and a matrix-vector product. [`SystemMatrix`]
//! captures exactly that, and is implemented for faer's compressed sparse row
//! matrix ([`CsrMatrix`]) and nalgebra's dense [`DMatrix`].
//!
//! Matrices are never mutated through this interface.

use faer::sparse::{SparseRowMat, Triplet};
use nalgebra::DMatrix;

use crate::error::{Error, Result};

/// Sparse matrix in compressed row storage, the main matrix type of this crate.
pub type CsrMatrix = SparseRowMat<usize, f64>;

/// Read-only view of a (possibly rectangular) system matrix.
pub trait SystemMatrix: Send + Sync {
    /// Number of rows.
    fn nrows(&self) -> usize;

    /// Number of columns.
    fn ncols(&self) -> usize;

    /// Visit every stored entry of `row` as `(col, value)`.
    ///
    /// Entries are visited in storage order. Duplicates are not merged, so
    /// callers must accumulate rather than overwrite.
    fn for_each_in_row(&self, row: usize, f: &mut dyn FnMut(usize, f64));

    /// Value at `(row, col)`, zero if the entry is not stored.
    fn entry(&self, row: usize, col: usize) -> f64 {
        let mut value = 0.0;
        self.for_each_in_row(row, &mut |j, a| {
            if j == col {
                value += a;
            }
        });
        value
    }

    /// Main diagonal, `min(nrows, ncols)` entries.
    fn diagonal(&self) -> Vec<f64> {
        (0..self.nrows().min(self.ncols()))
            .map(|i| self.entry(i, i))
            .collect()
    }

    /// Inner product of `row` with `x`.
    fn row_dot(&self, row: usize, x: &[f64]) -> f64 {
        let mut sum = 0.0;
        self.for_each_in_row(row, &mut |j, a| sum += a * x[j]);
        sum
    }

    /// Matrix-vector product: y = A * x.
    ///
    /// `x` must have length `ncols()` and `y` length `nrows()`.
    fn mul_vec(&self, x: &[f64], y: &mut [f64]) {
        assert_eq!(x.len(), self.ncols());
        assert_eq!(y.len(), self.nrows());

        for (i, yi) in y.iter_mut().enumerate() {
            *yi = self.row_dot(i, x);
        }
    }
}

impl SystemMatrix for CsrMatrix {
    fn nrows(&self) -> usize {
        self.as_ref().nrows()
    }

    fn ncols(&self) -> usize {
        self.as_ref().ncols()
    }

    fn for_each_in_row(&self, row: usize, f: &mut dyn FnMut(usize, f64)) {
        let mat_ref = self.as_ref();
        let row_ptrs = mat_ref.row_ptr();
        let col_indices = mat_ref.col_idx();
        let values = mat_ref.val();

        // Uncompressed storage keeps slack between rows
        let row_start = row_ptrs[row];
        let row_end = match mat_ref.row_nnz() {
            Some(nnz) => row_start + nnz[row],
            None => row_ptrs[row + 1],
        };

        for idx in row_start..row_end {
            f(col_indices[idx], values[idx]);
        }
    }

    fn mul_vec(&self, x: &[f64], y: &mut [f64]) {
        assert_eq!(x.len(), SystemMatrix::ncols(self));
        assert_eq!(y.len(), SystemMatrix::nrows(self));

        // CSR matrix-vector multiplication: y[i] = A[i, :] . x
        let mat_ref = self.as_ref();
        let row_ptrs = mat_ref.row_ptr();
        let col_indices = mat_ref.col_idx();
        let values = mat_ref.val();
        let row_nnz = mat_ref.row_nnz();

        for (i, yi) in y.iter_mut().enumerate() {
            let row_start = row_ptrs[i];
            let row_end = match row_nnz {
                Some(nnz) => row_start + nnz[i],
                None => row_ptrs[i + 1],
            };

            let mut sum = 0.0;
            for idx in row_start..row_end {
                sum += values[idx] * x[col_indices[idx]];
            }
            *yi = sum;
        }
    }
}

impl SystemMatrix for DMatrix<f64> {
    fn nrows(&self) -> usize {
        DMatrix::nrows(self)
    }

    fn ncols(&self) -> usize {
        DMatrix::ncols(self)
    }

    fn for_each_in_row(&self, row: usize, f: &mut dyn FnMut(usize, f64)) {
        for j in 0..DMatrix::ncols(self) {
            f(j, self[(row, j)]);
        }
    }

    fn entry(&self, row: usize, col: usize) -> f64 {
        self[(row, col)]
    }
}

/// Build a [`CsrMatrix`] from `(row, col, value)` triplets.
///
/// Duplicate entries at the same position are summed.
pub fn csr_from_triplets(
    nrows: usize,
    ncols: usize,
    triplets: &[(usize, usize, f64)],
) -> Result<CsrMatrix> {
    let faer_triplets: Vec<_> = triplets
        .iter()
        .map(|&(r, c, v)| Triplet::new(r, c, v))
        .collect();

    CsrMatrix::try_new_from_triplets(nrows, ncols, &faer_triplets).map_err(|e| {
        Error::InvalidArgument(format!(
            "cannot build {}x{} sparse matrix from triplets: {:?}",
            nrows, ncols, e
        ))
    })
}

/// Check that `a` is square and conforms to vectors of length `x_len` and `f_len`.
pub(crate) fn check_square_system<M: SystemMatrix + ?Sized>(
    a: &M,
    x_len: usize,
    f_len: usize,
) -> Result<()> {
    let n = a.nrows();
    if a.ncols() != n {
        return Err(Error::DimensionMismatch {
            expected: n,
            actual: a.ncols(),
        });
    }
    if x_len != n {
        return Err(Error::DimensionMismatch {
            expected: n,
            actual: x_len,
        });
    }
    if f_len != n {
        return Err(Error::DimensionMismatch {
            expected: n,
            actual: f_len,
        });
    }
    Ok(())
}

/// Compute the residual r = f - A * x.
pub fn residual<M: SystemMatrix + ?Sized>(a: &M, x: &[f64], f: &[f64], r: &mut [f64]) -> Result<()> {
    if x.len() != a.ncols() {
        return Err(Error::DimensionMismatch {
            expected: a.ncols(),
            actual: x.len(),
        });
    }
    if f.len() != a.nrows() {
        return Err(Error::DimensionMismatch {
            expected: a.nrows(),
            actual: f.len(),
        });
    }
    if r.len() != a.nrows() {
        return Err(Error::DimensionMismatch {
            expected: a.nrows(),
            actual: r.len(),
        });
    }

    a.mul_vec(x, r);
    for (ri, &fi) in r.iter_mut().zip(f.iter()) {
        *ri = fi - *ri;
    }
    Ok(())
}

/// Euclidean norm of a vector.
pub fn norm2(v: &[f64]) -> f64 {
    v.iter().map(|&vi| vi * vi).sum::<f64>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::dmatrix;

    fn tridiagonal() -> CsrMatrix {
        // [ 2 -1  0]
        // [-1  2 -1]
        // [ 0 -1  2]
        csr_from_triplets(
            3,
            3,
            &[
                (0, 0, 2.0),
                (0, 1, -1.0),
                (1, 0, -1.0),
                (1, 1, 2.0),
                (1, 2, -1.0),
                (2, 1, -1.0),
                (2, 2, 2.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn csr_shape_and_diagonal() {
        let a = tridiagonal();
        assert_eq!(SystemMatrix::nrows(&a), 3);
        assert_eq!(SystemMatrix::ncols(&a), 3);
        assert_eq!(SystemMatrix::diagonal(&a), vec![2.0, 2.0, 2.0]);
        assert_eq!(SystemMatrix::entry(&a, 0, 2), 0.0);
        assert_eq!(SystemMatrix::entry(&a, 2, 1), -1.0);
    }

    #[test]
    fn csr_mul_vec() {
        let a = tridiagonal();
        let x = vec![1.0, 2.0, 3.0];
        let mut y = vec![0.0; 3];
        SystemMatrix::mul_vec(&a, &x, &mut y);

        // y[0] = 2*1 - 1*2 = 0
        // y[1] = -1*1 + 2*2 - 1*3 = 0
        // y[2] = -1*2 + 2*3 = 4
        assert!((y[0] - 0.0).abs() < 1e-15);
        assert!((y[1] - 0.0).abs() < 1e-15);
        assert!((y[2] - 4.0).abs() < 1e-15);
    }

    #[test]
    fn csr_duplicate_triplets_are_summed() {
        let a = csr_from_triplets(1, 1, &[(0, 0, 2.0), (0, 0, 3.0)]).unwrap();
        assert_eq!(SystemMatrix::entry(&a, 0, 0), 5.0);
    }

    #[test]
    fn csr_rejects_out_of_bounds_triplets() {
        let result = csr_from_triplets(2, 2, &[(0, 5, 1.0)]);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn dense_matches_sparse() {
        let sparse = tridiagonal();
        let dense = dmatrix![2.0, -1.0, 0.0; -1.0, 2.0, -1.0; 0.0, -1.0, 2.0];

        let x = vec![0.5, -1.0, 2.0];
        let mut ys = vec![0.0; 3];
        let mut yd = vec![0.0; 3];
        SystemMatrix::mul_vec(&sparse, &x, &mut ys);
        SystemMatrix::mul_vec(&dense, &x, &mut yd);

        assert_eq!(ys, yd);
        assert_eq!(SystemMatrix::diagonal(&dense), SystemMatrix::diagonal(&sparse));
    }

    #[test]
    fn rectangular_dense_diagonal() {
        let a = dmatrix![1.0, 2.0, 3.0; 4.0, 5.0, 6.0];
        assert_eq!(SystemMatrix::diagonal(&a), vec![1.0, 5.0]);
    }

    #[test]
    fn residual_of_exact_solution_is_zero() {
        let a = tridiagonal();
        let x = vec![1.0, 2.0, 3.0];
        let f = vec![0.0, 0.0, 4.0];
        let mut r = vec![1.0; 3];
        residual(&a, &x, &f, &mut r).unwrap();
        assert!(norm2(&r) < 1e-15);
    }

    #[test]
    fn residual_dimension_mismatch() {
        let a = tridiagonal();
        let mut r = vec![0.0; 3];
        let result = residual(&a, &[1.0, 2.0], &[0.0; 3], &mut r);
        assert!(matches!(result, Err(Error::DimensionMismatch { .. })));
    }

    #[test]
    fn square_system_check() {
        let a = dmatrix![1.0, 2.0, 3.0; 4.0, 5.0, 6.0];
        assert!(matches!(
            check_square_system(&a, 2, 2),
            Err(Error::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));

        let b = tridiagonal();
        assert!(check_square_system(&b, 3, 3).is_ok());
        assert!(check_square_system(&b, 3, 2).is_err());
    }

    #[test]
    fn norm2_basic() {
        assert!((norm2(&[3.0, 4.0]) - 5.0).abs() < 1e-15);
    }
}
