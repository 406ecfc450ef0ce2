//! Relaxation sweep primitives.
//!
//! Each function performs one pass of a relaxation scheme for the system
//! `A x = f`, updating `x` in place. `A` must be square and conform to `x` and
//! `f`; otherwise [`Error::DimensionMismatch`] is returned and `x` is left
//! untouched.
//!
//! Zero diagonal entries are not checked. Jacobi and Gauss-Seidel divide by
//! them and the resulting Inf/NaN propagate to the caller's convergence check.

use nalgebra::{DMatrix, DVector};

use crate::error::{Error, Result};
use crate::matrix::{SystemMatrix, check_square_system};

/// Default damping factor for [`damped_richardson_sweep`].
pub const DEFAULT_RICHARDSON_DAMPING: f64 = 1.0;

/// Default damping factor for [`damped_jacobi_sweep`].
pub const DEFAULT_JACOBI_DAMPING: f64 = 0.5;

/// Update `x` with a damped Richardson sweep: x += tau * (f - A x).
pub fn damped_richardson_sweep<M: SystemMatrix + ?Sized>(
    a: &M,
    x: &mut [f64],
    f: &[f64],
    tau: f64,
) -> Result<()> {
    check_square_system(a, x.len(), f.len())?;

    let mut ax = vec![0.0; x.len()];
    richardson_update(a, x, f, tau, &mut ax);
    Ok(())
}

/// Update `x` with an undamped Jacobi sweep: x += D^-1 (f - A x).
pub fn jacobi_sweep<M: SystemMatrix + ?Sized>(a: &M, x: &mut [f64], f: &[f64]) -> Result<()> {
    damped_jacobi_sweep(a, x, f, 1.0)
}

/// Update `x` with a damped Jacobi sweep: x += tau * D^-1 (f - A x).
pub fn damped_jacobi_sweep<M: SystemMatrix + ?Sized>(
    a: &M,
    x: &mut [f64],
    f: &[f64],
    tau: f64,
) -> Result<()> {
    check_square_system(a, x.len(), f.len())?;

    let inv_diag = inverse_diagonal(a);
    let mut ax = vec![0.0; x.len()];
    jacobi_update(a, &inv_diag, x, f, tau, &mut ax);
    Ok(())
}

/// Update `x` with a forward Gauss-Seidel sweep (rows in increasing order).
pub fn gauss_seidel_sweep<M: SystemMatrix + ?Sized>(
    a: &M,
    x: &mut [f64],
    f: &[f64],
) -> Result<()> {
    check_square_system(a, x.len(), f.len())?;

    for i in 0..x.len() {
        gauss_seidel_row(a, x, f, i);
    }
    Ok(())
}

/// Update `x` with a backward Gauss-Seidel sweep (rows in decreasing order).
pub fn reverse_gauss_seidel_sweep<M: SystemMatrix + ?Sized>(
    a: &M,
    x: &mut [f64],
    f: &[f64],
) -> Result<()> {
    check_square_system(a, x.len(), f.len())?;

    for i in (0..x.len()).rev() {
        gauss_seidel_row(a, x, f, i);
    }
    Ok(())
}

/// Relax the unknowns in `dofs` simultaneously.
///
/// Solves the local system `A[dofs, dofs] * d = (f - A x)[dofs]` with a dense
/// LU and adds the correction `d` to `x[dofs]`. All other unknowns stay fixed.
pub fn gauss_seidel_single_block<M: SystemMatrix + ?Sized>(
    a: &M,
    x: &mut [f64],
    f: &[f64],
    dofs: &[usize],
) -> Result<()> {
    check_square_system(a, x.len(), f.len())?;
    check_dofs(dofs, x.len())?;

    block_update(a, x, f, dofs)
}

/// Block Gauss-Seidel sweep over the DoF groups in `blocks`, in order.
pub fn block_gauss_seidel_sweep<M: SystemMatrix + ?Sized>(
    a: &M,
    x: &mut [f64],
    f: &[f64],
    blocks: &[Vec<usize>],
) -> Result<()> {
    check_square_system(a, x.len(), f.len())?;
    for dofs in blocks {
        check_dofs(dofs, x.len())?;
    }

    for dofs in blocks {
        block_update(a, x, f, dofs)?;
    }
    Ok(())
}

// ============================================================================
// Unchecked kernels shared with the operator wrappers
// ============================================================================

/// x += tau * (f - A x), using `ax` as scratch.
pub(crate) fn richardson_update<M: SystemMatrix + ?Sized>(
    a: &M,
    x: &mut [f64],
    f: &[f64],
    tau: f64,
    ax: &mut [f64],
) {
    a.mul_vec(x, ax);
    for ((xi, &fi), &axi) in x.iter_mut().zip(f.iter()).zip(ax.iter()) {
        *xi += tau * (fi - axi);
    }
}

/// x += tau * D^-1 (f - A x), using `ax` as scratch.
pub(crate) fn jacobi_update<M: SystemMatrix + ?Sized>(
    a: &M,
    inv_diag: &[f64],
    x: &mut [f64],
    f: &[f64],
    tau: f64,
    ax: &mut [f64],
) {
    a.mul_vec(x, ax);
    for (i, xi) in x.iter_mut().enumerate() {
        *xi += tau * (f[i] - ax[i]) * inv_diag[i];
    }
}

/// Entry-wise reciprocal of the diagonal. Zero entries become infinite.
pub(crate) fn inverse_diagonal<M: SystemMatrix + ?Sized>(a: &M) -> Vec<f64> {
    a.diagonal().iter().map(|&d| 1.0 / d).collect()
}

fn gauss_seidel_row<M: SystemMatrix + ?Sized>(a: &M, x: &mut [f64], f: &[f64], i: usize) {
    let mut sum = f[i];
    let mut diag = 0.0;
    a.for_each_in_row(i, &mut |j, aij| {
        if j == i {
            diag += aij;
        } else {
            sum -= aij * x[j];
        }
    });
    x[i] = sum / diag;
}

fn block_update<M: SystemMatrix + ?Sized>(
    a: &M,
    x: &mut [f64],
    f: &[f64],
    dofs: &[usize],
) -> Result<()> {
    let size = dofs.len();
    if size == 0 {
        return Ok(());
    }

    let local_mat = DMatrix::from_fn(size, size, |i, j| a.entry(dofs[i], dofs[j]));
    let local_res = DVector::from_fn(size, |i, _| f[dofs[i]] - a.row_dot(dofs[i], x));

    let correction = local_mat.lu().solve(&local_res).ok_or(Error::SingularMatrix)?;

    for (k, &dof) in dofs.iter().enumerate() {
        x[dof] += correction[k];
    }
    Ok(())
}

pub(crate) fn check_dofs(dofs: &[usize], n: usize) -> Result<()> {
    if let Some(&bad) = dofs.iter().find(|&&dof| dof >= n) {
        return Err(Error::InvalidArgument(format!(
            "degree of freedom {} out of range for system of size {}",
            bad, n
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{csr_from_triplets, norm2, residual};
    use nalgebra::dmatrix;

    fn tridiagonal() -> crate::matrix::CsrMatrix {
        // [ 4 -1  0]
        // [-1  4 -1]
        // [ 0 -1  4]
        csr_from_triplets(
            3,
            3,
            &[
                (0, 0, 4.0),
                (0, 1, -1.0),
                (1, 0, -1.0),
                (1, 1, 4.0),
                (1, 2, -1.0),
                (2, 1, -1.0),
                (2, 2, 4.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn richardson_from_zero_is_scaled_rhs() {
        let a = tridiagonal();
        let f = vec![1.0, -2.0, 3.0];
        let mut x = vec![0.0; 3];
        damped_richardson_sweep(&a, &mut x, &f, 0.25).unwrap();

        assert_eq!(x, vec![0.25, -0.5, 0.75]);
    }

    #[test]
    fn jacobi_on_diagonal_matrix_is_exact() {
        let a = csr_from_triplets(3, 3, &[(0, 0, 2.0), (1, 1, 4.0), (2, 2, 5.0)]).unwrap();
        let f = vec![2.0, 8.0, 10.0];
        let mut x = vec![7.0, -3.0, 0.5];
        jacobi_sweep(&a, &mut x, &f).unwrap();

        assert!((x[0] - 1.0).abs() < 1e-15);
        assert!((x[1] - 2.0).abs() < 1e-15);
        assert!((x[2] - 2.0).abs() < 1e-15);
    }

    #[test]
    fn damped_jacobi_takes_half_step() {
        let a = csr_from_triplets(2, 2, &[(0, 0, 2.0), (1, 1, 4.0)]).unwrap();
        let f = vec![2.0, 8.0];
        let mut x = vec![0.0; 2];
        damped_jacobi_sweep(&a, &mut x, &f, DEFAULT_JACOBI_DAMPING).unwrap();

        // Full step would reach [1, 2]
        assert!((x[0] - 0.5).abs() < 1e-15);
        assert!((x[1] - 1.0).abs() < 1e-15);
    }

    #[test]
    fn jacobi_zero_diagonal_is_not_checked() {
        let a = dmatrix![0.0, 1.0; 1.0, 2.0];
        let mut x = vec![0.0; 2];
        jacobi_sweep(&a, &mut x, &[1.0, 1.0]).unwrap();
        assert!(!x[0].is_finite());
    }

    #[test]
    fn forward_gauss_seidel_by_hand() {
        let a = tridiagonal();
        let f = vec![4.0, 4.0, 4.0];
        let mut x = vec![0.0; 3];
        gauss_seidel_sweep(&a, &mut x, &f).unwrap();

        // x0 = 4/4 = 1
        // x1 = (4 + 1*1)/4 = 1.25
        // x2 = (4 + 1.25)/4 = 1.3125
        assert!((x[0] - 1.0).abs() < 1e-15);
        assert!((x[1] - 1.25).abs() < 1e-15);
        assert!((x[2] - 1.3125).abs() < 1e-15);
    }

    #[test]
    fn reverse_gauss_seidel_by_hand() {
        let a = tridiagonal();
        let f = vec![4.0, 4.0, 4.0];
        let mut x = vec![0.0; 3];
        reverse_gauss_seidel_sweep(&a, &mut x, &f).unwrap();

        assert!((x[2] - 1.0).abs() < 1e-15);
        assert!((x[1] - 1.25).abs() < 1e-15);
        assert!((x[0] - 1.3125).abs() < 1e-15);
    }

    #[test]
    fn gauss_seidel_on_lower_triangular_is_exact() {
        // Forward substitution solves a lower triangular system in one sweep
        let a = dmatrix![2.0, 0.0, 0.0; 1.0, 3.0, 0.0; -1.0, 2.0, 4.0];
        let x_true = vec![1.0, -1.0, 2.0];
        let mut f = vec![0.0; 3];
        SystemMatrix::mul_vec(&a, &x_true, &mut f);

        let mut x = vec![0.0; 3];
        gauss_seidel_sweep(&a, &mut x, &f).unwrap();

        for i in 0..3 {
            assert!((x[i] - x_true[i]).abs() < 1e-14, "x[{}] = {}", i, x[i]);
        }
    }

    #[test]
    fn single_block_covering_all_dofs_solves_exactly() {
        let a = tridiagonal();
        let f = vec![1.0, 2.0, 3.0];
        let mut x = vec![0.3, -0.2, 0.1];
        gauss_seidel_single_block(&a, &mut x, &f, &[0, 1, 2]).unwrap();

        let mut r = vec![0.0; 3];
        residual(&a, &x, &f, &mut r).unwrap();
        assert!(norm2(&r) < 1e-13);
    }

    #[test]
    fn single_block_leaves_other_dofs_fixed() {
        let a = tridiagonal();
        let f = vec![1.0, 2.0, 3.0];
        let mut x = vec![0.3, -0.2, 0.1];
        gauss_seidel_single_block(&a, &mut x, &f, &[0, 1]).unwrap();

        assert_eq!(x[2], 0.1);

        // Rows 0 and 1 are satisfied exactly
        let mut r = vec![0.0; 3];
        residual(&a, &x, &f, &mut r).unwrap();
        assert!(r[0].abs() < 1e-14);
        assert!(r[1].abs() < 1e-14);
    }

    #[test]
    fn singleton_blocks_match_pointwise_gauss_seidel() {
        let a = tridiagonal();
        let f = vec![1.0, -1.0, 2.0];
        let blocks = vec![vec![0], vec![1], vec![2]];

        let mut x_block = vec![0.0; 3];
        block_gauss_seidel_sweep(&a, &mut x_block, &f, &blocks).unwrap();

        let mut x_point = vec![0.0; 3];
        gauss_seidel_sweep(&a, &mut x_point, &f).unwrap();

        for i in 0..3 {
            assert!((x_block[i] - x_point[i]).abs() < 1e-14);
        }
    }

    #[test]
    fn singular_block_is_reported() {
        let a = dmatrix![1.0, 1.0; 1.0, 1.0];
        let mut x = vec![0.0; 2];
        let result = gauss_seidel_single_block(&a, &mut x, &[1.0, 2.0], &[0, 1]);
        assert!(matches!(result, Err(Error::SingularMatrix)));
    }

    #[test]
    fn out_of_range_dof_is_rejected() {
        let a = tridiagonal();
        let mut x = vec![0.0; 3];
        let result = block_gauss_seidel_sweep(&a, &mut x, &[0.0; 3], &[vec![0], vec![3]]);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
        // Validation happens before any block is relaxed
        assert_eq!(x, vec![0.0; 3]);
    }

    #[test]
    fn dimension_mismatch_is_reported() {
        let a = tridiagonal();
        let mut x = vec![0.0; 2];
        let f = vec![0.0; 3];

        assert!(matches!(
            damped_richardson_sweep(&a, &mut x, &f, 1.0),
            Err(Error::DimensionMismatch { .. })
        ));
        assert!(matches!(
            jacobi_sweep(&a, &mut x, &f),
            Err(Error::DimensionMismatch { .. })
        ));
        assert!(matches!(
            gauss_seidel_sweep(&a, &mut x, &f),
            Err(Error::DimensionMismatch { .. })
        ));
        assert!(matches!(
            reverse_gauss_seidel_sweep(&a, &mut x, &f),
            Err(Error::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn non_square_matrix_is_rejected() {
        let a = dmatrix![1.0, 2.0, 3.0; 4.0, 5.0, 6.0];
        let mut x = vec![0.0; 2];
        let result = gauss_seidel_sweep(&a, &mut x, &[0.0; 2]);
        assert!(matches!(result, Err(Error::DimensionMismatch { .. })));
    }
}
