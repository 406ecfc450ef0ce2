//! Model problems for exercising smoothers.
//!
//! Finite-difference Laplacians on uniform grids with homogeneous Dirichlet
//! boundaries. They are symmetric positive definite and weakly diagonally
//! dominant, the classic setting for relaxation schemes.

use crate::error::{Error, Result};
use crate::matrix::{CsrMatrix, csr_from_triplets};

/// 1D Laplacian: tridiagonal matrix with stencil `[-1, 2, -1]`.
pub fn laplace_1d(n: usize) -> Result<CsrMatrix> {
    if n == 0 {
        return Err(Error::InvalidArgument(
            "grid needs at least one point".to_string(),
        ));
    }

    let mut triplets = Vec::with_capacity(3 * n);
    for i in 0..n {
        triplets.push((i, i, 2.0));
        if i + 1 < n {
            triplets.push((i, i + 1, -1.0));
            triplets.push((i + 1, i, -1.0));
        }
    }
    csr_from_triplets(n, n, &triplets)
}

/// 2D Laplacian on an `nx` x `ny` grid: 5-point stencil, lexicographic order.
///
/// Unknown `(i, j)` has index `j * nx + i`.
pub fn laplace_2d(nx: usize, ny: usize) -> Result<CsrMatrix> {
    if nx == 0 || ny == 0 {
        return Err(Error::InvalidArgument(
            "grid needs at least one point in each direction".to_string(),
        ));
    }

    let n = nx * ny;
    let mut triplets = Vec::with_capacity(5 * n);
    for j in 0..ny {
        for i in 0..nx {
            let row = j * nx + i;
            triplets.push((row, row, 4.0));
            if i > 0 {
                triplets.push((row, row - 1, -1.0));
            }
            if i + 1 < nx {
                triplets.push((row, row + 1, -1.0));
            }
            if j > 0 {
                triplets.push((row, row - nx, -1.0));
            }
            if j + 1 < ny {
                triplets.push((row, row + nx, -1.0));
            }
        }
    }
    csr_from_triplets(n, n, &triplets)
}

/// One DoF group per grid line of an `nx` x `ny` grid (line relaxation).
pub fn line_blocks(nx: usize, ny: usize) -> Vec<Vec<usize>> {
    (0..ny)
        .map(|j| (0..nx).map(|i| j * nx + i).collect())
        .collect()
}
