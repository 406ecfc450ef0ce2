//! Relaxation smoothers usable as preconditioners.
//!
//! Every smoother wraps a square system matrix `A` and approximates `A^-1` by
//! running a fixed number of relaxation sweeps for `A x = input`, starting
//! from a zero initial guess. The result is written to `output`.
//!
//! | Operator                   | First sweep            | Further sweeps             |
//! |----------------------------|------------------------|----------------------------|
//! | [`RichardsonOp`]           | `tau * input`          | damped Richardson          |
//! | [`JacobiOp`]               | `tau * D^-1 * input`   | damped Jacobi              |
//! | [`GaussSeidelOp`]          | forward sweep from 0   | forward sweep              |
//! | [`SymmetricGaussSeidelOp`] | forward + backward     | forward + backward         |
//! | [`BlockGaussSeidelOp`]     | block sweep from 0     | block sweep                |
//!
//! Richardson and Jacobi skip the matrix-vector product of the first sweep,
//! since the residual of the zero initial guess is the input itself.
//!
//! Matrices are held through an [`Arc`]: `new` takes a private matrix by value,
//! `from_shared` lets several operators reference one matrix.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::matrix::{CsrMatrix, SystemMatrix};
use crate::operator::{LinearOperator, check_apply_dims};
use crate::sweep::{
    block_gauss_seidel_sweep, check_dofs, gauss_seidel_sweep, inverse_diagonal,
    jacobi_update, reverse_gauss_seidel_sweep, richardson_update,
};

/// A linear operator whose accuracy is controlled by a sweep count.
pub trait Smoother: LinearOperator {
    /// Number of sweeps performed per application.
    fn num_of_sweeps(&self) -> usize;

    /// Set the number of sweeps performed per application.
    ///
    /// Fails with [`Error::InvalidArgument`] if `n` is zero.
    fn set_num_of_sweeps(&mut self, n: usize) -> Result<()>;
}

fn validate_sweeps(n: usize) -> Result<usize> {
    if n == 0 {
        return Err(Error::InvalidArgument(
            "number of sweeps needs to be positive".to_string(),
        ));
    }
    Ok(n)
}

fn require_square<M: SystemMatrix + ?Sized>(matrix: &M) -> Result<()> {
    if matrix.nrows() != matrix.ncols() {
        return Err(Error::DimensionMismatch {
            expected: matrix.nrows(),
            actual: matrix.ncols(),
        });
    }
    Ok(())
}

// ============================================================================
// Richardson
// ============================================================================

/// Damped Richardson smoother.
pub struct RichardsonOp<M = CsrMatrix> {
    matrix: Arc<M>,
    num_of_sweeps: usize,
    tau: f64,
}

impl<M: SystemMatrix> RichardsonOp<M> {
    /// Create from an owned matrix with damping 1.0.
    pub fn new(matrix: M) -> Result<Self> {
        Self::from_shared(Arc::new(matrix))
    }

    /// Create from a matrix shared with other operators, with damping 1.0.
    pub fn from_shared(matrix: Arc<M>) -> Result<Self> {
        require_square(&*matrix)?;
        log::debug!("Richardson smoother on {}x{} matrix", matrix.nrows(), matrix.ncols());
        Ok(Self {
            matrix,
            num_of_sweeps: 1,
            tau: 1.0,
        })
    }

    /// Set the damping factor.
    pub fn with_tau(mut self, tau: f64) -> Self {
        self.tau = tau;
        self
    }

    /// Set the number of sweeps.
    pub fn with_sweeps(mut self, n: usize) -> Result<Self> {
        self.set_num_of_sweeps(n)?;
        Ok(self)
    }

    /// Damping factor.
    pub fn tau(&self) -> f64 {
        self.tau
    }

    /// Get a reference to the underlying matrix.
    pub fn matrix(&self) -> &M {
        &self.matrix
    }
}

impl<M: SystemMatrix> LinearOperator for RichardsonOp<M> {
    fn apply(&self, input: &[f64], output: &mut [f64]) -> Result<()> {
        check_apply_dims(self.rows(), self.cols(), input, output)?;

        for (xi, &bi) in output.iter_mut().zip(input.iter()) {
            *xi = self.tau * bi;
        }

        if self.num_of_sweeps > 1 {
            let mut scratch = vec![0.0; input.len()];
            for _ in 1..self.num_of_sweeps {
                richardson_update(&*self.matrix, output, input, self.tau, &mut scratch);
            }
        }
        Ok(())
    }

    fn rows(&self) -> usize {
        self.matrix.nrows()
    }

    fn cols(&self) -> usize {
        self.matrix.ncols()
    }
}

impl<M: SystemMatrix> Smoother for RichardsonOp<M> {
    fn num_of_sweeps(&self) -> usize {
        self.num_of_sweeps
    }

    fn set_num_of_sweeps(&mut self, n: usize) -> Result<()> {
        self.num_of_sweeps = validate_sweeps(n)?;
        Ok(())
    }
}

// ============================================================================
// Jacobi
// ============================================================================

/// Damped Jacobi smoother.
///
/// Requires a matrix with nonzero diagonal, e.g. positive definite. The
/// inverse diagonal is computed once at construction.
pub struct JacobiOp<M = CsrMatrix> {
    matrix: Arc<M>,
    inv_diag: Vec<f64>,
    num_of_sweeps: usize,
    tau: f64,
}

impl<M: SystemMatrix> JacobiOp<M> {
    /// Create from an owned matrix with damping 1.0.
    pub fn new(matrix: M) -> Result<Self> {
        Self::from_shared(Arc::new(matrix))
    }

    /// Create from a matrix shared with other operators, with damping 1.0.
    pub fn from_shared(matrix: Arc<M>) -> Result<Self> {
        require_square(&*matrix)?;
        log::debug!("Jacobi smoother on {}x{} matrix", matrix.nrows(), matrix.ncols());
        let inv_diag = inverse_diagonal(&*matrix);
        Ok(Self {
            matrix,
            inv_diag,
            num_of_sweeps: 1,
            tau: 1.0,
        })
    }

    /// Set the damping factor.
    pub fn with_tau(mut self, tau: f64) -> Self {
        self.tau = tau;
        self
    }

    /// Set the number of sweeps.
    pub fn with_sweeps(mut self, n: usize) -> Result<Self> {
        self.set_num_of_sweeps(n)?;
        Ok(self)
    }

    /// Damping factor.
    pub fn tau(&self) -> f64 {
        self.tau
    }

    /// Get a reference to the underlying matrix.
    pub fn matrix(&self) -> &M {
        &self.matrix
    }
}

impl<M: SystemMatrix> LinearOperator for JacobiOp<M> {
    fn apply(&self, input: &[f64], output: &mut [f64]) -> Result<()> {
        check_apply_dims(self.rows(), self.cols(), input, output)?;

        for ((xi, &bi), &inv_di) in output.iter_mut().zip(input.iter()).zip(self.inv_diag.iter())
        {
            *xi = self.tau * bi * inv_di;
        }

        if self.num_of_sweeps > 1 {
            let mut scratch = vec![0.0; input.len()];
            for _ in 1..self.num_of_sweeps {
                jacobi_update(
                    &*self.matrix,
                    &self.inv_diag,
                    output,
                    input,
                    self.tau,
                    &mut scratch,
                );
            }
        }
        Ok(())
    }

    fn rows(&self) -> usize {
        self.matrix.nrows()
    }

    fn cols(&self) -> usize {
        self.matrix.ncols()
    }
}

impl<M: SystemMatrix> Smoother for JacobiOp<M> {
    fn num_of_sweeps(&self) -> usize {
        self.num_of_sweeps
    }

    fn set_num_of_sweeps(&mut self, n: usize) -> Result<()> {
        self.num_of_sweeps = validate_sweeps(n)?;
        Ok(())
    }
}

// ============================================================================
// Gauss-Seidel
// ============================================================================

/// Forward Gauss-Seidel smoother.
///
/// Requires a matrix with nonzero diagonal, e.g. positive definite.
pub struct GaussSeidelOp<M = CsrMatrix> {
    matrix: Arc<M>,
    num_of_sweeps: usize,
}

impl<M: SystemMatrix> GaussSeidelOp<M> {
    /// Create from an owned matrix.
    pub fn new(matrix: M) -> Result<Self> {
        Self::from_shared(Arc::new(matrix))
    }

    /// Create from a matrix shared with other operators.
    pub fn from_shared(matrix: Arc<M>) -> Result<Self> {
        require_square(&*matrix)?;
        log::debug!("Gauss-Seidel smoother on {}x{} matrix", matrix.nrows(), matrix.ncols());
        Ok(Self {
            matrix,
            num_of_sweeps: 1,
        })
    }

    /// Set the number of sweeps.
    pub fn with_sweeps(mut self, n: usize) -> Result<Self> {
        self.set_num_of_sweeps(n)?;
        Ok(self)
    }

    /// Get a reference to the underlying matrix.
    pub fn matrix(&self) -> &M {
        &self.matrix
    }
}

impl<M: SystemMatrix> LinearOperator for GaussSeidelOp<M> {
    fn apply(&self, input: &[f64], output: &mut [f64]) -> Result<()> {
        check_apply_dims(self.rows(), self.cols(), input, output)?;

        output.fill(0.0);
        for _ in 0..self.num_of_sweeps {
            gauss_seidel_sweep(&*self.matrix, output, input)?;
        }
        Ok(())
    }

    fn rows(&self) -> usize {
        self.matrix.nrows()
    }

    fn cols(&self) -> usize {
        self.matrix.ncols()
    }
}

impl<M: SystemMatrix> Smoother for GaussSeidelOp<M> {
    fn num_of_sweeps(&self) -> usize {
        self.num_of_sweeps
    }

    fn set_num_of_sweeps(&mut self, n: usize) -> Result<()> {
        self.num_of_sweeps = validate_sweeps(n)?;
        Ok(())
    }
}

// ============================================================================
// Symmetric Gauss-Seidel
// ============================================================================

/// Symmetric Gauss-Seidel smoother.
///
/// Each sweep is one forward Gauss-Seidel sweep followed by one backward
/// sweep, which makes the operator symmetric for symmetric `A`.
pub struct SymmetricGaussSeidelOp<M = CsrMatrix> {
    matrix: Arc<M>,
    num_of_sweeps: usize,
}

impl<M: SystemMatrix> SymmetricGaussSeidelOp<M> {
    /// Create from an owned matrix.
    pub fn new(matrix: M) -> Result<Self> {
        Self::from_shared(Arc::new(matrix))
    }

    /// Create from a matrix shared with other operators.
    pub fn from_shared(matrix: Arc<M>) -> Result<Self> {
        require_square(&*matrix)?;
        log::debug!(
            "symmetric Gauss-Seidel smoother on {}x{} matrix",
            matrix.nrows(),
            matrix.ncols()
        );
        Ok(Self {
            matrix,
            num_of_sweeps: 1,
        })
    }

    /// Set the number of sweeps.
    pub fn with_sweeps(mut self, n: usize) -> Result<Self> {
        self.set_num_of_sweeps(n)?;
        Ok(self)
    }

    /// Get a reference to the underlying matrix.
    pub fn matrix(&self) -> &M {
        &self.matrix
    }
}

impl<M: SystemMatrix> LinearOperator for SymmetricGaussSeidelOp<M> {
    fn apply(&self, input: &[f64], output: &mut [f64]) -> Result<()> {
        check_apply_dims(self.rows(), self.cols(), input, output)?;

        output.fill(0.0);
        for _ in 0..self.num_of_sweeps {
            gauss_seidel_sweep(&*self.matrix, output, input)?;
            reverse_gauss_seidel_sweep(&*self.matrix, output, input)?;
        }
        Ok(())
    }

    fn rows(&self) -> usize {
        self.matrix.nrows()
    }

    fn cols(&self) -> usize {
        self.matrix.ncols()
    }
}

impl<M: SystemMatrix> Smoother for SymmetricGaussSeidelOp<M> {
    fn num_of_sweeps(&self) -> usize {
        self.num_of_sweeps
    }

    fn set_num_of_sweeps(&mut self, n: usize) -> Result<()> {
        self.num_of_sweeps = validate_sweeps(n)?;
        Ok(())
    }
}

// ============================================================================
// Block Gauss-Seidel
// ============================================================================

/// Block Gauss-Seidel smoother over a fixed list of DoF groups.
///
/// Each sweep relaxes the groups in the given order, solving a small dense
/// system per group. Unknowns not covered by any group are never updated and
/// stay zero.
pub struct BlockGaussSeidelOp<M = CsrMatrix> {
    matrix: Arc<M>,
    blocks: Vec<Vec<usize>>,
    num_of_sweeps: usize,
}

impl<M: SystemMatrix> BlockGaussSeidelOp<M> {
    /// Create from an owned matrix and its DoF groups.
    pub fn new(matrix: M, blocks: Vec<Vec<usize>>) -> Result<Self> {
        Self::from_shared(Arc::new(matrix), blocks)
    }

    /// Create from a shared matrix and its DoF groups.
    ///
    /// Fails with [`Error::InvalidArgument`] if a DoF index is out of range.
    pub fn from_shared(matrix: Arc<M>, blocks: Vec<Vec<usize>>) -> Result<Self> {
        require_square(&*matrix)?;
        for dofs in &blocks {
            check_dofs(dofs, matrix.nrows())?;
        }
        log::debug!(
            "block Gauss-Seidel smoother on {}x{} matrix with {} blocks",
            matrix.nrows(),
            matrix.ncols(),
            blocks.len()
        );
        Ok(Self {
            matrix,
            blocks,
            num_of_sweeps: 1,
        })
    }

    /// Set the number of sweeps.
    pub fn with_sweeps(mut self, n: usize) -> Result<Self> {
        self.set_num_of_sweeps(n)?;
        Ok(self)
    }

    /// The DoF groups, in sweep order.
    pub fn blocks(&self) -> &[Vec<usize>] {
        &self.blocks
    }

    /// Get a reference to the underlying matrix.
    pub fn matrix(&self) -> &M {
        &self.matrix
    }
}

impl<M: SystemMatrix> LinearOperator for BlockGaussSeidelOp<M> {
    fn apply(&self, input: &[f64], output: &mut [f64]) -> Result<()> {
        check_apply_dims(self.rows(), self.cols(), input, output)?;

        output.fill(0.0);
        for _ in 0..self.num_of_sweeps {
            block_gauss_seidel_sweep(&*self.matrix, output, input, &self.blocks)?;
        }
        Ok(())
    }

    fn rows(&self) -> usize {
        self.matrix.nrows()
    }

    fn cols(&self) -> usize {
        self.matrix.ncols()
    }
}

impl<M: SystemMatrix> Smoother for BlockGaussSeidelOp<M> {
    fn num_of_sweeps(&self) -> usize {
        self.num_of_sweeps
    }

    fn set_num_of_sweeps(&mut self, n: usize) -> Result<()> {
        self.num_of_sweeps = validate_sweeps(n)?;
        Ok(())
    }
}
