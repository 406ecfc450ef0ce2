//! The linear operator abstraction shared by all smoothers and block operators.
//!
//! A [`LinearOperator`] maps vectors of length `cols()` to vectors of length
//! `rows()`. Outer solvers only see this trait: they hand a residual to
//! `apply` and read back a correction.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::matrix::SystemMatrix;

/// A linear operator that computes output = Op(input) for real vectors.
pub trait LinearOperator: Send + Sync {
    /// Apply the operator.
    ///
    /// `input` must have length `cols()` and `output` length `rows()`. The
    /// previous contents of `output` are overwritten.
    fn apply(&self, input: &[f64], output: &mut [f64]) -> Result<()>;

    /// Dimension of the output space.
    fn rows(&self) -> usize;

    /// Dimension of the input space.
    fn cols(&self) -> usize;
}

/// Operator shared between several owners, e.g. the slots of a block operator.
pub type SharedOperator = Arc<dyn LinearOperator>;

impl<T: LinearOperator + ?Sized> LinearOperator for Box<T> {
    fn apply(&self, input: &[f64], output: &mut [f64]) -> Result<()> {
        (**self).apply(input, output)
    }

    fn rows(&self) -> usize {
        (**self).rows()
    }

    fn cols(&self) -> usize {
        (**self).cols()
    }
}

impl<T: LinearOperator + ?Sized> LinearOperator for Arc<T> {
    fn apply(&self, input: &[f64], output: &mut [f64]) -> Result<()> {
        (**self).apply(input, output)
    }

    fn rows(&self) -> usize {
        (**self).rows()
    }

    fn cols(&self) -> usize {
        (**self).cols()
    }
}

/// Check `input`/`output` lengths against an operator's shape.
pub(crate) fn check_apply_dims(
    rows: usize,
    cols: usize,
    input: &[f64],
    output: &[f64],
) -> Result<()> {
    if input.len() != cols {
        return Err(Error::DimensionMismatch {
            expected: cols,
            actual: input.len(),
        });
    }
    if output.len() != rows {
        return Err(Error::DimensionMismatch {
            expected: rows,
            actual: output.len(),
        });
    }
    Ok(())
}

/// Identity operator (no-op).
///
/// Useful as a baseline or to fill diagonal blocks that need no smoothing.
#[derive(Debug, Clone, Copy)]
pub struct IdentityOp {
    size: usize,
}

impl IdentityOp {
    /// Create an identity operator of the given size.
    pub fn new(size: usize) -> Self {
        Self { size }
    }
}

impl LinearOperator for IdentityOp {
    fn apply(&self, input: &[f64], output: &mut [f64]) -> Result<()> {
        check_apply_dims(self.size, self.size, input, output)?;
        output.copy_from_slice(input);
        Ok(())
    }

    fn rows(&self) -> usize {
        self.size
    }

    fn cols(&self) -> usize {
        self.size
    }
}

/// Plain matrix operator: output = A * input.
///
/// The matrix may be rectangular, which makes this the natural choice for
/// off-diagonal coupling blocks.
pub struct MatrixOp<M> {
    matrix: Arc<M>,
}

impl<M: SystemMatrix> MatrixOp<M> {
    /// Create from an owned matrix.
    pub fn new(matrix: M) -> Self {
        Self::from_shared(Arc::new(matrix))
    }

    /// Create from a matrix shared with other operators.
    pub fn from_shared(matrix: Arc<M>) -> Self {
        Self { matrix }
    }

    /// Get a reference to the underlying matrix.
    pub fn matrix(&self) -> &M {
        &self.matrix
    }
}

impl<M: SystemMatrix> LinearOperator for MatrixOp<M> {
    fn apply(&self, input: &[f64], output: &mut [f64]) -> Result<()> {
        check_apply_dims(self.rows(), self.cols(), input, output)?;
        self.matrix.mul_vec(input, output);
        Ok(())
    }

    fn rows(&self) -> usize {
        self.matrix.nrows()
    }

    fn cols(&self) -> usize {
        self.matrix.ncols()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::dmatrix;

    /// Simple diagonal operator for testing.
    struct DiagOp {
        diag: Vec<f64>,
    }

    impl LinearOperator for DiagOp {
        fn apply(&self, input: &[f64], output: &mut [f64]) -> Result<()> {
            check_apply_dims(self.rows(), self.cols(), input, output)?;
            for i in 0..self.diag.len() {
                output[i] = self.diag[i] * input[i];
            }
            Ok(())
        }

        fn rows(&self) -> usize {
            self.diag.len()
        }

        fn cols(&self) -> usize {
            self.diag.len()
        }
    }

    #[test]
    fn identity_copies_input() {
        let op = IdentityOp::new(3);
        let x = vec![1.0, 2.0, 3.0];
        let mut y = vec![0.0; 3];
        op.apply(&x, &mut y).unwrap();

        assert_eq!(y, x);
        assert_eq!(op.rows(), 3);
        assert_eq!(op.cols(), 3);
    }

    #[test]
    fn identity_dimension_mismatch() {
        let op = IdentityOp::new(3);
        let mut y = vec![0.0; 3];
        let result = op.apply(&[1.0, 2.0], &mut y);
        assert!(matches!(
            result,
            Err(Error::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn rectangular_matrix_op() {
        let op = MatrixOp::new(dmatrix![1.0, 0.0, 2.0; 0.0, 3.0, 0.0]);
        assert_eq!(op.rows(), 2);
        assert_eq!(op.cols(), 3);

        let mut y = vec![0.0; 2];
        op.apply(&[1.0, 1.0, 1.0], &mut y).unwrap();
        assert_eq!(y, vec![3.0, 3.0]);

        let mut wrong = vec![0.0; 3];
        assert!(op.apply(&[1.0, 1.0, 1.0], &mut wrong).is_err());
    }

    #[test]
    fn shared_matrix_is_not_copied() {
        let matrix = Arc::new(dmatrix![2.0, 0.0; 0.0, 2.0]);
        let op1 = MatrixOp::from_shared(Arc::clone(&matrix));
        let op2 = MatrixOp::from_shared(Arc::clone(&matrix));

        assert!(std::ptr::eq(op1.matrix(), op2.matrix()));
        assert_eq!(Arc::strong_count(&matrix), 3);
    }

    #[test]
    fn operator_as_trait_object() {
        let op: SharedOperator = Arc::new(DiagOp {
            diag: vec![2.0, 3.0],
        });
        let mut y = vec![0.0; 2];
        op.apply(&[5.0, 7.0], &mut y).unwrap();

        assert!((y[0] - 10.0).abs() < 1e-15);
        assert!((y[1] - 21.0).abs() < 1e-15);
    }

    #[test]
    fn boxed_operator_forwards() {
        let op: Box<dyn LinearOperator> = Box::new(IdentityOp::new(2));
        let shared: SharedOperator = Arc::new(op);
        assert_eq!(shared.rows(), 2);

        let mut y = vec![0.0; 2];
        shared.apply(&[4.0, 5.0], &mut y).unwrap();
        assert_eq!(y, vec![4.0, 5.0]);
    }

    #[test]
    fn operator_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<IdentityOp>();
        assert_send_sync::<MatrixOp<nalgebra::DMatrix<f64>>>();
        assert_send_sync::<SharedOperator>();
    }
}
