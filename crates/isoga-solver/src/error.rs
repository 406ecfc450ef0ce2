//! Error types for isoga-solver.

use thiserror::Error;

/// Errors raised while configuring or applying linear operators.
///
/// All of these indicate a misconfigured caller rather than a transient
/// condition; nothing in this crate retries. Zero pivots in Jacobi or
/// Gauss-Seidel are not reported here and show up as Inf/NaN instead.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("invalid dimensions: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("block ({row}, {col}) outside of {block_rows}x{block_cols} block grid")]
    OutOfRange {
        row: usize,
        col: usize,
        block_rows: usize,
        block_cols: usize,
    },

    #[error("illegal state: {0}")]
    IllegalState(String),

    #[error("singular matrix")]
    SingularMatrix,
}

pub type Result<T> = std::result::Result<T, Error>;
