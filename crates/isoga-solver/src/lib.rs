//! Relaxation smoothers and block operators for isogeometric solvers.
//!
//! This crate provides:
//! - Sweep primitives (Richardson, Jacobi, forward/backward/block Gauss-Seidel)
//! - The [`LinearOperator`] abstraction used by outer iterative solvers
//! - Smoother operators wrapping a system matrix and a sweep count
//! - [`BlockOperator`] for composing operators on block-partitioned vectors
//! - Serializable smoother configuration and a factory
//!
//! Matrices are consumed through [`SystemMatrix`], implemented for faer's
//! sparse row matrices and nalgebra's dense matrices.

pub mod block;
pub mod config;
pub mod error;
pub mod matrix;
pub mod operator;
pub mod smoother;
pub mod stencil;
pub mod sweep;

pub use block::BlockOperator;
pub use config::{SmootherConfig, SmootherKind, build_smoother};
pub use error::{Error, Result};
pub use matrix::{CsrMatrix, SystemMatrix, csr_from_triplets, norm2, residual};
pub use operator::{IdentityOp, LinearOperator, MatrixOp, SharedOperator};
pub use smoother::{
    BlockGaussSeidelOp, GaussSeidelOp, JacobiOp, RichardsonOp, Smoother, SymmetricGaussSeidelOp,
};
pub use sweep::{
    DEFAULT_JACOBI_DAMPING, DEFAULT_RICHARDSON_DAMPING, block_gauss_seidel_sweep,
    damped_jacobi_sweep, damped_richardson_sweep, gauss_seidel_single_block, gauss_seidel_sweep,
    jacobi_sweep, reverse_gauss_seidel_sweep,
};
