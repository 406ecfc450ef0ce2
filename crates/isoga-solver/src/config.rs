//! Smoother configuration and construction.
//!
//! Provides a serializable description of a smoother and a factory that builds
//! the corresponding operator around a shared system matrix.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::matrix::SystemMatrix;
use crate::smoother::{
    GaussSeidelOp, JacobiOp, RichardsonOp, Smoother, SymmetricGaussSeidelOp,
};

/// Relaxation scheme used by a smoother.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SmootherKind {
    /// Damped Richardson iteration.
    Richardson,
    /// Damped Jacobi iteration.
    Jacobi,
    /// Forward Gauss-Seidel.
    GaussSeidel,
    /// Forward followed by backward Gauss-Seidel.
    SymmetricGaussSeidel,
}

impl SmootherKind {
    /// Whether this scheme uses a damping factor.
    pub fn is_damped(&self) -> bool {
        matches!(self, SmootherKind::Richardson | SmootherKind::Jacobi)
    }
}

impl fmt::Display for SmootherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SmootherKind::Richardson => write!(f, "richardson"),
            SmootherKind::Jacobi => write!(f, "jacobi"),
            SmootherKind::GaussSeidel => write!(f, "gauss-seidel"),
            SmootherKind::SymmetricGaussSeidel => write!(f, "symmetric-gauss-seidel"),
        }
    }
}

impl FromStr for SmootherKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "richardson" => Ok(SmootherKind::Richardson),
            "jacobi" => Ok(SmootherKind::Jacobi),
            "gauss-seidel" | "gs" => Ok(SmootherKind::GaussSeidel),
            "symmetric-gauss-seidel" | "sgs" => Ok(SmootherKind::SymmetricGaussSeidel),
            other => Err(Error::InvalidArgument(format!(
                "unknown smoother '{}' (expected richardson, jacobi, gauss-seidel or symmetric-gauss-seidel)",
                other
            ))),
        }
    }
}

/// Smoother configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmootherConfig {
    /// Relaxation scheme.
    pub kind: SmootherKind,
    /// Sweeps per application (must be positive).
    pub sweeps: usize,
    /// Damping factor for Richardson/Jacobi. `None` keeps the operator default of 1.0.
    pub damping: Option<f64>,
}

impl Default for SmootherConfig {
    fn default() -> Self {
        Self {
            kind: SmootherKind::SymmetricGaussSeidel,
            sweeps: 1,
            damping: None,
        }
    }
}

impl SmootherConfig {
    /// Create a configuration for the given scheme with one sweep.
    pub fn new(kind: SmootherKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }

    /// Set the number of sweeps.
    pub fn with_sweeps(mut self, sweeps: usize) -> Self {
        self.sweeps = sweeps;
        self
    }

    /// Set the damping factor.
    pub fn with_damping(mut self, damping: f64) -> Self {
        self.damping = Some(damping);
        self
    }
}

/// Build the smoother described by `config` around a shared matrix.
///
/// Fails with [`Error::InvalidArgument`] for a zero sweep count and with
/// [`Error::DimensionMismatch`] for a non-square matrix.
pub fn build_smoother<M: SystemMatrix + 'static>(
    matrix: Arc<M>,
    config: &SmootherConfig,
) -> Result<Box<dyn Smoother>> {
    log::debug!(
        "building {} smoother ({} sweeps) for {}x{} matrix",
        config.kind,
        config.sweeps,
        matrix.nrows(),
        matrix.ncols()
    );

    if config.damping.is_some() && !config.kind.is_damped() {
        log::warn!("damping factor is ignored by the {} smoother", config.kind);
    }
    let tau = config.damping.unwrap_or(1.0);

    let smoother: Box<dyn Smoother> = match config.kind {
        SmootherKind::Richardson => Box::new(
            RichardsonOp::from_shared(matrix)?
                .with_tau(tau)
                .with_sweeps(config.sweeps)?,
        ),
        SmootherKind::Jacobi => Box::new(
            JacobiOp::from_shared(matrix)?
                .with_tau(tau)
                .with_sweeps(config.sweeps)?,
        ),
        SmootherKind::GaussSeidel => {
            Box::new(GaussSeidelOp::from_shared(matrix)?.with_sweeps(config.sweeps)?)
        }
        SmootherKind::SymmetricGaussSeidel => {
            Box::new(SymmetricGaussSeidelOp::from_shared(matrix)?.with_sweeps(config.sweeps)?)
        }
    };
    Ok(smoother)
}
