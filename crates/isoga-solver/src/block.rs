//! Block-structured linear operators.
//!
//! A [`BlockOperator`] represents an operator `C` with block structure
//!
//! ```text
//!     [ C_00  C_01  ...  C_0m ]
//! C = [ C_10  C_11  ...  C_1m ]
//!     [  ...   ...  ...   ... ]
//!     [ C_n0  C_n1  ...  C_nm ]
//! ```
//!
//! where each `C_ij` is itself a [`LinearOperator`] and unspecified blocks are
//! zero. Input vectors are split into contiguous segments, one per block-column;
//! output vectors into one segment per block-row.
//!
//! Block sizes are taken from the first operator placed in a block-row or
//! block-column and every later operator must agree. The operator becomes
//! usable once every block-row and block-column holds at least one operator.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use isoga_solver::{BlockOperator, JacobiOp, stencil::laplace_1d};
//!
//! let mut block = BlockOperator::new(2, 2);
//! block.add_operator(0, 0, Arc::new(JacobiOp::new(laplace_1d(3)?)?))?;
//! block.add_operator(1, 1, Arc::new(JacobiOp::new(laplace_1d(4)?)?))?;
//!
//! let mut correction = vec![0.0; 7];
//! block.apply(&residual, &mut correction)?;
//! ```

use std::collections::BTreeMap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::operator::{LinearOperator, SharedOperator, check_apply_dims};

/// Operator assembled from a grid of sub-operators.
pub struct BlockOperator {
    /// Populated slots, ordered by (row, col).
    blocks: BTreeMap<(usize, usize), SharedOperator>,
    /// Output size of each block-row, once known.
    row_sizes: Vec<Option<usize>>,
    /// Input size of each block-column, once known.
    col_sizes: Vec<Option<usize>>,
}

impl BlockOperator {
    /// Create an empty `n_rows` x `n_cols` block grid.
    pub fn new(n_rows: usize, n_cols: usize) -> Self {
        Self {
            blocks: BTreeMap::new(),
            row_sizes: vec![None; n_rows],
            col_sizes: vec![None; n_cols],
        }
    }

    /// Place `op` at block `(row, col)`, replacing any previous operator there.
    ///
    /// Fails with [`Error::OutOfRange`] outside the grid, and with
    /// [`Error::DimensionMismatch`] if `op` disagrees with the sizes already
    /// recorded for its block-row or block-column. A rejected operator leaves
    /// the configuration unchanged.
    pub fn add_operator(&mut self, row: usize, col: usize, op: SharedOperator) -> Result<()> {
        if row >= self.block_rows() || col >= self.block_cols() {
            return Err(Error::OutOfRange {
                row,
                col,
                block_rows: self.block_rows(),
                block_cols: self.block_cols(),
            });
        }

        if let Some(expected) = self.row_sizes[row] {
            if op.rows() != expected {
                return Err(Error::DimensionMismatch {
                    expected,
                    actual: op.rows(),
                });
            }
        }
        if let Some(expected) = self.col_sizes[col] {
            if op.cols() != expected {
                return Err(Error::DimensionMismatch {
                    expected,
                    actual: op.cols(),
                });
            }
        }

        log::debug!(
            "block ({}, {}): {}x{} operator",
            row,
            col,
            op.rows(),
            op.cols()
        );
        self.row_sizes[row] = Some(op.rows());
        self.col_sizes[col] = Some(op.cols());
        self.blocks.insert((row, col), op);
        Ok(())
    }

    /// Number of block-rows.
    pub fn block_rows(&self) -> usize {
        self.row_sizes.len()
    }

    /// Number of block-columns.
    pub fn block_cols(&self) -> usize {
        self.col_sizes.len()
    }

    /// Operator at `(row, col)`, if any.
    pub fn operator(&self, row: usize, col: usize) -> Option<&SharedOperator> {
        self.blocks.get(&(row, col))
    }

    /// Output size of block-row `row`, if an operator has been placed in it.
    pub fn row_size(&self, row: usize) -> Option<usize> {
        self.row_sizes.get(row).copied().flatten()
    }

    /// Input size of block-column `col`, if an operator has been placed in it.
    pub fn col_size(&self, col: usize) -> Option<usize> {
        self.col_sizes.get(col).copied().flatten()
    }

    /// Whether every block-row and block-column holds at least one operator.
    pub fn is_ready(&self) -> bool {
        self.row_sizes.iter().all(Option::is_some) && self.col_sizes.iter().all(Option::is_some)
    }

    /// Total output size.
    ///
    /// Fails with [`Error::IllegalState`] while some block-row is empty.
    pub fn try_rows(&self) -> Result<usize> {
        Ok(resolve_sizes(&self.row_sizes, "row")?.iter().sum())
    }

    /// Total input size.
    ///
    /// Fails with [`Error::IllegalState`] while some block-column is empty.
    pub fn try_cols(&self) -> Result<usize> {
        Ok(resolve_sizes(&self.col_sizes, "column")?.iter().sum())
    }

    /// Block-rows write disjoint output segments and are processed concurrently.
    #[cfg(feature = "parallel")]
    fn apply_rows(&self, inputs: &[&[f64]], outputs: Vec<&mut [f64]>) -> Result<()> {
        outputs
            .into_par_iter()
            .enumerate()
            .try_for_each(|(row, segment)| self.apply_row(row, inputs, segment))
    }

    #[cfg(not(feature = "parallel"))]
    fn apply_rows(&self, inputs: &[&[f64]], outputs: Vec<&mut [f64]>) -> Result<()> {
        for (row, segment) in outputs.into_iter().enumerate() {
            self.apply_row(row, inputs, segment)?;
        }
        Ok(())
    }

    /// Accumulate the contributions of block-row `row` into `output`.
    fn apply_row(&self, row: usize, inputs: &[&[f64]], output: &mut [f64]) -> Result<()> {
        output.fill(0.0);

        let mut contribution = vec![0.0; output.len()];
        for (&(_, col), op) in self.blocks.range((row, 0)..(row + 1, 0)) {
            op.apply(inputs[col], &mut contribution)?;
            for (yi, &ci) in output.iter_mut().zip(contribution.iter()) {
                *yi += ci;
            }
        }
        Ok(())
    }
}

impl LinearOperator for BlockOperator {
    /// Apply every block to its input segment and sum the results per block-row.
    ///
    /// Fails with [`Error::IllegalState`] while some block-row or block-column
    /// is empty. Within a block-row, contributions are summed in increasing
    /// column order.
    fn apply(&self, input: &[f64], output: &mut [f64]) -> Result<()> {
        let row_sizes = resolve_sizes(&self.row_sizes, "row")?;
        let col_sizes = resolve_sizes(&self.col_sizes, "column")?;
        check_apply_dims(
            row_sizes.iter().sum(),
            col_sizes.iter().sum(),
            input,
            output,
        )?;

        let inputs = split_segments(input, &col_sizes);
        let outputs = split_segments_mut(output, &row_sizes);
        self.apply_rows(&inputs, outputs)
    }

    /// Sum of the known block-row sizes; empty block-rows count as zero.
    ///
    /// Use [`BlockOperator::try_rows`] to reject an incomplete configuration.
    fn rows(&self) -> usize {
        self.row_sizes.iter().flatten().sum()
    }

    /// Sum of the known block-column sizes; empty block-columns count as zero.
    ///
    /// Use [`BlockOperator::try_cols`] to reject an incomplete configuration.
    fn cols(&self) -> usize {
        self.col_sizes.iter().flatten().sum()
    }
}

fn resolve_sizes(sizes: &[Option<usize>], kind: &str) -> Result<Vec<usize>> {
    sizes
        .iter()
        .enumerate()
        .map(|(i, size)| {
            size.ok_or_else(|| Error::IllegalState(format!("block {} {} has no operator", kind, i)))
        })
        .collect()
}

fn split_segments<'a>(mut data: &'a [f64], sizes: &[usize]) -> Vec<&'a [f64]> {
    let mut segments = Vec::with_capacity(sizes.len());
    for &size in sizes {
        let (head, tail) = data.split_at(size);
        segments.push(head);
        data = tail;
    }
    segments
}

fn split_segments_mut<'a>(mut data: &'a mut [f64], sizes: &[usize]) -> Vec<&'a mut [f64]> {
    let mut segments = Vec::with_capacity(sizes.len());
    for &size in sizes {
        let (head, tail) = std::mem::take(&mut data).split_at_mut(size);
        segments.push(head);
        data = tail;
    }
    segments
}
