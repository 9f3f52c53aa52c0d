//! Document x field score matrices with explicit validity.
//!
//! A cell is `None` when no signal produced a value for that pair. `None` is
//! kept apart from a genuine `Some(0.0)` until records are emitted.

use fieldscore_core::{DenseMatrix, Error, Result};
use std::ops::Range;

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreMatrix {
    rows: usize,
    cols: usize,
    cells: Vec<Option<f32>>,
}

impl ScoreMatrix {
    /// A matrix with every cell undefined.
    #[must_use]
    pub fn undefined(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![None; rows * cols],
        }
    }

    /// Every cell of `dense` becomes a defined score.
    #[must_use]
    pub fn from_dense(dense: &DenseMatrix) -> Self {
        Self {
            rows: dense.rows(),
            cols: dense.cols(),
            cells: dense.iter_rows().flatten().map(|v| Some(*v)).collect(),
        }
    }

    pub(crate) fn from_cells(rows: usize, cols: usize, cells: Vec<Option<f32>>) -> Self {
        debug_assert_eq!(cells.len(), rows * cols);
        Self { rows, cols, cells }
    }

    pub fn from_rows(rows: Vec<Vec<Option<f32>>>) -> Result<Self> {
        let cols = rows.first().map(Vec::len).unwrap_or(0);
        let n = rows.len();
        let mut cells = Vec::with_capacity(n * cols);
        for row in rows {
            if row.len() != cols {
                return Err(Error::InvalidDimension {
                    expected: cols,
                    actual: row.len(),
                });
            }
            cells.extend(row);
        }
        Ok(Self {
            rows: n,
            cols,
            cells,
        })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> Option<f32> {
        self.cells[i * self.cols + j]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: Option<f32>) {
        self.cells[i * self.cols + j] = value;
    }

    #[inline]
    pub fn row(&self, i: usize) -> &[Option<f32>] {
        &self.cells[i * self.cols..(i + 1) * self.cols]
    }

    #[inline]
    pub fn row_mut(&mut self, i: usize) -> &mut [Option<f32>] {
        &mut self.cells[i * self.cols..(i + 1) * self.cols]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[Option<f32>]> + '_ {
        (0..self.rows).map(move |i| self.row(i))
    }

    /// Copy out a contiguous block of columns.
    #[must_use]
    pub fn slice_cols(&self, cols: Range<usize>) -> Self {
        let mut cells = Vec::with_capacity(self.rows * cols.len());
        for row in self.iter_rows() {
            cells.extend_from_slice(&row[cols.clone()]);
        }
        Self {
            rows: self.rows,
            cols: cols.len(),
            cells,
        }
    }

    /// Write `block` into this matrix: block cell `(a, b)` lands at
    /// `(rows[a], cols[b])`.
    pub fn scatter(&mut self, rows: &[usize], cols: &[usize], block: &ScoreMatrix) -> Result<()> {
        if block.rows != rows.len() || block.cols != cols.len() {
            return Err(Error::InvalidDimension {
                expected: rows.len() * cols.len(),
                actual: block.rows * block.cols,
            });
        }
        for (a, &i) in rows.iter().enumerate() {
            for (b, &j) in cols.iter().enumerate() {
                self.set(i, j, block.get(a, b));
            }
        }
        Ok(())
    }

    pub fn defined_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }
}
