//! Row-major dense matrices.
//!
//! Field vectors are stored one field per row so that a level slice or a
//! constraint group is a plain row selection, and the similarity of a batch
//! of documents against a set of fields is a single `A * B^T` product.

use crate::{simd, Error, Result};
use rayon::prelude::*;
use std::ops::Range;

#[derive(Debug, Clone, PartialEq)]
pub struct DenseMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl DenseMatrix {
    #[must_use]
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Build from equal-length rows. `cols` is required so that an empty
    /// matrix still knows its width.
    pub fn from_rows<I, R>(rows: I, cols: usize) -> Result<Self>
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[f32]>,
    {
        let mut data = Vec::new();
        let mut n = 0;
        for row in rows {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(Error::InvalidDimension {
                    expected: cols,
                    actual: row.len(),
                });
            }
            data.extend_from_slice(row);
            n += 1;
        }
        Ok(Self {
            rows: n,
            cols,
            data,
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
    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    #[inline]
    pub fn row_mut(&mut self, i: usize) -> &mut [f32] {
        &mut self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f32]> + '_ {
        (0..self.rows).map(move |i| self.row(i))
    }

    /// Copy out the given rows, in the given order.
    #[must_use]
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        let mut data = Vec::with_capacity(indices.len() * self.cols);
        for &i in indices {
            data.extend_from_slice(self.row(i));
        }
        Self {
            rows: indices.len(),
            cols: self.cols,
            data,
        }
    }

    /// Copy out a contiguous block of rows.
    #[must_use]
    pub fn slice_rows(&self, range: Range<usize>) -> Self {
        Self {
            rows: range.len(),
            cols: self.cols,
            data: self.data[range.start * self.cols..range.end * self.cols].to_vec(),
        }
    }

    /// Scale every nonzero row to unit length.
    pub fn normalize_rows(&mut self) {
        if self.cols == 0 {
            return;
        }
        for row in self.data.chunks_exact_mut(self.cols) {
            let norm = simd::norm_simd(row);
            if norm > 0.0 {
                simd::scale(row, 1.0 / norm);
            }
        }
    }

    /// `self * other^T`: entry `(i, j)` is the dot product of row `i` of
    /// `self` with row `j` of `other`. Rows of the output are computed in
    /// parallel.
    pub fn mul_transposed(&self, other: &DenseMatrix) -> Result<DenseMatrix> {
        if self.cols != other.cols {
            return Err(Error::InvalidDimension {
                expected: other.cols,
                actual: self.cols,
            });
        }
        let m = other.rows;
        let mut out = vec![0.0f32; self.rows * m];
        if m > 0 {
            out.par_chunks_mut(m).enumerate().for_each(|(i, out_row)| {
                let a = self.row(i);
                for (j, cell) in out_row.iter_mut().enumerate() {
                    *cell = simd::dot_product_simd(a, other.row(j));
                }
            });
        }
        Ok(DenseMatrix {
            rows: self.rows,
            cols: m,
            data: out,
        })
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.data[i * self.cols + j]
    }
}
