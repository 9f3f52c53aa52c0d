//! Sparse lexical vectors.
//!
//! A [`SparseVector`] keeps `(token_id, weight)` entries sorted by token id
//! with no duplicates, so two vectors can be dotted with a single merge pass.
//! [`SparseMatrix`] stores field rows in compressed-row form.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Serialized as a list of `[token_id, weight]` pairs; deserializing goes
/// through [`SparseVector::new`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<(u32, f32)>", into = "Vec<(u32, f32)>")]
pub struct SparseVector {
    entries: Vec<(u32, f32)>,
}

impl SparseVector {
    /// Sort by token id and sum duplicate ids. Explicit zeros are dropped.
    #[must_use]
    pub fn new(mut entries: Vec<(u32, f32)>) -> Self {
        entries.sort_by_key(|(id, _)| *id);
        let mut merged: Vec<(u32, f32)> = Vec::with_capacity(entries.len());
        for (id, value) in entries {
            match merged.last_mut() {
                Some((last, acc)) if *last == id => *acc += value,
                _ => merged.push((id, value)),
            }
        }
        merged.retain(|(_, v)| *v != 0.0);
        Self { entries: merged }
    }

    #[inline]
    pub fn entries(&self) -> &[(u32, f32)] {
        &self.entries
    }

    #[inline]
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Largest token id plus one; 0 when empty.
    pub fn min_dimension(&self) -> usize {
        self.entries.last().map(|(id, _)| *id as usize + 1).unwrap_or(0)
    }

    pub fn norm(&self) -> f32 {
        self.entries.iter().map(|(_, v)| v * v).sum::<f32>().sqrt()
    }

    /// Divide every weight by the Euclidean length. Empty vectors and
    /// vectors already of unit length are returned as they are.
    #[must_use]
    pub fn normalized(&self) -> SparseVector {
        let length = self.norm();
        if length == 0.0 || length == 1.0 {
            return self.clone();
        }
        SparseVector {
            entries: self.entries.iter().map(|(id, v)| (*id, v / length)).collect(),
        }
    }

    pub fn dot(&self, other: &SparseVector) -> f32 {
        sorted_dot(&self.entries, &other.entries)
    }

    pub fn to_dense(&self, dim: usize) -> Vec<f32> {
        let mut dense = vec![0.0; dim];
        for (id, v) in &self.entries {
            if let Some(cell) = dense.get_mut(*id as usize) {
                *cell = *v;
            }
        }
        dense
    }
}

/// Merge-join dot product of two id-sorted entry lists.
pub(crate) fn sorted_dot(a: &[(u32, f32)], b: &[(u32, f32)]) -> f32 {
    let (mut i, mut j) = (0, 0);
    let mut dot = 0.0f32;
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            Ordering::Equal => {
                dot += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
        }
    }
    dot
}

impl From<Vec<(u32, f32)>> for SparseVector {
    fn from(entries: Vec<(u32, f32)>) -> Self {
        Self::new(entries)
    }
}

impl From<SparseVector> for Vec<(u32, f32)> {
    fn from(vector: SparseVector) -> Self {
        vector.entries
    }
}

/// Compressed sparse rows, one row per field.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SparseMatrix {
    offsets: Vec<usize>,
    entries: Vec<(u32, f32)>,
}

impl SparseMatrix {
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = SparseVector>,
    {
        let mut offsets = vec![0];
        let mut entries = Vec::new();
        for row in rows {
            entries.extend_from_slice(row.entries());
            offsets.push(entries.len());
        }
        Self { offsets, entries }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn row(&self, i: usize) -> &[(u32, f32)] {
        &self.entries[self.offsets[i]..self.offsets[i + 1]]
    }

    /// Dot product of `query` with row `i`.
    #[inline]
    pub fn row_dot(&self, i: usize, query: &SparseVector) -> f32 {
        sorted_dot(self.row(i), query.entries())
    }

    #[must_use]
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        Self::from_rows(
            indices
                .iter()
                .map(|&i| SparseVector { entries: self.row(i).to_vec() }),
        )
    }

    #[must_use]
    pub fn slice_rows(&self, range: std::ops::Range<usize>) -> Self {
        let indices: Vec<usize> = range.collect();
        self.select_rows(&indices)
    }

    /// Scale every nonzero row to unit length.
    pub fn normalize_rows(&mut self) {
        for i in 0..self.rows() {
            let span = self.offsets[i]..self.offsets[i + 1];
            let norm = self.entries[span.clone()]
                .iter()
                .map(|(_, v)| v * v)
                .sum::<f32>()
                .sqrt();
            if norm > 0.0 {
                for (_, v) in &mut self.entries[span] {
                    *v /= norm;
                }
            }
        }
    }

    /// Largest token id referenced by any row, plus one.
    pub fn min_dimension(&self) -> usize {
        self.entries
            .iter()
            .map(|(id, _)| *id as usize + 1)
            .max()
            .unwrap_or(0)
    }
}
