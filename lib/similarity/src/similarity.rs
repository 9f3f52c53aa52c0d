//! Similarity primitives.
//!
//! Field vectors are normalized when the catalog is loaded and document
//! vectors when they are embedded, so every product here is a cosine.

use crate::ScoreMatrix;
use fieldscore_core::{DenseMatrix, Error, Result, SparseMatrix, SparseVector, Vector};
use rayon::prelude::*;

/// Cosine similarity of every document row against every field row.
///
/// # Arguments
/// * `docs` - `N x D`, rows normalized
/// * `fields` - `M x D`, rows normalized
///
/// # Returns
/// `N x M` similarities
pub fn dense_similarity(docs: &DenseMatrix, fields: &DenseMatrix) -> Result<DenseMatrix> {
    docs.mul_transposed(fields)
}

/// Sparse dot product of a query against each field row.
///
/// The query is scaled to unit length first; an empty query or one that is
/// already unit length is used as is.
pub fn sparse_similarity(query: &SparseVector, fields: &SparseMatrix) -> Vec<f32> {
    let query = query.normalized();
    (0..fields.rows()).map(|i| fields.row_dot(i, &query)).collect()
}

/// [`sparse_similarity`] for a batch of queries, one output row each.
/// Queries stay sparse.
pub fn batch_sparse_similarity(queries: &[SparseVector], fields: &SparseMatrix) -> DenseMatrix {
    let rows: Vec<Vec<f32>> = queries
        .par_iter()
        .map(|q| sparse_similarity(q, fields))
        .collect();
    let mut out = DenseMatrix::zeros(queries.len(), fields.rows());
    for (i, row) in rows.into_iter().enumerate() {
        out.row_mut(i).copy_from_slice(&row);
    }
    out
}

/// Dense signal for documents that may lack a dense embedding. Rows of
/// documents without one are undefined.
pub fn dense_signal(docs: &[Option<Vector>], fields: &DenseMatrix) -> Result<ScoreMatrix> {
    let present: Vec<usize> = (0..docs.len()).filter(|&i| docs[i].is_some()).collect();
    let matrix = DenseMatrix::from_rows(
        docs.iter().flatten().map(Vector::as_slice),
        fields.cols(),
    )?;
    let sims = dense_similarity(&matrix, fields)?;
    let mut scores = ScoreMatrix::undefined(docs.len(), fields.rows());
    let all_fields: Vec<usize> = (0..fields.rows()).collect();
    scores.scatter(&present, &all_fields, &ScoreMatrix::from_dense(&sims))?;
    Ok(scores)
}

/// Sparse signal for documents that may lack a sparse embedding.
pub fn sparse_signal(docs: &[Option<SparseVector>], fields: &SparseMatrix) -> ScoreMatrix {
    let rows: Vec<Vec<Option<f32>>> = docs
        .par_iter()
        .map(|doc| match doc {
            Some(query) => sparse_similarity(query, fields).into_iter().map(Some).collect(),
            None => vec![None; fields.rows()],
        })
        .collect();
    let mut scores = ScoreMatrix::undefined(docs.len(), fields.rows());
    for (i, row) in rows.into_iter().enumerate() {
        scores.row_mut(i).copy_from_slice(&row);
    }
    scores
}

/// Entity signal. Every document has an entity vector, possibly zero, so
/// every cell is defined.
pub fn entity_signal(docs: &[Vector], fields: &DenseMatrix) -> Result<ScoreMatrix> {
    let matrix = DenseMatrix::from_rows(docs.iter().map(Vector::as_slice), fields.cols())?;
    Ok(ScoreMatrix::from_dense(&dense_similarity(&matrix, fields)?))
}

/// How far above 1.0 a cosine may land from float rounding alone.
pub const ROUNDING_SLACK: f32 = 1e-5;

/// Average the admissible signals of each cell.
///
/// A value is admissible when it is defined and in `[0, 1]`. Values within
/// [`ROUNDING_SLACK`] above 1.0 are clamped to 1.0; anything larger is left
/// out. A cell with no admissible signal is undefined.
pub fn average_similarity(signals: &[&ScoreMatrix]) -> Result<ScoreMatrix> {
    let Some(first) = signals.first() else {
        return Ok(ScoreMatrix::undefined(0, 0));
    };
    let (rows, cols) = (first.rows(), first.cols());
    for s in signals {
        if s.rows() != rows || s.cols() != cols {
            return Err(Error::InvalidDimension {
                expected: rows * cols,
                actual: s.rows() * s.cols(),
            });
        }
    }

    let admissible = |v: &f32| (0.0..=1.0 + ROUNDING_SLACK).contains(v);
    let mut out = ScoreMatrix::undefined(rows, cols);
    for i in 0..rows {
        for j in 0..cols {
            let mut sum = 0.0f32;
            let mut count = 0u32;
            for s in signals {
                if let Some(v) = s.get(i, j).filter(admissible) {
                    sum += v.min(1.0);
                    count += 1;
                }
            }
            if count > 0 {
                out.set(i, j, Some(sum / count as f32));
            }
        }
    }
    Ok(out)
}
