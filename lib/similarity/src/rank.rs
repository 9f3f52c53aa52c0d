//! Per-row top-k selection.

use crate::ScoreMatrix;
use ordered_float::OrderedFloat;
use rayon::prelude::*;

/// Top-k indices and values per document, ascending: column `k - 1` holds
/// the best match. Indices are already translated by the ranking offset.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    rows: usize,
    k: usize,
    indices: Vec<usize>,
    values: Vec<Option<f32>>,
}

impl Ranking {
    #[inline]
    pub fn k(&self) -> usize {
        self.k
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn indices(&self, row: usize) -> &[usize] {
        &self.indices[row * self.k..(row + 1) * self.k]
    }

    #[inline]
    pub fn values(&self, row: usize) -> &[Option<f32>] {
        &self.values[row * self.k..(row + 1) * self.k]
    }

    /// The `n` best indices of a row (fewer when `k < n`).
    pub fn best(&self, row: usize, n: usize) -> &[usize] {
        let indices = self.indices(row);
        &indices[indices.len() - n.min(indices.len())..]
    }

    /// `(index, value)` pairs of a row, best first.
    pub fn best_first(&self, row: usize) -> impl Iterator<Item = (usize, Option<f32>)> + '_ {
        self.indices(row)
            .iter()
            .copied()
            .zip(self.values(row).iter().copied())
            .rev()
    }

    /// The ranked values as an `N x k` score matrix.
    pub fn values_matrix(&self) -> ScoreMatrix {
        ScoreMatrix::from_cells(self.rows(), self.k, self.values.clone())
    }
}

/// Rank each row of `scores` and keep the best `k` columns.
///
/// # Arguments
/// * `scores` - `N x M` scores; undefined cells rank as 0.0 but keep their
///   undefined value in the output
/// * `k` - columns to keep, capped at `M`
/// * `offset` - added to every returned column index
///
/// # Returns
/// A [`Ranking`] whose rows are in ascending score order. The sort is
/// stable, so equal scores keep their column order.
pub fn rank_top_k(scores: &ScoreMatrix, k: usize, offset: usize) -> Ranking {
    let k = k.min(scores.cols());
    let ranked: Vec<(Vec<usize>, Vec<Option<f32>>)> = (0..scores.rows())
        .into_par_iter()
        .map(|i| {
            let row = scores.row(i);
            let mut order: Vec<usize> = (0..row.len()).collect();
            order.sort_by_key(|&j| OrderedFloat(row[j].unwrap_or(0.0)));
            let top = &order[row.len() - k..];
            (
                top.iter().map(|&j| j + offset).collect(),
                top.iter().map(|&j| row[j]).collect(),
            )
        })
        .collect();

    let mut indices = Vec::with_capacity(scores.rows() * k);
    let mut values = Vec::with_capacity(scores.rows() * k);
    for (i, v) in ranked {
        indices.extend(i);
        values.extend(v);
    }
    Ranking {
        rows: scores.rows(),
        k,
        indices,
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn scores() -> ScoreMatrix {
        ScoreMatrix::from_rows(vec![
            vec![Some(0.2), None, Some(0.9), Some(0.5)],
            vec![Some(0.3), Some(0.3), Some(0.1), Some(0.3)],
        ])
        .unwrap()
    }

    #[test]
    fn test_rank_top_k_ascending_with_offset() {
        let ranking = rank_top_k(&scores(), 3, 10);
        assert_eq!(ranking.k(), 3);
        assert_eq!(ranking.rows(), 2);
        assert_eq!(ranking.indices(0), &[10, 13, 12]);
        assert_eq!(ranking.values(0), &[Some(0.2), Some(0.5), Some(0.9)]);
        assert_eq!(ranking.best(0, 1), &[12]);
    }

    #[test]
    fn test_undefined_ranks_as_zero_but_stays_undefined() {
        let ranking = rank_top_k(&scores(), 4, 0);
        assert_eq!(ranking.indices(0)[0], 1);
        assert_eq!(ranking.values(0)[0], None);
    }

    #[test]
    fn test_ties_keep_column_order() {
        let ranking = rank_top_k(&scores(), 3, 0);
        assert_eq!(ranking.indices(1), &[0, 1, 3]);
    }

    #[test]
    fn test_k_capped_at_columns() {
        let ranking = rank_top_k(&scores(), 10, 0);
        assert_eq!(ranking.k(), 4);
        assert_eq!(ranking.best(0, 3), &[0, 3, 2]);
        let best: Vec<usize> = ranking.best_first(0).map(|(i, _)| i).collect();
        assert_eq!(best, vec![2, 3, 0, 1]);
    }

    #[test]
    fn test_empty_columns() {
        let ranking = rank_top_k(&ScoreMatrix::undefined(2, 0), 10, 5);
        assert_eq!(ranking.k(), 0);
        assert_eq!(ranking.rows(), 2);
        assert!(ranking.indices(1).is_empty());
        assert!(ranking.best(1, 3).is_empty());
    }

    fn matrix_strategy() -> impl Strategy<Value = ScoreMatrix> {
        (1usize..6, 1usize..12).prop_flat_map(|(rows, cols)| {
            prop::collection::vec(
                prop::collection::vec(prop::option::of(0.0f32..1.0), cols),
                rows,
            )
            .prop_map(|rows| ScoreMatrix::from_rows(rows).unwrap())
        })
    }

    proptest! {
        #[test]
        fn prop_rows_are_non_decreasing(scores in matrix_strategy(), k in 0usize..15) {
            let ranking = rank_top_k(&scores, k, 0);
            for row in 0..ranking.rows() {
                let values: Vec<f32> = ranking.values(row).iter().map(|v| v.unwrap_or(0.0)).collect();
                prop_assert!(values.windows(2).all(|w| w[0] <= w[1]));
            }
        }

        #[test]
        fn prop_reranking_is_idempotent(scores in matrix_strategy(), k in 1usize..15) {
            let ranking = rank_top_k(&scores, k, 0);
            let again = rank_top_k(&ranking.values_matrix(), k, 0);
            for row in 0..ranking.rows() {
                prop_assert_eq!(again.values(row), ranking.values(row));
                let identity: Vec<usize> = (0..ranking.k()).collect();
                prop_assert_eq!(again.indices(row), identity.as_slice());
            }
        }
    }
}
