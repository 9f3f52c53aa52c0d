//! Eligibility of fine-grained fields under coarse ancestors.
//!
//! A [`ConstraintKey`] pairs an L0 row with one of its L1 children. Its value
//! is the sorted set of L2/L3 rows descending from that L1. A document is
//! scored against those rows only when both halves of the key are among its
//! best coarse matches.

use crate::{FieldCatalog, Level};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConstraintKey {
    pub l0: usize,
    pub l1: usize,
}

impl ConstraintKey {
    pub fn new(l0: usize, l1: usize) -> Self {
        Self { l0, l1 }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstraintIndex {
    groups: BTreeMap<ConstraintKey, Vec<usize>>,
}

impl ConstraintIndex {
    /// Derive from the catalog's L0 -> L1 edges. Keys whose L1 has no L2/L3
    /// descendants are left out.
    ///
    /// A key's rows are every fine field reachable from its L1, not only its
    /// direct children, so an L3 under an L2 is eligible with that L2.
    pub fn from_catalog(catalog: &FieldCatalog) -> Self {
        let mut groups = BTreeMap::new();
        for l0 in catalog.level_range(Level::L0) {
            for &l1 in catalog.children(l0) {
                if catalog.level(l1) != Level::L1 {
                    continue;
                }
                let fine: Vec<usize> = catalog
                    .descendants(l1)
                    .into_iter()
                    .filter(|&row| catalog.level(row).is_fine())
                    .collect();
                if !fine.is_empty() {
                    groups.insert(ConstraintKey::new(l0, l1), fine);
                }
            }
        }
        Self { groups }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn get(&self, key: &ConstraintKey) -> Option<&[usize]> {
        self.groups.get(key).map(Vec::as_slice)
    }

    /// Keys in ascending `(l0, l1)` order.
    pub fn iter(&self) -> impl Iterator<Item = (&ConstraintKey, &[usize])> + '_ {
        self.groups.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Keys matched by a document's top L0 and top L1 rows, and the union of
    /// their descendant rows (sorted).
    pub fn eligible(&self, top_l0: &[usize], top_l1: &[usize]) -> (Vec<usize>, Vec<ConstraintKey>) {
        let mut fields = BTreeSet::new();
        let mut keys = Vec::new();
        for (key, rows) in &self.groups {
            if top_l0.contains(&key.l0) && top_l1.contains(&key.l1) {
                fields.extend(rows.iter().copied());
                keys.push(*key);
            }
        }
        (fields.into_iter().collect(), keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DenseMatrix, Edge, FieldRecord, FieldVectors, SparseMatrix, SparseVector};
    use proptest::prelude::*;

    fn catalog() -> FieldCatalog {
        let records = vec![
            FieldRecord::new("Biology", 0),
            FieldRecord::new("Computer science", 0),
            FieldRecord::new("Artificial intelligence", 1),
            FieldRecord::new("Genetics", 1),
            FieldRecord::new("Theory", 1),
            FieldRecord::new("Gene expression", 2),
            FieldRecord::new("Machine learning", 2),
            FieldRecord::new("Parsing", 3),
            FieldRecord::new("Sequencing", 3),
        ];
        let edges = vec![
            Edge::new("Computer science", "Artificial intelligence"),
            Edge::new("Computer science", "Theory"),
            Edge::new("Biology", "Genetics"),
            Edge::new("Computer science", "Genetics"),
            Edge::new("Artificial intelligence", "Machine learning"),
            Edge::new("Artificial intelligence", "Parsing"),
            Edge::new("Genetics", "Gene expression"),
            Edge::new("Genetics", "Sequencing"),
        ];
        let n = records.len();
        let dense = DenseMatrix::from_rows((0..n).map(|_| vec![1.0]), 1).unwrap();
        let sparse = SparseMatrix::from_rows((0..n).map(|_| SparseVector::default()));
        FieldCatalog::new(records, edges, FieldVectors::new(dense.clone(), sparse, dense)).unwrap()
    }

    #[test]
    fn test_from_catalog() {
        let index = ConstraintIndex::from_catalog(&catalog());
        // Theory has no fine descendants
        assert_eq!(index.len(), 3);
        assert_eq!(index.get(&ConstraintKey::new(1, 2)), Some(&[6, 7][..]));
        assert_eq!(index.get(&ConstraintKey::new(0, 3)), Some(&[5, 8][..]));
        assert_eq!(index.get(&ConstraintKey::new(1, 3)), Some(&[5, 8][..]));
        assert_eq!(index.get(&ConstraintKey::new(1, 4)), None);
    }

    #[test]
    fn test_eligible_requires_both_halves() {
        let index = ConstraintIndex::from_catalog(&catalog());
        let (fields, keys) = index.eligible(&[1], &[2, 3]);
        assert_eq!(fields, vec![5, 6, 7, 8]);
        assert_eq!(keys, vec![ConstraintKey::new(1, 2), ConstraintKey::new(1, 3)]);

        let (fields, keys) = index.eligible(&[0], &[2]);
        assert!(fields.is_empty());
        assert!(keys.is_empty());
    }

    #[test]
    fn test_groups_include_grandchildren() {
        let records = vec![
            FieldRecord::new("Physics", 0),
            FieldRecord::new("Optics", 1),
            FieldRecord::new("Lasers", 2),
            FieldRecord::new("Fiber lasers", 3),
        ];
        let edges = vec![
            Edge::new("Physics", "Optics"),
            Edge::new("Optics", "Lasers"),
            Edge::new("Lasers", "Fiber lasers"),
        ];
        let dense = DenseMatrix::from_rows((0..4).map(|_| vec![1.0]), 1).unwrap();
        let sparse = SparseMatrix::from_rows((0..4).map(|_| SparseVector::default()));
        let catalog =
            FieldCatalog::new(records, edges, FieldVectors::new(dense.clone(), sparse, dense)).unwrap();
        let index = ConstraintIndex::from_catalog(&catalog);
        assert_eq!(index.get(&ConstraintKey::new(0, 1)), Some(&[2, 3][..]));
    }

    proptest! {
        #[test]
        fn prop_eligibility_is_monotonic(
            l0 in prop::collection::vec(0usize..2, 0..3),
            l1 in prop::collection::vec(2usize..5, 0..3),
            extra_l0 in prop::collection::vec(0usize..2, 0..2),
            extra_l1 in prop::collection::vec(2usize..5, 0..2),
        ) {
            let index = ConstraintIndex::from_catalog(&catalog());
            let (narrow, _) = index.eligible(&l0, &l1);
            let wide_l0: Vec<usize> = l0.iter().chain(&extra_l0).copied().collect();
            let wide_l1: Vec<usize> = l1.iter().chain(&extra_l1).copied().collect();
            let (wide, _) = index.eligible(&wide_l0, &wide_l1);
            for row in narrow {
                prop_assert!(wide.contains(&row));
            }
        }
    }
}
