//! The field-of-study taxonomy.
//!
//! Rows are ordered by `(level, name)`. That order is the index space shared
//! by the three field-vector matrices and by [`crate::ConstraintIndex`], so it
//! is checked when the catalog is built rather than assumed.

use crate::{DenseMatrix, Error, Result, SparseMatrix};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::VecDeque;
use std::fmt;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    L0 = 0,
    L1 = 1,
    L2 = 2,
    L3 = 3,
}

impl Level {
    pub const ALL: [Level; 4] = [Level::L0, Level::L1, Level::L2, Level::L3];

    pub fn from_u8(level: u8) -> Option<Self> {
        match level {
            0 => Some(Level::L0),
            1 => Some(Level::L1),
            2 => Some(Level::L2),
            3 => Some(Level::L3),
            _ => None,
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// L2 and L3 are scored in the fine pass.
    #[inline]
    pub fn is_fine(self) -> bool {
        self >= Level::L2
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.index())
    }
}

/// One line of the catalog file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRecord {
    pub name: String,
    pub level: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
}

impl FieldRecord {
    pub fn new(name: impl Into<String>, level: u8) -> Self {
        Self {
            name: name.into(),
            level,
            id: None,
        }
    }
}

/// One line of the hierarchy file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub parent_name: String,
    pub child_name: String,
}

impl Edge {
    pub fn new(parent: impl Into<String>, child: impl Into<String>) -> Self {
        Self {
            parent_name: parent.into(),
            child_name: child.into(),
        }
    }
}

/// The three precomputed field representations, row-aligned.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldVectors {
    pub dense: DenseMatrix,
    pub sparse: SparseMatrix,
    pub entity: DenseMatrix,
}

impl FieldVectors {
    pub fn new(dense: DenseMatrix, sparse: SparseMatrix, entity: DenseMatrix) -> Self {
        Self {
            dense,
            sparse,
            entity,
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.dense.rows()
    }

    #[must_use]
    pub fn select(&self, rows: &[usize]) -> Self {
        Self {
            dense: self.dense.select_rows(rows),
            sparse: self.sparse.select_rows(rows),
            entity: self.entity.select_rows(rows),
        }
    }

    #[must_use]
    pub fn slice(&self, rows: Range<usize>) -> Self {
        Self {
            dense: self.dense.slice_rows(rows.clone()),
            sparse: self.sparse.slice_rows(rows.clone()),
            entity: self.entity.slice_rows(rows),
        }
    }

    fn normalize(&mut self) {
        self.dense.normalize_rows();
        self.sparse.normalize_rows();
        self.entity.normalize_rows();
    }
}

type Links = SmallVec<[usize; 4]>;

/// Struct-of-arrays taxonomy indexed by catalog row.
#[derive(Debug, Clone)]
pub struct FieldCatalog {
    names: Vec<String>,
    levels: Vec<Level>,
    source_ids: Vec<Option<u64>>,
    parents: Vec<Links>,
    children: Vec<Links>,
    name_index: AHashMap<String, usize>,
    level_ranges: [Range<usize>; 4],
    vectors: FieldVectors,
}

impl FieldCatalog {
    /// Build and validate. Field rows must be sorted by `(level, name)` with
    /// unique names, every matrix must have one row per field, and every
    /// edge must name known fields. Vector rows are normalized here.
    pub fn new<E>(records: Vec<FieldRecord>, edges: E, mut vectors: FieldVectors) -> Result<Self>
    where
        E: IntoIterator<Item = Edge>,
    {
        let n = records.len();
        let mut names = Vec::with_capacity(n);
        let mut levels = Vec::with_capacity(n);
        let mut source_ids = Vec::with_capacity(n);
        let mut name_index = AHashMap::with_capacity(n);

        for (row, record) in records.into_iter().enumerate() {
            let level = Level::from_u8(record.level).ok_or_else(|| {
                Error::InvalidCatalog(format!(
                    "row {row}: field {:?} has level {}, expected 0..=3",
                    record.name, record.level
                ))
            })?;
            if let (Some(prev_level), Some(prev_name)) = (levels.last(), names.last()) {
                if (*prev_level, prev_name) >= (level, &record.name) {
                    return Err(Error::InvalidCatalog(format!(
                        "row {row}: ({level}, {:?}) does not sort after ({prev_level}, {prev_name:?})",
                        record.name
                    )));
                }
            }
            if name_index.insert(record.name.clone(), row).is_some() {
                return Err(Error::InvalidCatalog(format!(
                    "row {row}: duplicate field name {:?}",
                    record.name
                )));
            }
            names.push(record.name);
            levels.push(level);
            source_ids.push(record.id);
        }

        for (label, rows) in [
            ("dense", vectors.dense.rows()),
            ("sparse", vectors.sparse.rows()),
            ("entity", vectors.entity.rows()),
        ] {
            if rows != n {
                return Err(Error::InvalidCatalog(format!(
                    "{label} field vectors have {rows} rows, catalog has {n} fields"
                )));
            }
        }
        vectors.normalize();

        let mut parents = vec![Links::new(); n];
        let mut children = vec![Links::new(); n];
        for edge in edges {
            let resolve = |name: &str| {
                name_index.get(name).copied().ok_or_else(|| {
                    Error::InvalidCatalog(format!("hierarchy references unknown field {name:?}"))
                })
            };
            let parent = resolve(&edge.parent_name)?;
            let child = resolve(&edge.child_name)?;
            if !children[parent].contains(&child) {
                children[parent].push(child);
                parents[child].push(parent);
            }
        }
        for links in children.iter_mut().chain(parents.iter_mut()) {
            links.sort_unstable();
        }

        let level_ranges = Level::ALL.map(|level| {
            let start = levels.partition_point(|l| *l < level);
            let end = levels.partition_point(|l| *l <= level);
            start..end
        });

        Ok(Self {
            names,
            levels,
            source_ids,
            parents,
            children,
            name_index,
            level_ranges,
            vectors,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[inline]
    pub fn name(&self, row: usize) -> &str {
        &self.names[row]
    }

    #[inline]
    pub fn level(&self, row: usize) -> Level {
        self.levels[row]
    }

    pub fn source_id(&self, row: usize) -> Option<u64> {
        self.source_ids[row]
    }

    pub fn parents(&self, row: usize) -> &[usize] {
        &self.parents[row]
    }

    pub fn children(&self, row: usize) -> &[usize] {
        &self.children[row]
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.name_index.get(name).copied()
    }

    /// Contiguous rows holding `level`; empty when the level has no fields.
    #[inline]
    pub fn level_range(&self, level: Level) -> Range<usize> {
        self.level_ranges[level.index()].clone()
    }

    /// L0 and L1 rows.
    pub fn coarse_range(&self) -> Range<usize> {
        self.level_ranges[0].start..self.level_ranges[1].end
    }

    /// L2 and L3 rows.
    pub fn fine_range(&self) -> Range<usize> {
        self.level_ranges[2].start..self.level_ranges[3].end
    }

    pub fn vectors(&self) -> &FieldVectors {
        &self.vectors
    }

    /// Every row reachable from `row` through child links, sorted.
    pub fn descendants(&self, row: usize) -> Vec<usize> {
        let mut seen = vec![false; self.len()];
        let mut queue: VecDeque<usize> = self.children[row].iter().copied().collect();
        let mut found = Vec::new();
        while let Some(next) = queue.pop_front() {
            if std::mem::replace(&mut seen[next], true) {
                continue;
            }
            found.push(next);
            queue.extend(self.children[next].iter().copied());
        }
        found.sort_unstable();
        found
    }
}
