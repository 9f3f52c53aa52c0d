//! # fieldscore Core
//!
//! Core data structures for field-of-study scoring.
//!
//! - [`Vector`], [`DenseMatrix`] - dense vectors and row-major matrices with SIMD kernels
//! - [`SparseVector`], [`SparseMatrix`] - id-sorted lexical vectors and CSR field rows
//! - [`Vocabulary`] - token ids, document frequencies, idf
//! - [`EntityMatcher`] - token-level Aho-Corasick over entity surface forms
//! - [`FieldCatalog`] - the L0-L3 taxonomy with row-aligned field vectors
//! - [`ConstraintIndex`] - (L0, L1) pairs mapped to eligible L2/L3 rows
//!
//! ## Example
//!
//! ```rust
//! use fieldscore_core::{EntityEntry, EntityMatcher, Vector};
//!
//! let matcher = EntityMatcher::build(
//!     vec![EntityEntry::new("machine learning", Vector::new(vec![3.0, 4.0]))],
//!     2,
//! )
//! .unwrap();
//!
//! let v = matcher.embed("advances in machine learning");
//! assert!((v.as_slice()[0] - 0.6).abs() < 1e-6);
//! assert!(matcher.embed("MACHINE LEARNING").is_zero());
//! ```

pub mod catalog;
pub mod constraint;
pub mod entity;
pub mod error;
pub mod matrix;
pub mod sparse;
pub mod vector;
pub mod vocab;

/// SIMD-optimized vector operations
///
/// - AVX2/FMA on x86_64
/// - NEON on ARM64/Apple Silicon
pub mod simd;

pub use catalog::{Edge, FieldCatalog, FieldRecord, FieldVectors, Level};
pub use constraint::{ConstraintIndex, ConstraintKey};
pub use entity::{EntityEntry, EntityMatcher, Mention, Mentions};
pub use error::{Error, Result};
pub use matrix::DenseMatrix;
pub use sparse::{SparseMatrix, SparseVector};
pub use vector::Vector;
pub use vocab::Vocabulary;
