//! # fieldscore
//!
//! Hierarchical field-of-study scoring for research text.
//!
//! Each document is embedded three ways (a dense sentence vector, a TF-IDF
//! lexical vector and a vector built from dictionary entity mentions) and
//! compared to every field of a four-level taxonomy. The coarse levels
//! (L0, L1) are scored exhaustively; the fine levels (L2, L3) only within
//! the subtrees of the document's best coarse fields.
//!
//! ## Quick Start
//!
//! ### From the command line
//!
//! ```bash
//! fields score --input records.jsonl.gz --output fields.jsonl --assets ./assets
//!
//! # or embed once and score later
//! fields embed --input records.jsonl.gz --output embeddings.jsonl.gz
//! fields score --embedded --input embeddings.jsonl.gz --output fields.jsonl
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use fieldscore::prelude::*;
//!
//! let assets = load_assets(&AssetPaths::new("assets", "en")).unwrap();
//! let engine = ScoringEngine::new(&assets, EngineConfig::default()).unwrap();
//! let docs = vec![Document::new("carl:1", "natural language processing")];
//! for record in engine.score_batch(&docs).unwrap() {
//!     println!("{}", record.to_json_line().unwrap());
//! }
//! ```
//!
//! ## Crate Structure
//!
//! - `fieldscore-core` - vectors, matrices, vocabulary, entity matching, field catalog
//! - `fieldscore-similarity` - embedding, similarity, ranking and the scoring engine
//! - `fieldscore-storage` - asset layout and loaders
//! - `fieldscore-batch` - streaming multi-threaded scoring of JSONL files

// Re-export core types
pub use fieldscore_core::{
    ConstraintIndex, ConstraintKey, DenseMatrix, EntityMatcher, Error, FieldCatalog, Level,
    Result, SparseMatrix, SparseVector, Vector, Vocabulary,
};

// Re-export scoring
pub use fieldscore_similarity::{
    Assets, Document, EmbeddedDocument, Embedding, EngineConfig, ScoreRecord, ScoredField,
    ScoringEngine, ScoringMode,
};

// Re-export storage
pub use fieldscore_storage::{load_assets, AssetPaths};

// Re-export batch
pub use fieldscore_batch::{BatchConfig, BatchError, BatchScorer, RunSummary, Sink, Stage};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        load_assets, AssetPaths, Assets, BatchConfig, BatchScorer, Document, EngineConfig, Error,
        Result, ScoreRecord, ScoringEngine, ScoringMode, Sink,
    };
}
