//! # fieldscore Similarity
//!
//! Embedding and hierarchical scoring of documents against a field-of-study
//! taxonomy.
//!
//! ## Features
//!
//! - **Three signals**: dense sentence vectors, tf-idf lexical vectors and
//!   entity-mention vectors, each compared by cosine similarity
//! - **Explicit validity**: a signal that is undefined for a document is
//!   left out of the average instead of counting as zero
//! - **Constrained ranking**: L2/L3 fields are only scored for documents
//!   whose best L0 and L1 fields are their ancestors
//! - **Explainability**: optional per-signal breakdown on every field
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Documents  │────>│  Embedder   │────>│ L0/L1 pass  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                                                │
//!                     ┌─────────────┐     ┌─────────────┐
//!                     │ L2/L3 pass  │<────│ Constraints │
//!                     └─────────────┘     └─────────────┘
//!                            │
//!                     ┌─────────────┐
//!                     │   Records   │
//!                     └─────────────┘
//! ```

pub mod assets;
pub mod config;
pub mod embedder;
pub mod engine;
pub mod rank;
pub mod record;
pub mod score;
pub mod similarity;

#[cfg(test)]
mod test_support;

pub use assets::Assets;
pub use config::{EngineConfig, ScoringMode};
pub use embedder::{DenseEncoder, EmbeddedBatch, Embedder, Embedding, LexicalWeighting, TfidfWeighting};
pub use engine::{check_distinct, ScoringEngine};
pub use rank::{rank_top_k, Ranking};
pub use record::{
    round_score, Document, EmbeddedDocument, ScoreRecord, ScoredField, SignalScores,
};
pub use score::ScoreMatrix;
pub use similarity::{
    average_similarity, batch_sparse_similarity, dense_signal, dense_similarity, entity_signal,
    sparse_signal, sparse_similarity, ROUNDING_SLACK,
};
