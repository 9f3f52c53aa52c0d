//! # fieldscore-batch
//!
//! Streams `{"merged_id", "text"}` JSONL records through a pool of scoring
//! workers and writes one `{"merged_id", "fields"}` line per record. The
//! same pipeline can save embeddings instead ([`BatchScorer::embed`]) and
//! score them in a later run ([`BatchScorer::run_embedded`]).
//!
//! ```no_run
//! use fieldscore_batch::{BatchConfig, BatchScorer, Sink};
//! use fieldscore_similarity::EngineConfig;
//! use fieldscore_storage::{load_assets, AssetPaths};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let assets = load_assets(&AssetPaths::new("assets", "en"))?;
//! let scorer = BatchScorer::new(&assets, EngineConfig::default(), BatchConfig::default())?;
//! let sink = Sink::create(Some(Path::new("fields.jsonl.gz")))?;
//! let (summary, sink) = scorer.run(Path::new("records.jsonl.gz"), sink)?;
//! sink.finish()?;
//! println!("{summary}");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod reader;
pub mod scorer;
pub mod writer;

pub use config::BatchConfig;
pub use error::{BatchError, Result};
pub use reader::{input_files, RecordReader};
pub use scorer::{BatchScorer, RunSummary, Stage};
pub use writer::{RecordWriter, Sink};
