//! # fieldscore Storage
//!
//! Reads the assets directory a scoring run depends on: the vocabulary
//! frequency table, the field catalog and hierarchy, the three field-vector
//! matrices, the entity dictionary and the pretrained word vectors.

pub mod encoder;
pub mod jsonl;
pub mod loader;
pub mod paths;

pub use encoder::WordVectorEncoder;
pub use loader::{load_assets, load_catalog, load_entities, load_vocabulary, load_word_vectors};
pub use paths::AssetPaths;
