use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to load {asset} from {}: {reason}", path.display())]
    AssetLoad {
        asset: &'static str,
        path: PathBuf,
        reason: String,
    },

    #[error("Vocabulary contains no entries")]
    EmptyVocabulary,

    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Invalid field catalog: {0}")]
    InvalidCatalog(String),

    #[error("Invalid entity entry: {0}")]
    InvalidEntity(String),

    #[error("Malformed record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    #[error("Catalog integrity violated: {0}")]
    CatalogIntegrity(String),

    #[error("Parse error at line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Attach the asset name and path to a lower-level failure.
    pub fn asset(asset: &'static str, path: impl Into<PathBuf>, source: impl std::fmt::Display) -> Self {
        Error::AssetLoad {
            asset,
            path: path.into(),
            reason: source.to_string(),
        }
    }

    /// True for failures that must abort a run rather than skip a record.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::MalformedRecord { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
