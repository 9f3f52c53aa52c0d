use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BatchError>;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error(transparent)]
    Core(#[from] fieldscore_core::Error),

    #[error("Failed to read input {}: {source}", path.display())]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write output: {0}")]
    Output(#[source] std::io::Error),

    #[error("Invalid batch configuration: {0}")]
    Config(String),

    #[error("Thread error: {0}")]
    Thread(String),
}
