use crate::{BatchError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Documents per chunk.
    pub batch_size: usize,
    /// Scoring threads.
    pub workers: usize,
    /// Capacity of the chunk queue and of the result queue.
    pub queue_depth: usize,
    /// Stop after this many records.
    pub limit: Option<usize>,
    pub progress: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self {
            batch_size: 10_000,
            workers,
            queue_depth: workers * 2,
            limit: None,
            progress: false,
        }
    }
}

impl BatchConfig {
    /// Set the worker count and size the queues to match.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self.queue_depth = workers * 2;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(BatchError::Config("batch size must be at least 1".to_string()));
        }
        if self.workers == 0 {
            return Err(BatchError::Config("at least one worker is required".to_string()));
        }
        if self.queue_depth == 0 {
            return Err(BatchError::Config("queue depth must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let config = BatchConfig::default();
        assert_eq!(config.batch_size, 10_000);
        assert!(config.workers >= 1);
        assert_eq!(config.queue_depth, config.workers * 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_with_workers() {
        let config = BatchConfig::default().with_workers(3);
        assert_eq!(config.queue_depth, 6);
    }

    #[test]
    fn test_validate() {
        let config = BatchConfig { batch_size: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(BatchError::Config(_))));
        let config = BatchConfig::default().with_workers(0);
        assert!(config.validate().is_err());
    }
}
