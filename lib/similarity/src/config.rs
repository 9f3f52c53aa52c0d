use fieldscore_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// How L2/L3 candidates are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringMode {
    /// Only descendants of a document's best L0/L1 pairs.
    #[default]
    Constrained,
    /// Every L2/L3 field for every document.
    Exhaustive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Fields kept per level.
    pub top_k: usize,
    /// Best L0 and L1 rows consulted for eligibility.
    pub coarse_k: usize,
    /// Decimal places of emitted scores.
    pub precision: u32,
    pub mode: ScoringMode,
    /// Attach per-signal scores to emitted fields.
    pub explain: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            top_k: 10,
            coarse_k: 3,
            precision: 4,
            mode: ScoringMode::Constrained,
            explain: false,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(Error::InvalidConfig("top_k must be at least 1".to_string()));
        }
        if self.coarse_k == 0 || self.coarse_k > self.top_k {
            return Err(Error::InvalidConfig(format!(
                "coarse_k must be between 1 and top_k ({}), got {}",
                self.top_k, self.coarse_k
            )));
        }
        if self.precision > 9 {
            return Err(Error::InvalidConfig(format!(
                "precision must be at most 9 decimal places, got {}",
                self.precision
            )));
        }
        Ok(())
    }
}
