//! Input documents and output records.

use crate::Embedding;
use fieldscore_core::Result;
use serde::{Deserialize, Serialize};

/// One input line. `text` is already normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub merged_id: String,
    pub text: String,
}

impl Document {
    pub fn new(merged_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            merged_id: merged_id.into(),
            text: text.into(),
        }
    }
}

/// A document embedded ahead of scoring: one line of `fields embed` output
/// and one line of input to `fields score --embedded`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedDocument {
    pub merged_id: String,
    #[serde(flatten)]
    pub embedding: Embedding,
}

impl EmbeddedDocument {
    pub fn new(merged_id: impl Into<String>, embedding: Embedding) -> Self {
        Self {
            merged_id: merged_id.into(),
            embedding,
        }
    }
}

/// Per-signal scores behind a combined score. `None` means the signal was
/// undefined for that document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalScores {
    pub dense: Option<f64>,
    pub sparse: Option<f64>,
    pub entity: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredField {
    pub name: String,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signals: Option<SignalScores>,
}

/// One output line: a document's fields, L0 to L3, best first per level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub merged_id: String,
    pub fields: Vec<ScoredField>,
}

impl ScoreRecord {
    pub fn empty(merged_id: impl Into<String>) -> Self {
        Self {
            merged_id: merged_id.into(),
            fields: Vec::new(),
        }
    }

    /// Serialize as a single JSON line without the trailing newline.
    pub fn to_json_line(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Round to `precision` decimal places.
pub fn round_score(value: f32, precision: u32) -> f64 {
    let scale = 10f64.powi(precision as i32);
    (value as f64 * scale).round() / scale
}
