//! Normalized, provider-independent results
//!
//! Each variant serializes as the flat JSON object returned to API clients.
//! Optional fields are omitted when absent.

use crate::OperationKind;
use serde::{Deserialize, Serialize};

/// A classification label with its score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    /// Label as reported by the provider
    pub label: String,
    /// Score in [0, 1]
    pub score: f64,
}

impl LabelScore {
    /// Create a new label/score pair
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// Result of mood analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodResult {
    /// Dominant emotion, in the provider's casing
    pub emotion: String,
}

/// Result of crisis detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrisisResult {
    /// Whether the text was classified as a crisis
    pub crisis_detected: bool,

    /// Highest-ranked label, when the provider reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_label: Option<String>,

    /// Score of the top label, rounded to 4 decimal places
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,

    /// All (label, score) pairs in the order received
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_pairs: Option<Vec<LabelScore>>,
}

/// Note attached to summaries of inputs too short to summarize
pub const SHORT_INPUT_NOTE: &str = "too short to summarize";

/// Result of summarization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryResult {
    /// Summary text
    pub summary: String,

    /// Explanation when the summary is not a model output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Stable result of a normalized upstream call
///
/// Serialized untagged: the required field of each variant (`emotion`,
/// `crisis_detected`, `summary`) identifies it on the way back in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NormalizedResult {
    /// Mood analysis result
    Mood(MoodResult),
    /// Crisis detection result
    Crisis(CrisisResult),
    /// Summarization result
    Summary(SummaryResult),
}

impl NormalizedResult {
    /// Operation kind this result answers
    pub fn kind(&self) -> OperationKind {
        match self {
            NormalizedResult::Mood(_) => OperationKind::MoodAnalysis,
            NormalizedResult::Crisis(_) => OperationKind::CrisisDetection,
            NormalizedResult::Summary(_) => OperationKind::Summarization,
        }
    }
}

impl From<MoodResult> for NormalizedResult {
    fn from(result: MoodResult) -> Self {
        NormalizedResult::Mood(result)
    }
}

impl From<CrisisResult> for NormalizedResult {
    fn from(result: CrisisResult) -> Self {
        NormalizedResult::Crisis(result)
    }
}

impl From<SummaryResult> for NormalizedResult {
    fn from(result: SummaryResult) -> Self {
        NormalizedResult::Summary(result)
    }
}
