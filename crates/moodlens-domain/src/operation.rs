//! Operation kinds exposed by the service

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three analyses the service can run on a piece of text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Emotion classification
    MoodAnalysis,
    /// Crisis / self-harm detection
    CrisisDetection,
    /// Text summarization
    Summarization,
}

impl OperationKind {
    /// All operation kinds, in route order
    pub const ALL: [OperationKind; 3] = [
        OperationKind::MoodAnalysis,
        OperationKind::CrisisDetection,
        OperationKind::Summarization,
    ];

    /// Stable snake_case name, matching the serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::MoodAnalysis => "mood_analysis",
            OperationKind::CrisisDetection => "crisis_detection",
            OperationKind::Summarization => "summarization",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OperationKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("Unknown operation kind: {}", s))
    }
}
