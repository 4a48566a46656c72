//! Provider contracts
//!
//! A contract states how one provider shapes its response for one operation.
//! Contracts are picked at configuration time; the normalizer never guesses a
//! shape from the body it receives.

use crate::OperationKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default label that marks a crisis in zero-shot classification
pub const DEFAULT_CRISIS_LABEL: &str = "crisis";

/// Default labels that mark a crisis in label-set classification
pub const DEFAULT_CRISIS_LABELS: [&str; 2] = ["suicidal", "self-harm"];

/// Default boolean field for flag-style crisis providers
pub const DEFAULT_CRISIS_FLAG_FIELD: &str = "crisis_detected";

/// Default field carrying summary text
pub const DEFAULT_SUMMARY_FIELD: &str = "summary_text";

/// Expected response shape for a (provider, operation) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderContract {
    /// Sequence of `{label, score}` objects, optionally nested one level
    /// (`[[{"label": "joy", "score": 0.9}, ...]]`)
    LabelScores,

    /// Free-text answer from a generative provider
    FreeText {
        /// Field holding the text. `None` means the body itself is the text.
        #[serde(default)]
        field: Option<String>,
    },

    /// Zero-shot classification with parallel `labels` and `scores`
    ZeroShot {
        /// Label that signals a crisis, compared case-insensitively
        #[serde(default = "default_crisis_label")]
        crisis_label: String,
    },

    /// A label or set of labels, any of which may signal a crisis
    LabelSet {
        /// Labels that signal a crisis (set membership, not substring)
        #[serde(default = "default_crisis_labels")]
        crisis_labels: Vec<String>,

        /// Whether label comparison is case-sensitive
        #[serde(default = "default_true")]
        case_sensitive: bool,
    },

    /// Object carrying a boolean crisis flag; absence means no crisis
    CrisisFlag {
        /// Name of the boolean field
        #[serde(default = "default_flag_field")]
        field: String,
    },

    /// Sequence whose first element carries the summary string
    SummaryText {
        /// Name of the summary field
        #[serde(default = "default_summary_field")]
        field: String,
    },
}

fn default_crisis_label() -> String {
    DEFAULT_CRISIS_LABEL.to_string()
}

fn default_crisis_labels() -> Vec<String> {
    DEFAULT_CRISIS_LABELS.iter().map(|s| s.to_string()).collect()
}

fn default_true() -> bool {
    true
}

fn default_flag_field() -> String {
    DEFAULT_CRISIS_FLAG_FIELD.to_string()
}

fn default_summary_field() -> String {
    DEFAULT_SUMMARY_FIELD.to_string()
}

impl ProviderContract {
    /// Zero-shot contract with the default crisis label
    pub fn zero_shot() -> Self {
        ProviderContract::ZeroShot {
            crisis_label: default_crisis_label(),
        }
    }

    /// Label-set contract with the default vocabulary, case-sensitive
    pub fn label_set() -> Self {
        ProviderContract::LabelSet {
            crisis_labels: default_crisis_labels(),
            case_sensitive: true,
        }
    }

    /// Flag contract reading `crisis_detected`
    pub fn crisis_flag() -> Self {
        ProviderContract::CrisisFlag {
            field: default_flag_field(),
        }
    }

    /// Summary contract reading `summary_text`
    pub fn summary_text() -> Self {
        ProviderContract::SummaryText {
            field: default_summary_field(),
        }
    }

    /// Contract name, matching the serde `type` tag
    pub fn name(&self) -> &'static str {
        match self {
            ProviderContract::LabelScores => "label_scores",
            ProviderContract::FreeText { .. } => "free_text",
            ProviderContract::ZeroShot { .. } => "zero_shot",
            ProviderContract::LabelSet { .. } => "label_set",
            ProviderContract::CrisisFlag { .. } => "crisis_flag",
            ProviderContract::SummaryText { .. } => "summary_text",
        }
    }

    /// Whether this contract can produce a result for `kind`
    pub fn supports(&self, kind: OperationKind) -> bool {
        match kind {
            OperationKind::MoodAnalysis => matches!(
                self,
                ProviderContract::LabelScores | ProviderContract::FreeText { .. }
            ),
            OperationKind::CrisisDetection => matches!(
                self,
                ProviderContract::ZeroShot { .. }
                    | ProviderContract::LabelSet { .. }
                    | ProviderContract::CrisisFlag { .. }
            ),
            OperationKind::Summarization => {
                matches!(self, ProviderContract::SummaryText { .. })
            }
        }
    }

    /// Human-readable description of the body this contract expects
    pub fn expected_shape(&self) -> String {
        match self {
            ProviderContract::LabelScores => "array of {label, score}".to_string(),
            ProviderContract::FreeText { field: None } => "free text".to_string(),
            ProviderContract::FreeText { field: Some(field) } => {
                format!("object with string field '{}'", field)
            }
            ProviderContract::ZeroShot { .. } => {
                "object with parallel 'labels' and 'scores' arrays".to_string()
            }
            ProviderContract::LabelSet { .. } => "label or array of labels".to_string(),
            ProviderContract::CrisisFlag { field } => {
                format!("object with boolean field '{}'", field)
            }
            ProviderContract::SummaryText { field } => {
                format!("array whose first element has string field '{}'", field)
            }
        }
    }
}

impl fmt::Display for ProviderContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
