//! Crisis detection parsing
//!
//! Each crisis vocabulary is its own contract:
//!
//! - `ZeroShot`: top-ranked label compared case-insensitively to the crisis label
//! - `LabelSet`: any returned label is a member of the crisis label set
//! - `CrisisFlag`: a boolean field set by the provider

use crate::shape::{describe, json_body, probability, round4, stable_max, unnest};
use moodlens_domain::{
    CrisisResult, LabelScore, NormalizationError, OperationKind, ProviderContract, UpstreamBody,
};
use serde_json::{Map, Value};

/// Decide whether a successful response signals a crisis
pub fn detect(
    contract: &ProviderContract,
    body: &UpstreamBody,
) -> Result<CrisisResult, NormalizationError> {
    match contract {
        ProviderContract::ZeroShot { crisis_label } => zero_shot(contract, crisis_label, body),
        ProviderContract::LabelSet {
            crisis_labels,
            case_sensitive,
        } => label_set(contract, crisis_labels, *case_sensitive, body),
        ProviderContract::CrisisFlag { field } => flag(contract, field, body),
        _ => Err(NormalizationError::ContractMismatch {
            kind: OperationKind::CrisisDetection,
            contract: contract.clone(),
        }),
    }
}

fn zero_shot(
    contract: &ProviderContract,
    crisis_label: &str,
    body: &UpstreamBody,
) -> Result<CrisisResult, NormalizationError> {
    let value = json_body(contract, body)?;
    let obj = value
        .as_object()
        .ok_or_else(|| NormalizationError::malformed(contract, describe(value)))?;

    let labels = string_array(obj, "labels")
        .map_err(|e| NormalizationError::malformed(contract, e))?;
    let scores = number_array(obj, "scores")
        .map_err(|e| NormalizationError::malformed(contract, e))?;

    if labels.len() != scores.len() {
        return Err(NormalizationError::malformed(
            contract,
            format!("{} labels and {} scores", labels.len(), scores.len()),
        ));
    }

    let pairs: Vec<LabelScore> = labels
        .into_iter()
        .zip(scores)
        .map(|(label, score)| LabelScore::new(label, score))
        .collect();

    let top = stable_max(&pairs)
        .ok_or_else(|| NormalizationError::malformed(contract, "empty 'labels'"))?;

    let crisis_detected = top.label.eq_ignore_ascii_case(crisis_label);
    let top_label = top.label.clone();
    let confidence = round4(top.score);

    Ok(CrisisResult {
        crisis_detected,
        top_label: Some(top_label),
        confidence: Some(confidence),
        raw_pairs: Some(pairs),
    })
}

fn string_array(obj: &Map<String, Value>, key: &str) -> Result<Vec<String>, String> {
    let items = obj
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| format!("missing or invalid '{}'", key))?;

    items
        .iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| format!("non-string entry in '{}'", key))
        })
        .collect()
}

fn number_array(obj: &Map<String, Value>, key: &str) -> Result<Vec<f64>, String> {
    let items = obj
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| format!("missing or invalid '{}'", key))?;

    items
        .iter()
        .enumerate()
        .map(|(idx, v)| probability(v).map_err(|e| format!("'{}' entry {}: {}", key, idx, e)))
        .collect()
}

/// Labels returned by a label-set provider, with scores when it sends them
struct Labels {
    labels: Vec<String>,
    pairs: Option<Vec<LabelScore>>,
}

impl Labels {
    fn unscored(labels: Vec<String>) -> Self {
        Self {
            labels,
            pairs: None,
        }
    }

    fn scored(pairs: Vec<LabelScore>) -> Self {
        Self {
            labels: pairs.iter().map(|p| p.label.clone()).collect(),
            pairs: Some(pairs),
        }
    }
}

fn label_set(
    contract: &ProviderContract,
    crisis_labels: &[String],
    case_sensitive: bool,
    body: &UpstreamBody,
) -> Result<CrisisResult, NormalizationError> {
    let found = match body {
        UpstreamBody::Text(text) => Labels::unscored(vec![text.trim().to_string()]),
        UpstreamBody::Json(value) => {
            labels_from_json(value).map_err(|e| NormalizationError::malformed(contract, e))?
        }
    };

    if found.labels.is_empty() || found.labels.iter().all(|l| l.is_empty()) {
        return Err(NormalizationError::malformed(contract, "no labels"));
    }

    let matches = |label: &str| {
        crisis_labels.iter().any(|crisis| {
            if case_sensitive {
                crisis == label
            } else {
                crisis.eq_ignore_ascii_case(label)
            }
        })
    };
    let crisis_detected = found.labels.iter().any(|label| matches(label.as_str()));

    let (top_label, confidence) = match &found.pairs {
        Some(pairs) => match stable_max(pairs) {
            Some(top) => (Some(top.label.clone()), Some(round4(top.score))),
            None => (None, None),
        },
        None => (found.labels.first().cloned(), None),
    };

    Ok(CrisisResult {
        crisis_detected,
        top_label,
        confidence,
        raw_pairs: found.pairs,
    })
}

/// Accepted forms:
/// `"label"`, `["a", "b"]`, `[{"label": "a", "score": 0.9}, ...]` (optionally
/// nested once), `{"label": "a", "score"?: 0.9}`, `{"labels": [...], "scores"?: [...]}`
fn labels_from_json(value: &Value) -> Result<Labels, String> {
    match value {
        Value::String(label) => Ok(Labels::unscored(vec![label.clone()])),
        Value::Array(items) => labels_from_items(unnest(items)),
        Value::Object(obj) => labels_from_object(obj),
        other => Err(describe(other)),
    }
}

fn labels_from_items(items: &[Value]) -> Result<Labels, String> {
    if items.iter().all(Value::is_string) {
        return Ok(Labels::unscored(
            items.iter().filter_map(Value::as_str).map(str::to_string).collect(),
        ));
    }

    let mut labels = Vec::with_capacity(items.len());
    let mut scores = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        let label = item
            .get("label")
            .and_then(Value::as_str)
            .ok_or_else(|| format!("element {}: missing or invalid 'label'", idx))?;
        labels.push(label.to_string());
        let score = item
            .get("score")
            .map(probability)
            .transpose()
            .map_err(|e| format!("element {}: {}", idx, e))?;
        scores.push(score);
    }

    match scores.into_iter().collect::<Option<Vec<f64>>>() {
        Some(scores) => Ok(Labels::scored(
            labels
                .into_iter()
                .zip(scores)
                .map(|(label, score)| LabelScore::new(label, score))
                .collect(),
        )),
        None => Ok(Labels::unscored(labels)),
    }
}

fn labels_from_object(obj: &Map<String, Value>) -> Result<Labels, String> {
    if let Some(label) = obj.get("label").and_then(Value::as_str) {
        let score = obj.get("score").map(probability).transpose()?;
        return Ok(match score {
            Some(score) => Labels::scored(vec![LabelScore::new(label, score)]),
            None => Labels::unscored(vec![label.to_string()]),
        });
    }

    let labels = string_array(obj, "labels")?;
    if !obj.contains_key("scores") {
        return Ok(Labels::unscored(labels));
    }

    let scores = number_array(obj, "scores")?;
    if scores.len() != labels.len() {
        return Err(format!("{} labels and {} scores", labels.len(), scores.len()));
    }

    Ok(Labels::scored(
        labels
            .into_iter()
            .zip(scores)
            .map(|(label, score)| LabelScore::new(label, score))
            .collect(),
    ))
}

fn flag(
    contract: &ProviderContract,
    field: &str,
    body: &UpstreamBody,
) -> Result<CrisisResult, NormalizationError> {
    let value = json_body(contract, body)?;
    let obj = value
        .as_object()
        .ok_or_else(|| NormalizationError::malformed(contract, describe(value)))?;

    let crisis_detected = match obj.get(field) {
        None => false,
        Some(Value::Bool(flag)) => *flag,
        Some(other) => {
            return Err(NormalizationError::malformed(
                contract,
                format!("'{}' is {}", field, describe(other)),
            ))
        }
    };

    Ok(CrisisResult {
        crisis_detected,
        top_label: None,
        confidence: None,
        raw_pairs: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn detect_json(contract: &ProviderContract, value: Value) -> Result<CrisisResult, NormalizationError> {
        detect(contract, &UpstreamBody::Json(value))
    }

    #[test]
    fn test_zero_shot_non_crisis() {
        let result = detect_json(
            &ProviderContract::zero_shot(),
            json!({"labels": ["support", "crisis", "neutral"], "scores": [0.5, 0.4, 0.1]}),
        )
        .unwrap();

        assert!(!result.crisis_detected);
        assert_eq!(result.top_label.as_deref(), Some("support"));
        assert_eq!(result.confidence, Some(0.5));
        assert_eq!(
            result.raw_pairs,
            Some(vec![
                LabelScore::new("support", 0.5),
                LabelScore::new("crisis", 0.4),
                LabelScore::new("neutral", 0.1),
            ])
        );
    }

    #[test]
    fn test_zero_shot_crisis_case_insensitive() {
        let result = detect_json(
            &ProviderContract::zero_shot(),
            json!({
                "sequence": "i want to hurt myself",
                "labels": ["Crisis", "support"],
                "scores": [0.912345, 0.087655]
            }),
        )
        .unwrap();

        assert!(result.crisis_detected);
        assert_eq!(result.top_label.as_deref(), Some("Crisis"));
        assert_eq!(result.confidence, Some(0.9123));
    }

    #[test]
    fn test_zero_shot_custom_label() {
        let contract = ProviderContract::ZeroShot {
            crisis_label: "self-harm risk".to_string(),
        };
        let result = detect_json(
            &contract,
            json!({"labels": ["self-harm risk", "non-crisis"], "scores": [0.7, 0.3]}),
        )
        .unwrap();
        assert!(result.crisis_detected);
    }

    #[test]
    fn test_zero_shot_missing_scores() {
        let err = detect_json(&ProviderContract::zero_shot(), json!({"labels": ["crisis"]}))
            .unwrap_err();
        assert!(err.to_string().contains("missing or invalid 'scores'"));
    }

    #[test]
    fn test_zero_shot_length_mismatch() {
        let err = detect_json(
            &ProviderContract::zero_shot(),
            json!({"labels": ["crisis", "support"], "scores": [0.9]}),
        )
        .unwrap_err();
        assert!(err.to_string().contains("2 labels and 1 scores"));
    }

    #[test]
    fn test_zero_shot_empty() {
        let err = detect_json(
            &ProviderContract::zero_shot(),
            json!({"labels": [], "scores": []}),
        )
        .unwrap_err();
        assert!(matches!(err, NormalizationError::MalformedShape { .. }));
    }

    #[test]
    fn test_zero_shot_rejects_out_of_range_scores() {
        let err = detect_json(
            &ProviderContract::zero_shot(),
            json!({"labels": ["crisis", "support"], "scores": [7.5, -2.0]}),
        )
        .unwrap_err();
        assert!(matches!(err, NormalizationError::MalformedShape { .. }));
        assert!(err.to_string().contains("'scores' entry 0: score 7.5 outside [0, 1]"));
    }

    #[test]
    fn test_zero_shot_ascii_case_only() {
        let contract = ProviderContract::ZeroShot {
            crisis_label: "crisis".to_string(),
        };
        let result = detect_json(&contract, json!({"labels": ["CRISIS"], "scores": [0.9]})).unwrap();
        assert!(result.crisis_detected);

        let contract = ProviderContract::ZeroShot {
            crisis_label: "\u{e9}tat critique".to_string(),
        };
        let result =
            detect_json(&contract, json!({"labels": ["\u{c9}tat critique"], "scores": [0.9]}))
                .unwrap();
        assert!(!result.crisis_detected);
    }

    #[test]
    fn test_zero_shot_rejects_array() {
        let err = detect_json(&ProviderContract::zero_shot(), json!([])).unwrap_err();
        assert!(matches!(err, NormalizationError::MalformedShape { .. }));
    }

    #[test]
    fn test_label_set_scored_pairs() {
        let result = detect_json(
            &ProviderContract::label_set(),
            json!([[{"label": "non-suicidal", "score": 0.2}, {"label": "suicidal", "score": 0.8}]]),
        )
        .unwrap();

        assert!(result.crisis_detected);
        assert_eq!(result.top_label.as_deref(), Some("suicidal"));
        assert_eq!(result.confidence, Some(0.8));
        assert_eq!(result.raw_pairs.map(|p| p.len()), Some(2));
    }

    #[test]
    fn test_label_set_membership_not_substring() {
        let result = detect_json(
            &ProviderContract::label_set(),
            json!(["non-suicidal", "self-harmony"]),
        )
        .unwrap();
        assert!(!result.crisis_detected);
        assert_eq!(result.top_label.as_deref(), Some("non-suicidal"));
        assert_eq!(result.confidence, None);
    }

    #[test]
    fn test_label_set_case_sensitive_by_default() {
        let result = detect_json(&ProviderContract::label_set(), json!("Suicidal")).unwrap();
        assert!(!result.crisis_detected);

        let result = detect_json(&ProviderContract::label_set(), json!("self-harm")).unwrap();
        assert!(result.crisis_detected);
    }

    #[test]
    fn test_label_set_case_insensitive() {
        let contract = ProviderContract::LabelSet {
            crisis_labels: vec!["suicidal".to_string(), "self-harm".to_string()],
            case_sensitive: false,
        };
        let result = detect_json(&contract, json!({"label": "SUICIDAL"})).unwrap();
        assert!(result.crisis_detected);
    }

    #[test]
    fn test_label_set_rejects_out_of_range_pair_score() {
        let err = detect_json(
            &ProviderContract::label_set(),
            json!([{"label": "suicidal", "score": 1.2}, {"label": "neutral", "score": 0.1}]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("element 0: score 1.2 outside [0, 1]"));
    }

    #[test]
    fn test_label_set_rejects_out_of_range_object_scores() {
        let err = detect_json(
            &ProviderContract::label_set(),
            json!({"labels": ["self-harm", "neutral"], "scores": [0.4, -0.6]}),
        )
        .unwrap_err();
        assert!(matches!(err, NormalizationError::MalformedShape { .. }));

        let err = detect_json(&ProviderContract::label_set(), json!({"label": "self-harm", "score": 3}))
            .unwrap_err();
        assert!(err.to_string().contains("score 3 outside [0, 1]"));
    }

    #[test]
    fn test_label_set_object_with_scores() {
        let result = detect_json(
            &ProviderContract::label_set(),
            json!({"labels": ["depression", "self-harm"], "scores": [0.6, 0.4]}),
        )
        .unwrap();
        assert!(result.crisis_detected);
        assert_eq!(result.top_label.as_deref(), Some("depression"));
        assert_eq!(result.confidence, Some(0.6));
    }

    #[test]
    fn test_label_set_plain_text() {
        let result = detect(
            &ProviderContract::label_set(),
            &UpstreamBody::Text("suicidal\n".to_string()),
        )
        .unwrap();
        assert!(result.crisis_detected);
    }

    #[test]
    fn test_label_set_empty() {
        let err = detect_json(&ProviderContract::label_set(), json!([])).unwrap_err();
        assert!(matches!(err, NormalizationError::MalformedShape { .. }));
    }

    #[test]
    fn test_label_set_rejects_number() {
        let err = detect_json(&ProviderContract::label_set(), json!(42)).unwrap_err();
        assert!(matches!(err, NormalizationError::MalformedShape { .. }));
    }

    #[test]
    fn test_flag_present() {
        let result = detect_json(&ProviderContract::crisis_flag(), json!({"crisis_detected": true}))
            .unwrap();
        assert!(result.crisis_detected);
        assert_eq!(result.top_label, None);
    }

    #[test]
    fn test_flag_absent_means_false() {
        let result = detect_json(&ProviderContract::crisis_flag(), json!({"other": 1})).unwrap();
        assert!(!result.crisis_detected);
    }

    #[test]
    fn test_flag_wrong_type() {
        let err = detect_json(&ProviderContract::crisis_flag(), json!({"crisis_detected": "yes"}))
            .unwrap_err();
        assert!(err.to_string().contains("'crisis_detected' is string"));
    }

    #[test]
    fn test_wrong_contract() {
        let err = detect_json(&ProviderContract::LabelScores, json!([])).unwrap_err();
        assert!(matches!(err, NormalizationError::ContractMismatch { .. }));
    }
}
