//! Quiz types and validation of model-produced quiz payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Minimum number of answer options for a usable question.
const MIN_OPTIONS: usize = 2;

/// One multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizItem {
    pub question: String,
    pub options: Vec<String>,
    #[serde(rename = "correctAnswerIndex")]
    pub correct_answer_index: usize,
}

/// Validate and normalize raw quiz items produced by the model.
///
/// An item is kept when it is an object carrying `question`, an `options`
/// array with at least two entries, and a `correctAnswerIndex`. A missing,
/// non-integer or out-of-range index is clamped to 0 rather than dropping
/// the item. All text fields are stringified.
pub fn validate_quiz_items(raw: &[Value]) -> Vec<QuizItem> {
    raw.iter()
        .enumerate()
        .filter_map(|(position, item)| {
            let validated = validate_item(item);
            if validated.is_none() {
                debug!(position, "Dropping malformed quiz item");
            }
            validated
        })
        .collect()
}

fn validate_item(item: &Value) -> Option<QuizItem> {
    let obj = item.as_object()?;
    let question = obj.get("question")?;
    let options = obj.get("options")?.as_array()?;
    let index = obj.get("correctAnswerIndex")?;

    if options.len() < MIN_OPTIONS {
        return None;
    }

    let correct_answer_index = index
        .as_u64()
        .and_then(|i| usize::try_from(i).ok())
        .filter(|&i| i < options.len())
        .unwrap_or(0);

    Some(QuizItem {
        question: stringify(question),
        options: options.iter().map(stringify).collect(),
        correct_answer_index,
    })
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_out_of_bounds_index_is_clamped_and_fields_stringified() {
        let raw = vec![json!({
            "question": 42,
            "options": ["a", 2, true],
            "correctAnswerIndex": 7
        })];
        let items = validate_quiz_items(&raw);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].question, "42");
        assert_eq!(items[0].options, vec!["a", "2", "true"]);
        assert_eq!(items[0].correct_answer_index, 0);
    }

    #[test]
    fn test_negative_and_non_integer_index_clamped() {
        let raw = vec![
            json!({"question": "q1", "options": ["a", "b"], "correctAnswerIndex": -1}),
            json!({"question": "q2", "options": ["a", "b"], "correctAnswerIndex": "1"}),
            json!({"question": "q3", "options": ["a", "b"], "correctAnswerIndex": 1}),
        ];
        let items = validate_quiz_items(&raw);
        let indices: Vec<usize> = items.iter().map(|i| i.correct_answer_index).collect();
        assert_eq!(indices, vec![0, 0, 1]);
    }

    #[test]
    fn test_drops_items_missing_fields_or_options() {
        let raw = vec![
            json!("not an object"),
            json!({"question": "q", "options": ["only one"], "correctAnswerIndex": 0}),
            json!({"question": "q", "options": "ab", "correctAnswerIndex": 0}),
            json!({"options": ["a", "b"], "correctAnswerIndex": 0}),
            json!({"question": "q", "options": ["a", "b"]}),
        ];
        assert!(validate_quiz_items(&raw).is_empty());
    }

    #[test]
    fn test_serializes_with_camel_case_index() {
        let item = QuizItem {
            question: "q".into(),
            options: vec!["a".into(), "b".into()],
            correct_answer_index: 1,
        };
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["correctAnswerIndex"], 1);
    }
}
