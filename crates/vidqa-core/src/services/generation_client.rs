//! Use-case level generation over a `TextGenerator`.
//!
//! Each operation applies a fixed `GenerationProfile` and, where a
//! structured answer is expected, extracts it from the raw completion.
//! Malformed output never becomes an error here: it is logged and replaced
//! by a documented fallback tagged `Confidence::Fallback`. Errors from the
//! generator itself are returned unchanged.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::domain::GenerationProfile;
use crate::ports::{InferenceError, TextGenerator};
use crate::utils::{Shape, extract_structured};

/// Timestamp reported when the model's answer could not be used.
pub const FALLBACK_TIMESTAMP: &str = "00:00:00";

/// Reason reported when the navigation payload is not valid JSON.
pub const UNPARSABLE_NAVIGATION_REASON: &str = "Could not parse timestamp information";

/// Reason reported when the navigation payload lacks a required field.
pub const INCOMPLETE_NAVIGATION_REASON: &str = "Could not determine appropriate timestamp";

/// Whether a structured value came from the model or from a fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Parsed,
    Fallback,
}

/// A structured value with its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted<T> {
    pub value: T,
    pub confidence: Confidence,
}

impl<T> Extracted<T> {
    pub const fn parsed(value: T) -> Self {
        Self {
            value,
            confidence: Confidence::Parsed,
        }
    }

    pub const fn fallback(value: T) -> Self {
        Self {
            value,
            confidence: Confidence::Fallback,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.confidence == Confidence::Fallback
    }
}

/// Timestamp text and explanation proposed by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationCandidate {
    pub timestamp: String,
    pub reason: String,
    pub confidence: Confidence,
}

impl NavigationCandidate {
    fn fallback(reason: &str) -> Self {
        Self {
            timestamp: FALLBACK_TIMESTAMP.to_string(),
            reason: reason.to_string(),
            confidence: Confidence::Fallback,
        }
    }
}

#[derive(Clone)]
pub struct GenerationClient {
    generator: Arc<dyn TextGenerator>,
}

impl GenerationClient {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    async fn complete(
        &self,
        profile: GenerationProfile,
        prompt: String,
    ) -> Result<String, InferenceError> {
        let request = profile.request(prompt)?;
        debug!(
            ?profile,
            max_tokens = request.max_tokens(),
            prompt_len = request.prompt().len(),
            "Requesting completion"
        );
        self.generator.generate(&request).await
    }

    pub async fn answer_question(
        &self,
        query: &str,
        context: &str,
    ) -> Result<String, InferenceError> {
        let prompt = format!(
            "You are a helpful AI assistant who provides information about videos.\n\n\
             {context}\n\n\
             User question: {query}\n\n\
             Provide a helpful answer based on the video content. \
             If the video content doesn't address the question, say so.\n\n\
             Answer:"
        );
        let raw = self
            .complete(GenerationProfile::QuestionAnswering, prompt)
            .await?;
        Ok(raw.trim().to_string())
    }

    pub async fn navigation_point(
        &self,
        query: &str,
        context: &str,
    ) -> Result<NavigationCandidate, InferenceError> {
        let prompt = format!(
            "{context}\n\n\
             User query: \"{query}\"\n\n\
             Based on the transcript segments, what is the most appropriate timestamp to navigate to?\n\
             Respond with only a JSON object containing: timestamp (string) and reason (string)."
        );
        let raw = self.complete(GenerationProfile::Navigation, prompt).await?;
        Ok(parse_navigation(&raw))
    }

    pub async fn summarize(&self, context: &str) -> Result<String, InferenceError> {
        let prompt = format!(
            "{context}\n\n\
             Create a concise summary of this video transcript in about 3-5 sentences.\n\
             Focus on the main points and key insights.\n\n\
             Summary:"
        );
        let raw = self.complete(GenerationProfile::Summary, prompt).await?;
        Ok(raw.trim().to_string())
    }

    /// Raw quiz items as the model produced them; see `validate_quiz_items`.
    pub async fn quiz_items(&self, context: &str) -> Result<Extracted<Vec<Value>>, InferenceError> {
        let prompt = format!(
            "{context}\n\n\
             Return your response as a JSON array where each item has the format:\n\
             {{\"question\": \"Question text\", \"options\": [\"Option A\", \"Option B\", \"Option C\", \"Option D\"], \"correctAnswerIndex\": 0}}"
        );
        let raw = self.complete(GenerationProfile::Quiz, prompt).await?;
        Ok(parse_quiz(&raw))
    }
}

fn parse_navigation(raw: &str) -> NavigationCandidate {
    let object: Map<String, Value> = match extract_structured(raw, Shape::Object) {
        Ok(object) => object,
        Err(e) => {
            warn!(error = %e, raw = %raw, "Failed to parse navigation response");
            return NavigationCandidate::fallback(UNPARSABLE_NAVIGATION_REASON);
        }
    };

    match (object.get("timestamp"), object.get("reason")) {
        (Some(timestamp), Some(reason)) => NavigationCandidate {
            timestamp: text_of(timestamp),
            reason: text_of(reason),
            confidence: Confidence::Parsed,
        },
        _ => {
            warn!(raw = %raw, "Incomplete navigation response");
            NavigationCandidate::fallback(INCOMPLETE_NAVIGATION_REASON)
        }
    }
}

fn parse_quiz(raw: &str) -> Extracted<Vec<Value>> {
    match extract_structured::<Vec<Value>>(raw, Shape::Array) {
        Ok(items) => Extracted::parsed(items),
        Err(e) => {
            warn!(error = %e, raw = %raw, "Failed to parse quiz response");
            Extracted::fallback(Vec::new())
        }
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GenerationRequest;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct EchoGenerator {
        reply: Result<String, InferenceError>,
        seen: Mutex<Vec<GenerationRequest>>,
    }

    impl EchoGenerator {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl TextGenerator for EchoGenerator {
        async fn generate(&self, request: &GenerationRequest) -> Result<String, InferenceError> {
            self.seen.lock().unwrap().push(request.clone());
            self.reply.clone()
        }
    }

    #[tokio::test]
    async fn test_navigation_uses_cold_profile() {
        let generator = EchoGenerator::replying(r#"{"timestamp": "1:02:03", "reason": "intro"}"#);
        let client = GenerationClient::new(generator.clone());
        let candidate = client.navigation_point("where", "ctx").await.unwrap();
        assert_eq!(candidate.timestamp, "1:02:03");
        assert_eq!(candidate.confidence, Confidence::Parsed);

        let seen = generator.seen.lock().unwrap();
        assert_eq!(seen[0].max_tokens(), 256);
        assert!((seen[0].temperature() - 0.3).abs() < f32::EPSILON);
        assert!(seen[0].prompt().contains("User query: \"where\""));
    }

    #[test]
    fn test_navigation_fallbacks() {
        let garbage = parse_navigation("the model rambles without json");
        assert_eq!(garbage.timestamp, FALLBACK_TIMESTAMP);
        assert_eq!(garbage.reason, UNPARSABLE_NAVIGATION_REASON);
        assert_eq!(garbage.confidence, Confidence::Fallback);

        let missing = parse_navigation(r#"```json
{"timestamp": "2:00"}
```"#);
        assert_eq!(missing.reason, INCOMPLETE_NAVIGATION_REASON);
        assert_eq!(missing.confidence, Confidence::Fallback);
    }

    #[test]
    fn test_navigation_stringifies_numeric_fields() {
        let candidate = parse_navigation(r#"Answer: {"timestamp": 95, "reason": "demo"}"#);
        assert_eq!(candidate.timestamp, "95");
        assert_eq!(candidate.confidence, Confidence::Parsed);
    }

    #[tokio::test]
    async fn test_quiz_extraction_and_fallback() {
        let client = GenerationClient::new(EchoGenerator::replying(
            "```json\n[{\"question\": \"q\", \"options\": [\"a\", \"b\"], \"correctAnswerIndex\": 1}]\n```",
        ));
        let items = client.quiz_items("ctx").await.unwrap();
        assert_eq!(items.value.len(), 1);
        assert!(!items.is_fallback());

        let client = GenerationClient::new(EchoGenerator::replying("no quiz today"));
        let items = client.quiz_items("ctx").await.unwrap();
        assert!(items.value.is_empty());
        assert!(items.is_fallback());
    }

    #[tokio::test]
    async fn test_generator_errors_propagate() {
        let generator = Arc::new(EchoGenerator {
            reply: Err(InferenceError::ProcessUnavailable("stopped".into())),
            seen: Mutex::new(Vec::new()),
        });
        let client = GenerationClient::new(generator);
        let err = client.answer_question("q", "ctx").await.unwrap_err();
        assert!(err.is_unavailable());
        assert!(client.navigation_point("q", "ctx").await.is_err());
    }

    #[tokio::test]
    async fn test_answer_is_trimmed() {
        let client = GenerationClient::new(EchoGenerator::replying("\n  It explains ownership.  \n"));
        assert_eq!(
            client.summarize("ctx").await.unwrap(),
            "It explains ownership."
        );
    }
}
