//! Multiple-choice quizzes: stored, or generated on demand.

use std::sync::Arc;

use tracing::{info, warn};

use super::context::{ContextBuilder, NO_TRANSCRIPT};
use super::generation_client::GenerationClient;
use crate::cache::{CacheKey, CachePolicy, CachedOperation};
use crate::domain::{QuizItem, QuizResult, validate_quiz_items};
use crate::ports::TranscriptStore;

/// Cache operation name for generated quizzes.
pub const GENERATE_QUIZ_OP: &str = "quiz.generate";

#[derive(Clone)]
pub struct QuizService {
    store: Arc<dyn TranscriptStore>,
    client: GenerationClient,
    cached: CachedOperation,
}

impl QuizService {
    pub fn new(
        store: Arc<dyn TranscriptStore>,
        client: GenerationClient,
        cached: CachedOperation,
    ) -> Self {
        Self {
            store,
            client,
            cached,
        }
    }

    /// Return the stored quiz, or generate, validate, save and return a new one.
    pub async fn get_quiz(&self, video_id: &str, regenerate: bool, policy: CachePolicy) -> QuizResult {
        info!(video_id = %video_id, regenerate, "Getting quiz");

        if !regenerate {
            match self.store.get_quiz(video_id).await {
                Ok(Some(questions)) if !questions.is_empty() => {
                    info!(video_id = %video_id, "Retrieved existing quiz");
                    return QuizResult {
                        video_id: video_id.to_string(),
                        questions,
                        success: true,
                        regenerated: false,
                        error: None,
                    };
                }
                Ok(_) => {}
                Err(e) => warn!(video_id = %video_id, error = %e, "Failed to read stored quiz"),
            }
        }

        let key = CacheKey::for_operation(GENERATE_QUIZ_OP).arg(video_id).finish();
        self.cached
            .run(key, policy.regenerating(regenerate), || {
                self.generate(video_id)
            })
            .await
    }

    async fn generate(&self, video_id: &str) -> QuizResult {
        info!(video_id = %video_id, "Generating new quiz");

        let full_text = match self.store.get_transcript(video_id).await {
            Ok(transcript) => transcript.map(|t| t.full_text).unwrap_or_default(),
            Err(e) => return failure(video_id, e.to_string()),
        };
        let Some(context) = ContextBuilder::quiz_context(&full_text) else {
            return failure(video_id, NO_TRANSCRIPT.to_string());
        };

        let raw = match self.client.quiz_items(&context).await {
            Ok(raw) => raw,
            Err(e) => return failure(video_id, e.to_string()),
        };
        if raw.is_fallback() {
            return failure(video_id, "Model output did not contain a quiz".to_string());
        }

        let questions: Vec<QuizItem> = validate_quiz_items(&raw.value);
        if questions.is_empty() {
            return failure(video_id, "Model output contained no valid quiz items".to_string());
        }
        info!(
            video_id = %video_id,
            produced = raw.value.len(),
            kept = questions.len(),
            "Validated quiz items"
        );

        if let Err(e) = self.store.save_quiz(video_id, &questions).await {
            warn!(video_id = %video_id, error = %e, "Failed to save quiz");
        }

        QuizResult {
            video_id: video_id.to_string(),
            questions,
            success: true,
            regenerated: true,
            error: None,
        }
    }
}

fn failure(video_id: &str, error: String) -> QuizResult {
    warn!(video_id = %video_id, error = %error, "Quiz generation failed");
    QuizResult {
        video_id: video_id.to_string(),
        questions: Vec::new(),
        success: false,
        regenerated: false,
        error: Some(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::KeyedCache;
    use crate::domain::{GenerationRequest, Transcript, TranscriptSegment};
    use crate::memory::InMemoryStore;
    use crate::ports::{InferenceError, TextGenerator};
    use async_trait::async_trait;
    use std::time::Duration;

    struct FixedGenerator(&'static str);

    #[async_trait]
    impl TextGenerator for FixedGenerator {
        async fn generate(&self, _request: &GenerationRequest) -> Result<String, InferenceError> {
            Ok(self.0.to_string())
        }
    }

    fn service(reply: &'static str) -> (QuizService, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        store.insert_transcript(
            "vid",
            Transcript::from_segments(vec![
                TranscriptSegment::new(0.0, 3.0, "Rust has no garbage collector").unwrap(),
            ]),
        );
        let cached = CachedOperation::new(Arc::new(KeyedCache::new(Duration::from_secs(60))));
        let service = QuizService::new(
            store.clone(),
            GenerationClient::new(Arc::new(FixedGenerator(reply))),
            cached,
        );
        (service, store)
    }

    #[tokio::test]
    async fn test_out_of_bounds_index_is_clamped_and_saved() {
        let (service, store) = service(
            r#"Here you go:
```json
[{"question": "GC?", "options": ["yes", "no", 3], "correctAnswerIndex": 9},
 {"question": "broken", "options": ["only"], "correctAnswerIndex": 0}]
```"#,
        );
        let result = service.get_quiz("vid", false, CachePolicy::Use).await;
        assert!(result.success);
        assert_eq!(result.questions.len(), 1);
        assert_eq!(result.questions[0].correct_answer_index, 0);
        assert_eq!(result.questions[0].options[2], "3");
        assert_eq!(store.get_quiz("vid").await.unwrap().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unparsable_output_is_failure_and_not_cached() {
        let (service, store) = service("Sorry, I can't write quizzes.");
        let result = service.get_quiz("vid", false, CachePolicy::Use).await;
        assert!(!result.success);
        assert!(result.questions.is_empty());
        assert!(service.cached.cache().is_empty());
        assert!(store.get_quiz("vid").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stored_quiz_is_returned_without_generation() {
        let (service, store) = service("not json");
        let stored = vec![QuizItem {
            question: "q".into(),
            options: vec!["a".into(), "b".into()],
            correct_answer_index: 1,
        }];
        store.save_quiz("vid", &stored).await.unwrap();
        let result = service.get_quiz("vid", false, CachePolicy::Use).await;
        assert!(result.success);
        assert!(!result.regenerated);
        assert_eq!(result.questions, stored);
    }
}
