//! Question answering over a video transcript.

use std::sync::Arc;

use tracing::{info, warn};

use super::context::{ContextBuilder, NO_TRANSCRIPT};
use super::generation_client::GenerationClient;
use crate::domain::AnswerResult;
use crate::ports::TranscriptStore;

/// Answer text shown when a question could not be processed.
pub const ANSWER_FAILED: &str = "I'm sorry, I couldn't process your question due to an error.";

#[derive(Clone)]
pub struct QaEngine {
    store: Arc<dyn TranscriptStore>,
    context: ContextBuilder,
    client: GenerationClient,
}

impl QaEngine {
    pub fn new(
        store: Arc<dyn TranscriptStore>,
        context: ContextBuilder,
        client: GenerationClient,
    ) -> Self {
        Self {
            store,
            context,
            client,
        }
    }

    pub async fn answer_question(&self, video_id: &str, query: &str) -> AnswerResult {
        info!(video_id = %video_id, query = %query, "Processing question");

        let segments = match self.store.get_transcript(video_id).await {
            Ok(transcript) => transcript.map(|t| t.segments).unwrap_or_default(),
            Err(e) => return failure(video_id, query, e.to_string()),
        };

        let context = match self.context.qa_context(video_id, query, &segments).await {
            Ok(Some(context)) => context,
            Ok(None) => return failure(video_id, query, NO_TRANSCRIPT.to_string()),
            Err(e) => return failure(video_id, query, e.to_string()),
        };

        match self.client.answer_question(query, &context).await {
            Ok(answer) => AnswerResult {
                video_id: video_id.to_string(),
                query: query.to_string(),
                answer,
                success: true,
                error: None,
            },
            Err(e) => failure(video_id, query, e.to_string()),
        }
    }
}

fn failure(video_id: &str, query: &str, error: String) -> AnswerResult {
    warn!(video_id = %video_id, error = %error, "Question answering failed");
    AnswerResult {
        video_id: video_id.to_string(),
        query: query.to_string(),
        answer: ANSWER_FAILED.to_string(),
        success: false,
        error: Some(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GenerationRequest, Transcript, TranscriptSegment};
    use crate::memory::InMemoryStore;
    use crate::ports::{InferenceError, TextGenerator};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingGenerator {
        reply: Result<String, InferenceError>,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TextGenerator for RecordingGenerator {
        async fn generate(&self, request: &GenerationRequest) -> Result<String, InferenceError> {
            self.prompts.lock().unwrap().push(request.prompt().to_string());
            self.reply.clone()
        }
    }

    fn engine(reply: Result<String, InferenceError>) -> (QaEngine, Arc<RecordingGenerator>) {
        let store = Arc::new(InMemoryStore::new());
        store.insert_transcript(
            "vid",
            Transcript::from_segments(vec![
                TranscriptSegment::new(0.0, 4.0, "Borrowing lets you reference data").unwrap(),
            ]),
        );
        let generator = Arc::new(RecordingGenerator {
            reply,
            prompts: Mutex::new(Vec::new()),
        });
        let engine = QaEngine::new(
            store.clone(),
            ContextBuilder::new(store),
            GenerationClient::new(generator.clone()),
        );
        (engine, generator)
    }

    #[tokio::test]
    async fn test_answers_with_transcript_context() {
        let (engine, generator) = engine(Ok("By reference.".into()));
        let result = engine.answer_question("vid", "what is borrowing?").await;
        assert!(result.success);
        assert_eq!(result.answer, "By reference.");
        let prompts = generator.prompts.lock().unwrap();
        assert!(prompts[0].contains("[0:00] Borrowing lets you reference data"));
        assert!(prompts[0].contains("User question: what is borrowing?"));
    }

    #[tokio::test]
    async fn test_missing_transcript_does_not_call_model() {
        let (engine, generator) = engine(Ok("unused".into()));
        let result = engine.answer_question("nope", "anything").await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some(NO_TRANSCRIPT));
        assert!(generator.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_server_is_reported() {
        let (engine, _) = engine(Err(InferenceError::ProcessUnavailable("stopped".into())));
        let result = engine.answer_question("vid", "borrowing").await;
        assert!(!result.success);
        assert_eq!(result.answer, ANSWER_FAILED);
        assert!(result.error.unwrap().contains("not running"));
    }
}
