//! `VideoAssistant` - the application facade.
//!
//! Constructed once at the composition root with concrete port
//! implementations and one shared cache. Adapters call these operations and
//! always get a tagged result back.

use std::sync::Arc;

use tracing::{info, warn};

use super::context::{ContextBuilder, NO_TRANSCRIPT};
use super::generation_client::GenerationClient;
use super::navigation::NavigationResolver;
use super::qa::QaEngine;
use super::quiz::QuizService;
use super::summary::SummaryService;
use crate::cache::{CacheKey, CachePolicy, CachedOperation};
use crate::domain::{
    AnswerResult, NavigationResult, QuizResult, SummaryResult, TranscriptSearchResult,
};
use crate::ports::{SegmentSearch, TextGenerator, TranscriptStore};
use crate::settings::Settings;
use crate::utils::find_text_in_segments;

/// Cache operation name for answers.
pub const ANSWER_QUESTION_OP: &str = "qa.answer_question";

/// Cache operation name for navigation.
pub const NAVIGATE_OP: &str = "navigation.navigate";

/// Collaborators the assistant is built from.
#[derive(Clone)]
pub struct AssistantPorts {
    pub store: Arc<dyn TranscriptStore>,
    pub search: Arc<dyn SegmentSearch>,
    pub generator: Arc<dyn TextGenerator>,
}

pub struct VideoAssistant {
    store: Arc<dyn TranscriptStore>,
    cached: CachedOperation,
    qa: QaEngine,
    navigation: NavigationResolver,
    summary: SummaryService,
    quiz: QuizService,
}

impl VideoAssistant {
    pub fn new(ports: AssistantPorts, cached: CachedOperation, settings: &Settings) -> Self {
        let context = ContextBuilder::new(ports.search).with_qa_k(settings.effective_search_k());
        let client = GenerationClient::new(ports.generator);

        Self {
            qa: QaEngine::new(Arc::clone(&ports.store), context.clone(), client.clone()),
            navigation: NavigationResolver::new(context, client.clone()),
            summary: SummaryService::new(Arc::clone(&ports.store), client.clone(), cached.clone()),
            quiz: QuizService::new(Arc::clone(&ports.store), client, cached.clone()),
            store: ports.store,
            cached,
        }
    }

    pub const fn cached(&self) -> &CachedOperation {
        &self.cached
    }

    pub async fn answer_question(
        &self,
        video_id: &str,
        query: &str,
        policy: CachePolicy,
    ) -> AnswerResult {
        let key = CacheKey::for_operation(ANSWER_QUESTION_OP)
            .arg(video_id)
            .arg(query)
            .finish();
        self.cached
            .run(key, policy, || self.qa.answer_question(video_id, query))
            .await
    }

    pub async fn navigate(&self, video_id: &str, query: &str, policy: CachePolicy) -> NavigationResult {
        let key = CacheKey::for_operation(NAVIGATE_OP)
            .arg(video_id)
            .arg(query)
            .finish();
        self.cached
            .run(key, policy, || self.navigate_uncached(video_id, query))
            .await
    }

    async fn navigate_uncached(&self, video_id: &str, query: &str) -> NavigationResult {
        info!(video_id = %video_id, query = %query, "Processing navigation query");
        match self.store.get_transcript(video_id).await {
            Ok(transcript) => {
                let segments = transcript.map(|t| t.segments).unwrap_or_default();
                self.navigation.navigate(video_id, query, &segments).await
            }
            Err(e) => {
                warn!(video_id = %video_id, error = %e, "Failed to load transcript");
                NavigationResolver::direct_match(video_id, query).unwrap_or_else(|| {
                    NavigationResult::failure(video_id, query, format!("Error: {e}"))
                })
            }
        }
    }

    pub async fn get_summary(
        &self,
        video_id: &str,
        regenerate: bool,
        policy: CachePolicy,
    ) -> SummaryResult {
        self.summary.get_summary(video_id, regenerate, policy).await
    }

    pub async fn get_quiz(&self, video_id: &str, regenerate: bool, policy: CachePolicy) -> QuizResult {
        self.quiz.get_quiz(video_id, regenerate, policy).await
    }

    /// Case-insensitive text search over the transcript segments.
    pub async fn search_transcript(&self, video_id: &str, search_text: &str) -> TranscriptSearchResult {
        let result = |matches, error: Option<String>| TranscriptSearchResult {
            video_id: video_id.to_string(),
            search_text: search_text.to_string(),
            matches,
            success: error.is_none(),
            error,
        };

        match self.store.get_transcript(video_id).await {
            Ok(Some(transcript)) if !transcript.segments.is_empty() => {
                result(find_text_in_segments(&transcript.segments, search_text), None)
            }
            Ok(_) => result(Vec::new(), Some(NO_TRANSCRIPT.to_string())),
            Err(e) => {
                warn!(video_id = %video_id, error = %e, "Transcript search failed");
                result(Vec::new(), Some(e.to_string()))
            }
        }
    }
}
