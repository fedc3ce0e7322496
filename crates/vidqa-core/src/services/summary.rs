//! Video summaries: stored, or generated on demand.

use std::sync::Arc;

use tracing::{info, warn};

use super::context::{ContextBuilder, NO_TRANSCRIPT};
use super::generation_client::GenerationClient;
use crate::cache::{CacheKey, CachePolicy, CachedOperation};
use crate::domain::SummaryResult;
use crate::ports::TranscriptStore;

/// Summary text shown when generation failed.
pub const SUMMARY_FAILED: &str = "Summary generation failed due to an error.";

/// Cache operation name for generated summaries.
pub const GENERATE_SUMMARY_OP: &str = "summary.generate";

#[derive(Clone)]
pub struct SummaryService {
    store: Arc<dyn TranscriptStore>,
    client: GenerationClient,
    cached: CachedOperation,
}

impl SummaryService {
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

    /// Return the stored summary, or generate, save and return a new one.
    ///
    /// `regenerate` skips the stored summary and refreshes the cached one.
    pub async fn get_summary(
        &self,
        video_id: &str,
        regenerate: bool,
        policy: CachePolicy,
    ) -> SummaryResult {
        info!(video_id = %video_id, regenerate, "Getting summary");

        if !regenerate {
            match self.store.get_summary(video_id).await {
                Ok(Some(summary)) if !summary.trim().is_empty() => {
                    info!(video_id = %video_id, "Retrieved existing summary");
                    return SummaryResult {
                        video_id: video_id.to_string(),
                        summary,
                        success: true,
                        regenerated: false,
                        error: None,
                    };
                }
                Ok(_) => {}
                Err(e) => warn!(video_id = %video_id, error = %e, "Failed to read stored summary"),
            }
        }

        let key = CacheKey::for_operation(GENERATE_SUMMARY_OP)
            .arg(video_id)
            .finish();
        self.cached
            .run(key, policy.regenerating(regenerate), || {
                self.generate(video_id)
            })
            .await
    }

    async fn generate(&self, video_id: &str) -> SummaryResult {
        info!(video_id = %video_id, "Generating new summary");

        let full_text = match self.store.get_transcript(video_id).await {
            Ok(transcript) => transcript.map(|t| t.full_text).unwrap_or_default(),
            Err(e) => return failure(video_id, e.to_string()),
        };
        let Some(context) = ContextBuilder::summary_context(&full_text) else {
            return failure(video_id, NO_TRANSCRIPT.to_string());
        };

        let summary = match self.client.summarize(&context).await {
            Ok(summary) => summary,
            Err(e) => return failure(video_id, e.to_string()),
        };

        if let Err(e) = self.store.save_summary(video_id, &summary).await {
            warn!(video_id = %video_id, error = %e, "Failed to save summary");
        }

        SummaryResult {
            video_id: video_id.to_string(),
            summary,
            success: true,
            regenerated: true,
            error: None,
        }
    }
}

fn failure(video_id: &str, error: String) -> SummaryResult {
    warn!(video_id = %video_id, error = %error, "Summary generation failed");
    SummaryResult {
        video_id: video_id.to_string(),
        summary: SUMMARY_FAILED.to_string(),
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
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct NumberedGenerator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TextGenerator for NumberedGenerator {
        async fn generate(&self, _request: &GenerationRequest) -> Result<String, InferenceError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("summary #{n}"))
        }
    }

    fn service() -> (SummaryService, Arc<InMemoryStore>, Arc<NumberedGenerator>) {
        let store = Arc::new(InMemoryStore::new());
        store.insert_transcript(
            "vid",
            Transcript::from_segments(vec![
                TranscriptSegment::new(0.0, 3.0, "A talk about caching").unwrap(),
            ]),
        );
        let generator = Arc::new(NumberedGenerator {
            calls: AtomicUsize::new(0),
        });
        let cached = CachedOperation::new(Arc::new(KeyedCache::new(Duration::from_secs(60))));
        let service = SummaryService::new(
            store.clone(),
            GenerationClient::new(generator.clone()),
            cached,
        );
        (service, store, generator)
    }

    #[tokio::test]
    async fn test_generates_then_serves_stored_summary() {
        let (service, store, generator) = service();
        let first = service.get_summary("vid", false, CachePolicy::Use).await;
        assert!(first.success);
        assert!(first.regenerated);
        assert_eq!(first.summary, "summary #0");
        assert_eq!(
            store.get_summary("vid").await.unwrap().as_deref(),
            Some("summary #0")
        );

        let second = service.get_summary("vid", false, CachePolicy::Use).await;
        assert!(!second.regenerated);
        assert_eq!(second.summary, "summary #0");
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_regenerate_bypasses_store_and_cache() {
        let (service, store, generator) = service();
        service.get_summary("vid", false, CachePolicy::Use).await;
        let again = service.get_summary("vid", true, CachePolicy::Use).await;
        assert!(again.regenerated);
        assert_eq!(again.summary, "summary #1");
        assert_eq!(
            store.get_summary("vid").await.unwrap().as_deref(),
            Some("summary #1")
        );
        assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_missing_transcript_is_not_cached() {
        let (service, _, generator) = service();
        let result = service.get_summary("other", false, CachePolicy::Use).await;
        assert!(!result.success);
        assert_eq!(result.summary, SUMMARY_FAILED);
        assert!(service.cached.cache().is_empty());
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }
}
