//! Map a navigation query to a position in the video.
//!
//! A timestamp written in the query always wins: it is converted directly
//! and no model call is made. Only queries without one are sent to the
//! model. Every failure is folded into an unsuccessful `NavigationResult`.

#![allow(clippy::cast_precision_loss)]

use tracing::{info, warn};

use super::context::{ContextBuilder, NO_TRANSCRIPT};
use super::generation_client::{Confidence, GenerationClient, NavigationCandidate};
use crate::domain::{NavigationResult, ResolvedBy, TranscriptSegment};
use crate::utils::{extract_timestamps, format_timestamp, parse_timestamp};

#[derive(Clone)]
pub struct NavigationResolver {
    context: ContextBuilder,
    client: GenerationClient,
}

impl NavigationResolver {
    pub const fn new(context: ContextBuilder, client: GenerationClient) -> Self {
        Self { context, client }
    }

    /// Resolve `query` against the transcript `segments` of `video_id`.
    pub async fn navigate(
        &self,
        video_id: &str,
        query: &str,
        segments: &[TranscriptSegment],
    ) -> NavigationResult {
        if let Some(result) = Self::direct_match(video_id, query) {
            return result;
        }

        let context = match self.context.navigation_context(video_id, query, segments).await {
            Ok(Some(context)) => context,
            Ok(None) => return NavigationResult::failure(video_id, query, NO_TRANSCRIPT),
            Err(e) => {
                warn!(video_id = %video_id, error = %e, "Failed to prepare navigation context");
                return NavigationResult::failure(video_id, query, format!("Error: {e}"));
            }
        };

        match self.client.navigation_point(query, &context).await {
            Ok(candidate) => Self::from_candidate(video_id, query, candidate),
            Err(e) => {
                warn!(video_id = %video_id, error = %e, "Navigation generation failed");
                NavigationResult::failure(video_id, query, format!("Error: {e}"))
            }
        }
    }

    /// Resolve from a timestamp written in the query, if there is one.
    pub fn direct_match(video_id: &str, query: &str) -> Option<NavigationResult> {
        let mention = extract_timestamps(query).into_iter().next()?;
        info!(video_id = %video_id, timestamp = %mention.text, "Query names an explicit timestamp");
        Some(NavigationResult {
            video_id: video_id.to_string(),
            query: query.to_string(),
            position_seconds: mention.seconds as f64,
            reason: format!(
                "Navigating to explicitly mentioned timestamp {}",
                mention.text
            ),
            display_timestamp: mention.text,
            resolved_by: ResolvedBy::DirectMatch,
            success: true,
        })
    }

    fn from_candidate(video_id: &str, query: &str, candidate: NavigationCandidate) -> NavigationResult {
        match parse_timestamp(&candidate.timestamp) {
            Ok(seconds) => NavigationResult {
                video_id: video_id.to_string(),
                query: query.to_string(),
                position_seconds: seconds as f64,
                display_timestamp: format_timestamp(seconds),
                reason: candidate.reason,
                resolved_by: ResolvedBy::ModelInference,
                success: candidate.confidence == Confidence::Parsed,
            },
            Err(e) => {
                warn!(video_id = %video_id, timestamp = %candidate.timestamp, error = %e, "Model proposed an unusable timestamp");
                let reason = if candidate.reason.is_empty() {
                    e.to_string()
                } else {
                    format!("{} ({e})", candidate.reason)
                };
                NavigationResult::failure(video_id, query, reason)
            }
        }
    }
}
