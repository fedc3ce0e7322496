//! Navigation result types.

use serde::{Deserialize, Serialize};

use crate::cache::Cacheable;

/// How a navigation target was determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedBy {
    /// The query contained an explicit timestamp.
    DirectMatch,
    /// The language model picked the position from transcript context.
    ModelInference,
}

/// Outcome of a navigation query. Always returned, never raised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationResult {
    pub video_id: String,
    pub query: String,
    /// Target position in seconds (>= 0).
    pub position_seconds: f64,
    /// Human-readable form of the position (`M:SS` or `H:MM:SS`).
    pub display_timestamp: String,
    pub reason: String,
    pub resolved_by: ResolvedBy,
    pub success: bool,
}

impl NavigationResult {
    /// A labeled failure pointing at the start of the video.
    pub fn failure(
        video_id: impl Into<String>,
        query: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            video_id: video_id.into(),
            query: query.into(),
            position_seconds: 0.0,
            display_timestamp: "0:00".to_string(),
            reason: reason.into(),
            resolved_by: ResolvedBy::ModelInference,
            success: false,
        }
    }
}

impl Cacheable for NavigationResult {
    fn is_cacheable(&self) -> bool {
        self.success
    }
}
