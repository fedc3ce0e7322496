//! Segment similarity search port definition.

use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::ScoredSegment;

/// Port for ranking transcript segments by relevance to a query.
#[async_trait]
pub trait SegmentSearch: Send + Sync {
    /// Return up to `k` segments of `video_id`, most relevant first.
    async fn search(
        &self,
        query: &str,
        video_id: &str,
        k: usize,
    ) -> Result<Vec<ScoredSegment>, RepositoryError>;
}
