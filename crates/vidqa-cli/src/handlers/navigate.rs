//! Navigate command handler.
//!
//! A query naming an explicit timestamp resolves without the model, so the
//! server is only started when there is none.

use anyhow::Result;
use vidqa_core::NavigationResolver;

use crate::bootstrap::CliContext;
use crate::commands::CacheArgs;

use super::print_json;

pub async fn execute(ctx: &CliContext, video_id: &str, query: &str, cache: CacheArgs) -> Result<()> {
    if NavigationResolver::direct_match(video_id, query).is_none() {
        ctx.start_server_in_background().await;
    }
    let result = ctx.assistant.navigate(video_id, query, cache.policy()).await;
    print_json(&result)
}
