//! Summary command handler.

use anyhow::Result;

use crate::bootstrap::CliContext;
use crate::commands::CacheArgs;

use super::print_json;

pub async fn execute(ctx: &CliContext, video_id: &str, regenerate: bool, cache: CacheArgs) -> Result<()> {
    ctx.start_server_in_background().await;
    let result = ctx
        .assistant
        .get_summary(video_id, regenerate, cache.policy())
        .await;
    print_json(&result)
}
