//! Ask command handler.

use anyhow::Result;

use crate::bootstrap::CliContext;
use crate::commands::CacheArgs;

use super::print_json;

pub async fn execute(ctx: &CliContext, video_id: &str, question: &str, cache: CacheArgs) -> Result<()> {
    ctx.start_server_in_background().await;
    let result = ctx
        .assistant
        .answer_question(video_id, question, cache.policy())
        .await;
    print_json(&result)
}
