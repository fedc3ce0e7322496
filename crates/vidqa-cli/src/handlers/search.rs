//! Search command handler. Never needs the model.

use anyhow::Result;

use crate::bootstrap::CliContext;

use super::print_json;

pub async fn execute(ctx: &CliContext, video_id: &str, text: &str) -> Result<()> {
    let result = ctx.assistant.search_transcript(video_id, text).await;
    print_json(&result)
}
