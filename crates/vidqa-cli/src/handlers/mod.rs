//! Command handlers that delegate to `VideoAssistant`.
//!
//! Handlers follow one pattern:
//! - Signature: `pub async fn execute(ctx: &CliContext, ...) -> Result<()>`
//! - Start the server only if the command may need the model
//! - Print the tagged result as pretty JSON on stdout
//!
//! Failed results are still printed; the `success` field tells them apart.

pub mod ask;
pub mod batch;
pub mod navigate;
pub mod quiz;
pub mod search;
pub mod serve;
pub mod summary;

use anyhow::{Context, Result, bail};
use serde::Serialize;

use crate::bootstrap::CliContext;
use crate::commands::Commands;

/// Run one question-style command. `serve` and `batch` are handled by the
/// caller.
pub async fn run_query(ctx: &CliContext, command: Commands) -> Result<()> {
    match command {
        Commands::Ask {
            video_id,
            question,
            cache,
        } => ask::execute(ctx, &video_id, &question.join(" "), cache).await,
        Commands::Navigate {
            video_id,
            query,
            cache,
        } => navigate::execute(ctx, &video_id, &query.join(" "), cache).await,
        Commands::Summary {
            video_id,
            regenerate,
            cache,
        } => summary::execute(ctx, &video_id, regenerate, cache).await,
        Commands::Quiz {
            video_id,
            regenerate,
            cache,
        } => quiz::execute(ctx, &video_id, regenerate, cache).await,
        Commands::Search { video_id, text } => search::execute(ctx, &video_id, &text.join(" ")).await,
        Commands::Serve | Commands::Batch { .. } => {
            bail!("`serve` and `batch` cannot be run as a query")
        }
    }
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize result")?;
    println!("{json}");
    Ok(())
}
