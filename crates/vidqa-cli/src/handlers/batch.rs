//! Batch command handler.
//!
//! Reads one command per line and runs them all through the same
//! `CliContext`, so repeated questions are answered from the cache and the
//! inference server is started once. Blank lines and `#` comments are
//! skipped.

use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tokio::io::AsyncReadExt;
use tracing::{info, warn};

use crate::bootstrap::CliContext;
use crate::commands::Commands;

use super::run_query;

#[derive(Debug, Parser)]
#[command(no_binary_name = true)]
struct BatchLine {
    #[command(subcommand)]
    command: Commands,
}

/// Parse one batch line. Returns `None` for blank lines and comments.
pub fn parse_batch_line(line: &str) -> Option<Result<Commands, clap::Error>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    Some(BatchLine::try_parse_from(line.split_whitespace()).map(|parsed| parsed.command))
}

pub async fn execute(ctx: &CliContext, file: Option<&Path>) -> Result<()> {
    let input = match file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read batch file {}", path.display()))?,
        None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("Failed to read batch commands from stdin")?;
            buf
        }
    };

    let (mut total, mut failed) = (0_usize, 0_usize);
    for (index, line) in input.lines().enumerate() {
        let Some(parsed) = parse_batch_line(line) else {
            continue;
        };
        total += 1;
        let outcome = match parsed {
            Ok(Commands::Serve | Commands::Batch { .. }) => {
                Err(anyhow::anyhow!("`serve` and `batch` are not allowed in a batch"))
            }
            Ok(command) => run_query(ctx, command).await,
            Err(e) => Err(anyhow::anyhow!(e.to_string())),
        };
        if let Err(e) = outcome {
            failed += 1;
            warn!(line = index + 1, error = %format!("{e:#}"), "Batch command failed");
        }
    }

    info!(total, failed, cached_entries = ctx.cache.len(), "Batch finished");
    if failed > 0 {
        bail!("{failed} of {total} batch commands failed");
    }
    Ok(())
}
