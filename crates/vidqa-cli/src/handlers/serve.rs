//! Serve command handler.
//!
//! Starts the inference server, waits for it to become ready, then keeps it
//! running until Ctrl+C. Other `vidqa` invocations adopt the running server.

use anyhow::{Context, Result};
use tracing::{info, warn};
use vidqa_runtime::ServerState;

use crate::bootstrap::CliContext;
use crate::error::CliError;

use super::print_json;

pub async fn execute(ctx: &CliContext) -> Result<()> {
    let options = ctx.supervisor.config().start_options(true);
    info!(timeout_secs = options.timeout.as_secs(), "Waiting for inference server");

    ctx.supervisor
        .start(options)
        .await
        .map_err(CliError::from)
        .context("Inference server failed to start")?;
    print_json(&ctx.supervisor.snapshot())?;

    let mut states = ctx.supervisor.subscribe();
    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl+C")?;
                info!("Received Ctrl+C, shutting down");
                return Ok(());
            }
            changed = states.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                let state = *states.borrow_and_update();
                if state == ServerState::Ready {
                    continue;
                }
                warn!(%state, "Inference server is no longer ready");
                let failure = ctx.supervisor.snapshot().last_failure.unwrap_or_default();
                return Err(CliError::Server(format!("server became {state}: {failure}")).into());
            }
        }
    }
}
