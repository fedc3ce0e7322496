//! CLI bootstrap - the composition root.
//!
//! The only place where infrastructure is wired together:
//! - In-memory transcript store and lexical search (from transcript files)
//! - Inference server supervisor (via vidqa-runtime)
//! - Result cache, its sweeper, and the `VideoAssistant` facade (via vidqa-core)

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use vidqa_core::{
    AssistantPorts, CachedOperation, InMemoryStore, KeyedCache, Settings, VideoAssistant,
};
use vidqa_runtime::{ProcessSupervisor, ServerConfig, spawn_cache_sweeper};

use crate::error::CliError;
use crate::transcripts::load_transcripts;

const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);
const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// Fully composed application context for CLI commands.
pub struct CliContext {
    pub settings: Settings,
    pub assistant: VideoAssistant,
    pub supervisor: ProcessSupervisor,
    pub store: Arc<InMemoryStore>,
    pub cache: Arc<KeyedCache<Value>>,
    sweeper_cancel: CancellationToken,
    sweeper: JoinHandle<()>,
}

impl CliContext {
    /// Launch the server without blocking on readiness.
    ///
    /// Generation calls wait for a starting server, so commands that may
    /// never need the model (an explicit timestamp, a stored summary) do
    /// not pay for startup. A failed start is reported by those calls.
    pub async fn start_server_in_background(&self) {
        let options = self.supervisor.config().start_options(false);
        if let Err(e) = self.supervisor.start(options).await {
            warn!(error = %e, "Inference server did not start");
        }
    }

    /// Stop the sweeper and the server.
    pub async fn shutdown(self) {
        self.sweeper_cancel.cancel();
        if let Err(e) = self.sweeper.await {
            debug!(error = %e, "Cache sweeper ended abnormally");
        }
        self.supervisor.stop().await;
    }
}

/// Bootstrap the CLI application.
///
/// Must be called from within a Tokio runtime.
pub fn bootstrap(settings: Settings, transcripts: Option<&Path>) -> Result<CliContext> {
    let store = Arc::new(InMemoryStore::new());
    if let Some(path) = transcripts {
        load_transcripts(path, &store)
            .with_context(|| format!("Failed to load transcripts from {}", path.display()))?;
    }

    let config = ServerConfig::from_settings(&settings);
    info!(
        base_url = %config.base_url(),
        model = %config.model_id,
        "Configured inference server"
    );
    let supervisor = ProcessSupervisor::new(config).map_err(CliError::from)?;

    let cache = Arc::new(KeyedCache::new(settings.cache_ttl()));
    let cached = CachedOperation::new(Arc::clone(&cache)).with_single_flight();
    let ports = AssistantPorts {
        store: store.clone(),
        search: store.clone(),
        generator: Arc::new(supervisor.clone()),
    };
    let assistant = VideoAssistant::new(ports, cached, &settings);

    let sweeper_cancel = CancellationToken::new();
    let sweeper = spawn_cache_sweeper(
        Arc::clone(&cache),
        sweep_interval(settings.cache_ttl()),
        sweeper_cancel.clone(),
    );

    Ok(CliContext {
        settings,
        assistant,
        supervisor,
        store,
        cache,
        sweeper_cancel,
        sweeper,
    })
}

fn sweep_interval(ttl: Duration) -> Duration {
    (ttl / 4).clamp(MIN_SWEEP_INTERVAL, MAX_SWEEP_INTERVAL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use vidqa_core::CachePolicy;
    use vidqa_runtime::ServerState;

    #[test]
    fn test_sweep_interval_is_bounded() {
        assert_eq!(sweep_interval(Duration::from_secs(2)), MIN_SWEEP_INTERVAL);
        assert_eq!(sweep_interval(Duration::from_secs(60)), Duration::from_secs(15));
        assert_eq!(sweep_interval(Duration::from_secs(3600)), MAX_SWEEP_INTERVAL);
    }

    #[tokio::test]
    async fn test_bootstrap_wires_store_and_assistant() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("talk.json"),
            r#"{"segments": [{"start": 0, "end": 5, "text": "Ownership rules"}]}"#,
        )
        .unwrap();

        let ctx = bootstrap(Settings::with_defaults(), Some(dir.path())).unwrap();
        assert_eq!(ctx.supervisor.state(), ServerState::Stopped);
        assert_eq!(ctx.store.video_ids(), vec!["talk"]);

        let found = ctx.assistant.search_transcript("talk", "ownership").await;
        assert!(found.success);

        // No server and no network: direct navigation still works
        let nav = ctx.assistant.navigate("talk", "go to 0:03", CachePolicy::Use).await;
        assert!(nav.success);
        assert_eq!(ctx.cache.len(), 1);

        ctx.shutdown().await;
    }

    #[tokio::test]
    async fn test_bad_transcripts_fail_bootstrap() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.json");
        fs::write(&path, r#"{"segments": "nope"}"#).unwrap();
        let err = bootstrap(Settings::with_defaults(), Some(&path)).err().unwrap();
        assert!(err.downcast_ref::<CliError>().is_some());
    }
}
