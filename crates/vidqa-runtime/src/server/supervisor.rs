//! Process supervisor for the managed inference server.
//!
//! `ProcessSupervisor` owns at most one child process and drives it through
//! `Stopped → Starting → Ready`. Spawning, stopping and reaping all happen
//! under a single lifecycle mutex, so concurrent `start` calls never launch
//! two servers and `start`/`stop` never interleave.
//!
//! A background watcher polls the health probe while the process is
//! starting and keeps checking for an exit once it is ready. An adopted
//! server has no child to reap, so its watcher keeps probing instead and
//! releases it once it stops answering. Callers that want to block observe
//! the state through a `watch` channel instead of polling themselves.

use std::process::Stdio;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use thiserror::Error;
use tokio::process::{Child, Command};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use vidqa_core::{GenerationRequest, InferenceError, TextGenerator};

use super::config::{ConfigError, ServerConfig};
use super::state::{ServerState, StartOptions, SupervisorSnapshot};
use crate::completion::request_completion;
use crate::health::check_http_health;
use crate::process::{DiagnosticsBuffer, FAILURE_TAIL_LINES, shutdown_child, spawn_stream_reader};

/// How long output readers get to drain once the process is gone.
const READER_DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

/// Stand-in deadline for timeouts too large to add to the clock.
const FAR_FUTURE: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 30);

/// Errors constructing a supervisor.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("Invalid server configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

#[derive(Default)]
struct Lifecycle {
    child: Option<Child>,
    readers: Vec<JoinHandle<()>>,
}

#[derive(Debug, Default)]
struct Status {
    pid: Option<u32>,
    adopted: bool,
    started_at: Option<DateTime<Utc>>,
    spawned_at: Option<Instant>,
    start_timeout: Duration,
    ready_deadline: Option<Instant>,
    last_failure: Option<InferenceError>,
}

struct Inner {
    config: ServerConfig,
    base_url: String,
    client: Client,
    state: watch::Sender<ServerState>,
    lifecycle: Mutex<Lifecycle>,
    status: StdMutex<Status>,
    diagnostics: DiagnosticsBuffer,
    /// Bumped on every spawn and stop; stale watchers compare and exit.
    epoch: AtomicU64,
    spawn_count: AtomicUsize,
}

/// Cheap-clone handle to the supervised server.
#[derive(Clone)]
pub struct ProcessSupervisor {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ProcessSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessSupervisor")
            .field("base_url", &self.inner.base_url)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl ProcessSupervisor {
    pub fn new(config: ServerConfig) -> Result<Self, SupervisorError> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| SupervisorError::HttpClient(e.to_string()))?;
        let (state, _) = watch::channel(ServerState::Stopped);

        Ok(Self {
            inner: Arc::new(Inner {
                base_url: config.base_url(),
                diagnostics: DiagnosticsBuffer::new(config.diagnostic_lines),
                config,
                client,
                state,
                lifecycle: Mutex::new(Lifecycle::default()),
                status: StdMutex::new(Status::default()),
                epoch: AtomicU64::new(0),
                spawn_count: AtomicUsize::new(0),
            }),
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn state(&self) -> ServerState {
        self.inner.current_state()
    }

    /// Receive every state transition.
    pub fn subscribe(&self) -> watch::Receiver<ServerState> {
        self.inner.state.subscribe()
    }

    /// Number of processes launched over this supervisor's lifetime.
    pub fn spawn_count(&self) -> usize {
        self.inner.spawn_count.load(Ordering::SeqCst)
    }

    /// Recent stdout/stderr lines of the current or last process.
    pub fn diagnostics(&self) -> Vec<String> {
        self.inner.diagnostics.snapshot()
    }

    pub fn snapshot(&self) -> SupervisorSnapshot {
        let status = self.inner.status();
        SupervisorSnapshot {
            state: self.state(),
            base_url: self.inner.base_url.clone(),
            pid: status.pid,
            adopted: status.adopted,
            started_at: status.started_at,
            spawn_count: self.spawn_count(),
            last_failure: status.last_failure.as_ref().map(ToString::to_string),
        }
    }

    /// One health probe. Never errors.
    pub async fn is_ready(&self) -> bool {
        self.inner.probe().await
    }

    /// Launch the server unless it is already starting or ready.
    pub async fn start(&self, options: StartOptions) -> Result<(), InferenceError> {
        let epoch = {
            let mut lifecycle = self.inner.lifecycle.lock().await;
            self.inner.reap_exited(&mut lifecycle).await;

            let adopted = self.inner.is_adopted();
            if adopted && self.state() == ServerState::Ready && !self.inner.probe().await {
                self.inner.release_adopted();
            }

            match self.state() {
                ServerState::Ready => {
                    debug!("Inference server already ready");
                    return Ok(());
                }
                ServerState::Starting => {
                    drop(lifecycle);
                    debug!("Inference server already starting");
                    return if options.wait_for_ready {
                        self.wait_until_ready(options.timeout).await
                    } else {
                        Ok(())
                    };
                }
                ServerState::Stopped | ServerState::Failed => {}
            }

            if self.inner.config.adopt_existing && self.inner.probe().await {
                info!(base_url = %self.inner.base_url, "Adopting already-running inference server");
                let epoch = self.inner.epoch.fetch_add(1, Ordering::SeqCst) + 1;
                *self.inner.status() = Status {
                    adopted: true,
                    started_at: Some(Utc::now()),
                    ..Status::default()
                };
                self.inner.state.send_replace(ServerState::Ready);
                tokio::spawn(watch_adopted(Arc::downgrade(&self.inner), epoch));
                return Ok(());
            }

            self.spawn_locked(&mut lifecycle, options.timeout)?
        };

        if options.wait_for_ready {
            return self.wait_until_ready(options.timeout).await;
        }

        tokio::time::sleep(self.inner.config.liveness_grace).await;
        {
            let mut lifecycle = self.inner.lifecycle.lock().await;
            if self.inner.epoch() == epoch {
                if let Some(err) = self.inner.reap_exited(&mut lifecycle).await {
                    return Err(err);
                }
            }
        }
        match self.state() {
            ServerState::Failed => Err(self.inner.failure_or("failed during startup")),
            ServerState::Stopped => Err(InferenceError::ProcessUnavailable(
                "stopped during startup".to_string(),
            )),
            ServerState::Starting | ServerState::Ready => Ok(()),
        }
    }

    fn spawn_locked(
        &self,
        lifecycle: &mut Lifecycle,
        timeout: Duration,
    ) -> Result<u64, InferenceError> {
        let launch = &self.inner.config.launch;
        info!(command = %launch.display(), "Starting inference server");

        let mut command = Command::new(&launch.program);
        command
            .args(&launch.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                let err = InferenceError::SpawnFailed(format!("{}: {e}", launch.program));
                error!(error = %err, "Failed to spawn inference server");
                self.inner.record_failure(ServerState::Failed, err.clone());
                return Err(err);
            }
        };

        self.inner.spawn_count.fetch_add(1, Ordering::SeqCst);
        self.inner.diagnostics.clear();

        let pid = child.id().unwrap_or_default();
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(spawn_stream_reader(stdout, pid, "stdout", self.inner.diagnostics.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(spawn_stream_reader(stderr, pid, "stderr", self.inner.diagnostics.clone()));
        }

        let epoch = self.inner.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let now = Instant::now();
        *self.inner.status() = Status {
            pid: Some(pid),
            adopted: false,
            started_at: Some(Utc::now()),
            spawned_at: Some(now),
            start_timeout: timeout,
            ready_deadline: Some(deadline_after(now, timeout)),
            last_failure: None,
        };
        lifecycle.child = Some(child);
        lifecycle.readers = readers;
        self.inner.state.send_replace(ServerState::Starting);

        tokio::spawn(watch_process(Arc::downgrade(&self.inner), epoch));
        info!(pid, timeout_secs = timeout.as_secs(), "Inference server process spawned");
        Ok(epoch)
    }

    /// Block until the server is ready, it fails, or `timeout` elapses.
    ///
    /// A timeout that only exhausts the caller's budget leaves the server
    /// starting. Reaching the start deadline fails the start and terminates
    /// the process.
    pub async fn wait_until_ready(&self, timeout: Duration) -> Result<(), InferenceError> {
        let caller_deadline = deadline_after(Instant::now(), timeout);
        let mut rx = self.inner.state.subscribe();

        loop {
            let state = *rx.borrow_and_update();
            match state {
                ServerState::Ready => return Ok(()),
                ServerState::Failed => return Err(self.inner.failure_or("failed to start")),
                ServerState::Stopped => {
                    return Err(InferenceError::ProcessUnavailable("stopped".to_string()));
                }
                ServerState::Starting => {}
            }

            let epoch = self.inner.epoch();
            let start_deadline = self.inner.status().ready_deadline.unwrap_or(caller_deadline);
            match tokio::time::timeout_at(caller_deadline.min(start_deadline), rx.changed()).await {
                Ok(Ok(())) => {}
                Ok(Err(_)) => {
                    return Err(InferenceError::ProcessUnavailable(
                        "supervisor shut down".to_string(),
                    ));
                }
                Err(_) if Instant::now() >= start_deadline => {
                    if let Some(err) = self.inner.expire_startup(epoch).await {
                        return Err(err);
                    }
                }
                Err(_) => {
                    debug!(waited = ?timeout, "Gave up waiting; server still starting");
                    return Err(InferenceError::ReadinessTimeout {
                        waited: timeout,
                        diagnostics: self.inner.diagnostics.tail(FAILURE_TAIL_LINES),
                    });
                }
            }
        }
    }

    /// Run one completion against the server.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<String, InferenceError> {
        {
            let mut lifecycle = self.inner.lifecycle.lock().await;
            self.inner.reap_exited(&mut lifecycle).await;
        }

        match self.state() {
            ServerState::Ready => {}
            ServerState::Starting if self.inner.config.wait_if_starting => {
                debug!("Waiting for inference server before generating");
                self.wait_until_ready(self.inner.config.generate_wait_timeout)
                    .await?;
            }
            ServerState::Starting => {
                return Err(InferenceError::ProcessUnavailable(
                    "still starting".to_string(),
                ));
            }
            ServerState::Stopped => {
                return Err(InferenceError::ProcessUnavailable("stopped".to_string()));
            }
            ServerState::Failed => {
                let reason = self
                    .inner
                    .status()
                    .last_failure
                    .as_ref()
                    .map_or_else(|| "failed".to_string(), |e| format!("failed: {e}"));
                return Err(InferenceError::ProcessUnavailable(reason));
            }
        }

        request_completion(
            &self.inner.client,
            &self.inner.base_url,
            &self.inner.config.model_id,
            request,
        )
        .await
    }

    /// Terminate the server and end in `Stopped`. Safe to call repeatedly.
    ///
    /// An adopted server is not ours to kill; it is only released.
    pub async fn stop(&self) {
        let mut lifecycle = self.inner.lifecycle.lock().await;
        self.inner.epoch.fetch_add(1, Ordering::SeqCst);

        if let Some(mut child) = lifecycle.child.take() {
            let pid = child.id();
            info!(?pid, "Stopping inference server");
            match shutdown_child(&mut child, self.inner.config.shutdown_grace).await {
                Ok(status) => info!(?pid, %status, "Inference server stopped"),
                Err(e) => warn!(?pid, error = %e, "Inference server did not stop cleanly"),
            }
        } else if self.inner.status().adopted {
            info!("Releasing adopted inference server");
        }
        drain_readers(std::mem::take(&mut lifecycle.readers)).await;

        {
            let mut status = self.inner.status();
            status.pid = None;
            status.adopted = false;
            status.ready_deadline = None;
        }
        self.inner.state.send_replace(ServerState::Stopped);
    }
}

impl Inner {
    fn current_state(&self) -> ServerState {
        *self.state.borrow()
    }

    fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    fn status(&self) -> MutexGuard<'_, Status> {
        self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_adopted(&self) -> bool {
        self.status().adopted
    }

    /// Let go of an adopted server that stopped answering. Caller holds the
    /// lifecycle lock.
    fn release_adopted(&self) {
        let err = InferenceError::ProcessUnavailable(
            "adopted server stopped responding".to_string(),
        );
        warn!(base_url = %self.base_url, "Adopted inference server is gone");
        self.status().adopted = false;
        self.record_failure(ServerState::Stopped, err);
    }

    async fn probe(&self) -> bool {
        check_http_health(&self.client, &self.base_url, self.config.probe_timeout).await
    }

    fn failure_or(&self, reason: &str) -> InferenceError {
        self.status()
            .last_failure
            .clone()
            .unwrap_or_else(|| InferenceError::ProcessUnavailable(reason.to_string()))
    }

    fn record_failure(&self, next: ServerState, err: InferenceError) {
        {
            let mut status = self.status();
            status.pid = None;
            status.ready_deadline = None;
            status.last_failure = Some(err);
        }
        self.state.send_replace(next);
    }

    /// Reap the child if it has exited. Caller holds the lifecycle lock.
    async fn reap_exited(&self, lifecycle: &mut Lifecycle) -> Option<InferenceError> {
        let child = lifecycle.child.as_mut()?;
        let status = match child.try_wait() {
            Ok(Some(status)) => status.to_string(),
            Ok(None) => return None,
            Err(e) => format!("unknown ({e})"),
        };
        lifecycle.child = None;
        drain_readers(std::mem::take(&mut lifecycle.readers)).await;

        let err = InferenceError::ProcessExited {
            status,
            diagnostics: self.diagnostics.tail(FAILURE_TAIL_LINES),
        };
        let next = if self.current_state() == ServerState::Ready {
            ServerState::Stopped
        } else {
            ServerState::Failed
        };
        warn!(error = %err, next = %next, "Inference server process exited");
        self.record_failure(next, err.clone());
        Some(err)
    }

    async fn mark_ready(&self, epoch: u64) {
        let _lifecycle = self.lifecycle.lock().await;
        if self.epoch() != epoch || self.current_state() != ServerState::Starting {
            return;
        }
        let elapsed = {
            let mut status = self.status();
            status.ready_deadline = None;
            status.spawned_at.map(|at| at.elapsed())
        };
        info!(base_url = %self.base_url, ?elapsed, "Inference server is ready");
        self.state.send_replace(ServerState::Ready);
    }

    fn startup_overdue(&self) -> bool {
        self.status()
            .ready_deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Fail a start whose deadline has passed and terminate its process.
    ///
    /// Returns `None` when the start was superseded or already resolved.
    async fn expire_startup(&self, epoch: u64) -> Option<InferenceError> {
        let mut lifecycle = self.lifecycle.lock().await;
        if self.epoch() != epoch || self.current_state() != ServerState::Starting {
            return None;
        }
        if let Some(err) = self.reap_exited(&mut lifecycle).await {
            return Some(err);
        }

        let waited = self.status().start_timeout;
        warn!(?waited, "Inference server missed its readiness deadline; terminating");
        if let Some(mut child) = lifecycle.child.take() {
            if let Err(e) = shutdown_child(&mut child, self.config.shutdown_grace).await {
                warn!(error = %e, "Failed to terminate unready inference server");
            }
        }
        drain_readers(std::mem::take(&mut lifecycle.readers)).await;

        let err = InferenceError::ReadinessTimeout {
            waited,
            diagnostics: self.diagnostics.tail(FAILURE_TAIL_LINES),
        };
        self.record_failure(ServerState::Failed, err.clone());
        Some(err)
    }
}

#[async_trait]
impl TextGenerator for ProcessSupervisor {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, InferenceError> {
        Self::generate(self, request).await
    }
}

/// Background watcher for one spawned process.
///
/// Holds only a weak reference between polls so dropping the last
/// supervisor handle still kills the child.
async fn watch_process(inner: Weak<Inner>, epoch: u64) {
    loop {
        let Some(strong) = inner.upgrade() else {
            return;
        };

        let state = {
            let mut lifecycle = strong.lifecycle.lock().await;
            if strong.epoch() != epoch || strong.reap_exited(&mut lifecycle).await.is_some() {
                return;
            }
            strong.current_state()
        };

        match state {
            ServerState::Starting => {
                if strong.probe().await {
                    strong.mark_ready(epoch).await;
                } else if strong.startup_overdue() {
                    strong.expire_startup(epoch).await;
                    return;
                }
            }
            ServerState::Ready => {}
            ServerState::Stopped | ServerState::Failed => return,
        }

        let interval = strong.config.poll_interval;
        drop(strong);
        tokio::time::sleep(interval).await;
    }
}

/// Background watcher for an adopted server.
///
/// Probes every poll interval while the server is ready and releases it on
/// the first failed probe.
async fn watch_adopted(inner: Weak<Inner>, epoch: u64) {
    loop {
        let Some(interval) = inner.upgrade().map(|strong| strong.config.poll_interval) else {
            return;
        };
        tokio::time::sleep(interval).await;

        let Some(strong) = inner.upgrade() else {
            return;
        };
        if strong.epoch() != epoch || strong.current_state() != ServerState::Ready {
            return;
        }
        if strong.probe().await {
            continue;
        }

        let _lifecycle = strong.lifecycle.lock().await;
        if strong.epoch() == epoch && strong.current_state() == ServerState::Ready {
            strong.release_adopted();
        }
        return;
    }
}

/// `now + timeout`, saturating instead of overflowing the clock.
fn deadline_after(now: Instant, timeout: Duration) -> Instant {
    now.checked_add(timeout).unwrap_or_else(|| now + FAR_FUTURE)
}

async fn drain_readers(readers: Vec<JoinHandle<()>>) {
    for mut reader in readers {
        if tokio::time::timeout(READER_DRAIN_TIMEOUT, &mut reader)
            .await
            .is_err()
        {
            reader.abort();
        }
    }
}
