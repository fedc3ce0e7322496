//! Settings domain types and validation.
//!
//! Pure data with no infrastructure dependencies. Loading from files or the
//! environment happens at the composition root.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Model served when nothing else is configured.
pub const DEFAULT_MODEL_ID: &str = "Qwen/Qwen3-8B";

/// Default listen port for the inference server.
pub const DEFAULT_SERVER_PORT: u16 = 3000;

/// Default bind address for the inference server.
pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";

/// Default maximum context length passed to the server.
pub const DEFAULT_MAX_MODEL_LEN: u32 = 4096;

/// Default program used to launch the server.
pub const DEFAULT_LAUNCH_PROGRAM: &str = "python";

/// Default lifetime of cached results.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

/// Default readiness deadline for a start.
pub const DEFAULT_READINESS_TIMEOUT_SECS: u64 = 300;

/// Default delay between readiness probes.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

/// Default SIGTERM-to-SIGKILL grace period.
pub const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 5;

/// Default number of segments requested from search for question answering.
pub const DEFAULT_SEARCH_K: usize = 5;

/// Application settings.
///
/// All fields are optional so partial files and environment overrides
/// compose cleanly. Use the `effective_*` accessors to read a value with its
/// default applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Model identifier passed to the server and sent with each completion.
    pub model_id: Option<String>,

    /// Address the server binds to.
    pub server_host: Option<String>,

    /// Port the server listens on.
    pub server_port: Option<u16>,

    /// Maximum model context length.
    pub max_model_len: Option<u32>,

    /// Program used to launch the server (e.g. `python`, or a venv path).
    pub launch_program: Option<String>,

    /// Lifetime of cached results, in seconds.
    pub cache_ttl_secs: Option<u64>,

    /// Readiness deadline for a start, in seconds.
    pub readiness_timeout_secs: Option<u64>,

    /// Delay between readiness probes, in milliseconds.
    pub poll_interval_ms: Option<u64>,

    /// Grace period between SIGTERM and SIGKILL, in seconds.
    pub shutdown_grace_secs: Option<u64>,

    /// Segments requested from search when building QA context.
    pub search_k: Option<usize>,
}

impl Settings {
    /// Create settings with every field populated by its default.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            model_id: Some(DEFAULT_MODEL_ID.to_string()),
            server_host: Some(DEFAULT_SERVER_HOST.to_string()),
            server_port: Some(DEFAULT_SERVER_PORT),
            max_model_len: Some(DEFAULT_MAX_MODEL_LEN),
            launch_program: Some(DEFAULT_LAUNCH_PROGRAM.to_string()),
            cache_ttl_secs: Some(DEFAULT_CACHE_TTL_SECS),
            readiness_timeout_secs: Some(DEFAULT_READINESS_TIMEOUT_SECS),
            poll_interval_ms: Some(DEFAULT_POLL_INTERVAL_MS),
            shutdown_grace_secs: Some(DEFAULT_SHUTDOWN_GRACE_SECS),
            search_k: Some(DEFAULT_SEARCH_K),
        }
    }

    #[must_use]
    pub fn effective_model_id(&self) -> &str {
        self.model_id.as_deref().unwrap_or(DEFAULT_MODEL_ID)
    }

    #[must_use]
    pub fn effective_server_host(&self) -> &str {
        self.server_host.as_deref().unwrap_or(DEFAULT_SERVER_HOST)
    }

    #[must_use]
    pub fn effective_server_port(&self) -> u16 {
        self.server_port.unwrap_or(DEFAULT_SERVER_PORT)
    }

    #[must_use]
    pub fn effective_max_model_len(&self) -> u32 {
        self.max_model_len.unwrap_or(DEFAULT_MAX_MODEL_LEN)
    }

    #[must_use]
    pub fn effective_launch_program(&self) -> &str {
        self.launch_program
            .as_deref()
            .unwrap_or(DEFAULT_LAUNCH_PROGRAM)
    }

    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs.unwrap_or(DEFAULT_CACHE_TTL_SECS))
    }

    #[must_use]
    pub fn readiness_timeout(&self) -> Duration {
        Duration::from_secs(
            self.readiness_timeout_secs
                .unwrap_or(DEFAULT_READINESS_TIMEOUT_SECS),
        )
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS))
    }

    #[must_use]
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs.unwrap_or(DEFAULT_SHUTDOWN_GRACE_SECS))
    }

    #[must_use]
    pub fn effective_search_k(&self) -> usize {
        self.search_k.unwrap_or(DEFAULT_SEARCH_K)
    }

    /// Overlay every field that is set in `other`.
    pub fn merge(&mut self, other: &Self) {
        if other.model_id.is_some() {
            self.model_id.clone_from(&other.model_id);
        }
        if other.server_host.is_some() {
            self.server_host.clone_from(&other.server_host);
        }
        if other.launch_program.is_some() {
            self.launch_program.clone_from(&other.launch_program);
        }
        self.server_port = other.server_port.or(self.server_port);
        self.max_model_len = other.max_model_len.or(self.max_model_len);
        self.cache_ttl_secs = other.cache_ttl_secs.or(self.cache_ttl_secs);
        self.readiness_timeout_secs = other.readiness_timeout_secs.or(self.readiness_timeout_secs);
        self.poll_interval_ms = other.poll_interval_ms.or(self.poll_interval_ms);
        self.shutdown_grace_secs = other.shutdown_grace_secs.or(self.shutdown_grace_secs);
        self.search_k = other.search_k.or(self.search_k);
    }
}

/// Settings validation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("Model id cannot be empty")]
    EmptyModelId,

    #[error("Launch program cannot be empty")]
    EmptyLaunchProgram,

    #[error("Server port must be non-zero")]
    InvalidPort,

    #[error("Max model length must be between 256 and 1,000,000, got {0}")]
    InvalidMaxModelLen(u32),

    #[error("Cache TTL must be at least one second")]
    InvalidCacheTtl,

    #[error("Readiness timeout must be at least one second")]
    InvalidReadinessTimeout,

    #[error("Poll interval must be between 10ms and 60s, got {0}ms")]
    InvalidPollInterval(u64),

    #[error("Search k must be between 1 and 50, got {0}")]
    InvalidSearchK(usize),
}

/// Validate settings values.
pub fn validate_settings(settings: &Settings) -> Result<(), SettingsError> {
    if settings
        .model_id
        .as_ref()
        .is_some_and(|m| m.trim().is_empty())
    {
        return Err(SettingsError::EmptyModelId);
    }

    if settings
        .launch_program
        .as_ref()
        .is_some_and(|p| p.trim().is_empty())
    {
        return Err(SettingsError::EmptyLaunchProgram);
    }

    if settings.server_port == Some(0) {
        return Err(SettingsError::InvalidPort);
    }

    if let Some(len) = settings.max_model_len {
        if !(256..=1_000_000).contains(&len) {
            return Err(SettingsError::InvalidMaxModelLen(len));
        }
    }

    if settings.cache_ttl_secs == Some(0) {
        return Err(SettingsError::InvalidCacheTtl);
    }

    if settings.readiness_timeout_secs == Some(0) {
        return Err(SettingsError::InvalidReadinessTimeout);
    }

    if let Some(ms) = settings.poll_interval_ms {
        if !(10..=60_000).contains(&ms) {
            return Err(SettingsError::InvalidPollInterval(ms));
        }
    }

    if let Some(k) = settings.search_k {
        if !(1..=50).contains(&k) {
            return Err(SettingsError::InvalidSearchK(k));
        }
    }

    Ok(())
}
