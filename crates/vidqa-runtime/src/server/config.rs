//! Launch command and supervision timing for the inference server.

use std::time::Duration;

use thiserror::Error;
use vidqa_core::Settings;

use crate::health::PROBE_TIMEOUT;
use super::state::StartOptions;
use crate::process::DEFAULT_DIAGNOSTIC_LINES;

/// Python module that serves the OpenAI-compatible API.
pub const VLLM_ENTRYPOINT: &str = "vllm.entrypoints.openai.api_server";

/// How long a fire-and-forget start waits before checking the process is alive.
pub const DEFAULT_LIVENESS_GRACE: Duration = Duration::from_millis(500);

/// Default timeout for a single completion request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Launch program cannot be empty")]
    EmptyProgram,

    #[error("Model id cannot be empty")]
    EmptyModelId,

    #[error("Server host cannot be empty")]
    EmptyHost,

    #[error("Poll interval must be positive")]
    ZeroPollInterval,
}

/// Program and arguments used to start the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl LaunchCommand {
    /// `<program> -m vllm.entrypoints.openai.api_server --model .. --port .. --host .. --max-model-len ..`
    pub fn vllm(program: &str, model_id: &str, host: &str, port: u16, max_model_len: u32) -> Self {
        Self {
            program: program.to_string(),
            args: vec![
                "-m".to_string(),
                VLLM_ENTRYPOINT.to_string(),
                "--model".to_string(),
                model_id.to_string(),
                "--port".to_string(),
                port.to_string(),
                "--host".to_string(),
                host.to_string(),
                "--max-model-len".to_string(),
                max_model_len.to_string(),
            ],
        }
    }

    /// An arbitrary command, for servers launched some other way.
    pub fn custom<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Command line as one string, for logs.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Everything the supervisor needs to run one server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub launch: LaunchCommand,
    /// Sent as `model` in every completion request.
    pub model_id: String,
    pub host: String,
    pub port: u16,
    /// Start deadline used by `start_options`.
    pub readiness_timeout: Duration,
    pub poll_interval: Duration,
    pub probe_timeout: Duration,
    pub request_timeout: Duration,
    pub shutdown_grace: Duration,
    pub liveness_grace: Duration,
    /// Treat a server already answering on the port as ours instead of spawning.
    pub adopt_existing: bool,
    /// Let `generate` wait for a server that is still starting.
    pub wait_if_starting: bool,
    pub generate_wait_timeout: Duration,
    pub diagnostic_lines: usize,
}

impl ServerConfig {
    /// Defaults for everything but the command and address.
    pub fn new(launch: LaunchCommand, model_id: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        let readiness_timeout = Settings::default().readiness_timeout();
        Self {
            launch,
            model_id: model_id.into(),
            host: host.into(),
            port,
            readiness_timeout,
            poll_interval: Settings::default().poll_interval(),
            probe_timeout: PROBE_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            shutdown_grace: Settings::default().shutdown_grace(),
            liveness_grace: DEFAULT_LIVENESS_GRACE,
            adopt_existing: true,
            wait_if_starting: true,
            generate_wait_timeout: readiness_timeout,
            diagnostic_lines: DEFAULT_DIAGNOSTIC_LINES,
        }
    }

    /// vLLM server configuration from application settings.
    pub fn from_settings(settings: &Settings) -> Self {
        let host = settings.effective_server_host();
        let port = settings.effective_server_port();
        let launch = LaunchCommand::vllm(
            settings.effective_launch_program(),
            settings.effective_model_id(),
            host,
            port,
            settings.effective_max_model_len(),
        );
        let readiness_timeout = settings.readiness_timeout();

        Self {
            readiness_timeout,
            poll_interval: settings.poll_interval(),
            shutdown_grace: settings.shutdown_grace(),
            generate_wait_timeout: readiness_timeout,
            ..Self::new(launch, settings.effective_model_id(), host, port)
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.launch.program.trim().is_empty() {
            return Err(ConfigError::EmptyProgram);
        }
        if self.model_id.trim().is_empty() {
            return Err(ConfigError::EmptyModelId);
        }
        if self.host.trim().is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }
        Ok(())
    }

    /// Start options bounded by the configured readiness timeout.
    pub const fn start_options(&self, wait_for_ready: bool) -> StartOptions {
        if wait_for_ready {
            StartOptions::wait(self.readiness_timeout)
        } else {
            StartOptions::background(self.readiness_timeout)
        }
    }

    /// Base URL clients use. Wildcard bind addresses are reached via loopback.
    pub fn base_url(&self) -> String {
        let host = match self.host.as_str() {
            "0.0.0.0" => "127.0.0.1",
            "::" | "[::]" => "[::1]",
            other => other,
        };
        format!("http://{host}:{}", self.port)
    }
}
