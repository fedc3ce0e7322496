//! Supervisor lifecycle states and status snapshots.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Lifecycle of the managed server.
///
/// ```text
/// Stopped --start--> Starting --probe ok--> Ready
///                        |                    |
///                 exit / deadline        exit detected
///                        v                    v
///                      Failed              Stopped
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerState {
    Stopped,
    Starting,
    Ready,
    Failed,
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => write!(f, "stopped"),
            Self::Starting => write!(f, "starting"),
            Self::Ready => write!(f, "ready"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// How a `start` call should behave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartOptions {
    pub wait_for_ready: bool,
    /// Readiness deadline, measured from the spawn.
    pub timeout: Duration,
}

impl StartOptions {
    /// Block until ready or `timeout` elapses.
    pub const fn wait(timeout: Duration) -> Self {
        Self {
            wait_for_ready: true,
            timeout,
        }
    }

    /// Return once the process has survived its liveness grace period.
    /// `timeout` still bounds how long it may stay `Starting`.
    pub const fn background(timeout: Duration) -> Self {
        Self {
            wait_for_ready: false,
            timeout,
        }
    }
}

/// Point-in-time view of the supervisor, for status output.
#[derive(Debug, Clone, Serialize)]
pub struct SupervisorSnapshot {
    pub state: ServerState,
    pub base_url: String,
    pub pid: Option<u32>,
    /// True when an already-running server was adopted instead of spawned.
    pub adopted: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub spawn_count: usize,
    pub last_failure: Option<String>,
}
