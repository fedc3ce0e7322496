//! Process runtime and OS-level concerns for vidqa.
//!
//! This crate runs the inference server the core's `TextGenerator` port
//! talks to:
//!
//! - `server`: launch configuration, lifecycle states and `ProcessSupervisor`
//! - `health`: the `/v1/models` liveness probe
//! - `completion`: the `/v1/completions` wire format
//! - `process`: output capture and graceful shutdown of the child
//! - `maintenance`: background cache sweeping

pub mod completion;
pub mod health;
pub mod maintenance;
pub mod process;
pub mod server;

pub use maintenance::spawn_cache_sweeper;
pub use server::{
    ConfigError, LaunchCommand, ProcessSupervisor, ServerConfig, ServerState, StartOptions,
    SupervisorError, SupervisorSnapshot,
};
