//! Managed inference server: configuration, states and the supervisor.

pub mod config;
pub mod state;
pub mod supervisor;

pub use config::{ConfigError, LaunchCommand, ServerConfig, VLLM_ENTRYPOINT};
pub use state::{ServerState, StartOptions, SupervisorSnapshot};
pub use supervisor::{ProcessSupervisor, SupervisorError};
