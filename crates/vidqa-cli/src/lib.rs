//! `vidqa` command-line adapter.
//!
//! Parses arguments, loads settings and transcripts, and wires the
//! supervisor, cache and services together in `bootstrap`. Handlers are
//! thin: call the assistant, print the tagged result as JSON.
#![deny(unused_crate_dependencies)]

#[cfg(test)]
use tempfile as _;

// Used by the binary only
use dotenvy as _;
use tracing_subscriber as _;

pub mod bootstrap;
pub mod commands;
pub mod config;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod transcripts;

pub use bootstrap::{CliContext, bootstrap};
pub use commands::{CacheArgs, Commands};
pub use config::load_settings;
pub use error::CliError;
pub use parser::{Cli, SettingsArgs};
pub use transcripts::load_transcripts;
