//! Root CLI structure with global options.

use std::path::PathBuf;

use clap::{Args, Parser};
use vidqa_core::Settings;

use crate::commands::Commands;

/// Ask questions about video transcripts with a locally served model.
#[derive(Debug, Parser)]
#[command(name = "vidqa")]
#[command(about = "Question answering, navigation, summaries and quizzes over video transcripts")]
#[command(version)]
pub struct Cli {
    /// TOML settings file
    #[arg(long, global = true, env = "VIDQA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Transcript JSON file, or a directory with one file per video
    #[arg(long, global = true, env = "VIDQA_TRANSCRIPTS")]
    pub transcripts: Option<PathBuf>,

    /// Enable debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub settings: SettingsArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Settings that can be overridden per invocation or via the environment.
#[derive(Debug, Clone, Default, Args)]
pub struct SettingsArgs {
    /// Model served and requested
    #[arg(long, global = true, env = "VIDQA_MODEL_ID")]
    pub model_id: Option<String>,

    /// Address the inference server binds to
    #[arg(long, global = true, env = "VIDQA_SERVER_HOST")]
    pub server_host: Option<String>,

    /// Port the inference server listens on
    #[arg(long, global = true, env = "VIDQA_SERVER_PORT")]
    pub server_port: Option<u16>,

    /// Maximum model context length
    #[arg(long, global = true, env = "VIDQA_MAX_MODEL_LEN")]
    pub max_model_len: Option<u32>,

    /// Python interpreter used to launch the server
    #[arg(long, global = true, env = "VIDQA_LAUNCH_PROGRAM")]
    pub launch_program: Option<String>,

    /// Lifetime of cached results, in seconds
    #[arg(long, global = true, env = "VIDQA_CACHE_TTL_SECS")]
    pub cache_ttl_secs: Option<u64>,

    /// How long to wait for the server to become ready, in seconds
    #[arg(long, global = true, env = "VIDQA_READINESS_TIMEOUT_SECS")]
    pub readiness_timeout_secs: Option<u64>,
}

impl SettingsArgs {
    /// Only the fields given on the command line or in the environment.
    pub fn to_settings(&self) -> Settings {
        Settings {
            model_id: self.model_id.clone(),
            server_host: self.server_host.clone(),
            server_port: self.server_port,
            max_model_len: self.max_model_len,
            launch_program: self.launch_program.clone(),
            cache_ttl_secs: self.cache_ttl_secs,
            readiness_timeout_secs: self.readiness_timeout_secs,
            ..Settings::default()
        }
    }
}
