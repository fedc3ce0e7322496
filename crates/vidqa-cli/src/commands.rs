//! Subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use vidqa_core::CachePolicy;

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the inference server and keep it running until Ctrl+C
    Serve,

    /// Answer a question about a video
    Ask {
        video_id: String,
        /// The question (words are joined with spaces)
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
        #[command(flatten)]
        cache: CacheArgs,
    },

    /// Find the position in a video that a query refers to
    Navigate {
        video_id: String,
        /// e.g. "skip to 2:15" or "where do they explain lifetimes"
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
        #[command(flatten)]
        cache: CacheArgs,
    },

    /// Print the stored summary, generating one if needed
    Summary {
        video_id: String,
        /// Generate a new summary even if one exists
        #[arg(long)]
        regenerate: bool,
        #[command(flatten)]
        cache: CacheArgs,
    },

    /// Print the stored quiz, generating one if needed
    Quiz {
        video_id: String,
        /// Generate a new quiz even if one exists
        #[arg(long)]
        regenerate: bool,
        #[command(flatten)]
        cache: CacheArgs,
    },

    /// Case-insensitive text search over a transcript
    Search {
        video_id: String,
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Run one command per line against a single assistant and cache
    Batch {
        /// File with one command per line; reads stdin when omitted
        file: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, Default, Args)]
pub struct CacheArgs {
    /// Neither read nor write the result cache
    #[arg(long)]
    pub skip_cache: bool,
}

impl CacheArgs {
    pub const fn policy(self) -> CachePolicy {
        CachePolicy::skip_cache(self.skip_cache)
    }
}
