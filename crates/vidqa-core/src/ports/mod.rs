//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the core domain expects from infrastructure.
//! They contain no implementation details and use only domain types.
//!
//! # Design Rules
//!
//! - No `reqwest` or process types in any signature
//! - Intent-based methods for the text generator (not implementation-leaking)
//! - Record store and search traits are minimal and keyed by video id

pub mod generation;
pub mod segment_search;
pub mod transcript_store;

use std::time::Duration;
use thiserror::Error;

pub use generation::TextGenerator;
pub use segment_search::SegmentSearch;
pub use transcript_store::TranscriptStore;

/// Domain-specific errors for record store and search operations.
///
/// This error type abstracts away storage implementation details and provides
/// a clean interface for services to handle collaborator failures.
#[derive(Debug, Clone, Error)]
pub enum RepositoryError {
    /// The requested entity was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Storage backend error (database, filesystem, remote service).
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Supplied data violates a domain invariant.
    #[error("Invalid data: {0}")]
    Invalid(String),
}

/// Errors raised by text generation and the serving process behind it.
///
/// Timeouts, process exits and transport failures are separate variants so
/// callers can tell a slow boot apart from a hard failure.
#[derive(Debug, Clone, Error)]
pub enum InferenceError {
    /// The serving process is not running or not ready.
    #[error("Inference server not running: {0}")]
    ProcessUnavailable(String),

    /// The serving process did not become healthy within the bound.
    #[error("Inference server not ready after {waited:?}{}", format_diagnostics(.diagnostics))]
    ReadinessTimeout {
        waited: Duration,
        diagnostics: String,
    },

    /// The serving process exited before or while serving.
    #[error("Inference server exited ({status}){}", format_diagnostics(.diagnostics))]
    ProcessExited { status: String, diagnostics: String },

    /// The serving process could not be launched.
    #[error("Failed to launch inference server: {0}")]
    SpawnFailed(String),

    /// Network-level failure talking to the serving endpoint.
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The serving endpoint answered with a non-success status.
    #[error("Inference server returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The completion response did not have the expected shape.
    #[error("Malformed completion response: {0}")]
    MalformedResponse(String),

    /// The request itself was invalid.
    #[error("Invalid generation request: {0}")]
    InvalidRequest(String),
}

impl InferenceError {
    /// Whether this error is a readiness timeout (as opposed to a hard failure).
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::ReadinessTimeout { .. })
    }

    /// Whether the serving process was unavailable (stopped, failed or exited).
    pub const fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::ProcessUnavailable(_) | Self::ProcessExited { .. }
        )
    }
}

fn format_diagnostics(diagnostics: &str) -> String {
    if diagnostics.trim().is_empty() {
        String::new()
    } else {
        format!("\n--- server output ---\n{diagnostics}")
    }
}
