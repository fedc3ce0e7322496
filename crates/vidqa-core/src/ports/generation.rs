//! Text generator trait definition.
//!
//! This port defines the interface services use to obtain completions.
//! The runtime's process supervisor is the production implementation;
//! tests substitute scripted generators.

use async_trait::async_trait;

use super::InferenceError;
use crate::domain::GenerationRequest;

/// Synchronous request/response text generation.
///
/// # Design Rules
///
/// - One call, one completion: returns the first choice's text
/// - Transport and HTTP failures are typed errors, never swallowed
/// - Implementations must be safe to call from many tasks at once
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for `request`.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, InferenceError>;
}
