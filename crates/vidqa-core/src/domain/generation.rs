//! Generation request types.
//!
//! A `GenerationRequest` is immutable once built and is constructed per call.
//! `GenerationProfile` fixes the sampling defaults for each use case so that
//! callers never pick token budgets or temperatures ad hoc.

use serde::{Deserialize, Serialize};

use crate::ports::InferenceError;

/// Upper bound accepted for sampling temperature.
pub const MAX_TEMPERATURE: f32 = 2.0;

/// A single completion request against the serving process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    prompt: String,
    max_tokens: u32,
    temperature: f32,
    stop_sequences: Vec<String>,
}

impl GenerationRequest {
    /// Create a request, validating `max_tokens > 0` and `temperature` in `[0, 2]`.
    pub fn new(
        prompt: impl Into<String>,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<Self, InferenceError> {
        if max_tokens == 0 {
            return Err(InferenceError::InvalidRequest(
                "max_tokens must be positive".to_string(),
            ));
        }
        if !temperature.is_finite() || !(0.0..=MAX_TEMPERATURE).contains(&temperature) {
            return Err(InferenceError::InvalidRequest(format!(
                "temperature must be within [0, {MAX_TEMPERATURE}], got {temperature}"
            )));
        }
        Ok(Self {
            prompt: prompt.into(),
            max_tokens,
            temperature,
            stop_sequences: Vec::new(),
        })
    }

    /// Set the ordered stop sequences.
    #[must_use]
    pub fn with_stop_sequences(mut self, stop: Vec<String>) -> Self {
        self.stop_sequences = stop;
        self
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub const fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub const fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn stop_sequences(&self) -> &[String] {
        &self.stop_sequences
    }
}

/// Sampling defaults per use case.
///
/// Classification-style calls (navigation) run cold with a small budget;
/// free-form answers get a larger budget and moderate temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationProfile {
    QuestionAnswering,
    Navigation,
    Summary,
    Quiz,
}

impl GenerationProfile {
    pub const fn max_tokens(self) -> u32 {
        match self {
            Self::QuestionAnswering => 512,
            Self::Navigation => 256,
            Self::Summary => 300,
            Self::Quiz => 800,
        }
    }

    pub const fn temperature(self) -> f32 {
        match self {
            Self::QuestionAnswering | Self::Quiz => 0.7,
            Self::Navigation => 0.3,
            Self::Summary => 0.5,
        }
    }

    /// Build a request for `prompt` using this profile's defaults.
    pub fn request(self, prompt: impl Into<String>) -> Result<GenerationRequest, InferenceError> {
        GenerationRequest::new(prompt, self.max_tokens(), self.temperature())
    }
}
