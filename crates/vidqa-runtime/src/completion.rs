//! `/v1/completions` wire format and request execution.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use vidqa_core::{GenerationRequest, InferenceError};

/// Path completions are posted to.
pub const COMPLETIONS_PATH: &str = "/v1/completions";

/// Longest error body kept in an HTTP error.
const MAX_ERROR_BODY: usize = 2048;

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a [String]>,
}

impl<'a> CompletionRequest<'a> {
    fn new(model: &'a str, request: &'a GenerationRequest) -> Self {
        let stop = request.stop_sequences();
        Self {
            model,
            prompt: request.prompt(),
            max_tokens: request.max_tokens(),
            temperature: request.temperature(),
            stop: (!stop.is_empty()).then_some(stop),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    text: String,
}

/// POST one completion and return the first choice's text.
pub async fn request_completion(
    client: &Client,
    base_url: &str,
    model: &str,
    request: &GenerationRequest,
) -> Result<String, InferenceError> {
    let url = format!("{base_url}{COMPLETIONS_PATH}");
    debug!(
        %url,
        max_tokens = request.max_tokens(),
        temperature = request.temperature(),
        "Sending completion request"
    );

    let response = client
        .post(&url)
        .json(&CompletionRequest::new(model, request))
        .send()
        .await
        .map_err(|e| InferenceError::Transport(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let mut body = response.text().await.unwrap_or_default();
        truncate_at_char_boundary(&mut body, MAX_ERROR_BODY);
        return Err(InferenceError::Http {
            status: status.as_u16(),
            body,
        });
    }

    let parsed: CompletionResponse = response
        .json()
        .await
        .map_err(|e| InferenceError::MalformedResponse(e.to_string()))?;

    parsed
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.text)
        .ok_or_else(|| InferenceError::MalformedResponse("response contained no choices".into()))
}

fn truncate_at_char_boundary(text: &mut String, max: usize) {
    if text.len() <= max {
        return;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text.truncate(end);
}
