//! Liveness probe for the OpenAI-compatible inference server.
//!
//! A server is considered healthy once `GET /v1/models` answers with a
//! success status. Probes never raise: every failure is just "not yet".

use std::time::Duration;

use reqwest::Client;
use tracing::trace;

/// Per-probe request timeout.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Path polled to decide readiness.
pub const HEALTH_PATH: &str = "/v1/models";

/// Make a single probe against `base_url` and report whether it succeeded.
pub async fn check_http_health(client: &Client, base_url: &str, timeout: Duration) -> bool {
    let url = format!("{base_url}{HEALTH_PATH}");

    match client.get(&url).timeout(timeout).send().await {
        Ok(response) if response.status().is_success() => true,
        Ok(response) => {
            trace!(%url, status = %response.status(), "Health probe returned non-success status");
            false
        }
        Err(e) => {
            trace!(%url, error = %e, "Health probe failed");
            false
        }
    }
}
