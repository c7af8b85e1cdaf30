use reqwest::{Client, Response};
use serde::Deserialize;
use std::time::Duration;
use tracing::error;

use crate::error::{BackendError, Result};

pub mod function_client;
pub mod prompt;
pub mod stats_client;
pub mod vision_client;

pub use function_client::FunctionClient;
pub use stats_client::StatsClient;
pub use vision_client::VisionClient;

const USER_AGENT: &str = concat!("chart-signal/", env!("CARGO_PKG_VERSION"));

pub(crate) fn http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|e| BackendError::Configuration(format!("failed to build HTTP client: {e}")))
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

/// Turns a non-success response into `BackendError::Api`, preferring the server's
/// own `error` text over the raw body.
pub(crate) async fn api_error(resp: Response, context: &str) -> BackendError {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    error!("{context} failed with {status}: {body}");

    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.error.or(b.message))
        .filter(|m| !m.trim().is_empty())
        .or_else(|| Some(body.trim().to_string()).filter(|b| !b.is_empty()))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });

    BackendError::api(status.as_u16(), message)
}

pub(crate) fn trim_base_url(url: impl Into<String>) -> String {
    url.into().trim_end_matches('/').to_string()
}
