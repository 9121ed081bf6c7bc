//! Shared HTTP plumbing for the collaborator clients.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Response};

use super::{CallResult, CollaboratorError};

/// Build the single client every collaborator shares.
///
/// The timeout applies to each request as a whole, uniformly across services.
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("clipforge/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")
}

/// Map a send error into the collaborator taxonomy.
///
/// The request URL is stripped; query strings and signed links carry
/// credentials, and this message ends up in logs and run history.
pub(crate) fn transport(service: &'static str) -> impl FnOnce(reqwest::Error) -> CollaboratorError {
    move |source| CollaboratorError::Transport {
        service,
        source: source.without_url(),
    }
}

/// Pass 2xx responses through; turn anything else into a status error
pub(crate) async fn ensure_success(service: &'static str, response: Response) -> CallResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(CollaboratorError::Status {
        service,
        status: status.as_u16(),
        body: truncate(&body, 500),
    })
}

/// Read a successful response body as JSON
pub(crate) async fn read_json<T: serde::de::DeserializeOwned>(
    service: &'static str,
    response: Response,
) -> CallResult<T> {
    let bytes = response.bytes().await.map_err(transport(service))?;
    serde_json::from_slice(&bytes).map_err(|e| CollaboratorError::malformed(service, e.to_string()))
}

/// Shorten text for logs and error messages, on a char boundary
pub fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
