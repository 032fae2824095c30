//! Shared HTTP plumbing for adapters.
//!
//! Maps transport and status failures onto `ProviderError` the same way for
//! every registry and enforces the adapter's response-size bound while the
//! body is streamed.

use std::time::Duration;

use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::errors::{ProviderError, UnavailableCause};

/// One outbound call's limits.
#[derive(Clone, Copy, Debug)]
pub(crate) struct CallLimits {
    pub provider: &'static str,
    pub timeout: Duration,
    pub max_bytes: usize,
}

/// Send a request and decode a JSON body.
///
/// Returns `Ok(None)` for HTTP 404 and 204 so each adapter can decide whether
/// absence means `NotFound` or an empty answer.
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: RequestBuilder,
    limits: CallLimits,
) -> Result<Option<T>, ProviderError> {
    let provider = limits.provider;
    let mut response = request
        .timeout(limits.timeout)
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await
        .map_err(|e| transport_error(provider, &e))?;

    let status = response.status();
    debug!(provider, %status, "registry response");

    if status == StatusCode::NOT_FOUND || status == StatusCode::NO_CONTENT {
        return Ok(None);
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(ProviderError::RateLimited {
            provider: provider.to_string(),
        });
    }
    if status.is_server_error() {
        return Err(ProviderError::unavailable(
            provider,
            UnavailableCause::Upstream,
            format!("HTTP {}", status),
        ));
    }
    if !status.is_success() {
        return Err(ProviderError::malformed(
            provider,
            format!("unexpected HTTP {}", status),
        ));
    }

    if let Some(length) = response.content_length() {
        if length > limits.max_bytes as u64 {
            return Err(too_large(provider, limits.max_bytes));
        }
    }

    let mut body = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| transport_error(provider, &e))?
    {
        if body.len() + chunk.len() > limits.max_bytes {
            return Err(too_large(provider, limits.max_bytes));
        }
        body.extend_from_slice(&chunk);
    }

    serde_json::from_slice(&body)
        .map(Some)
        .map_err(|e| ProviderError::malformed(provider, format!("invalid JSON: {}", e)))
}

fn transport_error(provider: &str, error: &reqwest::Error) -> ProviderError {
    // a connect timeout never reached the upstream, so it is the route's fault
    let cause = if error.is_timeout() && !error.is_connect() {
        UnavailableCause::Timeout
    } else {
        UnavailableCause::Transport
    };
    ProviderError::unavailable(provider, cause, error.to_string())
}

fn too_large(provider: &str, max_bytes: usize) -> ProviderError {
    ProviderError::malformed(
        provider,
        format!("response exceeds {} bytes", max_bytes),
    )
}
