// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HTTP plumbing shared by the search providers

use reqwest::{Client, Response, StatusCode};
use std::time::Duration;

use super::config::ConfigError;
use super::types::ProviderError;

/// Browser-like agent; the keyless endpoints reject obvious bots
pub(crate) const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";

/// Build a client with the provider's timeout baked in
pub(crate) fn build_client(timeout: Duration) -> Result<Client, ConfigError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(BROWSER_USER_AGENT)
        .build()
        .map_err(|e| ConfigError::HttpClient(e.to_string()))
}

/// Map a transport error onto the provider taxonomy
pub(crate) fn map_send_error(error: reqwest::Error, timeout: Duration) -> ProviderError {
    if error.is_timeout() {
        ProviderError::Timeout {
            timeout_ms: timeout.as_millis() as u64,
        }
    } else if error.is_decode() {
        ProviderError::MalformedResponse {
            message: error.to_string(),
        }
    } else {
        ProviderError::Network {
            message: error.to_string(),
        }
    }
}

/// Turn non-success statuses into errors, passing successful responses through
pub(crate) async fn check_status(response: Response) -> Result<Response, ProviderError> {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);
        return Err(ProviderError::RateLimited { retry_after_secs });
    }

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(ProviderError::Auth {
            status: status.as_u16(),
        });
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = body.chars().take(200).collect();
        return Err(ProviderError::Api {
            status: status.as_u16(),
            message,
        });
    }

    Ok(response)
}

/// Decode a JSON body, reporting shape mismatches as malformed responses
pub(crate) async fn read_json<T: serde::de::DeserializeOwned>(
    response: Response,
    timeout: Duration,
) -> Result<T, ProviderError> {
    let body = response
        .text()
        .await
        .map_err(|e| map_send_error(e, timeout))?;

    serde_json::from_str(&body).map_err(|e| ProviderError::MalformedResponse {
        message: format!("JSON parse error: {}", e),
    })
}
