// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Google Custom Search JSON API provider
//!
//! Official-tier provider. Two instances may be configured with separate
//! credentials ("google_custom_search" and "gcp_search") so that one
//! exhausted quota does not take the whole tier down.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use super::config::ConfigError;
use super::http::{build_client, check_status, map_send_error, read_json};
use super::provider::{ProviderKind, ProviderTier, SearchProvider};
use super::types::{ProviderError, SearchResult};

const CUSTOM_SEARCH_URL: &str = "https://www.googleapis.com/customsearch/v1";
/// The JSON API caps `num` at 10
const CUSTOM_SEARCH_MAX_RESULTS: usize = 10;

/// Google Custom Search provider
pub struct GoogleSearchProvider {
    kind: ProviderKind,
    api_key: String,
    engine_id: String,
    endpoint: String,
    timeout: Duration,
    client: Client,
}

impl GoogleSearchProvider {
    /// Create the primary Custom Search provider
    pub fn custom_search(
        api_key: String,
        engine_id: String,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        Self::with_kind(ProviderKind::GoogleCustomSearch, api_key, engine_id, timeout)
    }

    /// Create the secondary provider backed by a separate GCP project
    pub fn gcp_search(
        api_key: String,
        engine_id: String,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        Self::with_kind(ProviderKind::GcpSearch, api_key, engine_id, timeout)
    }

    fn with_kind(
        kind: ProviderKind,
        api_key: String,
        engine_id: String,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            kind,
            api_key,
            engine_id,
            endpoint: CUSTOM_SEARCH_URL.to_string(),
            timeout,
            client: build_client(timeout)?,
        })
    }

    /// Point the provider at a different endpoint (used by tests)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl SearchProvider for GoogleSearchProvider {
    async fn search(
        &self,
        query: &str,
        num_results: usize,
    ) -> Result<Vec<SearchResult>, ProviderError> {
        let count = num_results.min(CUSTOM_SEARCH_MAX_RESULTS).to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("q", query),
                ("num", count.as_str()),
                ("safe", "active"),
            ])
            .send()
            .await
            .map_err(|e| map_send_error(e, self.timeout))?;

        // Quota exhaustion arrives as 403 with a reason in the body,
        // which would otherwise be read as an auth failure
        if response.status() == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_forbidden(&body));
        }

        let response = check_status(response).await?;
        let data: CustomSearchResponse = read_json(response, self.timeout).await?;

        let score = self.tier().relevance_score();
        Ok(data
            .items
            .into_iter()
            .filter(|item| !item.link.is_empty() && !item.title.is_empty())
            .take(num_results)
            .map(|item| SearchResult::new(item.title, item.link, item.snippet, self.name(), score))
            .collect())
    }

    fn name(&self) -> &'static str {
        self.kind.name()
    }

    fn tier(&self) -> ProviderTier {
        self.kind.tier()
    }

    fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.engine_id.trim().is_empty()
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}

fn classify_forbidden(body: &str) -> ProviderError {
    let lower = body.to_lowercase();
    if lower.contains("ratelimitexceeded")
        || lower.contains("dailylimitexceeded")
        || lower.contains("quota")
    {
        ProviderError::RateLimited {
            retry_after_secs: 3600,
        }
    } else {
        ProviderError::Auth { status: 403 }
    }
}

#[derive(Debug, Deserialize)]
struct CustomSearchResponse {
    #[serde(default)]
    items: Vec<CustomSearchItem>,
}

#[derive(Debug, Deserialize)]
struct CustomSearchItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}
