// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! SerpAPI provider
//!
//! Implements web search using SerpAPI's Google engine.
//! Highest quality results, so it leads the commercial tier.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::config::ConfigError;
use super::http::{build_client, check_status, map_send_error, read_json};
use super::provider::{ProviderKind, ProviderTier, SearchProvider};
use super::types::{ProviderError, SearchResult};

const SERP_API_URL: &str = "https://serpapi.com/search.json";
/// SerpAPI serves at most 10 organic results per page
const SERP_MAX_RESULTS: usize = 10;

/// SerpAPI search provider
pub struct SerpApiProvider {
    api_key: String,
    endpoint: String,
    timeout: Duration,
    client: Client,
}

impl SerpApiProvider {
    /// Create a new SerpAPI provider
    ///
    /// # Arguments
    /// * `api_key` - SerpAPI key
    /// * `timeout` - Per-request timeout
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, ConfigError> {
        Ok(Self {
            api_key,
            endpoint: SERP_API_URL.to_string(),
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
impl SearchProvider for SerpApiProvider {
    async fn search(
        &self,
        query: &str,
        num_results: usize,
    ) -> Result<Vec<SearchResult>, ProviderError> {
        let count = num_results.min(SERP_MAX_RESULTS).to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("engine", "google"),
                ("q", query),
                ("api_key", self.api_key.as_str()),
                ("num", count.as_str()),
                ("safe", "active"),
            ])
            .send()
            .await
            .map_err(|e| map_send_error(e, self.timeout))?;

        let response = check_status(response).await?;
        let data: SerpResponse = read_json(response, self.timeout).await?;

        if let Some(error) = data.error {
            return Err(classify_body_error(error));
        }

        let score = self.tier().relevance_score();
        Ok(data
            .organic_results
            .into_iter()
            .filter(|r| !r.link.is_empty() && !r.title.is_empty())
            .take(num_results)
            .map(|r| {
                SearchResult::new(r.title, r.link, r.snippet, self.name(), score)
                    .with_published_date(r.date)
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        ProviderKind::SerpApi.name()
    }

    fn tier(&self) -> ProviderTier {
        ProviderKind::SerpApi.tier()
    }

    fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// SerpAPI sometimes reports failures in a 200 body
fn classify_body_error(message: String) -> ProviderError {
    let lower = message.to_lowercase();
    if lower.contains("api key") {
        ProviderError::Auth { status: 401 }
    } else if lower.contains("run out of searches") || lower.contains("rate limit") {
        ProviderError::RateLimited {
            retry_after_secs: 3600,
        }
    } else if lower.contains("hasn't returned any results") {
        ProviderError::NoResults
    } else {
        ProviderError::Api {
            status: 200,
            message,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SerpResponse {
    #[serde(default)]
    organic_results: Vec<SerpResult>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SerpResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
    date: Option<String>,
}
