// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! DuckDuckGo search provider
//!
//! Implements web search using DuckDuckGo's HTML interface.
//! No API key required, serves as the always-available fallback.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use scraper::{Html, Selector};
use std::time::Duration;

use super::config::ConfigError;
use super::http::{build_client, check_status, map_send_error};
use super::provider::{ProviderKind, ProviderTier, SearchProvider};
use super::types::{ProviderError, SearchResult};

const DDG_HTML_URL: &str = "https://html.duckduckgo.com/html/";

/// DuckDuckGo search provider (no API key required)
pub struct DuckDuckGoProvider {
    endpoint: String,
    timeout: Duration,
    client: Client,
}

impl DuckDuckGoProvider {
    /// Create a new DuckDuckGo provider
    pub fn new(timeout: Duration) -> Result<Self, ConfigError> {
        Ok(Self {
            endpoint: DDG_HTML_URL.to_string(),
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
impl SearchProvider for DuckDuckGoProvider {
    async fn search(
        &self,
        query: &str,
        num_results: usize,
    ) -> Result<Vec<SearchResult>, ProviderError> {
        let response = self
            .client
            .post(&self.endpoint)
            .form(&[("q", query), ("kl", "wt-wt")])
            .send()
            .await
            .map_err(|e| map_send_error(e, self.timeout))?;

        // 202 is the bot-check interstitial
        if response.status() == StatusCode::ACCEPTED {
            return Err(ProviderError::RateLimited {
                retry_after_secs: 60,
            });
        }

        let response = check_status(response).await?;
        let html = response
            .text()
            .await
            .map_err(|e| map_send_error(e, self.timeout))?;

        parse_ddg_html(&html, num_results, self.tier().relevance_score())
    }

    fn name(&self) -> &'static str {
        ProviderKind::DuckDuckGo.name()
    }

    fn tier(&self) -> ProviderTier {
        ProviderKind::DuckDuckGo.tier()
    }

    fn is_configured(&self) -> bool {
        true // No API key needed
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Parse DuckDuckGo HTML response to extract search results
///
/// Results live in `div.result` blocks with an `a.result__a` title link and
/// an optional `.result__snippet`.
fn parse_ddg_html(
    html: &str,
    max_results: usize,
    score: f64,
) -> Result<Vec<SearchResult>, ProviderError> {
    let selector = |css: &str| {
        Selector::parse(css).map_err(|e| ProviderError::MalformedResponse {
            message: format!("selector {}: {:?}", css, e),
        })
    };
    let result_sel = selector("div.result")?;
    let link_sel = selector("a.result__a")?;
    let snippet_sel = selector(".result__snippet")?;

    let document = Html::parse_document(html);
    let mut results = Vec::new();

    for block in document.select(&result_sel) {
        if results.len() >= max_results {
            break;
        }

        let Some(link) = block.select(&link_sel).next() else {
            continue;
        };
        let url = link
            .value()
            .attr("href")
            .map(extract_ddg_url)
            .unwrap_or_default();
        let title = collapse(&link.text().collect::<String>());
        let snippet = block
            .select(&snippet_sel)
            .next()
            .map(|s| collapse(&s.text().collect::<String>()))
            .unwrap_or_default();

        if !url.is_empty() && !title.is_empty() {
            results.push(SearchResult::new(
                title,
                url,
                snippet,
                ProviderKind::DuckDuckGo.name(),
                score,
            ));
        }
    }

    Ok(results)
}

/// Extract actual URL from DuckDuckGo's redirect URL
fn extract_ddg_url(redirect_url: &str) -> String {
    // DDG URLs look like: //duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com&...
    let absolute = if redirect_url.starts_with("//") {
        format!("https:{}", redirect_url)
    } else {
        redirect_url.to_string()
    };

    match url::Url::parse(&absolute) {
        Ok(parsed) => parsed
            .query_pairs()
            .find(|(key, _)| key == "uddg")
            .map(|(_, target)| target.into_owned())
            .unwrap_or_else(|| {
                if parsed.scheme().starts_with("http") && !absolute.contains("duckduckgo.com/l/")
                {
                    absolute.clone()
                } else {
                    String::new()
                }
            }),
        Err(_) => String::new(),
    }
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
