// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Core types for web search functionality

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Upper bound on results a single search may request
pub const MAX_RESULTS_LIMIT: usize = 50;

/// A single search result from a web search provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// Title of the search result
    pub title: String,
    /// URL of the search result
    pub url: String,
    /// Snippet/description of the search result
    pub snippet: String,
    /// Host of the URL without a leading `www.`
    pub domain: String,
    /// Source provider (e.g., "serp_api", "google_custom_search", "duckduckgo")
    pub source: String,
    /// Fixed per-provider relevance in [0, 1]
    pub relevance_score: f64,
    /// Published date if available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
}

impl SearchResult {
    /// Build a result, deriving `domain` from the URL
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        snippet: impl Into<String>,
        source: &str,
        relevance_score: f64,
    ) -> Self {
        let url = url.into();
        Self {
            domain: extract_domain(&url),
            title: title.into(),
            url,
            snippet: snippet.into(),
            source: source.to_string(),
            relevance_score,
            published_date: None,
        }
    }

    pub fn with_published_date(mut self, date: Option<String>) -> Self {
        self.published_date = date;
        self
    }
}

/// Response from a search operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    /// The original search query
    pub query: String,
    /// List of search results, in provider order
    pub results: Vec<SearchResult>,
    /// Time taken for the search in milliseconds
    pub search_time_ms: u64,
    /// Provider that returned the results
    pub provider: String,
    /// Whether the result was from cache
    pub cached: bool,
    /// Number of results returned
    pub result_count: usize,
    /// Higher-priority providers that failed before this one answered
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub provider_failures: Vec<ProviderFailure>,
}

impl SearchResponse {
    /// Whether a fallback provider had to answer
    pub fn is_degraded(&self) -> bool {
        !self.provider_failures.is_empty()
    }
}

/// A normalized, immutable search request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    text: String,
    max_results: usize,
    domain_hints: Vec<String>,
}

impl SearchQuery {
    /// Build a query, rejecting blank text and clamping `max_results` to 1..=50
    pub fn new(text: &str, max_results: usize) -> Result<Self, SearchError> {
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if text.is_empty() {
            return Err(SearchError::InvalidQuery {
                reason: "query text is empty".to_string(),
            });
        }

        Ok(Self {
            text,
            max_results: max_results.clamp(1, MAX_RESULTS_LIMIT),
            domain_hints: Vec::new(),
        })
    }

    /// Attach domain hints (e.g. `who.int`) the caller would like favoured
    pub fn with_domain_hints<I, S>(mut self, hints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.domain_hints = hints
            .into_iter()
            .map(|h| {
                let hint: String = h.into();
                hint.trim().to_lowercase()
            })
            .filter(|h| !h.is_empty())
            .collect();
        self.domain_hints.sort();
        self.domain_hints.dedup();
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    pub fn domain_hints(&self) -> &[String] {
        &self.domain_hints
    }

    /// Text sent to providers: hints become `site:` operators
    pub fn provider_text(&self) -> String {
        match self.domain_hints.as_slice() {
            [] => self.text.clone(),
            hints => {
                let sites = hints
                    .iter()
                    .map(|h| format!("site:{}", h))
                    .collect::<Vec<_>>()
                    .join(" OR ");
                format!("{} ({})", self.text, sites)
            }
        }
    }
}

/// Coarse classification of provider failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    Auth,
    QuotaOrRateLimit,
    NetworkOrTimeout,
    MalformedResponse,
    NoResults,
}

/// Errors raised by a single provider attempt
#[derive(Debug, Clone, Error, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProviderError {
    /// Credentials were rejected by the provider
    #[error("Authentication rejected (HTTP {status})")]
    Auth { status: u16 },

    /// Rate limited or out of quota
    #[error("Rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Connection, DNS or TLS failure
    #[error("Network error: {message}")]
    Network { message: String },

    /// Request did not complete within the per-provider timeout
    #[error("Search timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Non-success HTTP status other than auth/rate limit
    #[error("Search API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Body could not be decoded into results
    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

    /// Provider answered but had nothing for this query
    #[error("No results returned")]
    NoResults,

    /// The local request ceiling had no free slot within the provider's timeout
    #[error("Request ceiling reached, no slot within {waited_ms}ms")]
    Throttled { waited_ms: u64 },
}

impl ProviderError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Auth { .. } => ErrorClass::Auth,
            Self::RateLimited { .. } | Self::Throttled { .. } => ErrorClass::QuotaOrRateLimit,
            Self::Network { .. } | Self::Timeout { .. } => ErrorClass::NetworkOrTimeout,
            Self::Api { status, .. } if *status >= 500 => ErrorClass::NetworkOrTimeout,
            Self::Api { .. } | Self::MalformedResponse { .. } => ErrorClass::MalformedResponse,
            Self::NoResults => ErrorClass::NoResults,
        }
    }

    /// Whether one more attempt against the same provider may help
    pub fn is_transient(&self) -> bool {
        self.class() == ErrorClass::NetworkOrTimeout
    }

    /// Whether this failure should count against the provider's health
    ///
    /// Local throttling never reached the provider.
    pub fn counts_against_health(&self) -> bool {
        !matches!(self, Self::NoResults | Self::Throttled { .. })
    }
}

/// One provider's reason for failing a search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderFailure {
    pub provider: String,
    pub error: ProviderError,
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.provider, self.error)
    }
}

fn join_failures(failures: &[ProviderFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors that can occur during search operations
#[derive(Debug, Error)]
pub enum SearchError {
    /// Invalid search query
    #[error("Invalid query: {reason}")]
    InvalidQuery {
        /// Reason the query is invalid
        reason: String,
    },

    /// Search is disabled on this host
    #[error("Search disabled on this host")]
    SearchDisabled,

    /// No provider is usable with the current configuration
    #[error("No search providers configured")]
    NoProviders,

    /// Every configured provider failed for this query
    #[error("All providers failed: {}", join_failures(.failures))]
    AllProvidersFailed {
        /// Failure reasons in attempt order
        failures: Vec<ProviderFailure>,
    },

    /// The caller cancelled the search
    #[error("Search cancelled")]
    Cancelled,
}

impl SearchError {
    /// Per-provider reasons when every provider failed
    pub fn provider_failures(&self) -> &[ProviderFailure] {
        match self {
            Self::AllProvidersFailed { failures } => failures,
            _ => &[],
        }
    }
}

/// Extract the host from a URL, lowercased and without a leading `www.`
pub fn extract_domain(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
        .map(|h| h.trim_start_matches("www.").to_string())
        .unwrap_or_default()
}
