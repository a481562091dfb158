// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Unified search orchestration
//!
//! Coordinates search providers, caching, health tracking and rate limiting.
//! Providers are tried one at a time in tier order (commercial, official,
//! free); an unhealthy provider drops to the back of its tier but is still
//! offered a turn, so the service degrades instead of refusing to search.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::config::{ConfigError, SearchConfig};
use super::duckduckgo::DuckDuckGoProvider;
use super::google::GoogleSearchProvider;
use super::health::{HealthTracker, ProviderHealth};
use super::provider::SearchProvider;
use super::rate_limiter::SearchRateLimiter;
use super::serp_api::SerpApiProvider;
use super::types::{
    ProviderError, ProviderFailure, SearchError, SearchQuery, SearchResponse, SearchResult,
};
use crate::cache::{cache_key, CacheStats, TtlCache};

/// Outcome of offering one provider its turn
enum Attempt {
    Success(Vec<SearchResult>),
    Recoverable(ProviderError),
    Cancelled,
}

/// Live operational view of the search subsystem
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStats {
    /// Configured providers in current attempt order
    pub available_providers: Vec<String>,
    /// Health of every configured provider
    pub provider_health: BTreeMap<String, ProviderHealth>,
    /// Search cache hit rate
    pub cache_hit_rate: f64,
    /// Full search cache statistics
    pub cache: CacheStats,
    /// Which known providers have credentials
    pub configuration: BTreeMap<String, bool>,
}

/// Main search service that orchestrates providers, caching, and health
pub struct UnifiedSearchService {
    /// All known providers, in configuration order
    providers: Vec<Arc<dyn SearchProvider>>,
    cache: TtlCache<SearchResponse>,
    health: HealthTracker,
    rate_limiter: SearchRateLimiter,
    config: SearchConfig,
}

impl UnifiedSearchService {
    /// Create a search service with the built-in providers
    ///
    /// Providers without credentials are still registered (so stats can
    /// report them) but never enter the attempt order.
    pub fn new(config: SearchConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let creds = &config.providers;
        let timeouts = &config.timeouts;
        let mut providers: Vec<Arc<dyn SearchProvider>> = Vec::new();

        providers.push(Arc::new(SerpApiProvider::new(
            creds.serp_api_key.clone().unwrap_or_default(),
            std::time::Duration::from_millis(timeouts.serp_api_ms),
        )?));
        providers.push(Arc::new(GoogleSearchProvider::custom_search(
            creds.google_search_api_key.clone().unwrap_or_default(),
            creds.google_search_engine_id.clone().unwrap_or_default(),
            std::time::Duration::from_millis(timeouts.google_ms),
        )?));
        providers.push(Arc::new(GoogleSearchProvider::gcp_search(
            creds.gcp_search_api_key.clone().unwrap_or_default(),
            creds.gcp_search_engine_id.clone().unwrap_or_default(),
            std::time::Duration::from_millis(timeouts.gcp_ms),
        )?));
        // Always available as the last resort
        providers.push(Arc::new(DuckDuckGoProvider::new(
            std::time::Duration::from_millis(timeouts.duckduckgo_ms),
        )?));

        for provider in providers.iter().filter(|p| p.is_configured()) {
            debug!(provider = provider.name(), tier = ?provider.tier(), "Search provider enabled");
        }

        Ok(Self::with_providers(config, providers))
    }

    /// Create a search service over an explicit provider set
    ///
    /// The order of `providers` is the configuration order used to break
    /// ties within a tier.
    pub fn with_providers(config: SearchConfig, providers: Vec<Arc<dyn SearchProvider>>) -> Self {
        Self {
            cache: TtlCache::new(config.cache_max_entries),
            health: HealthTracker::new(config.failure_threshold),
            rate_limiter: SearchRateLimiter::new(config.rate_limit_per_minute),
            providers,
            config,
        }
    }

    /// Perform a search
    ///
    /// # Arguments
    /// * `query` - The search query
    /// * `num_results` - Optional number of results (uses default if None)
    ///
    /// # Returns
    /// Search response with results, or error
    pub async fn search(
        &self,
        query: &str,
        num_results: Option<usize>,
    ) -> Result<SearchResponse, SearchError> {
        let query = SearchQuery::new(
            query,
            num_results.unwrap_or(self.config.default_num_results),
        )?;
        self.search_query(&query).await
    }

    /// Perform a search for a prepared query
    pub async fn search_query(&self, query: &SearchQuery) -> Result<SearchResponse, SearchError> {
        self.search_with_cancel(query, &CancellationToken::new()).await
    }

    /// Perform a search that the caller can abort
    ///
    /// Cancellation stops the in-flight provider call and returns
    /// `SearchError::Cancelled`; no provider is charged a failure for it.
    pub async fn search_with_cancel(
        &self,
        query: &SearchQuery,
        cancel: &CancellationToken,
    ) -> Result<SearchResponse, SearchError> {
        if !self.config.enabled {
            return Err(SearchError::SearchDisabled);
        }

        let start = Instant::now();
        let key = Self::cache_key(query);

        // Check cache first
        if let Some(mut response) = self.cache.get(&key) {
            debug!(query = query.text(), provider = %response.provider, "Search cache hit");
            response.cached = true;
            response.search_time_ms = start.elapsed().as_millis() as u64;
            return Ok(response);
        }

        let order = self.ordered_providers();
        if order.is_empty() {
            return Err(SearchError::NoProviders);
        }

        let mut failures: Vec<ProviderFailure> = Vec::new();

        for (index, provider) in order.iter().enumerate() {
            if index > 0 && !self.pause(cancel).await {
                return Err(SearchError::Cancelled);
            }

            debug!(provider = provider.name(), "Trying search provider");

            match self.attempt(provider.as_ref(), query, cancel).await {
                Attempt::Success(results) => {
                    self.health.record_success(provider.name());

                    let elapsed_ms = start.elapsed().as_millis() as u64;
                    let response = SearchResponse {
                        query: query.text().to_string(),
                        result_count: results.len(),
                        results,
                        search_time_ms: elapsed_ms,
                        provider: provider.name().to_string(),
                        cached: false,
                        provider_failures: Vec::new(),
                    };

                    self.cache
                        .set(key, response.clone(), self.config.cache_ttl());

                    info!(
                        provider = provider.name(),
                        results = response.result_count,
                        elapsed_ms,
                        fallbacks = failures.len(),
                        "Search complete"
                    );

                    return Ok(SearchResponse {
                        provider_failures: failures,
                        ..response
                    });
                }
                Attempt::Recoverable(error) => {
                    if error.counts_against_health() {
                        self.health
                            .record_failure(provider.name(), &error.to_string());
                    }
                    warn!(
                        provider = provider.name(),
                        error = %error,
                        "Search provider failed, trying next"
                    );
                    failures.push(ProviderFailure {
                        provider: provider.name().to_string(),
                        error,
                    });
                }
                Attempt::Cancelled => {
                    info!(provider = provider.name(), "Search cancelled by caller");
                    return Err(SearchError::Cancelled);
                }
            }
        }

        warn!(
            query = query.text(),
            attempted = failures.len(),
            "All search providers failed"
        );
        Err(SearchError::AllProvidersFailed { failures })
    }

    /// Offer one provider its turn, retrying once on transient errors
    async fn attempt(
        &self,
        provider: &dyn SearchProvider,
        query: &SearchQuery,
        cancel: &CancellationToken,
    ) -> Attempt {
        let text = query.provider_text();
        let timeout = provider.timeout();
        let mut retries = 0;

        loop {
            // Slot wait and request share one deadline
            let call = async {
                let deadline = tokio::time::Instant::now() + timeout;
                if tokio::time::timeout_at(deadline, self.rate_limiter.wait())
                    .await
                    .is_err()
                {
                    return Err(ProviderError::Throttled {
                        waited_ms: timeout.as_millis() as u64,
                    });
                }
                match tokio::time::timeout_at(deadline, provider.search(&text, query.max_results()))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(ProviderError::Timeout {
                        timeout_ms: timeout.as_millis() as u64,
                    }),
                }
            };

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Attempt::Cancelled,
                outcome = call => outcome,
            };

            match outcome {
                Ok(results) if results.is_empty() => {
                    return Attempt::Recoverable(ProviderError::NoResults)
                }
                Ok(mut results) => {
                    results.truncate(query.max_results());
                    return Attempt::Success(results);
                }
                Err(error) if error.is_transient() && retries < self.config.provider_retries => {
                    retries += 1;
                    debug!(
                        provider = provider.name(),
                        error = %error,
                        "Transient provider error, retrying"
                    );
                    if !self.pause(cancel).await {
                        return Attempt::Cancelled;
                    }
                }
                Err(error) => return Attempt::Recoverable(error),
            }
        }
    }

    /// Fixed delay between network attempts; false if cancelled meanwhile
    async fn pause(&self, cancel: &CancellationToken) -> bool {
        let delay = self.config.attempt_delay();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }

    /// Configured providers in attempt order
    ///
    /// Sorted by tier, then healthy before unhealthy, then configuration
    /// order. Health is read once per provider so the order is consistent
    /// even while other searches update counters.
    fn ordered_providers(&self) -> Vec<Arc<dyn SearchProvider>> {
        let mut ranked: Vec<_> = self
            .providers
            .iter()
            .filter(|p| p.is_configured())
            .enumerate()
            .map(|(position, p)| {
                let unhealthy = !self.health.is_healthy(p.name());
                ((p.tier(), unhealthy, position), p.clone())
            })
            .collect();

        ranked.sort_by_key(|(rank, _)| *rank);
        ranked.into_iter().map(|(_, p)| p).collect()
    }

    fn cache_key(query: &SearchQuery) -> String {
        let max_results = query.max_results().to_string();
        let hints = query.domain_hints().join(",");
        cache_key("search", &[query.text(), &max_results, &hints])
    }

    /// Perform multiple searches concurrently
    ///
    /// # Arguments
    /// * `queries` - List of search queries
    /// * `num_results_per_query` - Optional number of results per query
    pub async fn batch_search(
        &self,
        queries: Vec<String>,
        num_results_per_query: Option<usize>,
    ) -> Vec<Result<SearchResponse, SearchError>> {
        let futures: Vec<_> = queries
            .iter()
            .map(|q| self.search(q, num_results_per_query))
            .collect();

        futures::future::join_all(futures).await
    }

    /// Check if search is enabled
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Names of configured providers in current attempt order
    pub fn available_providers(&self) -> Vec<&'static str> {
        self.ordered_providers().iter().map(|p| p.name()).collect()
    }

    /// Provider health, availability and cache statistics, read live
    pub fn provider_stats(&self) -> ProviderStats {
        let cache = self.cache.stats();
        let provider_health = self
            .providers
            .iter()
            .filter(|p| p.is_configured())
            .map(|p| (p.name().to_string(), self.health.health(p.name())))
            .collect();
        let configuration = self
            .providers
            .iter()
            .map(|p| (p.name().to_string(), p.is_configured()))
            .collect();

        ProviderStats {
            available_providers: self
                .available_providers()
                .into_iter()
                .map(String::from)
                .collect(),
            provider_health,
            cache_hit_rate: cache.hit_rate,
            cache,
            configuration,
        }
    }

    /// Shared health tracker
    pub fn health(&self) -> &HealthTracker {
        &self.health
    }

    /// Get cache statistics
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Clear the search cache
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }
}
