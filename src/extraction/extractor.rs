// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Content extraction orchestration
//!
//! Runs extraction strategies for a URL until one yields enough text.
//! Strategies run one after another by default; with `race_width > 1` the
//! leading strategies are started together and the first success wins.

use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use super::blocked::{BlockedDomainSet, UrlGuard};
use super::config::ContentExtractionConfig;
use super::profile::{ContentCategory, PageProfile};
use super::strategy::{default_strategies, ExtractionStrategy};
use super::text::{clean_text, truncate_content};
use super::types::{ExtractionFailure, ExtractionResult, MethodError, MethodFailure, CACHE_METHOD};
use crate::cache::{cache_key, CacheStats, TtlCache};
use crate::search::config::ConfigError;

/// Extraction orchestrator with blocked-domain filter and result cache
pub struct ContentExtractor {
    strategies: Vec<Arc<dyn ExtractionStrategy>>,
    guard: UrlGuard,
    cache: TtlCache<String>,
    config: ContentExtractionConfig,
}

impl ContentExtractor {
    /// Create an extractor with the built-in strategies
    pub fn new(config: ContentExtractionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let strategies = default_strategies(&config)?;
        Ok(Self::with_strategies(config, strategies))
    }

    /// Create an extractor over an explicit strategy set
    ///
    /// Registration order is the attempt order among strategies of the same
    /// kind (domain-aware or generic).
    pub fn with_strategies(
        config: ContentExtractionConfig,
        strategies: Vec<Arc<dyn ExtractionStrategy>>,
    ) -> Self {
        Self {
            strategies,
            guard: UrlGuard::for_config(&config),
            cache: TtlCache::new(config.cache_max_entries),
            config,
        }
    }

    /// Extract the main text of a page
    ///
    /// Never fails: problems are reported through `ExtractionResult::failure`.
    pub async fn extract(&self, url: &str) -> ExtractionResult {
        self.extract_with_cancel(url, &CancellationToken::new()).await
    }

    /// Extract, substituting `snippet` as degraded text if every method fails
    pub async fn extract_or_snippet(&self, url: &str, snippet: &str) -> ExtractionResult {
        self.extract(url).await.with_snippet(snippet)
    }

    /// Extract a page; cancellation stops in-flight fetches
    pub async fn extract_with_cancel(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> ExtractionResult {
        let start = Instant::now();
        let elapsed_ms = || start.elapsed().as_millis() as u64;

        if !self.config.enabled {
            return ExtractionResult::failed(
                url,
                ExtractionFailure::Disabled,
                ContentCategory::General,
                elapsed_ms(),
            );
        }

        let Ok(parsed) = Url::parse(url.trim()) else {
            debug!(url, "Unparseable URL");
            return ExtractionResult::failed(
                url,
                ExtractionFailure::UnsafeUrl,
                ContentCategory::General,
                elapsed_ms(),
            );
        };
        let page = PageProfile::for_url(&parsed);

        if let Err(failure) = self.guard.check(&parsed) {
            match &failure {
                ExtractionFailure::BlockedDomain { rule } => {
                    debug!(url, rule = %rule, "Blocked domain, skipping extraction")
                }
                _ => warn!(url, "Unsafe URL blocked"),
            }
            return ExtractionResult::failed(url, failure, page.category, elapsed_ms());
        }

        let key = Self::cache_key(&parsed);
        if let Some(text) = self.cache.get(&key) {
            debug!(url, "Content cache hit");
            return ExtractionResult::succeeded(url, text, CACHE_METHOD, page.category, elapsed_ms());
        }

        match self.run_plan(url, &page, cancel).await {
            Ok((method, text)) => {
                let text = truncate_content(&text, self.config.max_chars);
                self.cache
                    .set(key, text.clone(), page.category.cache_ttl());

                let result =
                    ExtractionResult::succeeded(url, text, method, page.category, elapsed_ms());
                info!(
                    url,
                    method,
                    chars = result.char_count,
                    elapsed_ms = result.duration_ms,
                    "Extracted content"
                );
                result
            }
            Err(failure) => {
                match &failure {
                    ExtractionFailure::Cancelled => info!(url, "Extraction cancelled by caller"),
                    other => warn!(url, reason = %other, "Extraction failed"),
                }
                ExtractionResult::failed(url, failure, page.category, elapsed_ms())
            }
        }
    }

    /// Extract several pages concurrently, results in input order
    pub async fn extract_many(&self, urls: &[String]) -> Vec<ExtractionResult> {
        let futures: Vec<_> = urls.iter().map(|url| self.extract(url)).collect();
        futures::future::join_all(futures).await
    }

    /// Strategies for `page` in attempt order
    ///
    /// Domain-aware strategies that support the page come first, then the
    /// generic set; registration order is kept within each group.
    fn plan(&self, page: &PageProfile) -> Vec<Arc<dyn ExtractionStrategy>> {
        let mut plan: Vec<_> = self
            .strategies
            .iter()
            .filter(|s| s.supports(page))
            .cloned()
            .collect();
        plan.sort_by_key(|s| s.is_generic());
        plan
    }

    /// Method names that would be tried for `url`, in order
    pub fn method_order(&self, url: &str) -> Vec<&'static str> {
        let page = Url::parse(url)
            .map(|u| PageProfile::for_url(&u))
            .unwrap_or_else(|_| PageProfile::for_host(""));
        self.plan(&page).iter().map(|s| s.name()).collect()
    }

    async fn run_plan(
        &self,
        url: &str,
        page: &PageProfile,
        cancel: &CancellationToken,
    ) -> Result<(&'static str, String), ExtractionFailure> {
        let plan = self.plan(page);
        let width = if self.config.race_width > 1 {
            self.config.race_width.min(plan.len())
        } else {
            0
        };
        let (raced, sequential) = plan.split_at(width);
        let mut failures = Vec::new();

        if !raced.is_empty() {
            match self.race(raced, url, page, cancel).await {
                Ok(winner) => return Ok(winner),
                Err(ExtractionFailure::AllMethodsFailed { failures: lost }) => {
                    failures.extend(lost)
                }
                Err(other) => return Err(other),
            }
        }

        for strategy in sequential {
            if !failures.is_empty() && !self.pause(cancel).await {
                return Err(ExtractionFailure::Cancelled);
            }

            match self.attempt(strategy.as_ref(), url, page, cancel).await {
                Ok(text) => return Ok((strategy.name(), text)),
                Err(MethodError::Cancelled) => return Err(ExtractionFailure::Cancelled),
                Err(error) => {
                    debug!(method = strategy.name(), url, error = %error, "Extraction method failed");
                    failures.push(MethodFailure {
                        method: strategy.name().to_string(),
                        error,
                    });
                }
            }
        }

        Err(ExtractionFailure::AllMethodsFailed { failures })
    }

    /// Start every strategy in `raced` at once; first success wins
    ///
    /// Returning drops the remaining futures, which cancels their requests.
    /// Failures are listed in completion order.
    async fn race(
        &self,
        raced: &[Arc<dyn ExtractionStrategy>],
        url: &str,
        page: &PageProfile,
        cancel: &CancellationToken,
    ) -> Result<(&'static str, String), ExtractionFailure> {
        let mut racing: FuturesUnordered<_> = raced
            .iter()
            .map(|strategy| async move {
                let outcome = self.attempt(strategy.as_ref(), url, page, cancel).await;
                (strategy.name(), outcome)
            })
            .collect();

        let mut failures = Vec::new();
        while let Some((method, outcome)) = racing.next().await {
            match outcome {
                Ok(text) => {
                    debug!(method, url, lost = failures.len(), "Extraction race won");
                    return Ok((method, text));
                }
                Err(MethodError::Cancelled) => return Err(ExtractionFailure::Cancelled),
                Err(error) => failures.push(MethodFailure {
                    method: method.to_string(),
                    error,
                }),
            }
        }

        Err(ExtractionFailure::AllMethodsFailed { failures })
    }

    /// Run one strategy under its timeout, retrying transient errors
    async fn attempt(
        &self,
        strategy: &dyn ExtractionStrategy,
        url: &str,
        page: &PageProfile,
        cancel: &CancellationToken,
    ) -> Result<String, MethodError> {
        let timeout = self.config.method_timeout();
        let min = self.config.min_chars;
        let mut retries = 0;

        loop {
            let call = async {
                match tokio::time::timeout(timeout, strategy.extract(url, page)).await {
                    Ok(result) => result,
                    Err(_) => Err(MethodError::Timeout {
                        timeout_ms: timeout.as_millis() as u64,
                    }),
                }
            };

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(MethodError::Cancelled),
                outcome = call => outcome,
            };

            let error = match outcome {
                Ok(text) => {
                    let text = clean_text(&text);
                    let chars = text.chars().count();
                    if chars >= min {
                        return Ok(text);
                    }
                    MethodError::TooShort { chars, min }
                }
                Err(error) => error,
            };

            if error.is_transient() && retries < self.config.method_retries {
                retries += 1;
                debug!(method = strategy.name(), url, error = %error, "Transient method error, retrying");
                if !self.pause(cancel).await {
                    return Err(MethodError::Cancelled);
                }
                continue;
            }

            return Err(error);
        }
    }

    /// Fixed delay between sequential attempts; false if cancelled meanwhile
    async fn pause(&self, cancel: &CancellationToken) -> bool {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => false,
            _ = tokio::time::sleep(self.config.method_delay()) => true,
        }
    }

    fn cache_key(url: &Url) -> String {
        let mut normalized = url.clone();
        normalized.set_fragment(None);
        // URL paths are case-sensitive; hex keeps them distinct after key normalization
        cache_key("extract", &[&hex::encode(normalized.as_str())])
    }

    /// Whether `url` would be rejected by the blocked-domain filter
    pub fn is_blocked(&self, url: &str) -> bool {
        self.guard.blocked().is_blocked(url)
    }

    pub fn blocked_domains(&self) -> &BlockedDomainSet {
        self.guard.blocked()
    }

    /// Get cache statistics
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Clear the extraction cache
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Check if content extraction is enabled
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn config(&self) -> &ContentExtractionConfig {
        &self.config
    }
}
