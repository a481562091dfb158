// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Shared helpers: scripted providers and a local HTTP server

use async_trait::async_trait;
use axum::Router;
use factcheck_search::search::{
    ProviderError, ProviderTier, SearchConfig, SearchProvider, SearchResult, UnifiedSearchService,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Provider that replays scripted outcomes, then repeats a fallback
pub struct ScriptedProvider {
    name: &'static str,
    tier: ProviderTier,
    configured: bool,
    delay: Duration,
    timeout: Duration,
    script: Mutex<VecDeque<Result<Vec<SearchResult>, ProviderError>>>,
    fallback: Result<Vec<SearchResult>, ProviderError>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn succeeding(name: &'static str, tier: ProviderTier, count: usize) -> Self {
        Self {
            name,
            tier,
            configured: true,
            delay: Duration::ZERO,
            timeout: Duration::from_secs(5),
            script: Mutex::new(VecDeque::new()),
            fallback: Ok(results(name, tier, count)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(name: &'static str, tier: ProviderTier, error: ProviderError) -> Self {
        Self {
            fallback: Err(error),
            ..Self::succeeding(name, tier, 0)
        }
    }

    /// Outcomes returned, in order, before falling back
    pub fn then(self, outcome: Result<Vec<SearchResult>, ProviderError>) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(outcome);
        }
        self
    }

    pub fn unconfigured(mut self) -> Self {
        self.configured = false;
        self
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchProvider for ScriptedProvider {
    async fn search(
        &self,
        _query: &str,
        num_results: usize,
    ) -> Result<Vec<SearchResult>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let scripted = self.script.lock().unwrap().pop_front();
        let mut outcome = scripted.unwrap_or_else(|| self.fallback.clone());
        if let Ok(results) = outcome.as_mut() {
            results.truncate(num_results);
        }
        outcome
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn tier(&self) -> ProviderTier {
        self.tier
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}

pub fn results(source: &str, tier: ProviderTier, count: usize) -> Vec<SearchResult> {
    (0..count)
        .map(|i| {
            SearchResult::new(
                format!("{} result {}", source, i),
                format!("https://example.com/{}/{}", source, i),
                "snippet",
                source,
                tier.relevance_score(),
            )
        })
        .collect()
}

/// Config with no pacing so tests run fast
pub fn fast_config() -> SearchConfig {
    SearchConfig {
        attempt_delay_ms: 0,
        rate_limit_per_minute: 10_000,
        ..SearchConfig::default()
    }
}

pub fn service(config: SearchConfig, providers: &[Arc<ScriptedProvider>]) -> UnifiedSearchService {
    let providers = providers
        .iter()
        .map(|p| p.clone() as Arc<dyn SearchProvider>)
        .collect();
    UnifiedSearchService::with_providers(config, providers)
}

/// Serve `router` on an ephemeral local port and return its base URL
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}
