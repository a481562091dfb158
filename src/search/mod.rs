// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Multi-provider web search
//!
//! Key features:
//! - Multiple search providers (SerpAPI, Google Custom Search, DuckDuckGo)
//! - Tiered, health-aware failover between providers
//! - TTL-based result caching
//! - Outbound rate limiting
//! - Cancellation of in-flight searches

pub mod config;
pub mod duckduckgo;
pub mod google;
pub mod health;
pub(crate) mod http;
pub mod provider;
pub mod rate_limiter;
pub mod serp_api;
pub mod service;
pub mod types;

// Re-export commonly used types
pub use config::{ConfigError, SearchConfig};
pub use health::{HealthTracker, ProviderHealth};
pub use provider::{ProviderKind, ProviderTier, SearchProvider};
pub use service::{ProviderStats, UnifiedSearchService};
pub use types::{
    ProviderError, ProviderFailure, SearchError, SearchQuery, SearchResponse, SearchResult,
};
