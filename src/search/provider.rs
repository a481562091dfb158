// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Search provider trait definition

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use super::types::{ProviderError, SearchResult};

/// Quality tier of a provider; lower rank is tried first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderTier {
    /// Paid, highest quality API
    Commercial,
    /// First-party search vendor API
    Official,
    /// Keyless fallback
    Free,
}

impl ProviderTier {
    pub fn rank(self) -> u8 {
        match self {
            Self::Commercial => 0,
            Self::Official => 1,
            Self::Free => 2,
        }
    }

    /// Relevance score assigned to every result from this tier
    pub fn relevance_score(self) -> f64 {
        match self {
            Self::Commercial => 0.8,
            Self::Official => 0.75,
            Self::Free => 0.6,
        }
    }
}

/// The closed set of backends the service knows how to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    SerpApi,
    GoogleCustomSearch,
    GcpSearch,
    DuckDuckGo,
}

impl ProviderKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::SerpApi => "serp_api",
            Self::GoogleCustomSearch => "google_custom_search",
            Self::GcpSearch => "gcp_search",
            Self::DuckDuckGo => "duckduckgo",
        }
    }

    pub fn tier(self) -> ProviderTier {
        match self {
            Self::SerpApi => ProviderTier::Commercial,
            Self::GoogleCustomSearch | Self::GcpSearch => ProviderTier::Official,
            Self::DuckDuckGo => ProviderTier::Free,
        }
    }
}

/// Trait for implementing search providers
///
/// Search providers implement this trait to provide web search functionality.
/// Multiple providers can be configured with automatic failover.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Perform a web search
    ///
    /// # Arguments
    /// * `query` - The search query string
    /// * `num_results` - Maximum number of results to return
    ///
    /// # Returns
    /// Results in provider order, each carrying this provider's relevance score
    async fn search(
        &self,
        query: &str,
        num_results: usize,
    ) -> Result<Vec<SearchResult>, ProviderError>;

    /// Get the provider name for logging and health tracking
    fn name(&self) -> &'static str;

    /// Quality tier used for ordering
    fn tier(&self) -> ProviderTier;

    /// Check if the provider has the credentials it needs
    fn is_configured(&self) -> bool;

    /// Upper bound for a single request to this provider
    fn timeout(&self) -> Duration {
        Duration::from_secs(5)
    }
}
