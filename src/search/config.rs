// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Configuration for web search functionality

use std::env;
use std::time::Duration;
use thiserror::Error;

/// Configuration validation and setup errors
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Configuration for web search functionality
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Whether web search is enabled
    pub enabled: bool,
    /// Provider credentials
    pub providers: ProviderCredentials,
    /// Per-provider request timeouts
    pub timeouts: ProviderTimeouts,
    /// Cache TTL in seconds
    pub cache_ttl_secs: u64,
    /// Maximum cached responses
    pub cache_max_entries: usize,
    /// Consecutive failures before a provider is considered unhealthy
    pub failure_threshold: u32,
    /// Extra attempts per provider for transient errors
    pub provider_retries: u32,
    /// Fixed delay between sequential provider attempts in milliseconds
    pub attempt_delay_ms: u64,
    /// Outbound request ceiling (requests per minute)
    pub rate_limit_per_minute: u32,
    /// Default number of results per search
    pub default_num_results: usize,
}

/// Provider credentials; absent credentials remove a provider entirely
#[derive(Debug, Clone, Default)]
pub struct ProviderCredentials {
    /// SerpAPI key (commercial tier)
    pub serp_api_key: Option<String>,
    /// Google Custom Search API key (official tier)
    pub google_search_api_key: Option<String>,
    /// Google Custom Search engine id
    pub google_search_engine_id: Option<String>,
    /// Secondary Custom Search JSON API key (official tier)
    pub gcp_search_api_key: Option<String>,
    /// Secondary Custom Search engine id
    pub gcp_search_engine_id: Option<String>,
}

impl ProviderCredentials {
    pub fn serp_api_configured(&self) -> bool {
        non_empty(&self.serp_api_key)
    }

    pub fn google_configured(&self) -> bool {
        non_empty(&self.google_search_api_key) && non_empty(&self.google_search_engine_id)
    }

    pub fn gcp_configured(&self) -> bool {
        non_empty(&self.gcp_search_api_key) && non_empty(&self.gcp_search_engine_id)
    }
}

/// Request timeouts per provider, in milliseconds
#[derive(Debug, Clone)]
pub struct ProviderTimeouts {
    pub serp_api_ms: u64,
    pub google_ms: u64,
    pub gcp_ms: u64,
    pub duckduckgo_ms: u64,
}

impl Default for ProviderTimeouts {
    fn default() -> Self {
        Self {
            serp_api_ms: 5000,
            google_ms: 4000,
            gcp_ms: 4000,
            duckduckgo_ms: 3000,
        }
    }
}

fn non_empty(value: &Option<String>) -> bool {
    value.as_deref().map_or(false, |v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_key(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl SearchConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let timeouts = ProviderTimeouts::default();

        Self {
            // DuckDuckGo needs no key, so search stays usable without credentials.
            // Set WEB_SEARCH_ENABLED=false to disable
            enabled: env::var("WEB_SEARCH_ENABLED")
                .map(|v| v.to_lowercase() != "false")
                .unwrap_or(true),
            providers: ProviderCredentials {
                serp_api_key: env_key("SERP_API_KEY"),
                google_search_api_key: env_key("GOOGLE_SEARCH_API_KEY"),
                google_search_engine_id: env_key("GOOGLE_SEARCH_ENGINE_ID"),
                gcp_search_api_key: env_key("GCP_SEARCH_API_KEY"),
                gcp_search_engine_id: env_key("GCP_SEARCH_ENGINE_ID"),
            },
            timeouts: ProviderTimeouts {
                serp_api_ms: env_parse("SEARCH_TIMEOUT_SERP_MS", timeouts.serp_api_ms),
                google_ms: env_parse("SEARCH_TIMEOUT_GOOGLE_MS", timeouts.google_ms),
                gcp_ms: env_parse("SEARCH_TIMEOUT_GCP_MS", timeouts.gcp_ms),
                duckduckgo_ms: env_parse("SEARCH_TIMEOUT_DDG_MS", timeouts.duckduckgo_ms),
            },
            cache_ttl_secs: env_parse("SEARCH_CACHE_TTL_SECS", defaults.cache_ttl_secs),
            cache_max_entries: env_parse("SEARCH_CACHE_MAX_ENTRIES", defaults.cache_max_entries),
            failure_threshold: env_parse("SEARCH_FAILURE_THRESHOLD", defaults.failure_threshold),
            provider_retries: env_parse("SEARCH_PROVIDER_RETRIES", defaults.provider_retries)
                .min(1),
            attempt_delay_ms: env_parse("SEARCH_ATTEMPT_DELAY_MS", defaults.attempt_delay_ms),
            rate_limit_per_minute: env_parse(
                "SEARCH_RATE_LIMIT_PER_MINUTE",
                defaults.rate_limit_per_minute,
            ),
            default_num_results: defaults.default_num_results,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        // DuckDuckGo is always available, so missing API keys are not an error
        if self.cache_ttl_secs == 0 {
            return Err(ConfigError::Invalid(
                "Cache TTL must be greater than 0".to_string(),
            ));
        }
        if self.failure_threshold == 0 {
            return Err(ConfigError::Invalid(
                "Failure threshold must be at least 1".to_string(),
            ));
        }
        if self.rate_limit_per_minute == 0 {
            return Err(ConfigError::Invalid(
                "Rate limit must be greater than 0".to_string(),
            ));
        }
        if self.provider_retries > 1 {
            return Err(ConfigError::Invalid(
                "At most one retry per provider is allowed".to_string(),
            ));
        }
        Ok(())
    }

    /// Check if any credentialed provider is configured
    pub fn has_any_provider(&self) -> bool {
        self.providers.serp_api_configured()
            || self.providers.google_configured()
            || self.providers.gcp_configured()
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn attempt_delay(&self) -> Duration {
        Duration::from_millis(self.attempt_delay_ms)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            enabled: true, // Enabled by default (DuckDuckGo needs no API key)
            providers: ProviderCredentials::default(),
            timeouts: ProviderTimeouts::default(),
            cache_ttl_secs: 1800,
            cache_max_entries: 500,
            failure_threshold: 5,
            provider_retries: 1,
            attempt_delay_ms: 250,
            rate_limit_per_minute: 60,
            default_num_results: 10,
        }
    }
}
