// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Configuration for content extraction
//!
//! Defines per-method timeouts, content limits, racing and caching.

use std::env;
use std::time::Duration;

use crate::search::config::ConfigError;

/// Configuration for content extraction
#[derive(Debug, Clone)]
pub struct ContentExtractionConfig {
    /// Enable content extraction (default: true)
    pub enabled: bool,
    /// Timeout per extraction method in seconds (default: 3)
    pub method_timeout_secs: u64,
    /// Minimum characters for a method to count as a success (default: 100)
    pub min_chars: usize,
    /// Maximum characters kept per page (default: 10000)
    pub max_chars: usize,
    /// Methods started concurrently; 1 means strictly sequential (default: 1)
    pub race_width: usize,
    /// Retries per method on transient errors, at most 1 (default: 0)
    pub method_retries: u32,
    /// Delay between sequential method attempts in ms (default: 100)
    pub method_delay_ms: u64,
    /// Maximum cached extractions (default: 1000)
    pub cache_max_entries: usize,
    /// Extra blocked domains, appended to the built-in set
    pub blocked_domains: Vec<String>,
    /// Permit loopback and private-network hosts (default: false)
    pub allow_private_hosts: bool,
}

impl ContentExtractionConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: env::var("CONTENT_EXTRACTION_ENABLED")
                .map(|v| v.to_lowercase() != "false")
                .unwrap_or(defaults.enabled),
            method_timeout_secs: env_parse(
                "CONTENT_METHOD_TIMEOUT_SECS",
                defaults.method_timeout_secs,
            ),
            min_chars: env_parse("CONTENT_MIN_CHARS", defaults.min_chars),
            max_chars: env_parse("CONTENT_MAX_CHARS", defaults.max_chars),
            race_width: env_parse("CONTENT_RACE_WIDTH", defaults.race_width),
            method_retries: env_parse("CONTENT_METHOD_RETRIES", defaults.method_retries),
            method_delay_ms: env_parse("CONTENT_METHOD_DELAY_MS", defaults.method_delay_ms),
            cache_max_entries: env_parse(
                "CONTENT_CACHE_MAX_ENTRIES",
                defaults.cache_max_entries,
            ),
            blocked_domains: env::var("CONTENT_BLOCKED_DOMAINS")
                .map(|v| {
                    v.split(',')
                        .map(|d| d.trim().to_string())
                        .filter(|d| !d.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            allow_private_hosts: false,
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.method_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "method_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.min_chars == 0 {
            return Err(ConfigError::Invalid(
                "min_chars must be at least 1".to_string(),
            ));
        }
        if self.max_chars < self.min_chars {
            return Err(ConfigError::Invalid(format!(
                "max_chars ({}) must not be below min_chars ({})",
                self.max_chars, self.min_chars
            )));
        }
        if self.race_width == 0 {
            return Err(ConfigError::Invalid(
                "race_width must be at least 1".to_string(),
            ));
        }
        if self.method_retries > 1 {
            return Err(ConfigError::Invalid(
                "method_retries must be 0 or 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn method_timeout(&self) -> Duration {
        Duration::from_secs(self.method_timeout_secs)
    }

    pub fn method_delay(&self) -> Duration {
        Duration::from_millis(self.method_delay_ms)
    }
}

impl Default for ContentExtractionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            method_timeout_secs: 3,
            min_chars: 100,
            max_chars: 10_000,
            race_width: 1,
            method_retries: 0,
            method_delay_ms: 100,
            cache_max_entries: 1000,
            blocked_domains: Vec::new(),
            allow_private_hosts: false,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
