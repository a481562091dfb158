// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Per-provider health tracking
//!
//! A provider becomes unhealthy after `threshold` consecutive failures and
//! recovers on its next success. Health is derived whenever it is read, so a
//! snapshot always reflects the counters at that instant.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

/// Default consecutive failures before a provider is deprioritized
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;

#[derive(Debug, Clone, Default)]
struct HealthCounters {
    consecutive_failures: u32,
    total_successes: u64,
    total_failures: u64,
    last_success: Option<DateTime<Utc>>,
    last_failure: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

/// Point-in-time health of one provider
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderHealth {
    pub provider: String,
    pub consecutive_failures: u32,
    pub healthy: bool,
    pub total_successes: u64,
    pub total_failures: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_success: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_failure: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Thread-safe consecutive-failure tracker
pub struct HealthTracker {
    providers: Mutex<HashMap<String, HealthCounters>>,
    threshold: u32,
}

impl HealthTracker {
    /// Create a tracker; a zero threshold is raised to 1
    pub fn new(threshold: u32) -> Self {
        Self {
            providers: Mutex::new(HashMap::new()),
            threshold: threshold.max(1),
        }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Record a successful attempt; always resets the failure streak
    pub fn record_success(&self, provider: &str) {
        if let Ok(mut providers) = self.providers.lock() {
            let counters = providers.entry(provider.to_string()).or_default();
            counters.consecutive_failures = 0;
            counters.total_successes += 1;
            counters.last_success = Some(Utc::now());
        }
    }

    /// Record a failed attempt
    pub fn record_failure(&self, provider: &str, reason: &str) {
        if let Ok(mut providers) = self.providers.lock() {
            let counters = providers.entry(provider.to_string()).or_default();
            counters.consecutive_failures = counters.consecutive_failures.saturating_add(1);
            counters.total_failures += 1;
            counters.last_failure = Some(Utc::now());
            counters.last_error = Some(reason.to_string());
        }
    }

    /// Whether the provider is below the failure threshold
    ///
    /// Providers never seen before are healthy.
    pub fn is_healthy(&self, provider: &str) -> bool {
        self.consecutive_failures(provider) < self.threshold
    }

    pub fn consecutive_failures(&self, provider: &str) -> u32 {
        self.providers
            .lock()
            .ok()
            .and_then(|providers| providers.get(provider).map(|c| c.consecutive_failures))
            .unwrap_or(0)
    }

    /// Health of one provider, derived now
    pub fn health(&self, provider: &str) -> ProviderHealth {
        let counters = self
            .providers
            .lock()
            .ok()
            .and_then(|providers| providers.get(provider).cloned())
            .unwrap_or_default();
        self.to_health(provider, counters)
    }

    /// Health of every provider that has been recorded, keyed by name
    pub fn snapshot(&self) -> BTreeMap<String, ProviderHealth> {
        let providers = match self.providers.lock() {
            Ok(providers) => providers.clone(),
            Err(_) => return BTreeMap::new(),
        };

        providers
            .into_iter()
            .map(|(name, counters)| {
                let health = self.to_health(&name, counters);
                (name, health)
            })
            .collect()
    }

    /// Forget all history
    pub fn reset(&self) {
        if let Ok(mut providers) = self.providers.lock() {
            providers.clear();
        }
    }

    fn to_health(&self, provider: &str, counters: HealthCounters) -> ProviderHealth {
        ProviderHealth {
            provider: provider.to_string(),
            consecutive_failures: counters.consecutive_failures,
            healthy: counters.consecutive_failures < self.threshold,
            total_successes: counters.total_successes,
            total_failures: counters.total_failures,
            last_success: counters.last_success,
            last_failure: counters.last_failure,
            last_error: counters.last_error,
        }
    }
}

impl Default for HealthTracker {
    fn default() -> Self {
        Self::new(DEFAULT_FAILURE_THRESHOLD)
    }
}
