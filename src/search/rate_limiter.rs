// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Outbound rate ceiling for provider requests
//!
//! Shared by every provider: a burst of concurrent searches waits for quota
//! instead of hammering the backends into throttling us. Callers bound the
//! wait by the provider's timeout.

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as GovRateLimiter};
use std::num::NonZeroU32;

/// Rate limiter for search requests
pub struct SearchRateLimiter {
    limiter: GovRateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    requests_per_minute: u32,
}

impl SearchRateLimiter {
    /// Create a new rate limiter
    ///
    /// # Arguments
    /// * `requests_per_minute` - Maximum requests allowed per minute (0 becomes 60)
    pub fn new(requests_per_minute: u32) -> Self {
        let rpm = NonZeroU32::new(requests_per_minute)
            .or(NonZeroU32::new(60))
            .unwrap_or(NonZeroU32::MIN);
        let limiter = GovRateLimiter::direct(Quota::per_minute(rpm));

        Self {
            limiter,
            requests_per_minute: rpm.get(),
        }
    }

    /// Check whether a request is allowed right now without waiting
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }

    /// Wait until a request is allowed
    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }

    /// Get the configured requests per minute
    pub fn requests_per_minute(&self) -> u32 {
        self.requests_per_minute
    }
}
