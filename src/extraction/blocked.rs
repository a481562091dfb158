// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Blocked domains and the unsafe-URL guard
//!
//! Both checks run before any network call, and again on every redirect hop.

use std::net::IpAddr;
use url::{Host, Url};

use super::config::ContentExtractionConfig;
use super::types::ExtractionFailure;

/// Hosts known to reject automated fetches: paywalls, social media,
/// restricted academic portals and slow government archives
const BUILTIN_BLOCKED: &[&str] = &[
    // Financial paywalls
    "bloomberg.com",
    "bloomberg.co.uk",
    "wsj.com",
    "ft.com",
    "economist.com",
    "marketwatch.com",
    "barrons.com",
    // News paywalls
    "nytimes.com",
    "washingtonpost.com",
    "newyorker.com",
    "theatlantic.com",
    "vanityfair.com",
    // Tech paywalls
    "wired.com",
    "techcrunch.com",
    "arstechnica.com",
    "theverge.com",
    "engadget.com",
    "gizmodo.com",
    // Restricted academic portals
    "scholar.google.com",
    "patents.google.com",
    "jstor.org",
    "springer.com",
    "elsevier.com",
    "wiley.com",
    "tandfonline.com",
    "sagepub.com",
    // Government archives
    "sec.gov/Archives",
    "fda.gov/downloads",
    "govinfo.gov",
    "congress.gov/bill",
    // Social media
    "twitter.com",
    "x.com",
    "facebook.com",
    "instagram.com",
    "tiktok.com",
    "linkedin.com",
    "reddit.com",
    "pinterest.com",
    // Other
    "medium.com",
    "substack.com",
    "quora.com",
    "stackoverflow.com",
    "github.com/issues",
];

#[derive(Debug, Clone, PartialEq, Eq)]
struct BlockRule {
    domain: String,
    path_prefix: Option<String>,
}

impl BlockRule {
    fn parse(rule: &str) -> Option<Self> {
        let rule = rule
            .trim()
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_start_matches("www.")
            .trim_end_matches('/');
        if rule.is_empty() {
            return None;
        }

        let (domain, path) = match rule.split_once('/') {
            Some((domain, path)) => (domain, Some(format!("/{}", path.to_lowercase()))),
            None => (rule, None),
        };

        Some(Self {
            domain: domain.to_lowercase(),
            path_prefix: path,
        })
    }

    fn matches(&self, host: &str, path: &str) -> bool {
        let domain_match = host == self.domain
            || host
                .strip_suffix(self.domain.as_str())
                .is_some_and(|rest| rest.ends_with('.'));
        if !domain_match {
            return false;
        }

        match &self.path_prefix {
            Some(prefix) => path.to_lowercase().starts_with(prefix.as_str()),
            None => true,
        }
    }

    fn label(&self) -> String {
        match &self.path_prefix {
            Some(prefix) => format!("{}{}", self.domain, prefix),
            None => self.domain.clone(),
        }
    }
}

/// Domain suffixes, optionally narrowed by a path prefix, that are never fetched
#[derive(Debug, Clone, Default)]
pub struct BlockedDomainSet {
    rules: Vec<BlockRule>,
}

impl BlockedDomainSet {
    /// Empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in list
    pub fn builtin() -> Self {
        Self::from_rules(BUILTIN_BLOCKED.iter().copied())
    }

    /// Build from rules like `example.com` or `sec.gov/Archives`
    pub fn from_rules<I, S>(rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for rule in rules {
            set.add(rule.as_ref());
        }
        set
    }

    /// Add one rule; blank and duplicate rules are ignored
    pub fn add(&mut self, rule: &str) {
        if let Some(rule) = BlockRule::parse(rule) {
            if !self.rules.contains(&rule) {
                self.rules.push(rule);
            }
        }
    }

    /// The rule that blocks `url`, if any
    pub fn blocking_rule(&self, url: &Url) -> Option<String> {
        let host = url.host_str()?.to_lowercase();
        let host = host.trim_start_matches("www.");
        self.rules
            .iter()
            .find(|rule| rule.matches(host, url.path()))
            .map(BlockRule::label)
    }

    /// Whether `url` is blocked; unparseable URLs are not
    pub fn is_blocked(&self, url: &str) -> bool {
        Url::parse(url)
            .ok()
            .is_some_and(|u| self.blocking_rule(&u).is_some())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Blocked-domain filter plus the unsafe-URL check
#[derive(Debug, Clone)]
pub struct UrlGuard {
    blocked: BlockedDomainSet,
    allow_private_hosts: bool,
}

impl UrlGuard {
    pub fn new(blocked: BlockedDomainSet, allow_private_hosts: bool) -> Self {
        Self {
            blocked,
            allow_private_hosts,
        }
    }

    /// Built-in rules plus the configured extras
    pub fn for_config(config: &ContentExtractionConfig) -> Self {
        let mut blocked = BlockedDomainSet::builtin();
        for rule in &config.blocked_domains {
            blocked.add(rule);
        }
        Self::new(blocked, config.allow_private_hosts)
    }

    /// Reject blocked domains first, then unsafe hosts
    pub fn check(&self, url: &Url) -> Result<(), ExtractionFailure> {
        if let Some(rule) = self.blocked.blocking_rule(url) {
            return Err(ExtractionFailure::BlockedDomain { rule });
        }
        if !self.allow_private_hosts && !is_safe_url(url) {
            return Err(ExtractionFailure::UnsafeUrl);
        }
        Ok(())
    }

    pub fn blocked(&self) -> &BlockedDomainSet {
        &self.blocked
    }
}

/// Check if URL is safe to fetch (http/https, not localhost or a private IP)
pub fn is_safe_url(url: &Url) -> bool {
    if !["http", "https"].contains(&url.scheme()) {
        return false;
    }

    match url.host() {
        Some(Host::Domain(domain)) => {
            let domain = domain.to_lowercase();
            domain != "localhost" && !domain.ends_with(".localhost")
        }
        Some(Host::Ipv4(ip)) => is_public_ip(IpAddr::V4(ip)),
        Some(Host::Ipv6(ip)) => is_public_ip(IpAddr::V6(ip)),
        None => false,
    }
}

fn is_public_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(ip) => {
            !(ip.is_loopback()
                || ip.is_private()
                || ip.is_link_local()
                || ip.is_unspecified()
                || ip.is_broadcast())
        }
        IpAddr::V6(ip) => {
            let segments = ip.segments();
            let unique_local = (segments[0] & 0xfe00) == 0xfc00;
            let link_local = (segments[0] & 0xffc0) == 0xfe80;
            let mapped_private = ip
                .to_ipv4_mapped()
                .is_some_and(|v4| !is_public_ip(IpAddr::V4(v4)));
            !(ip.is_loopback() || ip.is_unspecified() || unique_local || link_local || mapped_private)
        }
    }
}
