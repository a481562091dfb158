// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Content extraction strategies
//!
//! Each strategy is one independent way of turning a URL into page text.
//! The orchestrator decides order, timeouts and retries; a strategy only
//! fetches and cleans.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL};
use reqwest::redirect::Policy;
use reqwest::Client;
use scraper::Html;
use std::sync::Arc;
use std::time::Duration;

use super::blocked::UrlGuard;
use super::config::ContentExtractionConfig;
use super::profile::PageProfile;
use super::text::{extract_main_content, extract_paragraphs, extract_with_selectors, GENERIC_SELECTORS};
use super::types::MethodError;
use crate::search::config::ConfigError;
use crate::search::http::BROWSER_USER_AGENT;

const MAX_REDIRECTS: usize = 5;

/// Agent for the alternate client, distinct from the primary one
const ALTERNATE_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:122.0) Gecko/20100101 Firefox/122.0";

/// One way of extracting page text
#[async_trait]
pub trait ExtractionStrategy: Send + Sync {
    /// Method name reported in results and failures
    fn name(&self) -> &'static str;

    /// Generic strategies apply to any page and run after domain-aware ones
    fn is_generic(&self) -> bool {
        true
    }

    /// Whether this strategy can handle the page at all
    fn supports(&self, _page: &PageProfile) -> bool {
        true
    }

    /// Fetch `url` and return its cleaned text
    ///
    /// Short text is returned as-is; the caller decides what is too short.
    async fn extract(&self, url: &str, page: &PageProfile) -> Result<String, MethodError>;
}

/// HTTP fetcher shared by the fetch-based strategies
#[derive(Clone)]
pub struct PageFetcher {
    client: Client,
    timeout: Duration,
}

impl PageFetcher {
    /// Create a fetcher with its own connection pool
    ///
    /// Every redirect hop is checked against `guard` before it is followed.
    pub fn new(
        user_agent: &str,
        timeout: Duration,
        headers: HeaderMap,
        guard: UrlGuard,
    ) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .default_headers(headers)
            .redirect(redirect_policy(guard))
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self { client, timeout })
    }

    /// Fetch a page body, failing on non-success statuses
    pub async fn fetch_html(&self, url: &str) -> Result<String, MethodError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MethodError::Http {
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| self.map_error(e))
    }

    fn map_error(&self, error: reqwest::Error) -> MethodError {
        if error.is_redirect() {
            // The policy's own message sits in the source
            let reason = std::error::Error::source(&error)
                .map(|source| source.to_string())
                .unwrap_or_else(|| error.to_string());
            MethodError::RedirectRejected { reason }
        } else if error.is_timeout() {
            MethodError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else {
            MethodError::Network {
                message: error.to_string(),
            }
        }
    }
}

fn redirect_policy(guard: UrlGuard) -> Policy {
    Policy::custom(move |attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            return attempt.error(format!("more than {} redirects", MAX_REDIRECTS));
        }
        match guard.check(attempt.url()) {
            Ok(()) => attempt.follow(),
            Err(failure) => {
                let reason = format!("{} ({})", failure, attempt.url());
                attempt.error(reason)
            }
        }
    })
}

/// Selectors tuned for one well-known site
pub struct SiteSpecificStrategy {
    fetcher: PageFetcher,
    min_chars: usize,
}

impl SiteSpecificStrategy {
    pub fn new(fetcher: PageFetcher, min_chars: usize) -> Self {
        Self { fetcher, min_chars }
    }
}

#[async_trait]
impl ExtractionStrategy for SiteSpecificStrategy {
    fn name(&self) -> &'static str {
        "site_specific"
    }

    fn is_generic(&self) -> bool {
        false
    }

    fn supports(&self, page: &PageProfile) -> bool {
        page.site.is_some()
    }

    async fn extract(&self, url: &str, page: &PageProfile) -> Result<String, MethodError> {
        let Some(site) = page.site else {
            return Err(MethodError::NotApplicable {
                reason: format!("no site profile for {}", page.host),
            });
        };

        let html = self.fetcher.fetch_html(url).await?;
        let document = Html::parse_document(&html);
        Ok(extract_with_selectors(&document, site.selectors, self.min_chars).unwrap_or_default())
    }
}

/// Category selectors, then generic content containers; never the whole body
pub struct StructuredFetchStrategy {
    fetcher: PageFetcher,
    min_chars: usize,
}

impl StructuredFetchStrategy {
    pub fn new(fetcher: PageFetcher, min_chars: usize) -> Self {
        Self { fetcher, min_chars }
    }
}

#[async_trait]
impl ExtractionStrategy for StructuredFetchStrategy {
    fn name(&self) -> &'static str {
        "structured_fetch"
    }

    fn is_generic(&self) -> bool {
        false
    }

    async fn extract(&self, url: &str, page: &PageProfile) -> Result<String, MethodError> {
        let html = self.fetcher.fetch_html(url).await?;
        let document = Html::parse_document(&html);
        let text = extract_with_selectors(&document, page.category.selectors(), self.min_chars)
            .or_else(|| extract_with_selectors(&document, GENERIC_SELECTORS, self.min_chars))
            .unwrap_or_default();
        Ok(text)
    }
}

/// Plain GET with generic selectors and a cleaned-body fallback
pub struct SimpleFetchStrategy {
    fetcher: PageFetcher,
    min_chars: usize,
}

impl SimpleFetchStrategy {
    pub fn new(fetcher: PageFetcher, min_chars: usize) -> Self {
        Self { fetcher, min_chars }
    }
}

#[async_trait]
impl ExtractionStrategy for SimpleFetchStrategy {
    fn name(&self) -> &'static str {
        "simple_fetch"
    }

    async fn extract(&self, url: &str, _page: &PageProfile) -> Result<String, MethodError> {
        let html = self.fetcher.fetch_html(url).await?;
        Ok(extract_main_content(&html, &[], self.min_chars))
    }
}

/// Second HTTP client with different headers, harvesting paragraph text
///
/// Some sites serve a stripped page to one agent and a full one to another.
pub struct AlternateClientStrategy {
    fetcher: PageFetcher,
    min_chars: usize,
}

impl AlternateClientStrategy {
    pub fn new(fetcher: PageFetcher, min_chars: usize) -> Self {
        Self { fetcher, min_chars }
    }
}

#[async_trait]
impl ExtractionStrategy for AlternateClientStrategy {
    fn name(&self) -> &'static str {
        "alternate_client"
    }

    async fn extract(&self, url: &str, page: &PageProfile) -> Result<String, MethodError> {
        let html = self.fetcher.fetch_html(url).await?;
        let paragraphs = extract_paragraphs(&html);
        if paragraphs.chars().count() >= self.min_chars {
            return Ok(paragraphs);
        }
        Ok(extract_main_content(&html, page.selectors(), self.min_chars))
    }
}

fn alternate_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
    headers
}

/// The built-in strategies in registration order
pub fn default_strategies(
    config: &ContentExtractionConfig,
) -> Result<Vec<Arc<dyn ExtractionStrategy>>, ConfigError> {
    let timeout = config.method_timeout();
    let guard = UrlGuard::for_config(config);
    let primary = PageFetcher::new(BROWSER_USER_AGENT, timeout, HeaderMap::new(), guard.clone())?;
    let alternate = PageFetcher::new(ALTERNATE_USER_AGENT, timeout, alternate_headers(), guard)?;
    let min_chars = config.min_chars;

    Ok(vec![
        Arc::new(SiteSpecificStrategy::new(primary.clone(), min_chars)),
        Arc::new(StructuredFetchStrategy::new(primary.clone(), min_chars)),
        Arc::new(SimpleFetchStrategy::new(primary, min_chars)),
        Arc::new(AlternateClientStrategy::new(alternate, min_chars)),
    ])
}
