// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Extraction result and error types

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::profile::ContentCategory;

/// Method name reported for results served from the extraction cache
pub const CACHE_METHOD: &str = "cache";

/// Method name reported when the caller's snippet stands in for page text
pub const SNIPPET_METHOD: &str = "snippet";

/// Errors raised by a single extraction method
#[derive(Debug, Clone, Error, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MethodError {
    /// Non-success HTTP status
    #[error("HTTP {status}")]
    Http { status: u16 },

    /// Connection, DNS, TLS or body read failure
    #[error("Network error: {message}")]
    Network { message: String },

    /// Method did not finish within its timeout
    #[error("Timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Page fetched but yielded too little text
    #[error("Content too short ({chars} < {min} chars)")]
    TooShort { chars: usize, min: usize },

    /// A redirect pointed at a blocked or unsafe URL, or went on too long
    #[error("Redirect rejected: {reason}")]
    RedirectRejected { reason: String },

    /// Method has no way to handle this page
    #[error("Not applicable: {reason}")]
    NotApplicable { reason: String },

    /// The caller cancelled the extraction
    #[error("Cancelled")]
    Cancelled,
}

impl MethodError {
    /// Whether one more attempt with the same method may help
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network { .. } | Self::Timeout { .. } => true,
            Self::Http { status } => *status >= 500,
            _ => false,
        }
    }
}

/// One method's reason for failing an extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodFailure {
    pub method: String,
    pub error: MethodError,
}

impl fmt::Display for MethodFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.method, self.error)
    }
}

fn join_failures(failures: &[MethodFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Why an extraction produced no page text
#[derive(Debug, Clone, Error, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractionFailure {
    /// Host is in the blocked set; nothing was fetched
    #[error("blocked-domain ({rule})")]
    BlockedDomain { rule: String },

    /// Not an http(s) URL, or it points at a local/private host
    #[error("unsafe-url")]
    UnsafeUrl,

    /// Extraction is switched off
    #[error("extraction-disabled")]
    Disabled,

    /// Every method was tried and failed
    #[error("all methods failed: {}", join_failures(.failures))]
    AllMethodsFailed { failures: Vec<MethodFailure> },

    /// The caller cancelled the extraction
    #[error("cancelled")]
    Cancelled,
}

impl ExtractionFailure {
    /// Stable short code for the failure
    pub fn reason(&self) -> &'static str {
        match self {
            Self::BlockedDomain { .. } => "blocked-domain",
            Self::UnsafeUrl => "unsafe-url",
            Self::Disabled => "extraction-disabled",
            Self::AllMethodsFailed { .. } => "all-methods-failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Per-method reasons, empty unless every method failed
    pub fn method_failures(&self) -> &[MethodFailure] {
        match self {
            Self::AllMethodsFailed { failures } => failures,
            _ => &[],
        }
    }
}

/// Outcome of extracting one URL
///
/// Always produced, never raised: a failed extraction carries `failure`
/// and possibly degraded snippet text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub url: String,
    pub text: String,
    /// Winning method, `cache`, `snippet`, or empty on failure
    pub method: String,
    pub success: bool,
    pub char_count: usize,
    pub byte_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<ExtractionFailure>,
    /// Text is a stand-in (the search snippet), not the page itself
    pub degraded: bool,
    pub duration_ms: u64,
    pub category: ContentCategory,
}

impl ExtractionResult {
    pub fn succeeded(
        url: impl Into<String>,
        text: String,
        method: impl Into<String>,
        category: ContentCategory,
        duration_ms: u64,
    ) -> Self {
        Self {
            url: url.into(),
            char_count: text.chars().count(),
            byte_count: text.len(),
            text,
            method: method.into(),
            success: true,
            failure: None,
            degraded: false,
            duration_ms,
            category,
        }
    }

    pub fn failed(
        url: impl Into<String>,
        failure: ExtractionFailure,
        category: ContentCategory,
        duration_ms: u64,
    ) -> Self {
        Self {
            url: url.into(),
            text: String::new(),
            method: String::new(),
            success: false,
            char_count: 0,
            byte_count: 0,
            failure: Some(failure),
            degraded: false,
            duration_ms,
            category,
        }
    }

    /// Replace the missing page text with the caller's snippet
    ///
    /// Keeps the failure so callers can still see why extraction failed.
    pub fn with_snippet(mut self, snippet: &str) -> Self {
        let snippet = snippet.split_whitespace().collect::<Vec<_>>().join(" ");
        if self.success || snippet.is_empty() {
            return self;
        }
        self.char_count = snippet.chars().count();
        self.byte_count = snippet.len();
        self.text = snippet;
        self.method = SNIPPET_METHOD.to_string();
        self.degraded = true;
        self
    }

    /// Whether the result carries any usable text, page or snippet
    pub fn has_text(&self) -> bool {
        !self.text.is_empty()
    }

    pub fn failure_reason(&self) -> Option<&'static str> {
        self.failure.as_ref().map(ExtractionFailure::reason)
    }
}
