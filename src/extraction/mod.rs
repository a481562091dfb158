// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Content extraction from search result URLs
//!
//! Turns a URL into clean page text through a chain of fallback methods.
//!
//! ## Architecture
//!
//! ```text
//! URL → blocked-domain / unsafe-URL check → cache
//!     → strategies (site-specific, structured, simple, alternate client)
//!     → normalized, truncated text
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let extractor = ContentExtractor::new(ContentExtractionConfig::from_env())?;
//! let result = extractor.extract_or_snippet(&hit.url, &hit.snippet).await;
//! ```

pub mod blocked;
pub mod config;
pub mod extractor;
pub mod profile;
pub mod strategy;
pub mod text;
pub mod types;

pub use blocked::{BlockedDomainSet, UrlGuard};
pub use config::ContentExtractionConfig;
pub use extractor::ContentExtractor;
pub use profile::{ContentCategory, PageProfile};
pub use strategy::{ExtractionStrategy, PageFetcher};
pub use types::{ExtractionFailure, ExtractionResult, MethodError, MethodFailure};
