// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Resilient search-and-extraction core
//!
//! [`search::UnifiedSearchService`] queries several web search providers
//! with health-aware failover and caching; [`extraction::ContentExtractor`]
//! turns result URLs into clean page text through a chain of fallback
//! methods.

pub mod cache;
pub mod cli;
pub mod extraction;
pub mod search;

pub use extraction::{ContentExtractionConfig, ContentExtractor, ExtractionResult};
pub use search::{SearchConfig, SearchError, SearchQuery, SearchResponse, UnifiedSearchService};
