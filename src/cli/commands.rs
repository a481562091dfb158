// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Result};
use clap::Args;
use serde::Serialize;
use tracing::info;

use crate::extraction::{ContentExtractionConfig, ContentExtractor, ExtractionResult};
use crate::search::{SearchConfig, SearchQuery, SearchResponse, UnifiedSearchService};

/// Arguments for the search command
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Query text
    pub query: String,

    /// Number of results (1-50)
    #[arg(long, short = 'n', default_value_t = 10)]
    pub num_results: usize,

    /// Restrict results to these domains
    #[arg(long, value_delimiter = ',')]
    pub domains: Vec<String>,

    /// Also extract page text for the top N results
    #[arg(long, default_value_t = 0)]
    pub extract_top: usize,

    /// Print JSON instead of a summary
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the extract command
#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// URLs to extract
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// Fallback text used when extraction fails (single URL only)
    #[arg(long)]
    pub snippet: Option<String>,

    /// Print JSON instead of a summary
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the providers command
#[derive(Args, Debug)]
pub struct ProvidersArgs {
    /// Print JSON instead of a summary
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchOutput {
    #[serde(flatten)]
    response: SearchResponse,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    extractions: Vec<ExtractionResult>,
}

/// Run one search and print the results
pub async fn search(args: SearchArgs) -> Result<()> {
    let service = UnifiedSearchService::new(SearchConfig::from_env())?;
    let query = SearchQuery::new(&args.query, args.num_results)?.with_domain_hints(args.domains);

    let response = service.search_query(&query).await?;
    info!(
        provider = %response.provider,
        results = response.result_count,
        "Search finished"
    );

    let mut extractions = Vec::new();
    if args.extract_top > 0 {
        let extractor = ContentExtractor::new(ContentExtractionConfig::from_env())?;
        for result in response.results.iter().take(args.extract_top) {
            extractions.push(
                extractor
                    .extract_or_snippet(&result.url, &result.snippet)
                    .await,
            );
        }
    }

    if args.json {
        let output = SearchOutput {
            response,
            extractions,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "{} results from {} in {}ms{}",
        response.result_count,
        response.provider,
        response.search_time_ms,
        if response.cached { " (cached)" } else { "" }
    );
    for failure in &response.provider_failures {
        println!("  skipped {}", failure);
    }
    for (i, result) in response.results.iter().enumerate() {
        println!("{:>2}. {}\n    {}\n    {}", i + 1, result.title, result.url, result.snippet);
    }
    for extraction in &extractions {
        print_extraction(extraction);
    }
    Ok(())
}

/// Extract pages and print the text
pub async fn extract(args: ExtractArgs) -> Result<()> {
    let extractor = ContentExtractor::new(ContentExtractionConfig::from_env())?;

    let results = match (&args.snippet, args.urls.as_slice()) {
        (Some(snippet), [url]) => vec![extractor.extract_or_snippet(url, snippet).await],
        (Some(_), _) => return Err(anyhow!("--snippet needs exactly one URL")),
        (None, urls) => extractor.extract_many(urls).await,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        results.iter().for_each(print_extraction);
    }
    Ok(())
}

/// Print provider configuration and health
pub fn providers(args: ProvidersArgs) -> Result<()> {
    let service = UnifiedSearchService::new(SearchConfig::from_env())?;
    let stats = service.provider_stats();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    for (name, configured) in &stats.configuration {
        println!(
            "{:<22} {}",
            name,
            if *configured { "configured" } else { "missing credentials" }
        );
    }
    println!("attempt order: {}", stats.available_providers.join(" -> "));
    Ok(())
}

fn print_extraction(result: &ExtractionResult) {
    match &result.failure {
        None => println!(
            "\n[{}] {} chars via {} ({}ms)\n{}",
            result.url, result.char_count, result.method, result.duration_ms, result.text
        ),
        Some(failure) if result.degraded => println!(
            "\n[{}] using snippet, extraction failed: {}\n{}",
            result.url, failure, result.text
        ),
        Some(failure) => println!("\n[{}] extraction failed: {}", result.url, failure),
    }
}
