// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Keyless operation through the free HTML endpoint

use super::fixtures::{fast_config, serve};
use axum::response::Html;
use axum::routing::post;
use axum::Router;
use factcheck_search::search::duckduckgo::DuckDuckGoProvider;
use factcheck_search::search::{SearchConfig, SearchQuery, UnifiedSearchService};
use std::sync::Arc;
use std::time::Duration;

async fn results_page() -> Html<String> {
    let mut body = String::from("<html><body><div id=\"links\">");
    for i in 0..12 {
        body.push_str(&format!(
            r##"<div class="result results_links">
                 <h2 class="result__title">
                   <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fsite{i}.example.org%2Fpage&amp;rut=x">Result {i}</a>
                 </h2>
                 <a class="result__snippet" href="#">Snippet number {i}</a>
               </div>"##
        ));
    }
    body.push_str("</div></body></html>");
    Html(body)
}

async fn keyless_service() -> UnifiedSearchService {
    let base = serve(Router::new().route("/html/", post(results_page))).await;
    let ddg = DuckDuckGoProvider::new(Duration::from_secs(3))
        .unwrap()
        .with_endpoint(format!("{}/html/", base));
    UnifiedSearchService::with_providers(fast_config(), vec![Arc::new(ddg)])
}

#[test]
fn test_default_config_has_only_free_provider() {
    let service = UnifiedSearchService::new(SearchConfig::default()).unwrap();
    assert_eq!(service.available_providers(), vec!["duckduckgo"]);
}

#[tokio::test]
async fn test_search_without_any_keys() {
    let service = keyless_service().await;

    let response = service.search("climate change evidence", None).await.unwrap();

    assert_eq!(response.provider, "duckduckgo");
    assert!(!response.cached);
    assert!(!response.is_degraded());
    assert_eq!(response.results.len(), 10);
    assert_eq!(response.result_count, 10);
    for (i, result) in response.results.iter().enumerate() {
        assert_eq!(result.url, format!("https://site{}.example.org/page", i));
        assert_eq!(result.source, "duckduckgo");
        assert_eq!(result.relevance_score, 0.6);
        assert!(!result.title.is_empty());
    }
}

#[tokio::test]
async fn test_free_provider_respects_max_results() {
    let service = keyless_service().await;
    let query = SearchQuery::new("vaccine safety", 3).unwrap();

    let response = service.search_query(&query).await.unwrap();
    assert_eq!(response.results.len(), 3);

    let again = service.search_query(&query).await.unwrap();
    assert!(again.cached);
    assert_eq!(again.results, response.results);
}
