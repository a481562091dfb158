// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Failover, caching and cancellation through the unified search service

use super::fixtures::{fast_config, results, service, ScriptedProvider};
use factcheck_search::search::{ProviderError, ProviderTier, SearchError, SearchQuery};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_first_failure_falls_through_to_next_provider() {
    let p1 = Arc::new(ScriptedProvider::failing(
        "p1",
        ProviderTier::Commercial,
        ProviderError::Timeout { timeout_ms: 5000 },
    ));
    let p2 = Arc::new(ScriptedProvider::succeeding("p2", ProviderTier::Official, 5));
    let p3 = Arc::new(ScriptedProvider::succeeding("p3", ProviderTier::Free, 5));
    let service = service(fast_config(), &[p1.clone(), p2.clone(), p3.clone()]);

    let response = service.search("vaccine efficacy", Some(5)).await.unwrap();

    assert_eq!(response.provider, "p2");
    assert!(!response.cached);
    assert_eq!(response.result_count, 5);
    assert_eq!(p3.calls(), 0);

    // Exactly P1's reason is carried along
    assert_eq!(response.provider_failures.len(), 1);
    assert_eq!(response.provider_failures[0].provider, "p1");
    assert_eq!(
        response.provider_failures[0].error,
        ProviderError::Timeout { timeout_ms: 5000 }
    );
    assert!(response.is_degraded());

    assert_eq!(service.health().consecutive_failures("p1"), 1);
    assert_eq!(service.health().consecutive_failures("p2"), 0);
}

#[tokio::test]
async fn test_all_providers_failed_carries_every_reason() {
    let p1 = Arc::new(ScriptedProvider::failing(
        "p1",
        ProviderTier::Commercial,
        ProviderError::Auth { status: 401 },
    ));
    let p2 = Arc::new(ScriptedProvider::failing(
        "p2",
        ProviderTier::Official,
        ProviderError::RateLimited {
            retry_after_secs: 60,
        },
    ));
    let p3 = Arc::new(ScriptedProvider::failing(
        "p3",
        ProviderTier::Free,
        ProviderError::MalformedResponse {
            message: "bad html".to_string(),
        },
    ));
    let service = service(fast_config(), &[p1, p2, p3]);

    let error = service.search("query", None).await.unwrap_err();

    let providers: Vec<_> = error
        .provider_failures()
        .iter()
        .map(|f| f.provider.as_str())
        .collect();
    assert_eq!(providers, vec!["p1", "p2", "p3"]);

    let message = error.to_string();
    assert!(message.contains("p1: Authentication rejected (HTTP 401)"));
    assert!(message.contains("p2: Rate limited"));
    assert!(message.contains("p3: Malformed response: bad html"));
}

#[tokio::test]
async fn test_empty_results_fall_through_without_health_penalty() {
    let p1 = Arc::new(ScriptedProvider::succeeding("p1", ProviderTier::Commercial, 0));
    let p2 = Arc::new(ScriptedProvider::succeeding("p2", ProviderTier::Free, 3));
    let service = service(fast_config(), &[p1, p2]);

    let response = service.search("obscure query", None).await.unwrap();
    assert_eq!(response.provider, "p2");
    assert_eq!(
        response.provider_failures[0].error,
        ProviderError::NoResults
    );
    assert_eq!(service.health().consecutive_failures("p1"), 0);
}

#[tokio::test]
async fn test_never_returns_empty_success() {
    let p1 = Arc::new(ScriptedProvider::succeeding("p1", ProviderTier::Free, 0));
    let service = service(fast_config(), &[p1]);

    let error = service.search("nothing here", None).await.unwrap_err();
    assert!(matches!(error, SearchError::AllProvidersFailed { .. }));
}

#[tokio::test]
async fn test_repeat_query_served_from_cache() {
    let p1 = Arc::new(ScriptedProvider::succeeding("p1", ProviderTier::Free, 4));
    let service = service(fast_config(), &[p1.clone()]);

    let first = service.search("Climate change", Some(4)).await.unwrap();
    let second = service.search("  climate   CHANGE ", Some(4)).await.unwrap();

    assert!(!first.cached);
    assert!(second.cached);
    assert_eq!(second.results, first.results);
    assert_eq!(p1.calls(), 1);

    let stats = service.cache_stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
}

#[tokio::test]
async fn test_cached_response_drops_fallback_failures() {
    let p1 = Arc::new(ScriptedProvider::failing(
        "p1",
        ProviderTier::Commercial,
        ProviderError::Network {
            message: "refused".to_string(),
        },
    ));
    let p2 = Arc::new(ScriptedProvider::succeeding("p2", ProviderTier::Free, 2));
    let service = service(fast_config(), &[p1, p2]);

    let first = service.search("q", None).await.unwrap();
    let second = service.search("q", None).await.unwrap();
    assert!(first.is_degraded());
    assert!(second.cached);
    assert!(second.provider_failures.is_empty());
}

#[tokio::test]
async fn test_cache_expiry_forces_provider_call() {
    let p1 = Arc::new(ScriptedProvider::succeeding("p1", ProviderTier::Free, 2));
    let mut config = fast_config();
    config.cache_ttl_secs = 1;
    let service = service(config, &[p1.clone()]);

    service.search("ttl", None).await.unwrap();
    tokio::time::sleep(Duration::from_millis(1100)).await;
    let response = service.search("ttl", None).await.unwrap();

    assert!(!response.cached);
    assert_eq!(p1.calls(), 2);
    assert_eq!(service.cache_stats().expirations, 1);
}

#[tokio::test]
async fn test_different_max_results_are_cached_separately() {
    let p1 = Arc::new(ScriptedProvider::succeeding("p1", ProviderTier::Free, 10));
    let service = service(fast_config(), &[p1.clone()]);

    let five = service.search("q", Some(5)).await.unwrap();
    let ten = service.search("q", Some(10)).await.unwrap();
    assert_eq!(five.result_count, 5);
    assert_eq!(ten.result_count, 10);
    assert!(!ten.cached);
    assert_eq!(p1.calls(), 2);
}

#[tokio::test]
async fn test_provider_timeout_is_enforced() {
    let slow = Arc::new(
        ScriptedProvider::succeeding("slow", ProviderTier::Commercial, 3)
            .slow(Duration::from_secs(5))
            .with_timeout(Duration::from_millis(100)),
    );
    let backup = Arc::new(ScriptedProvider::succeeding("backup", ProviderTier::Free, 3));
    let mut config = fast_config();
    config.provider_retries = 0;
    let service = service(config, &[slow.clone(), backup]);

    let start = Instant::now();
    let response = service.search("q", None).await.unwrap();

    assert!(start.elapsed() < Duration::from_secs(2));
    assert_eq!(response.provider, "backup");
    assert_eq!(
        response.provider_failures[0].error,
        ProviderError::Timeout { timeout_ms: 100 }
    );
    assert_eq!(service.health().consecutive_failures("slow"), 1);
}

#[tokio::test]
async fn test_exhausted_request_ceiling_bounded_by_provider_timeouts() {
    let primary = Arc::new(
        ScriptedProvider::succeeding("primary", ProviderTier::Commercial, 3)
            .with_timeout(Duration::from_millis(100)),
    );
    let backup = Arc::new(
        ScriptedProvider::succeeding("backup", ProviderTier::Free, 3)
            .with_timeout(Duration::from_millis(100)),
    );
    let mut config = fast_config();
    config.rate_limit_per_minute = 1;
    let service = service(config, &[primary.clone(), backup.clone()]);

    service.search("first query", None).await.unwrap();

    // The only slot this minute is spent, so both turns run out of time waiting
    let start = Instant::now();
    let error = service.search("second query", None).await.unwrap_err();

    assert!(start.elapsed() < Duration::from_secs(1));
    let reasons: Vec<_> = error
        .provider_failures()
        .iter()
        .map(|f| (f.provider.as_str(), f.error.clone()))
        .collect();
    assert_eq!(
        reasons,
        vec![
            ("primary", ProviderError::Throttled { waited_ms: 100 }),
            ("backup", ProviderError::Throttled { waited_ms: 100 }),
        ]
    );
    assert_eq!(primary.calls(), 1);
    assert_eq!(backup.calls(), 0);
    // Local throttling is not the providers' fault
    assert_eq!(service.health().consecutive_failures("primary"), 0);
    assert_eq!(service.health().consecutive_failures("backup"), 0);
}

#[tokio::test]
async fn test_transient_error_retried_once() {
    let flaky = Arc::new(
        ScriptedProvider::succeeding("flaky", ProviderTier::Commercial, 2).then(Err(
            ProviderError::Network {
                message: "connection reset".to_string(),
            },
        )),
    );
    let service = service(fast_config(), &[flaky.clone()]);

    let response = service.search("q", None).await.unwrap();
    assert_eq!(response.provider, "flaky");
    assert!(response.provider_failures.is_empty());
    assert_eq!(flaky.calls(), 2);
}

#[tokio::test]
async fn test_non_transient_error_not_retried() {
    let auth = Arc::new(ScriptedProvider::failing(
        "auth",
        ProviderTier::Commercial,
        ProviderError::Auth { status: 403 },
    ));
    let service = service(fast_config(), &[auth.clone()]);

    let _ = service.search("q", None).await;
    assert_eq!(auth.calls(), 1);
}

#[tokio::test]
async fn test_unconfigured_provider_never_called() {
    let missing = Arc::new(
        ScriptedProvider::succeeding("missing", ProviderTier::Commercial, 3).unconfigured(),
    );
    let free = Arc::new(ScriptedProvider::succeeding("free", ProviderTier::Free, 3));
    let service = service(fast_config(), &[missing.clone(), free]);

    let response = service.search("q", None).await.unwrap();
    assert_eq!(response.provider, "free");
    assert_eq!(missing.calls(), 0);
    assert_eq!(service.available_providers(), vec!["free"]);
}

#[tokio::test]
async fn test_no_configured_providers() {
    let missing = Arc::new(
        ScriptedProvider::succeeding("missing", ProviderTier::Commercial, 3).unconfigured(),
    );
    let service = service(fast_config(), &[missing]);

    let error = service.search("q", None).await.unwrap_err();
    assert!(matches!(error, SearchError::NoProviders));
}

#[tokio::test]
async fn test_cancellation_does_not_touch_health() {
    let slow = Arc::new(
        ScriptedProvider::succeeding("slow", ProviderTier::Commercial, 3)
            .slow(Duration::from_secs(5)),
    );
    let service = service(fast_config(), &[slow.clone()]);
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let query = SearchQuery::new("q", 5).unwrap();
    let start = Instant::now();
    let error = service
        .search_with_cancel(&query, &cancel)
        .await
        .unwrap_err();

    assert!(matches!(error, SearchError::Cancelled));
    assert!(start.elapsed() < Duration::from_secs(2));
    let health = service.health().health("slow");
    assert_eq!(health.consecutive_failures, 0);
    assert_eq!(health.total_failures, 0);
    assert_eq!(health.total_successes, 0);
}

#[tokio::test]
async fn test_dropped_search_records_nothing() {
    let slow = Arc::new(
        ScriptedProvider::succeeding("slow", ProviderTier::Commercial, 3)
            .slow(Duration::from_secs(5)),
    );
    let service = service(fast_config(), &[slow.clone()]);

    let outcome = tokio::time::timeout(Duration::from_millis(50), service.search("q", None)).await;
    assert!(outcome.is_err());
    assert_eq!(slow.calls(), 1);
    assert!(service.health().snapshot().is_empty());
}

#[tokio::test]
async fn test_concurrent_searches_share_one_service() {
    let p1 = Arc::new(ScriptedProvider::succeeding("p1", ProviderTier::Free, 3));
    let service = Arc::new(service(fast_config(), &[p1.clone()]));

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let service = service.clone();
            tokio::spawn(async move { service.search(&format!("query {}", i % 4), None).await })
        })
        .collect();

    for handle in handles {
        let response = handle.await.unwrap().unwrap();
        assert_eq!(response.provider, "p1");
    }
    // At least one call per distinct query, never more than one per search
    assert!(p1.calls() >= 4 && p1.calls() <= 16);
    assert_eq!(service.health().health("p1").total_successes as usize, p1.calls());
}

#[tokio::test]
async fn test_batch_search_keeps_query_order() {
    let p1 = Arc::new(ScriptedProvider::succeeding("p1", ProviderTier::Free, 2));
    let service = service(fast_config(), &[p1]);

    let responses = service
        .batch_search(
            vec!["first".to_string(), "   ".to_string(), "third".to_string()],
            Some(2),
        )
        .await;

    assert_eq!(responses.len(), 3);
    assert_eq!(responses[0].as_ref().unwrap().query, "first");
    assert!(matches!(responses[1], Err(SearchError::InvalidQuery { .. })));
    assert_eq!(responses[2].as_ref().unwrap().query, "third");
}

#[tokio::test]
async fn test_results_keep_provider_order_and_score() {
    let p1 = Arc::new(ScriptedProvider::succeeding("p1", ProviderTier::Official, 3));
    let service = service(fast_config(), &[p1]);

    let response = service.search("q", Some(3)).await.unwrap();
    assert_eq!(response.results, results("p1", ProviderTier::Official, 3));
    assert!(response.results.iter().all(|r| r.relevance_score == 0.75));
}

#[tokio::test]
async fn test_disabled_service() {
    let p1 = Arc::new(ScriptedProvider::succeeding("p1", ProviderTier::Free, 2));
    let mut config = fast_config();
    config.enabled = false;
    let service = service(config, &[p1.clone()]);

    let error = service.search("q", None).await.unwrap_err();
    assert!(matches!(error, SearchError::SearchDisabled));
    assert_eq!(p1.calls(), 0);
}
