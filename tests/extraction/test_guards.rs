// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! URL guards that run before any fetch

use super::fixtures::serve_pages;
use factcheck_search::extraction::{
    BlockedDomainSet, ContentExtractionConfig, ContentExtractor, ExtractionFailure,
};

#[tokio::test]
async fn test_loopback_rejected_by_default() {
    let server = serve_pages().await;
    let extractor = ContentExtractor::new(ContentExtractionConfig::default()).unwrap();

    let result = extractor.extract(&server.url("/article")).await;

    assert!(!result.success);
    assert_eq!(result.failure, Some(ExtractionFailure::UnsafeUrl));
    assert_eq!(server.hits(), 0);
}

#[tokio::test]
async fn test_private_and_odd_urls_rejected() {
    let extractor = ContentExtractor::new(ContentExtractionConfig::default()).unwrap();

    for url in [
        "http://localhost:8080/admin",
        "http://10.0.0.7/internal",
        "http://192.168.1.1/",
        "http://169.254.169.254/latest/meta-data/",
        "http://[::1]/",
        "ftp://example.com/file.txt",
        "file:///etc/passwd",
        "not a url",
    ] {
        let result = extractor.extract(url).await;
        assert_eq!(result.failure_reason(), Some("unsafe-url"), "{}", url);
        assert!(result.method.is_empty());
    }
}

#[tokio::test]
async fn test_builtin_blocked_domains_never_fetched() {
    let extractor = ContentExtractor::new(ContentExtractionConfig::default()).unwrap();

    for (url, rule) in [
        ("https://www.wsj.com/articles/markets", "wsj.com"),
        ("https://blogs.nytimes.com/2020/01/01/post", "nytimes.com"),
        ("https://twitter.com/who/status/1", "twitter.com"),
        ("https://www.sec.gov/Archives/edgar/data/1.txt", "sec.gov/archives"),
    ] {
        let result = extractor.extract(url).await;
        assert_eq!(
            result.failure,
            Some(ExtractionFailure::BlockedDomain {
                rule: rule.to_string()
            }),
            "{}",
            url
        );
        assert_eq!(result.failure_reason(), Some("blocked-domain"));
    }
}

#[test]
fn test_block_rules_respect_label_and_path_boundaries() {
    let blocked = BlockedDomainSet::builtin();

    assert!(!blocked.is_blocked("https://notwsj.com/"));
    assert!(!blocked.is_blocked("https://www.sec.gov/news/press-release"));
    assert!(!blocked.is_blocked("https://github.com/rust-lang/rust"));
    assert!(blocked.is_blocked("https://github.com/issues/assigned"));
    assert!(!blocked.is_blocked("https://www.who.int/news-room"));
}

#[test]
fn test_configured_domains_extend_builtin_set() {
    let builtin = BlockedDomainSet::builtin().len();
    let config = ContentExtractionConfig {
        blocked_domains: vec![
            "example.org".to_string(),
            "wsj.com".to_string(),
            "  ".to_string(),
        ],
        ..Default::default()
    };
    let extractor = ContentExtractor::new(config).unwrap();

    // Duplicates and blanks are ignored
    assert_eq!(extractor.blocked_domains().len(), builtin + 1);
    assert!(extractor.is_blocked("https://news.example.org/story"));
}

#[tokio::test]
async fn test_disabled_extraction_reports_reason() {
    let config = ContentExtractionConfig {
        enabled: false,
        ..Default::default()
    };
    let extractor = ContentExtractor::new(config).unwrap();

    let result = extractor
        .extract_or_snippet("https://www.who.int/news", "WHO statement")
        .await;

    assert!(!extractor.is_enabled());
    assert_eq!(result.failure_reason(), Some("extraction-disabled"));
    assert!(result.degraded);
    assert_eq!(result.text, "WHO statement");
}
