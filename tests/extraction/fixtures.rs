// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Local page server with a request counter

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Redirect};
use axum::routing::get;
use axum::Router;
use factcheck_search::extraction::ContentExtractionConfig;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const ARTICLE_SENTENCE: &str =
    "Measles vaccination coverage fell below the ninety-five percent threshold needed for herd immunity in several regions. ";

/// Running page server
pub struct PageServer {
    pub base: String,
    hits: Arc<AtomicUsize>,
}

impl PageServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Page requests served so far; redirects are not counted
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn article(State(hits): State<Arc<AtomicUsize>>) -> Html<String> {
    hits.fetch_add(1, Ordering::SeqCst);
    Html(format!(
        "<html><head><title>Coverage report</title><script>var tracking = 1;</script></head>\
         <body><nav>Home | World | Health</nav>\
         <article><h1>Coverage report</h1><p>{}</p><p>{}</p></article>\
         <footer>Copyright Example News</footer></body></html>",
        ARTICLE_SENTENCE.repeat(2),
        ARTICLE_SENTENCE
    ))
}

async fn plain(State(hits): State<Arc<AtomicUsize>>) -> Html<String> {
    hits.fetch_add(1, Ordering::SeqCst);
    Html(format!(
        "<html><body><div class=\"wrapper\"><div>{}</div></div></body></html>",
        ARTICLE_SENTENCE.repeat(3)
    ))
}

async fn tiny(State(hits): State<Arc<AtomicUsize>>) -> Html<&'static str> {
    hits.fetch_add(1, Ordering::SeqCst);
    Html("<html><body><article>Too short.</article></body></html>")
}

async fn forbidden(State(hits): State<Arc<AtomicUsize>>) -> impl IntoResponse {
    hits.fetch_add(1, Ordering::SeqCst);
    (StatusCode::FORBIDDEN, "no robots")
}

async fn slow(State(hits): State<Arc<AtomicUsize>>) -> Html<String> {
    hits.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(3)).await;
    Html(format!("<html><body><article>{}</article></body></html>", ARTICLE_SENTENCE.repeat(3)))
}

/// Same-site redirect to the article
async fn moved() -> Redirect {
    Redirect::temporary("/article")
}

/// Redirect to the same server under the `localhost` name
async fn hop_to_localhost(headers: HeaderMap) -> Redirect {
    let port = headers
        .get(header::HOST)
        .and_then(|host| host.to_str().ok())
        .and_then(|host| host.rsplit(':').next())
        .unwrap_or("80")
        .to_string();
    Redirect::temporary(&format!("http://localhost:{}/article", port))
}

/// Serve the fixture pages on an ephemeral local port
pub async fn serve_pages() -> PageServer {
    let hits = Arc::new(AtomicUsize::new(0));
    let router = Router::new()
        .route("/article", get(article))
        .route("/Article", get(article))
        .route("/plain", get(plain))
        .route("/tiny", get(tiny))
        .route("/forbidden", get(forbidden))
        .route("/slow", get(slow))
        .route("/moved", get(moved))
        .route("/hop-to-localhost", get(hop_to_localhost))
        .with_state(hits.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    PageServer {
        base: format!("http://{}", addr),
        hits,
    }
}

/// Settings that let the extractor reach the loopback fixture quickly
pub fn local_config() -> ContentExtractionConfig {
    ContentExtractionConfig {
        method_timeout_secs: 1,
        method_delay_ms: 0,
        allow_private_hosts: true,
        ..Default::default()
    }
}
