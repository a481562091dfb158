// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HTML to plain text
//!
//! Pulls readable text out of a page using CSS selectors, skipping script,
//! style and navigation chrome.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;

/// Generic content selectors, tried after any domain-specific ones
pub const GENERIC_SELECTORS: &[&str] = &[
    "article",
    "main",
    "[role='main']",
    ".post-content",
    ".article-content",
    ".entry-content",
    ".story-body",
    ".article__body",
    ".content-body",
    "#article-body",
    "#content",
    ".prose",
];

/// Elements whose text is never page content
const SKIPPED_ELEMENTS: &[&str] = &[
    "script", "style", "noscript", "template", "svg", "nav", "footer", "header", "aside",
    "button",
];

/// Short boilerplate lines that survive selector extraction
fn boilerplate() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(
                r"(?i)\b(advertisement|skip to (main )?content|subscribe to our newsletter|sign up for our newsletter|accept all cookies|we use cookies[^.]*\.)",
            )
            .ok()
        })
        .as_ref()
}

/// Text of the first selector whose matches reach `min_chars`
///
/// All elements matching a selector are joined, so paragraph-level
/// selectors collect the whole article.
pub fn extract_with_selectors(document: &Html, selectors: &[&str], min_chars: usize) -> Option<String> {
    for selector_str in selectors {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };

        let text = document
            .select(&selector)
            .map(|element| element_text(&element))
            .collect::<Vec<_>>()
            .join(" ");
        let cleaned = clean_text(&text);
        if cleaned.chars().count() >= min_chars {
            return Some(cleaned);
        }
    }
    None
}

/// Extract main content from HTML
///
/// Tries `selectors`, then the generic content selectors, then falls back
/// to the whole `<body>` with noise removed.
pub fn extract_main_content(html: &str, selectors: &[&str], min_chars: usize) -> String {
    let document = Html::parse_document(html);

    extract_with_selectors(&document, selectors, min_chars)
        .or_else(|| extract_with_selectors(&document, GENERIC_SELECTORS, min_chars))
        .unwrap_or_else(|| extract_body_text(&document))
}

/// All `<p>` text in document order
pub fn extract_paragraphs(html: &str) -> String {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("p") else {
        return String::new();
    };

    let text = document
        .select(&selector)
        .map(|p| element_text(&p))
        .filter(|t| !t.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    clean_text(&text)
}

/// Extract text from body, removing common noise elements
fn extract_body_text(document: &Html) -> String {
    Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next().map(|b| element_text(&b)))
        .map(|text| clean_text(&text))
        .unwrap_or_default()
}

/// Text under `element`, minus skipped subtrees below it
fn element_text(element: &ElementRef) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for node in element.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let skipped = node
            .ancestors()
            .take_while(|ancestor| ancestor.id() != element.id())
            .any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|e| SKIPPED_ELEMENTS.contains(&e.name()))
            });
        if !skipped {
            parts.push(&**text);
        }
    }
    parts.join(" ")
}

/// Normalize whitespace and drop boilerplate phrases
pub fn clean_text(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match boilerplate() {
        Some(pattern) => pattern
            .replace_all(&collapsed, "")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" "),
        None => collapsed,
    }
}

/// Truncate to `max_chars` characters, preserving word boundaries
///
/// Appends `...` when text was cut.
pub fn truncate_content(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    // Room for the ellipsis inside the limit
    let cut = text
        .char_indices()
        .nth(max_chars.saturating_sub(3))
        .map(|(index, _)| index)
        .unwrap_or(text.len());
    let truncated = &text[..cut];
    match truncated.rfind(' ') {
        Some(last_space) if last_space > 0 => format!("{}...", truncated[..last_space].trim_end()),
        _ => format!("{}...", truncated),
    }
}
