// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Domain-aware extraction profiles
//!
//! Maps a host to a content category and, for well-known sites, to the
//! selectors that isolate article text on that site.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Broad kind of site, drives selector choice and cache lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentCategory {
    News,
    Academic,
    Medical,
    Government,
    #[default]
    General,
}

impl ContentCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::News => "news",
            Self::Academic => "academic",
            Self::Medical => "medical",
            Self::Government => "government",
            Self::General => "general",
        }
    }

    /// Selectors tried in order for this kind of page
    pub fn selectors(self) -> &'static [&'static str] {
        match self {
            Self::News => &[
                "article",
                ".article-content",
                ".entry-content",
                ".post-content",
                ".story-body",
                ".article-body",
                ".content-body",
                "[class*='article']",
                ".main-content",
                "main",
                ".story-content",
            ],
            Self::Academic => &[
                ".abstract",
                ".article-content",
                ".full-text",
                ".paper-content",
                ".document-content",
                "article",
                "main",
            ],
            Self::Medical => &[
                ".medical-content",
                ".health-content",
                ".article-content",
                "article",
                ".content-area",
                ".main-content",
                "main",
            ],
            Self::Government => &[
                ".content",
                ".main-content",
                ".page-content",
                ".document-content",
                "article",
                "main",
                ".body-content",
            ],
            Self::General => &[
                "article",
                ".content",
                ".main-content",
                ".post-content",
                ".entry-content",
                "main",
                ".body-content",
            ],
        }
    }

    /// How long a successful extraction stays cached
    ///
    /// News changes quickly; reference material barely changes.
    pub fn cache_ttl(self) -> Duration {
        match self {
            Self::News => Duration::from_secs(3600),
            Self::General => Duration::from_secs(2 * 3600),
            Self::Academic | Self::Medical | Self::Government => Duration::from_secs(6 * 3600),
        }
    }
}

/// Extraction hints for one well-known site
#[derive(Debug, PartialEq, Eq)]
pub struct SiteProfile {
    pub domain: &'static str,
    pub category: ContentCategory,
    pub selectors: &'static [&'static str],
}

static SITE_PROFILES: &[SiteProfile] = &[
    SiteProfile {
        domain: "reuters.com",
        category: ContentCategory::News,
        selectors: &["[data-testid^='paragraph']", "div.article-body__content"],
    },
    SiteProfile {
        domain: "apnews.com",
        category: ContentCategory::News,
        selectors: &[".RichTextStoryBody", "div.Article"],
    },
    SiteProfile {
        domain: "bbc.com",
        category: ContentCategory::News,
        selectors: &["[data-component='text-block']", ".story-body"],
    },
    SiteProfile {
        domain: "bbc.co.uk",
        category: ContentCategory::News,
        selectors: &["[data-component='text-block']", ".story-body"],
    },
    SiteProfile {
        domain: "npr.org",
        category: ContentCategory::News,
        selectors: &["#storytext", ".storytext"],
    },
    SiteProfile {
        domain: "cnn.com",
        category: ContentCategory::News,
        selectors: &[".article__content", ".zn-body__paragraph"],
    },
    SiteProfile {
        domain: "theguardian.com",
        category: ContentCategory::News,
        selectors: &["#maincontent", "[data-gu-name='body']"],
    },
    SiteProfile {
        domain: "who.int",
        category: ContentCategory::Medical,
        selectors: &[".sf-detail-body-wrapper", "article"],
    },
    SiteProfile {
        domain: "cdc.gov",
        category: ContentCategory::Medical,
        selectors: &[".cdc-dfe-body", "#content", "main"],
    },
    SiteProfile {
        domain: "ncbi.nlm.nih.gov",
        category: ContentCategory::Academic,
        selectors: &["#abstract", ".abstract", "#main-content"],
    },
    SiteProfile {
        domain: "nih.gov",
        category: ContentCategory::Medical,
        selectors: &["#main-content", ".main-content", "main"],
    },
    SiteProfile {
        domain: "nature.com",
        category: ContentCategory::Academic,
        selectors: &["div.c-article-body", "#Abs1-content"],
    },
    SiteProfile {
        domain: "science.org",
        category: ContentCategory::Academic,
        selectors: &["#bodymatter", "section#abstract"],
    },
    SiteProfile {
        domain: "wikipedia.org",
        category: ContentCategory::General,
        selectors: &["#mw-content-text .mw-parser-output > p", "#mw-content-text"],
    },
];

/// What the extractor knows about a URL before fetching it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageProfile {
    pub host: String,
    pub category: ContentCategory,
    pub site: Option<&'static SiteProfile>,
}

impl PageProfile {
    pub fn for_url(url: &Url) -> Self {
        let host = url
            .host_str()
            .map(|h| h.trim_start_matches("www.").to_lowercase())
            .unwrap_or_default();
        Self::for_host(&host)
    }

    pub fn for_host(host: &str) -> Self {
        let host = host.trim_start_matches("www.").to_lowercase();
        let site = site_profile(&host);
        let category = site
            .map(|s| s.category)
            .unwrap_or_else(|| category_from_tld(&host));

        Self {
            host,
            category,
            site,
        }
    }

    /// Site selectors if the site is known, otherwise the category's
    pub fn selectors(&self) -> &'static [&'static str] {
        match self.site {
            Some(site) => site.selectors,
            None => self.category.selectors(),
        }
    }
}

/// Profile for `host` or one of its parent domains; the most specific wins
fn site_profile(host: &str) -> Option<&'static SiteProfile> {
    SITE_PROFILES
        .iter()
        .filter(|p| {
            host == p.domain
                || host
                    .strip_suffix(p.domain)
                    .is_some_and(|rest| rest.ends_with('.'))
        })
        .max_by_key(|p| p.domain.len())
}

fn category_from_tld(host: &str) -> ContentCategory {
    let tld = host.rsplit('.').next().unwrap_or_default();
    match tld {
        "gov" | "mil" => ContentCategory::Government,
        "edu" => ContentCategory::Academic,
        _ if host.contains(".gov.") => ContentCategory::Government,
        _ if host.contains(".ac.") => ContentCategory::Academic,
        _ => ContentCategory::General,
    }
}
