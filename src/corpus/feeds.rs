//! Feed aggregation: merge candidate URLs from threat-intelligence and
//! top-domain feeds.
//!
//! Best-effort by design: a failing feed is logged and contributes zero
//! URLs, never aborting the run. Dedup is exact-match set union on the
//! literal URL string — no cross-feed normalization.

use std::collections::HashSet;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};
use url::Url;

use crate::corpus::{split_csv_line, CandidateUrl, UrlClass};

const PHISHTANK: &str = "https://data.phishtank.com/data/online-valid.csv";
const OPENPHISH: &str = "https://openphish.com/feed.txt";
const URLHAUS: &str = "https://urlhaus.abuse.ch/downloads/text_online/";
const CLOUDFLARE_TOP: &str = "https://radar.cloudflare.com/domains/top-1000.csv";

/// Substrings of legitimate domains excluded from the corpus
/// (JS-heavy pages or login walls that never render representative HTML).
pub const LEGIT_DENYLIST: [&str; 10] = [
    "google.",
    "instagram.",
    "youtube.",
    "tiktok.",
    "facebook.",
    "apple.com",
    "icloud.",
    "twitter.",
    "x.com",
    "netflix.",
];

/// Static stand-ins when the legitimate-domain feed is unreachable.
pub fn fallback_legit_urls() -> Vec<String> {
    [
        "https://bbc.com",
        "https://cnn.com",
        "https://w3schools.com",
        "https://stackoverflow.com",
        "https://craigslist.org",
        "https://wordpress.com",
        "https://github.com",
    ]
    .map(String::from)
    .to_vec()
}

/// How a feed body is turned into URL strings.
#[derive(Debug, Clone)]
pub enum FeedFormat {
    /// One URL per line; non-`http` lines are skipped.
    UrlLines,
    /// CSV with a named column of URLs.
    CsvColumn(String),
    /// CSV with a named column of bare domains, mapped to `https://` URLs.
    CsvDomains(String),
}

/// An independently fetched source of candidate URLs.
#[derive(Debug, Clone)]
pub struct FeedSource {
    pub name: &'static str,
    pub url: String,
    pub format: FeedFormat,
    pub class: UrlClass,
}

/// The standard phishing feeds.
pub fn default_phishing_feeds() -> Vec<FeedSource> {
    vec![
        FeedSource {
            name: "phishtank",
            url: PHISHTANK.to_string(),
            format: FeedFormat::CsvColumn("url".to_string()),
            class: UrlClass::Phishing,
        },
        FeedSource {
            name: "openphish",
            url: OPENPHISH.to_string(),
            format: FeedFormat::UrlLines,
            class: UrlClass::Phishing,
        },
        FeedSource {
            name: "urlhaus",
            url: URLHAUS.to_string(),
            format: FeedFormat::UrlLines,
            class: UrlClass::Phishing,
        },
    ]
}

/// The standard legitimate-domain feed.
pub fn default_legitimate_feed() -> FeedSource {
    FeedSource {
        name: "cloudflare-top",
        url: CLOUDFLARE_TOP.to_string(),
        format: FeedFormat::CsvDomains("domain".to_string()),
        class: UrlClass::Legitimate,
    }
}

/// Fetches and merges candidate URL feeds.
pub struct Aggregator {
    client: reqwest::Client,
}

impl Aggregator {
    pub fn new(timeout_ms: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .user_agent(concat!("lurebench/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self { client }
    }

    /// Merge all feeds into one deduplicated candidate list.
    ///
    /// Set union per class on the literal URL string. The legitimate class
    /// gets the denylist filter applied post-union and falls back to the
    /// static list when all of its feeds fail.
    pub async fn aggregate(&self, feeds: &[FeedSource]) -> Vec<CandidateUrl> {
        let mut phish: HashSet<String> = HashSet::new();
        let mut legit: HashSet<String> = HashSet::new();
        let mut legit_feed_seen = false;
        let mut legit_feed_ok = false;

        for feed in feeds {
            if feed.class == UrlClass::Legitimate {
                legit_feed_seen = true;
            }
            match self.fetch_feed(feed).await {
                Ok(urls) => {
                    info!("feed {} contributed {} URLs", feed.name, urls.len());
                    let target = match feed.class {
                        UrlClass::Phishing => &mut phish,
                        UrlClass::Legitimate => {
                            legit_feed_ok = true;
                            &mut legit
                        }
                    };
                    target.extend(urls);
                }
                Err(e) => warn!("feed {} unavailable, skipping: {e:#}", feed.name),
            }
        }

        if legit_feed_seen && !legit_feed_ok {
            info!("all legitimate feeds failed, using static fallback list");
            legit.extend(fallback_legit_urls());
        }

        let legit = apply_denylist(legit, &LEGIT_DENYLIST);

        let mut candidates: Vec<CandidateUrl> = phish
            .into_iter()
            .map(|url| CandidateUrl {
                url,
                class: UrlClass::Phishing,
            })
            .chain(legit.into_iter().map(|url| CandidateUrl {
                url,
                class: UrlClass::Legitimate,
            }))
            .collect();
        // Stable order for reproducible downstream sampling.
        candidates.sort_by(|a, b| a.url.cmp(&b.url));
        candidates
    }

    async fn fetch_feed(&self, feed: &FeedSource) -> Result<Vec<String>> {
        let response = self
            .client
            .get(&feed.url)
            .send()
            .await
            .with_context(|| format!("GET {}", feed.url))?;
        if !response.status().is_success() {
            bail!("{} returned HTTP {}", feed.url, response.status());
        }
        let body = response.text().await.context("reading feed body")?;
        Ok(parse_feed(&feed.format, &body))
    }
}

/// Extract URL strings from a feed body.
fn parse_feed(format: &FeedFormat, body: &str) -> Vec<String> {
    match format {
        FeedFormat::UrlLines => body
            .lines()
            .map(str::trim)
            .filter(|line| line.starts_with("http"))
            .filter(|line| Url::parse(line).is_ok())
            .map(String::from)
            .collect(),
        FeedFormat::CsvColumn(column) => csv_column(body, column)
            .into_iter()
            .filter(|value| Url::parse(value).is_ok())
            .collect(),
        FeedFormat::CsvDomains(column) => csv_column(body, column)
            .into_iter()
            .map(|domain| format!("https://{domain}"))
            .filter(|value| Url::parse(value).is_ok())
            .collect(),
    }
}

/// Non-empty values of a named CSV column.
fn csv_column(body: &str, column: &str) -> Vec<String> {
    let mut lines = body.lines();
    let Some(header) = lines.next() else {
        return Vec::new();
    };
    let Some(index) = split_csv_line(header)
        .iter()
        .position(|field| field.trim() == column)
    else {
        return Vec::new();
    };

    lines
        .filter_map(|line| split_csv_line(line).into_iter().nth(index))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}

/// Drop URLs containing any denylisted substring.
fn apply_denylist(urls: HashSet<String>, denylist: &[&str]) -> HashSet<String> {
    urls.into_iter()
        .filter(|url| !denylist.iter().any(|bad| url.contains(bad)))
        .collect()
}
