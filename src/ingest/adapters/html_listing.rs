// src/ingest/adapters/html_listing.rs
// Listing+detail HTML source: one listing page yields candidate links, each
// detail page enriches the description. Detail failures degrade to the
// listing title; they never drop the item.

use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::counter;
use once_cell::sync::OnceCell;
use regex::Regex;

use crate::ingest::types::{RawPosting, SourceAdapter, SourceTag};
use crate::sanitize::strip_tags;

/// Upper bound on anchors examined per listing page, so a pathological page
/// cannot turn the tag search into unbounded work.
const MAX_ANCHOR_SCAN: usize = 200;

fn re_anchor() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?is)<a\s[^>]*?href\s*=\s*"([^"]+)"[^>]*>(.*?)</a>"#).unwrap()
    })
}

pub struct HtmlListingAdapter {
    label: String,
    /// Substring a candidate href must contain (e.g. "/remote-jobs/").
    link_marker: String,
    base_url: String,
    mode: Mode,
}

enum Mode {
    Http {
        listing_url: String,
        client: reqwest::Client,
    },
    /// Listing HTML plus detail pages keyed by absolute URL. A URL absent
    /// from the map behaves like a failed detail fetch.
    Fixture {
        listing: String,
        details: HashMap<String, String>,
    },
}

impl HtmlListingAdapter {
    pub fn from_url(
        label: impl Into<String>,
        listing_url: impl Into<String>,
        base_url: impl Into<String>,
        link_marker: impl Into<String>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(5))
            .timeout(std::time::Duration::from_secs(20))
            .build()
            .context("building listing http client")?;
        Ok(Self {
            label: label.into(),
            link_marker: link_marker.into(),
            base_url: base_url.into(),
            mode: Mode::Http {
                listing_url: listing_url.into(),
                client,
            },
        })
    }

    pub fn from_fixture(
        label: impl Into<String>,
        base_url: impl Into<String>,
        link_marker: impl Into<String>,
        listing: &str,
        details: HashMap<String, String>,
    ) -> Self {
        Self {
            label: label.into(),
            link_marker: link_marker.into(),
            base_url: base_url.into(),
            mode: Mode::Fixture {
                listing: listing.to_string(),
                details,
            },
        }
    }

    fn absolutize(&self, href: &str) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else {
            format!(
                "{}/{}",
                self.base_url.trim_end_matches('/'),
                href.trim_start_matches('/')
            )
        }
    }

    /// Candidate (url, title) pairs from the listing page, deduplicated by
    /// href, bounded by the anchor-scan cap and `limit`.
    fn candidate_links(&self, listing_html: &str, limit: usize) -> Vec<(String, String)> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for cap in re_anchor().captures_iter(listing_html).take(MAX_ANCHOR_SCAN) {
            if out.len() >= limit {
                break;
            }
            let href = cap[1].trim();
            if !href.contains(&self.link_marker) {
                continue;
            }
            let title = strip_tags(&cap[2]);
            if title.is_empty() {
                continue;
            }
            let url = self.absolutize(href);
            if seen.insert(url.clone()) {
                out.push((url, title));
            }
        }
        out
    }

    async fn detail_text(&self, url: &str) -> Result<String> {
        match &self.mode {
            Mode::Fixture { details, .. } => details
                .get(url)
                .cloned()
                .with_context(|| format!("no detail fixture for {url}")),
            Mode::Http { client, .. } => {
                let body = client
                    .get(url)
                    .send()
                    .await
                    .with_context(|| format!("detail get {url}"))?
                    .error_for_status()
                    .context("detail http status")?
                    .text()
                    .await
                    .context("detail body")?;
                Ok(body)
            }
        }
    }

    async fn listing_html(&self) -> Result<String> {
        match &self.mode {
            Mode::Fixture { listing, .. } => Ok(listing.clone()),
            Mode::Http {
                listing_url,
                client,
            } => {
                let body = client
                    .get(listing_url)
                    .send()
                    .await
                    .with_context(|| format!("listing get {listing_url}"))?
                    .error_for_status()
                    .context("listing http status")?
                    .text()
                    .await
                    .context("listing body")?;
                Ok(body)
            }
        }
    }
}

#[async_trait]
impl SourceAdapter for HtmlListingAdapter {
    async fn fetch(&self, limit: usize) -> Result<Vec<RawPosting>> {
        let listing = self.listing_html().await?;
        let candidates = self.candidate_links(&listing, limit);

        let mut out = Vec::with_capacity(candidates.len());
        for (url, title) in candidates {
            let raw_description = match self.detail_text(&url).await {
                Ok(body) => body,
                Err(e) => {
                    // Degrade: the listing title alone still gives the oracle
                    // something to work with.
                    tracing::warn!(source = %self.label, url = %url, error = ?e,
                        "detail fetch failed, using listing title only");
                    counter!("ingest_detail_fallback_total").increment(1);
                    title.clone()
                }
            };
            out.push(RawPosting {
                title,
                company: None,
                source_url: url,
                raw_description,
                source: SourceTag::HtmlListing,
            });
        }
        counter!("ingest_items_fetched_total").increment(out.len() as u64);
        Ok(out)
    }

    fn name(&self) -> &str {
        &self.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"<html><body>
      <a href="/about">About us</a>
      <a href="/remote-jobs/rust-dev-1"><span>Rust Developer</span></a>
      <a href="/remote-jobs/go-dev-2">Go Developer</a>
      <a href="/remote-jobs/rust-dev-1">Rust Developer (again)</a>
    </body></html>"#;

    fn adapter(details: HashMap<String, String>) -> HtmlListingAdapter {
        HtmlListingAdapter::from_fixture(
            "board",
            "https://board.test",
            "/remote-jobs/",
            LISTING,
            details,
        )
    }

    #[tokio::test]
    async fn extracts_marked_links_and_dedupes_hrefs() {
        let mut details = HashMap::new();
        details.insert(
            "https://board.test/remote-jobs/rust-dev-1".to_string(),
            "<p>Rust role</p>".to_string(),
        );
        details.insert(
            "https://board.test/remote-jobs/go-dev-2".to_string(),
            "<p>Go role</p>".to_string(),
        );
        let items = adapter(details).fetch(10).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Rust Developer");
        assert_eq!(items[0].source_url, "https://board.test/remote-jobs/rust-dev-1");
        assert_eq!(items[0].raw_description, "<p>Rust role</p>");
    }

    #[tokio::test]
    async fn detail_failure_degrades_to_title() {
        // Only one detail page available; the other must survive regardless.
        let mut details = HashMap::new();
        details.insert(
            "https://board.test/remote-jobs/rust-dev-1".to_string(),
            "<p>Rust role</p>".to_string(),
        );
        let items = adapter(details).fetch(10).await.unwrap();
        assert_eq!(items.len(), 2);
        let go = items
            .iter()
            .find(|i| i.source_url.ends_with("go-dev-2"))
            .unwrap();
        assert_eq!(go.raw_description, "Go Developer");
    }

    #[tokio::test]
    async fn limit_bounds_candidates() {
        let items = adapter(HashMap::new()).fetch(1).await.unwrap();
        assert_eq!(items.len(), 1);
    }
}
