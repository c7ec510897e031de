// src/ingest/adapters/feed_rss.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use serde::Deserialize;

use crate::ingest::types::{RawPosting, SourceAdapter, SourceTag};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}
#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}
#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
}

/// Syndication-feed source. The feed entry body becomes the raw description,
/// markup and all; sanitization happens later in the pipeline.
pub struct FeedRssAdapter {
    label: String,
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        url: String,
        client: reqwest::Client,
    },
}

impl FeedRssAdapter {
    pub fn from_url(label: impl Into<String>, url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(5))
            .timeout(std::time::Duration::from_secs(20))
            .build()
            .context("building feed http client")?;
        Ok(Self {
            label: label.into(),
            mode: Mode::Http {
                url: url.into(),
                client,
            },
        })
    }

    pub fn from_fixture(label: impl Into<String>, xml: &str) -> Self {
        Self {
            label: label.into(),
            mode: Mode::Fixture(xml.to_string()),
        }
    }

    fn parse_items(&self, xml: &str, limit: usize) -> Result<Vec<RawPosting>> {
        let t0 = std::time::Instant::now();
        let xml_clean = scrub_html_entities_for_xml(xml);
        let rss: Rss = from_str(&xml_clean).context("parsing rss xml")?;

        let mut out = Vec::new();
        for it in rss.channel.item {
            if out.len() >= limit {
                break;
            }
            // An entry without a link has no dedup key; skip it, not the feed.
            let Some(link) = it.link.filter(|l| !l.trim().is_empty()) else {
                tracing::debug!(source = %self.label, "feed entry without link skipped");
                continue;
            };
            let title = it.title.unwrap_or_default();
            if title.trim().is_empty() {
                continue;
            }
            out.push(RawPosting {
                title,
                company: None,
                source_url: link.trim().to_string(),
                raw_description: it.description.unwrap_or_default(),
                source: SourceTag::FeedRss,
            });
        }

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("ingest_parse_ms").record(ms);
        counter!("ingest_items_fetched_total").increment(out.len() as u64);
        Ok(out)
    }
}

#[async_trait]
impl SourceAdapter for FeedRssAdapter {
    async fn fetch(&self, limit: usize) -> Result<Vec<RawPosting>> {
        match &self.mode {
            Mode::Fixture(xml) => self.parse_items(xml, limit),
            Mode::Http { url, client } => {
                let body = client
                    .get(url)
                    .send()
                    .await
                    .with_context(|| format!("feed get {url}"))?
                    .error_for_status()
                    .context("feed http status")?
                    .text()
                    .await
                    .context("feed body")?;
                self.parse_items(&body, limit)
            }
        }
    }

    fn name(&self) -> &str {
        &self.label
    }
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
