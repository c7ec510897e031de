// src/ingest/types.rs
use anyhow::Result;

/// Which kind of origin produced a posting. One variant per adapter family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SourceTag {
    FeedRss,
    HtmlListing,
    RemoteApi,
}

impl SourceTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTag::FeedRss => "feed-rss",
            SourceTag::HtmlListing => "html-listing",
            SourceTag::RemoteApi => "remote-api",
        }
    }
}

/// One posting as fetched from an origin, before any normalization.
/// `raw_description` may still contain markup; `source_url` is the dedup key.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RawPosting {
    pub title: String,
    pub company: Option<String>,
    pub source_url: String,
    pub raw_description: String,
    pub source: SourceTag,
}

/// A source of raw postings. `limit` bounds how many items are pulled from a
/// potentially much larger upstream result set.
///
/// Contract: a malformed individual item is skipped, never fatal. A
/// whole-source connectivity failure returns `Err`; the pipeline logs it and
/// continues with the remaining adapters.
#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    async fn fetch(&self, limit: usize) -> Result<Vec<RawPosting>>;
    fn name(&self) -> &str;
}
