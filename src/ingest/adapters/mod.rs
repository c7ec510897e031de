// src/ingest/adapters/mod.rs
pub mod feed_rss;
pub mod html_listing;
pub mod remote_api;

use anyhow::Result;

use crate::config::SourceConfig;
use crate::ingest::types::SourceAdapter;

pub use feed_rss::FeedRssAdapter;
pub use html_listing::HtmlListingAdapter;
pub use remote_api::RemoteApiAdapter;

/// Build the configured adapter set, in configuration order.
pub fn from_config(sources: &[SourceConfig]) -> Result<Vec<Box<dyn SourceAdapter>>> {
    let mut out: Vec<Box<dyn SourceAdapter>> = Vec::with_capacity(sources.len());
    for src in sources {
        match src {
            SourceConfig::FeedRss { label, url } => {
                out.push(Box::new(FeedRssAdapter::from_url(label.clone(), url.clone())?));
            }
            SourceConfig::HtmlListing {
                label,
                listing_url,
                base_url,
                link_marker,
            } => {
                out.push(Box::new(HtmlListingAdapter::from_url(
                    label.clone(),
                    listing_url.clone(),
                    base_url.clone(),
                    link_marker.clone(),
                )?));
            }
            SourceConfig::RemoteApi {
                label,
                url,
                remote_only,
            } => {
                out.push(Box::new(RemoteApiAdapter::from_url(
                    label.clone(),
                    url.clone(),
                    *remote_only,
                )?));
            }
        }
    }
    Ok(out)
}
