// src/ingest/adapters/remote_api.rs
// Structured-API source. Job-board JSON shapes disagree on field names, so
// each logical field resolves through an ordered fallback chain of key paths.

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::counter;
use serde_json::Value;

use crate::ingest::types::{RawPosting, SourceAdapter, SourceTag};

/// Raw descriptions are capped before hand-off to bound oracle input cost.
const DESCRIPTION_CAP: usize = 1200;

const ITEMS_KEYS: &[&str] = &["jobs", "data", "results"];
const URL_PATHS: &[&[&str]] = &[&["url"], &["job_url"], &["link"]];
const TITLE_PATHS: &[&[&str]] = &[&["title"], &["position"], &["name"]];
const COMPANY_PATHS: &[&[&str]] = &[&["company_name"], &["company", "name"], &["company"]];
const DESCRIPTION_PATHS: &[&[&str]] = &[&["description"], &["text"], &["snippet"]];
const LOCATION_PATHS: &[&[&str]] = &[
    &["candidate_required_location"],
    &["location"],
    &["region"],
];

pub struct RemoteApiAdapter {
    label: String,
    /// Drop items whose location is not remote/worldwide before yielding.
    remote_only: bool,
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        url: String,
        client: reqwest::Client,
    },
}

impl RemoteApiAdapter {
    pub fn from_url(
        label: impl Into<String>,
        url: impl Into<String>,
        remote_only: bool,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(5))
            .timeout(std::time::Duration::from_secs(20))
            .build()
            .context("building api http client")?;
        Ok(Self {
            label: label.into(),
            remote_only,
            mode: Mode::Http {
                url: url.into(),
                client,
            },
        })
    }

    pub fn from_fixture(label: impl Into<String>, json: &str, remote_only: bool) -> Self {
        Self {
            label: label.into(),
            remote_only,
            mode: Mode::Fixture(json.to_string()),
        }
    }

    fn map_item(&self, item: &Value) -> Option<RawPosting> {
        // URL and title are mandatory; an item missing either is malformed
        // and skipped, not fatal.
        let source_url = first_str(item, URL_PATHS)?;
        let title = first_str(item, TITLE_PATHS)?;

        if self.remote_only && !is_remote(item) {
            return None;
        }

        let raw_description = first_str(item, DESCRIPTION_PATHS)
            .map(|d| cap_chars(&d, DESCRIPTION_CAP))
            .unwrap_or_else(|| title.clone());

        Some(RawPosting {
            title,
            company: first_str(item, COMPANY_PATHS),
            source_url,
            raw_description,
            source: SourceTag::RemoteApi,
        })
    }

    fn parse_body(&self, body: &str, limit: usize) -> Result<Vec<RawPosting>> {
        let root: Value = serde_json::from_str(body).context("parsing api json")?;
        let items = items_array(&root).context("api json has no items array")?;

        let mut out = Vec::new();
        for item in items {
            if out.len() >= limit {
                break;
            }
            if let Some(p) = self.map_item(item) {
                out.push(p);
            }
        }
        counter!("ingest_items_fetched_total").increment(out.len() as u64);
        Ok(out)
    }
}

#[async_trait]
impl SourceAdapter for RemoteApiAdapter {
    async fn fetch(&self, limit: usize) -> Result<Vec<RawPosting>> {
        match &self.mode {
            Mode::Fixture(json) => self.parse_body(json, limit),
            Mode::Http { url, client } => {
                let body = client
                    .get(url)
                    .send()
                    .await
                    .with_context(|| format!("api get {url}"))?
                    .error_for_status()
                    .context("api http status")?
                    .text()
                    .await
                    .context("api body")?;
                self.parse_body(&body, limit)
            }
        }
    }

    fn name(&self) -> &str {
        &self.label
    }
}

/// The collection itself also varies: a top-level array, or one of a few
/// well-known wrapper keys.
fn items_array(root: &Value) -> Option<&Vec<Value>> {
    if let Some(arr) = root.as_array() {
        return Some(arr);
    }
    ITEMS_KEYS.iter().find_map(|k| root.get(*k)?.as_array())
}

/// First non-empty string found walking the given key paths in order.
fn first_str(item: &Value, paths: &[&[&str]]) -> Option<String> {
    for path in paths {
        let mut cur = item;
        let mut ok = true;
        for key in *path {
            match cur.get(*key) {
                Some(v) => cur = v,
                None => {
                    ok = false;
                    break;
                }
            }
        }
        if !ok {
            continue;
        }
        if let Some(s) = cur.as_str() {
            let t = s.trim();
            if !t.is_empty() {
                return Some(t.to_string());
            }
        }
    }
    None
}

fn is_remote(item: &Value) -> bool {
    if item.get("remote").and_then(Value::as_bool) == Some(true) {
        return true;
    }
    match first_str(item, LOCATION_PATHS) {
        Some(loc) => {
            let l = loc.to_lowercase();
            l.contains("remote") || l.contains("worldwide") || l.contains("anywhere")
        }
        None => false,
    }
}

fn cap_chars(s: &str, cap: usize) -> String {
    if s.chars().count() > cap {
        s.chars().take(cap).collect()
    } else {
        s.to_string()
    }
}
