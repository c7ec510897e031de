// src/config.rs
// All external endpoints and credentials are resolved once at startup into an
// explicit config object; nothing downstream reads the environment ad hoc.
// Secrets come from env vars (.env supported), the source list from a TOML
// file. Missing mandatory credentials are the one fatal startup error.

use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::extract::DEFAULT_MODEL;
use crate::ingest::DEFAULT_FETCH_LIMIT;
use crate::pacing::DEFAULT_ORACLE_INTERVAL;

const ENV_SOURCES_PATH: &str = "LOKER_SOURCES_PATH";
const DEFAULT_SOURCES_PATH: &str = "config/sources.toml";
const DEFAULT_TABLE: &str = "indo_tech_jobs";

/// One entry in the source list.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    FeedRss {
        label: String,
        url: String,
    },
    HtmlListing {
        label: String,
        listing_url: String,
        base_url: String,
        link_marker: String,
    },
    RemoteApi {
        label: String,
        url: String,
        #[serde(default)]
        remote_only: bool,
    },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub supabase_url: String,
    pub supabase_key: String,
    pub table: String,
    pub fetch_limit: usize,
    pub oracle_interval: Duration,
    pub sources: Vec<SourceConfig>,
}

impl AppConfig {
    /// Resolve the full configuration from the environment plus the sources
    /// file. Fails fast when a mandatory credential is absent.
    pub fn from_env() -> Result<Self> {
        let gemini_api_key =
            env::var("GEMINI_API_KEY").context("Missing GEMINI_API_KEY env var")?;
        let supabase_url = env::var("SUPABASE_URL").context("Missing SUPABASE_URL env var")?;
        let supabase_key = env::var("SUPABASE_KEY").context("Missing SUPABASE_KEY env var")?;

        let gemini_model =
            env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let table = env::var("SUPABASE_TABLE").unwrap_or_else(|_| DEFAULT_TABLE.to_string());

        let fetch_limit = env::var("LOKER_FETCH_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_FETCH_LIMIT);
        let oracle_interval = env::var("LOKER_ORACLE_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_ORACLE_INTERVAL);

        Ok(Self {
            gemini_api_key,
            gemini_model,
            supabase_url,
            supabase_key,
            table,
            fetch_limit,
            oracle_interval,
            sources: load_sources_default()?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct SourcesFile {
    #[serde(rename = "source", default)]
    sources: Vec<SourceConfig>,
}

/// Load the source list from an explicit TOML path.
pub fn load_sources_from(path: &Path) -> Result<Vec<SourceConfig>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading sources from {}", path.display()))?;
    let file: SourcesFile = toml::from_str(&content)
        .with_context(|| format!("parsing sources from {}", path.display()))?;
    Ok(file.sources)
}

/// Source-list resolution order:
/// 1) $LOKER_SOURCES_PATH
/// 2) config/sources.toml
/// 3) built-in default (the remote-programming RSS feed)
pub fn load_sources_default() -> Result<Vec<SourceConfig>> {
    if let Ok(p) = env::var(ENV_SOURCES_PATH) {
        let pb = PathBuf::from(p);
        return load_sources_from(&pb);
    }
    let default_path = PathBuf::from(DEFAULT_SOURCES_PATH);
    if default_path.exists() {
        return load_sources_from(&default_path);
    }
    Ok(vec![SourceConfig::FeedRss {
        label: "WWR Programming".to_string(),
        url: "https://weworkremotely.com/categories/remote-programming-jobs.rss".to_string(),
    }])
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCES_TOML: &str = r#"
[[source]]
kind = "feed_rss"
label = "WWR"
url = "https://example.test/jobs.rss"

[[source]]
kind = "remote_api"
label = "Remotive"
url = "https://example.test/api/jobs"
remote_only = true

[[source]]
kind = "html_listing"
label = "Board"
listing_url = "https://example.test/list"
base_url = "https://example.test"
link_marker = "/jobs/"
"#;

    #[test]
    fn parses_all_source_kinds() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("sources.toml");
        fs::write(&p, SOURCES_TOML).unwrap();
        let sources = load_sources_from(&p).unwrap();
        assert_eq!(sources.len(), 3);
        assert_eq!(
            sources[1],
            SourceConfig::RemoteApi {
                label: "Remotive".into(),
                url: "https://example.test/api/jobs".into(),
                remote_only: true,
            }
        );
    }

    #[serial_test::serial]
    #[test]
    fn env_path_takes_precedence() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("sources.toml");
        fs::write(
            &p,
            r#"[[source]]
kind = "feed_rss"
label = "X"
url = "https://x.test/feed"
"#,
        )
        .unwrap();
        env::set_var(ENV_SOURCES_PATH, p.display().to_string());
        let sources = load_sources_default().unwrap();
        env::remove_var(ENV_SOURCES_PATH);
        assert_eq!(sources.len(), 1);
        assert!(matches!(&sources[0], SourceConfig::FeedRss { label, .. } if label == "X"));
    }

    #[serial_test::serial]
    #[test]
    fn falls_back_to_builtin_feed() {
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();
        env::remove_var(ENV_SOURCES_PATH);

        let sources = load_sources_default().unwrap();
        assert_eq!(sources.len(), 1);
        assert!(matches!(&sources[0], SourceConfig::FeedRss { url, .. }
            if url.contains("weworkremotely.com")));

        env::set_current_dir(&old).unwrap();
    }

    #[serial_test::serial]
    #[test]
    fn missing_credentials_fail_fast() {
        env::remove_var("GEMINI_API_KEY");
        let err = AppConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }
}
