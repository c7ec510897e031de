// src/store.rs
// Keyed persistence behind a trait so the pipeline can run against the real
// Supabase REST surface or an in-memory double. The store is append-only:
// records are inserted once, keyed by source URL, and never updated in place.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::ingest::posting::NormalizedPosting;

/// Lookup-by-key plus insert. `exists` is the dedup gate: it must be consulted
/// before any oracle spend on an item.
#[async_trait::async_trait]
pub trait JobStore: Send + Sync {
    async fn exists(&self, source_url: &str) -> Result<bool>;
    async fn insert(&self, posting: &NormalizedPosting) -> Result<()>;
}

/// Supabase/PostgREST-backed store. Dedup is an equality filter on the
/// `url_sumber` column; insert is a plain POST into the table.
pub struct SupabaseStore {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    table: String,
}

impl SupabaseStore {
    pub fn new(base_url: String, api_key: String, table: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(15))
            .build()
            .context("building store http client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            table,
        })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }
}

#[async_trait::async_trait]
impl JobStore for SupabaseStore {
    async fn exists(&self, source_url: &str) -> Result<bool> {
        let filter = format!("eq.{source_url}");
        let resp = self
            .http
            .get(self.table_url())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .query(&[
                ("select", "id"),
                ("url_sumber", filter.as_str()),
                ("limit", "1"),
            ])
            .send()
            .await
            .context("store lookup request")?
            .error_for_status()
            .context("store lookup status")?;

        let rows: Vec<serde_json::Value> = resp.json().await.context("store lookup body")?;
        Ok(!rows.is_empty())
    }

    async fn insert(&self, posting: &NormalizedPosting) -> Result<()> {
        self.http
            .post(self.table_url())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=minimal")
            .json(posting)
            .send()
            .await
            .context("store insert request")?
            .error_for_status()
            .context("store insert status")?;
        Ok(())
    }
}

/// In-process store for tests and dry runs.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<HashMap<String, NormalizedPosting>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed a URL as already known, without a full record.
    pub fn seed_url(&self, source_url: &str) {
        let placeholder = NormalizedPosting {
            judul_pekerjaan: String::new(),
            perusahaan: String::new(),
            lokasi: String::new(),
            estimasi_gaji: String::new(),
            tech_stack: Vec::new(),
            tipe_pekerjaan: String::new(),
            url_sumber: source_url.to_string(),
        };
        self.rows
            .lock()
            .expect("store mutex poisoned")
            .insert(source_url.to_string(), placeholder);
    }

    pub fn len(&self) -> usize {
        self.rows.lock().expect("store mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, source_url: &str) -> Option<NormalizedPosting> {
        self.rows
            .lock()
            .expect("store mutex poisoned")
            .get(source_url)
            .cloned()
    }

    pub fn snapshot(&self) -> Vec<NormalizedPosting> {
        self.rows
            .lock()
            .expect("store mutex poisoned")
            .values()
            .cloned()
            .collect()
    }
}

#[async_trait::async_trait]
impl JobStore for MemoryStore {
    async fn exists(&self, source_url: &str) -> Result<bool> {
        Ok(self
            .rows
            .lock()
            .expect("store mutex poisoned")
            .contains_key(source_url))
    }

    async fn insert(&self, posting: &NormalizedPosting) -> Result<()> {
        self.rows
            .lock()
            .expect("store mutex poisoned")
            .insert(posting.url_sumber.clone(), posting.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posting(url: &str) -> NormalizedPosting {
        NormalizedPosting {
            judul_pekerjaan: "Dev".into(),
            perusahaan: "PT X".into(),
            lokasi: "Remote Indonesia".into(),
            estimasi_gaji: "Tidak disebutkan".into(),
            tech_stack: vec!["Rust".into()],
            tipe_pekerjaan: "Penuh Waktu".into(),
            url_sumber: url.into(),
        }
    }

    #[tokio::test]
    async fn memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(!store.exists("https://a.test/1").await.unwrap());
        store.insert(&posting("https://a.test/1")).await.unwrap();
        assert!(store.exists("https://a.test/1").await.unwrap());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn supabase_table_url_is_postgrest_shaped() {
        let s = SupabaseStore::new(
            "https://proj.supabase.co/".into(),
            "key".into(),
            "indo_tech_jobs".into(),
        )
        .unwrap();
        assert_eq!(s.table_url(), "https://proj.supabase.co/rest/v1/indo_tech_jobs");
    }
}
