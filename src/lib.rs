// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod config;
pub mod extract;
pub mod ingest;
pub mod pacing;
pub mod sanitize;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::config::{AppConfig, SourceConfig};
pub use crate::extract::{ExtractionOracle, FixedOracle, GeminiOracle};
pub use crate::ingest::posting::{NormalizedDraft, NormalizedPosting, SENTINEL};
pub use crate::ingest::types::{RawPosting, SourceAdapter, SourceTag};
pub use crate::ingest::{Pipeline, RunStats};
pub use crate::pacing::Pacer;
pub use crate::sanitize::Sanitizer;
pub use crate::store::{JobStore, MemoryStore, SupabaseStore};

use std::sync::Arc;

use anyhow::Result;

/// Wire a pipeline from resolved configuration: configured adapters, the
/// Gemini oracle, and the Supabase-backed store.
pub fn build_pipeline(cfg: &AppConfig) -> Result<Pipeline> {
    let adapters = ingest::adapters::from_config(&cfg.sources)?;
    let store = Arc::new(SupabaseStore::new(
        cfg.supabase_url.clone(),
        cfg.supabase_key.clone(),
        cfg.table.clone(),
    )?);
    let oracle = Arc::new(GeminiOracle::new(
        cfg.gemini_api_key.clone(),
        Some(&cfg.gemini_model),
    )?);

    Ok(Pipeline::new(adapters, store, oracle)
        .with_fetch_limit(cfg.fetch_limit)
        .with_pacer(Pacer::new(cfg.oracle_interval)))
}
