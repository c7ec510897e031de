// src/ingest/mod.rs
// The ingestion pipeline: drain adapters into one flat queue, then per item
// run dedup -> sanitize -> extract -> persist, strictly sequentially. Every
// per-item failure is terminal for that item only; the run always completes.

pub mod adapters;
pub mod posting;
pub mod types;

use std::sync::Arc;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;

use crate::extract::ExtractionOracle;
use crate::pacing::Pacer;
use crate::sanitize::Sanitizer;
use crate::store::JobStore;
use crate::ingest::types::{RawPosting, SourceAdapter};

pub const DEFAULT_FETCH_LIMIT: usize = 10;

/// One-time metrics registration.
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "ingest_items_fetched_total",
            "Raw postings yielded by source adapters."
        );
        describe_counter!("ingest_items_total", "Items entering the pipeline.");
        describe_counter!(
            "ingest_duplicates_total",
            "Items skipped because the source URL is already stored."
        );
        describe_counter!("ingest_stored_total", "Normalized postings persisted.");
        describe_counter!(
            "ingest_failed_total",
            "Items that failed extraction or persistence."
        );
        describe_counter!(
            "ingest_source_errors_total",
            "Whole-source fetch failures."
        );
        describe_counter!(
            "ingest_detail_fallback_total",
            "Listing items that fell back to title-only descriptions."
        );
        describe_histogram!("ingest_parse_ms", "Source parse time in milliseconds.");
        describe_histogram!("ingest_oracle_ms", "Oracle extraction time in milliseconds.");
        describe_gauge!(
            "ingest_last_run_ts",
            "Unix ts when the pipeline last finished a run."
        );
    });
}

/// Counters for one pipeline execution.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub seen: usize,
    pub duplicates: usize,
    pub stored: usize,
    pub failed: usize,
}

pub struct Pipeline {
    adapters: Vec<Box<dyn SourceAdapter>>,
    store: Arc<dyn JobStore>,
    oracle: Arc<dyn ExtractionOracle>,
    sanitizer: Sanitizer,
    pacer: Pacer,
    fetch_limit: usize,
}

impl Pipeline {
    pub fn new(
        adapters: Vec<Box<dyn SourceAdapter>>,
        store: Arc<dyn JobStore>,
        oracle: Arc<dyn ExtractionOracle>,
    ) -> Self {
        Self {
            adapters,
            store,
            oracle,
            sanitizer: Sanitizer::default(),
            pacer: Pacer::new(crate::pacing::DEFAULT_ORACLE_INTERVAL),
            fetch_limit: DEFAULT_FETCH_LIMIT,
        }
    }

    pub fn with_sanitizer(mut self, sanitizer: Sanitizer) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    pub fn with_pacer(mut self, pacer: Pacer) -> Self {
        self.pacer = pacer;
        self
    }

    pub fn with_fetch_limit(mut self, limit: usize) -> Self {
        self.fetch_limit = limit;
        self
    }

    /// Drain every adapter into a flat ordered queue. A failing source is
    /// logged and contributes zero items; it never aborts its siblings.
    async fn drain_adapters(&self) -> Vec<RawPosting> {
        let mut queue = Vec::new();
        for adapter in &self.adapters {
            match adapter.fetch(self.fetch_limit).await {
                Ok(mut items) => {
                    tracing::info!(target: "ingest", source = adapter.name(),
                        count = items.len(), "source fetched");
                    queue.append(&mut items);
                }
                Err(e) => {
                    tracing::warn!(target: "ingest", source = adapter.name(),
                        error = ?e, "source fetch failed");
                    counter!("ingest_source_errors_total").increment(1);
                }
            }
        }
        queue
    }

    /// What the oracle sees: title, company when the source knew it, and the
    /// sanitized description.
    fn oracle_input(&self, raw: &RawPosting) -> String {
        let cleaned = self.sanitizer.sanitize(&raw.raw_description);
        match &raw.company {
            Some(company) => format!("{}. {}. {}", raw.title, company, cleaned),
            None => format!("{}. {}", raw.title, cleaned),
        }
    }

    /// One linear pass: fetch everything, then process each item to a
    /// terminal outcome (stored, duplicate-skip, or failed).
    pub async fn run_once(&self) -> RunStats {
        ensure_metrics_described();
        let mut stats = RunStats::default();

        let queue = self.drain_adapters().await;
        tracing::info!(target: "ingest", queued = queue.len(), "processing queue");

        for raw in queue {
            stats.seen += 1;
            counter!("ingest_items_total").increment(1);

            // Dedup gate first: never spend oracle quota on a known URL.
            match self.store.exists(&raw.source_url).await {
                Ok(true) => {
                    tracing::info!(target: "ingest", url = %raw.source_url, "skip: already stored");
                    counter!("ingest_duplicates_total").increment(1);
                    stats.duplicates += 1;
                    continue;
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(target: "ingest", url = %raw.source_url, error = ?e,
                        "dedup lookup failed");
                    counter!("ingest_failed_total").increment(1);
                    stats.failed += 1;
                    continue;
                }
            }

            tracing::info!(target: "ingest", source = raw.source.as_str(),
                title = %raw.title, "processing");

            let input = self.oracle_input(&raw);

            // Pacing applies only to oracle-consuming items.
            self.pacer.acquire().await;

            let t0 = std::time::Instant::now();
            let draft = match self.oracle.extract(&input).await {
                Ok(d) => d,
                Err(e) => {
                    tracing::warn!(target: "ingest", url = %raw.source_url, error = ?e,
                        "extraction failed");
                    counter!("ingest_failed_total").increment(1);
                    stats.failed += 1;
                    continue;
                }
            };
            histogram!("ingest_oracle_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

            let posting = match draft.finalize(raw.source_url.clone()) {
                Ok(p) => p,
                Err(e) => {
                    tracing::warn!(target: "ingest", url = %raw.source_url, error = ?e,
                        "oracle reply failed schema validation");
                    counter!("ingest_failed_total").increment(1);
                    stats.failed += 1;
                    continue;
                }
            };

            match self.store.insert(&posting).await {
                Ok(()) => {
                    tracing::info!(target: "ingest", title = %posting.judul_pekerjaan,
                        url = %posting.url_sumber, "stored");
                    counter!("ingest_stored_total").increment(1);
                    stats.stored += 1;
                }
                Err(e) => {
                    tracing::warn!(target: "ingest", url = %posting.url_sumber, error = ?e,
                        "store insert failed");
                    counter!("ingest_failed_total").increment(1);
                    stats.failed += 1;
                }
            }
        }

        let now = chrono::Utc::now().timestamp().max(0) as u64;
        gauge!("ingest_last_run_ts").set(now as f64);
        tracing::info!(target: "ingest", seen = stats.seen, duplicates = stats.duplicates,
            stored = stats.stored, failed = stats.failed, "run finished");

        stats
    }
}
