// tests/pipeline_dedup.rs
// Dedup must precede extraction: the oracle is never consulted for a source
// URL that is already in the store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use loker_ingest::ingest::adapters::FeedRssAdapter;
use loker_ingest::{
    ExtractionOracle, FixedOracle, MemoryStore, NormalizedDraft, Pacer, Pipeline, SourceAdapter,
};

const FEED: &str = include_str!("fixtures/jobs_rss.xml");
const SEEDED_URL: &str = "https://jobs.test/remote-jobs/fullstack-developer";

const REPLY: &str = r#"{
    "judul_pekerjaan": "Insinyur Perangkat Lunak",
    "perusahaan": "Ferrous Co",
    "lokasi": "Remote",
    "estimasi_gaji": "$120k-$150k",
    "tech_stack": ["Rust", "PostgreSQL", "AWS"],
    "tipe_pekerjaan": "Penuh Waktu"
}"#;

struct CountingOracle {
    inner: FixedOracle,
    calls: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl ExtractionOracle for CountingOracle {
    async fn extract(&self, free_text: &str) -> Result<NormalizedDraft> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // The seeded URL's title must never reach the oracle.
        assert!(
            !free_text.contains("Fullstack Developer"),
            "oracle was called for a duplicate item"
        );
        self.inner.extract(free_text).await
    }
    fn name(&self) -> &str {
        "counting"
    }
}

#[tokio::test]
async fn duplicates_skip_before_any_oracle_spend() {
    let store = Arc::new(MemoryStore::new());
    store.seed_url(SEEDED_URL);

    let calls = Arc::new(AtomicUsize::new(0));
    let oracle = CountingOracle {
        inner: FixedOracle::new(REPLY),
        calls: calls.clone(),
    };

    let adapters: Vec<Box<dyn SourceAdapter>> =
        vec![Box::new(FeedRssAdapter::from_fixture("wwr", FEED))];
    let pipeline = Pipeline::new(adapters, store.clone(), Arc::new(oracle))
        .with_pacer(Pacer::unthrottled());

    let stats = pipeline.run_once().await;

    // The fixture has 3 entries with links; one is pre-seeded.
    assert_eq!(stats.seen, 3);
    assert_eq!(stats.duplicates, 1);
    assert_eq!(stats.stored, 2);
    assert_eq!(stats.failed, 0);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    // Seeded row untouched plus two new ones.
    assert_eq!(store.len(), 3);
}
