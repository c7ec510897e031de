// tests/pipeline_idempotent.rs
// Two consecutive runs over a static snapshot: the second run stores nothing,
// because every item is now a duplicate.

use std::sync::Arc;

use loker_ingest::ingest::adapters::FeedRssAdapter;
use loker_ingest::{FixedOracle, MemoryStore, Pacer, Pipeline, SourceAdapter};

const FEED: &str = include_str!("fixtures/jobs_rss.xml");

const REPLY: &str = r#"{
    "judul_pekerjaan": "Pengembang",
    "perusahaan": "Tidak disebutkan",
    "lokasi": "Remote",
    "estimasi_gaji": "Sesuai standar perusahaan",
    "tech_stack": ["Rust"],
    "tipe_pekerjaan": "Penuh Waktu"
}"#;

fn pipeline(store: Arc<MemoryStore>) -> Pipeline {
    let adapters: Vec<Box<dyn SourceAdapter>> =
        vec![Box::new(FeedRssAdapter::from_fixture("wwr", FEED))];
    Pipeline::new(adapters, store, Arc::new(FixedOracle::new(REPLY)))
        .with_pacer(Pacer::unthrottled())
}

#[tokio::test]
async fn second_run_stores_nothing_new() {
    let store = Arc::new(MemoryStore::new());

    let first = pipeline(store.clone()).run_once().await;
    assert_eq!(first.stored, 3);
    assert_eq!(first.duplicates, 0);
    assert_eq!(store.len(), 3);

    let second = pipeline(store.clone()).run_once().await;
    assert_eq!(second.seen, 3);
    assert_eq!(second.stored, 0);
    assert_eq!(second.duplicates, 3);
    assert_eq!(store.len(), 3);
}
