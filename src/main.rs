//! loker-ingest — Binary Entrypoint
//! One linear ingestion run per invocation: fetch, dedup, extract, persist.
//! Per-item failures are logged and counted; only missing credentials abort.

use loker_ingest::{build_pipeline, AppConfig};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("loker_ingest=info,ingest=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when vars come from the real environment.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AppConfig::from_env()?;
    tracing::info!(
        sources = cfg.sources.len(),
        fetch_limit = cfg.fetch_limit,
        "starting ingestion run"
    );

    let pipeline = build_pipeline(&cfg)?;
    let stats = pipeline.run_once().await;

    println!(
        "Selesai! {} lowongan baru tersimpan ({} duplikat dilewati, {} gagal).",
        stats.stored, stats.duplicates, stats.failed
    );
    Ok(())
}
