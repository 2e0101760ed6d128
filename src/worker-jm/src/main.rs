use std::sync::Arc;

use core_jm::{TimeUnit, get_db_pool, get_poll_interval, llms::provider_from_env, setup_logging};
use data_model_jm::PgJobStore;

use worker_jm::{EnrichmentConfig, EnrichmentProcessor};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file., if it exists
    dotenvy::dotenv().ok();

    setup_logging("worker_jm=debug,core_jm=info");

    let provider = match provider_from_env() {
        Ok(provider) => provider,
        Err(error) => {
            tracing::error!("Enrichment backend is not configured, worker will not start: {}", error);
            std::process::exit(1);
        }
    };

    let pool = get_db_pool().await;
    let store = Arc::new(PgJobStore::new(pool));

    let poll_interval = get_poll_interval(TimeUnit::Seconds, "WORKER_POLL_INTERVAL_S", 600);

    let processor = EnrichmentProcessor::new(store, provider, EnrichmentConfig::default());

    // Worker polling loop
    loop {
        if let Err(error) = processor.run_cycle().await {
            tracing::error!("[SKIP] Could not read pending postings: {}", error);
        }
        tracing::debug!("Waiting {:?} to poll for pending postings", poll_interval);
        tokio::time::sleep(poll_interval).await;
    }
}
