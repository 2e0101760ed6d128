use std::sync::Arc;

use core_jm::{
    BrowserEngine, ChromeOptions, ChromeSession, CrawlConfig, CrawlCycle, TimeUnit, TokioPacer, get_db_pool,
    get_poll_interval, setup_logging,
};
use data_model_jm::{PgJobStore, PgUserDirectory};

use cron_jm::{DEFAULT_MAX_AGE_HOURS, KeywordFanOut, RetentionSweep};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file., if it exists
    dotenvy::dotenv().ok();

    setup_logging("cron_jm=debug,core_jm=info");

    let pool = get_db_pool().await;
    let store = Arc::new(PgJobStore::new(pool.clone()));
    let directory = Arc::new(PgUserDirectory::new(pool));

    let crawl_interval = get_poll_interval(TimeUnit::Seconds, "CRON_CRAWL_INTERVAL_S", 900);
    let retention_interval = get_poll_interval(TimeUnit::Seconds, "CRON_RETENTION_INTERVAL_S", 900);
    let max_age = get_poll_interval(TimeUnit::Hours, "RETENTION_MAX_AGE_H", DEFAULT_MAX_AGE_HOURS as u64);
    let max_age = chrono::Duration::from_std(max_age).expect("RETENTION_MAX_AGE_H is out of range");

    let config = CrawlConfig::default();
    let browser = Arc::new(ChromeSession::new(ChromeOptions::from_env()));
    let pacer = Arc::new(TokioPacer);
    let cycle = CrawlCycle::new(browser.clone(), store.clone(), pacer.clone(), config.clone())
        .expect("Default crawl configuration must be valid");
    let fanout = KeywordFanOut::new(directory, Arc::new(cycle), pacer, &config);
    let sweep = RetentionSweep::new(store, max_age);

    tracing::info!(
        "Scheduler started: crawl every {:?}, retention every {:?} (max age {}h)",
        crawl_interval,
        retention_interval,
        sweep.max_age().num_hours()
    );

    // the two timers are independent: a long crawl never delays the sweep
    let crawl_loop = tokio::spawn(async move {
        loop {
            tracing::info!("Starting crawl fan-out");
            match fanout.run().await {
                Ok(report) => tracing::info!(
                    "Crawl fan-out stored {} new postings over {} cycles",
                    report.created(),
                    report.cycles.len()
                ),
                Err(e) => tracing::error!("Crawl fan-out could not start: {}", e),
            }
            tracing::info!("Sleeping for {:?} until next crawl", crawl_interval);
            tokio::time::sleep(crawl_interval).await;
        }
    });

    let retention_loop = tokio::spawn(async move {
        loop {
            if let Err(e) = sweep.run().await {
                tracing::error!("Retention sweep failed: {}", e);
            }
            tokio::time::sleep(retention_interval).await;
        }
    });

    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown requested"),
        Err(e) => tracing::error!("Failed to listen for shutdown signal: {}", e),
    }

    crawl_loop.abort();
    retention_loop.abort();
    if let Err(e) = browser.shutdown().await {
        tracing::warn!("Failed to close browser session: {}", e);
    }
}
