//! One complete crawl of a single query: every results page, every candidate.

use std::sync::Arc;

use async_trait::async_trait;
use data_model_jm::JobStore;
use futures::StreamExt;

use crate::Error;
use crate::batch::{BatchOrchestrator, BatchReport};
use crate::browser::BrowserEngine;
use crate::config::CrawlConfig;
use crate::listing::{ListingCrawler, SearchQuery};
use crate::pacer::Pacer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlReport {
    pub query: SearchQuery,
    pub pages_visited: usize,
    /// Pages that failed to render.
    pub pages_failed: usize,
    /// New candidates across all pages, before the per-page cap.
    pub candidates: usize,
    pub created: usize,
    pub already_existing: usize,
    pub filtered: usize,
    pub failed: usize,
}

impl CrawlReport {
    fn new(query: &SearchQuery) -> Self {
        Self {
            query: query.clone(),
            pages_visited: 0,
            pages_failed: 0,
            candidates: 0,
            created: 0,
            already_existing: 0,
            filtered: 0,
            failed: 0,
        }
    }

    fn absorb(&mut self, batch: BatchReport) {
        self.created += batch.created;
        self.already_existing += batch.already_existing;
        self.filtered += batch.filtered;
        self.failed += batch.failed;
    }
}

/// Something that can crawl one query end to end.
#[async_trait]
pub trait CycleRunner: Send + Sync {
    async fn run_cycle(&self, query: &SearchQuery) -> Result<CrawlReport, Error>;
}

pub struct CrawlCycle {
    browser: Arc<dyn BrowserEngine>,
    crawler: ListingCrawler,
    batch: BatchOrchestrator,
    /// Used for queries that leave the location blank.
    default_location: String,
}

impl CrawlCycle {
    pub fn new(
        browser: Arc<dyn BrowserEngine>,
        store: Arc<dyn JobStore>,
        pacer: Arc<dyn Pacer>,
        config: CrawlConfig,
    ) -> Result<Self, Error> {
        let batch = BatchOrchestrator::new(store, browser.clone(), pacer.clone(), config.clone())?;
        let default_location = config.default_location.clone();
        let crawler = ListingCrawler::new(browser.clone(), pacer, config);
        Ok(Self {
            browser,
            crawler,
            batch,
            default_location,
        })
    }

    /// Crawls `query`, storing new postings page by page.
    ///
    /// Fails only if the browser session cannot be brought up; everything after that is
    /// isolated per page and per candidate and only shows up in the report.
    pub async fn run(&self, query: &SearchQuery) -> Result<CrawlReport, Error> {
        self.browser.ensure_ready().await?;
        let query = &query.with_default_location(&self.default_location);
        tracing::info!("[crawl: {}] Starting crawl in {}", query.label(), query.location);

        let mut report = CrawlReport::new(query);
        let mut pages = Box::pin(self.crawler.pages(query));

        while let Some(page) = pages.next().await {
            report.pages_visited += 1;
            if !page.loaded {
                report.pages_failed += 1;
                continue;
            }
            if page.candidates.is_empty() {
                continue;
            }
            report.candidates += page.candidates.len();

            let batch = self.batch.process_page(page.candidates).await;
            tracing::info!(
                "[crawl: {}] Page {}: {} stored, {} known, {} filtered, {} failed",
                query.label(),
                page.index + 1,
                batch.created,
                batch.already_existing,
                batch.filtered,
                batch.failed
            );
            report.absorb(batch);
        }

        tracing::info!(
            "[crawl: {}] Finished: {} new postings over {} pages",
            query.label(),
            report.created,
            report.pages_visited
        );
        Ok(report)
    }
}

#[async_trait]
impl CycleRunner for CrawlCycle {
    async fn run_cycle(&self, query: &SearchQuery) -> Result<CrawlReport, Error> {
        self.run(query).await
    }
}
