use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use core_jm::{CrawlConfig, CrawlReport, CycleRunner, Error as CoreError, Pacer, PauseKind, SearchQuery};
use data_model_jm::UserDirectory;

use crate::errors::Error;

/// Trims, drops blanks and removes duplicates, keeping the first occurrence of each keyword.
pub fn normalize_keywords(raw: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.into_iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .filter(|k| seen.insert(k.clone()))
        .collect()
}

#[derive(Debug, Default)]
pub struct FanOutReport {
    /// One report per cycle that ran to completion, in run order.
    pub cycles: Vec<CrawlReport>,
    /// Keywords whose cycle could not run.
    pub failed_keywords: Vec<String>,
}

impl FanOutReport {
    pub fn created(&self) -> usize {
        self.cycles.iter().map(|c| c.created).sum()
    }
}

/// Runs one crawl cycle per distinct keyword of the active users, one after the other.
pub struct KeywordFanOut {
    directory: Arc<dyn UserDirectory>,
    runner: Arc<dyn CycleRunner>,
    pacer: Arc<dyn Pacer>,
    keyword_pause: Duration,
    /// Location and flags shared by every keyword cycle; also the fallback query.
    base_query: SearchQuery,
}

impl KeywordFanOut {
    /// Takes the inter-keyword pause and the location of every keyword query from `config`.
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        runner: Arc<dyn CycleRunner>,
        pacer: Arc<dyn Pacer>,
        config: &CrawlConfig,
    ) -> Self {
        Self {
            directory,
            runner,
            pacer,
            keyword_pause: config.keyword_pause,
            base_query: SearchQuery::broad(config.default_location.as_str()),
        }
    }

    /// Crawls `query` alone when given, otherwise fans out over the users' keywords.
    pub async fn trigger(&self, query: Option<SearchQuery>) -> Result<FanOutReport, Error> {
        match query {
            Some(query) => {
                let cycle = self.runner.run_cycle(&query).await?;
                Ok(FanOutReport {
                    cycles: vec![cycle],
                    failed_keywords: Vec::new(),
                })
            }
            None => self.run().await,
        }
    }

    /// Fails if the keyword list cannot be read or the browser session cannot be brought up.
    /// Any other failing keyword is logged and skipped.
    pub async fn run(&self) -> Result<FanOutReport, Error> {
        let keywords = normalize_keywords(self.directory.list_active_keywords().await?);
        let mut report = FanOutReport::default();

        if keywords.is_empty() {
            tracing::info!("No user keywords configured, running the broad search");
            match self.runner.run_cycle(&self.base_query).await {
                Ok(cycle) => report.cycles.push(cycle),
                Err(e @ CoreError::Browser(_)) => return Err(e.into()),
                Err(e) => {
                    tracing::error!("Broad crawl failed: {}", e);
                    report.failed_keywords.push(self.base_query.label());
                }
            }
            return Ok(report);
        }

        tracing::info!("Crawling {} keywords: {:?}", keywords.len(), keywords);
        for (i, keyword) in keywords.iter().enumerate() {
            if i > 0 {
                self.pacer.pause(PauseKind::Keyword, self.keyword_pause).await;
            }

            let query = self.base_query.with_keyword(keyword.as_str());
            match self.runner.run_cycle(&query).await {
                Ok(cycle) => report.cycles.push(cycle),
                // every remaining keyword would fail the same way
                Err(e @ CoreError::Browser(_)) => {
                    tracing::error!("[crawl: {}] Browser session unavailable, stopping fan-out", keyword);
                    return Err(e.into());
                }
                Err(e) => {
                    tracing::error!("[crawl: {}] Cycle failed: {}", keyword, e);
                    report.failed_keywords.push(keyword.clone());
                }
            }
        }

        tracing::info!(
            "Fan-out finished: {} cycles, {} new postings, {} failed keywords",
            report.cycles.len(),
            report.created(),
            report.failed_keywords.len()
        );
        Ok(report)
    }
}
