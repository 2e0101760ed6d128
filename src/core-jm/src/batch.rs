//! Turns the candidates of one results page into stored postings.

use std::sync::Arc;

use data_model_jm::models::{FALLBACK_DESCRIPTION, JobPosting};
use data_model_jm::{JobStore, StoreError};
use futures::future::join_all;
use regex::Regex;

use crate::Error;
use crate::browser::BrowserEngine;
use crate::config::CrawlConfig;
use crate::detail::DetailFetcher;
use crate::listing::CrawlCandidate;
use crate::pacer::{Pacer, PauseKind};

/// What happened to a single candidate.
#[derive(Debug)]
pub enum CandidateOutcome {
    Created(JobPosting),
    /// The url is already stored, either found up front or lost a concurrent insert race.
    AlreadyExists,
    /// The description requires English.
    Filtered,
    Failed(Error),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub created: usize,
    pub already_existing: usize,
    pub filtered: usize,
    pub failed: usize,
    /// Candidates beyond the per-page cap, never looked at.
    pub over_cap: usize,
}

impl BatchReport {
    fn record(&mut self, outcome: &CandidateOutcome) {
        match outcome {
            CandidateOutcome::Created(_) => self.created += 1,
            CandidateOutcome::AlreadyExists => self.already_existing += 1,
            CandidateOutcome::Filtered => self.filtered += 1,
            CandidateOutcome::Failed(_) => self.failed += 1,
        }
    }
}

pub struct BatchOrchestrator {
    store: Arc<dyn JobStore>,
    fetcher: DetailFetcher,
    pacer: Arc<dyn Pacer>,
    exclusion: Regex,
    config: CrawlConfig,
}

impl BatchOrchestrator {
    /// Fails only if the configured exclusion pattern does not compile.
    pub fn new(
        store: Arc<dyn JobStore>,
        browser: Arc<dyn BrowserEngine>,
        pacer: Arc<dyn Pacer>,
        config: CrawlConfig,
    ) -> Result<Self, Error> {
        let exclusion = Regex::new(&config.exclusion_pattern)?;
        Ok(Self {
            store,
            fetcher: DetailFetcher::new(browser, &config),
            pacer,
            exclusion,
            config,
        })
    }

    /// True if the text asks for English and must not be stored.
    pub fn is_excluded(&self, description: &str) -> bool {
        self.exclusion.is_match(description)
    }

    /// Processes the candidates of one page in sequential groups of concurrent units.
    pub async fn process_page(&self, mut candidates: Vec<CrawlCandidate>) -> BatchReport {
        let mut report = BatchReport::default();

        let cap = self.config.max_candidates_per_page;
        if candidates.len() > cap {
            report.over_cap = candidates.len() - cap;
            candidates.truncate(cap);
        }

        let group_size = self.config.group_size.max(1);
        let groups: Vec<&[CrawlCandidate]> = candidates.chunks(group_size).collect();
        let group_count = groups.len();

        for (i, group) in groups.into_iter().enumerate() {
            tracing::debug!("Processing group {} of {}", i + 1, group_count);

            let outcomes = join_all(group.iter().map(|candidate| self.process_candidate(candidate))).await;
            for outcome in &outcomes {
                report.record(outcome);
            }

            if i + 1 < group_count {
                self.pacer.pause(PauseKind::Batch, self.config.batch_pause).await;
            }
        }

        report
    }

    /// Runs one candidate through lookup, detail fetch, language filter and insert.
    pub async fn process_candidate(&self, candidate: &CrawlCandidate) -> CandidateOutcome {
        match self.store.find_by_url(&candidate.url).await {
            Ok(Some(_)) => return CandidateOutcome::AlreadyExists,
            Ok(None) => {}
            Err(e) => {
                tracing::error!("Lookup failed for {}: {}", candidate.url, e);
                return CandidateOutcome::Failed(e.into());
            }
        }

        tracing::info!("Fetching details for: {}", candidate.title);
        let description = self.fetcher.fetch(&candidate.url).await;

        if let Some(text) = &description {
            if self.is_excluded(text) {
                tracing::info!("Skipping '{}': description requires English", candidate.title);
                return CandidateOutcome::Filtered;
            }
        }

        let raw_description = description.unwrap_or_else(|| FALLBACK_DESCRIPTION.to_string());
        let posting = candidate.clone().into_new_posting(Some(raw_description));

        match self.store.create(posting).await {
            Ok(created) => {
                tracing::info!("[posting: {}] Stored '{}'", created.id, created.title);
                CandidateOutcome::Created(created)
            }
            Err(StoreError::DuplicateKey(url)) => {
                tracing::debug!("Lost insert race for {}", url);
                CandidateOutcome::AlreadyExists
            }
            Err(e) => {
                tracing::error!("Failed to store {}: {}", candidate.url, e);
                CandidateOutcome::Failed(e.into())
            }
        }
    }
}
