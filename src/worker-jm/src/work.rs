use std::sync::Arc;

use core_jm::llms::{LlmProvider, enrich_description};
use data_model_jm::JobStore;
use data_model_jm::models::JobPosting;

use crate::Error;

/// Postings enriched per cycle unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 10;

#[derive(Debug, Clone)]
pub struct EnrichmentConfig {
    /// Maximum number of postings selected per cycle (default: 10)
    pub batch_size: usize,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Outcome of asking the generation service about one posting.
#[derive(Debug)]
pub enum EnrichmentResult {
    /// Non-empty structured summary, ready to store.
    Enriched(String),
    /// Service error or blank answer. The posting stays pending.
    GenerationFailed(Error),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EnrichmentReport {
    pub selected: usize,
    pub enriched: usize,
    pub failed: usize,
}

/// Asks the generation service for the structured summary of `posting`.
pub async fn handle_posting(provider: &dyn LlmProvider, posting: &JobPosting) -> EnrichmentResult {
    let Some(raw_description) = posting.raw_description.as_deref() else {
        return EnrichmentResult::GenerationFailed(
            core_jm::Error::GenerationServiceFailure("posting has no description".to_string()).into(),
        );
    };

    tracing::debug!("[posting: {}] Requesting summary for '{}'", posting.id, posting.title);
    match enrich_description(provider, raw_description).await {
        Ok(summary) => EnrichmentResult::Enriched(summary),
        Err(e) => EnrichmentResult::GenerationFailed(e.into()),
    }
}

/// Stores a successful summary. A failed one leaves the posting untouched so the next cycle retries it.
/// Returns whether the posting is now enriched.
pub async fn handle_result(store: &dyn JobStore, posting: &JobPosting, result: EnrichmentResult) -> Result<bool, Error> {
    match result {
        EnrichmentResult::Enriched(summary) => {
            store.mark_enriched(posting.id, &summary).await?;
            tracing::info!("[posting: {}] Enriched '{}'", posting.id, posting.title);
            Ok(true)
        }
        EnrichmentResult::GenerationFailed(error) => {
            tracing::warn!(
                "[posting: {}] Failed to enrich '{}', will retry next cycle: {}",
                posting.id,
                posting.title,
                error
            );
            Ok(false)
        }
    }
}

/// Enriches pending postings in bounded batches.
pub struct EnrichmentProcessor {
    store: Arc<dyn JobStore>,
    provider: Arc<dyn LlmProvider>,
    config: EnrichmentConfig,
}

impl EnrichmentProcessor {
    pub fn new(store: Arc<dyn JobStore>, provider: Arc<dyn LlmProvider>, config: EnrichmentConfig) -> Self {
        Self { store, provider, config }
    }

    /// One pass over the oldest pending postings.
    ///
    /// Fails only if the pending batch cannot be read. Every posting is handled on its own: a
    /// failure is logged and the rest of the batch continues.
    pub async fn run_cycle(&self) -> Result<EnrichmentReport, Error> {
        let pending = self.store.select_pending(self.config.batch_size).await?;
        let mut report = EnrichmentReport {
            selected: pending.len(),
            ..EnrichmentReport::default()
        };

        if pending.is_empty() {
            tracing::debug!("No postings waiting for enrichment");
            return Ok(report);
        }
        tracing::info!("Enriching {} postings", pending.len());

        for posting in &pending {
            let result = handle_posting(self.provider.as_ref(), posting).await;
            match handle_result(self.store.as_ref(), posting, result).await {
                Ok(true) => report.enriched += 1,
                Ok(false) => report.failed += 1,
                Err(error) => {
                    tracing::error!("[posting: {}] Failed to store summary: {}", posting.id, error);
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            "Enrichment cycle done: {} enriched, {} failed",
            report.enriched,
            report.failed
        );
        Ok(report)
    }
}
