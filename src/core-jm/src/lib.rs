//! Job-posting ingestion core.
//!
//! A crawl walks the search results of one [`SearchQuery`] page by page with the
//! [`ListingCrawler`], and hands every page's new candidates to the [`BatchOrchestrator`], which
//! reads each posting's description with the [`DetailFetcher`] and stores what passes the
//! language filter. [`CrawlCycle`] ties these together for one query. The [`llms`] module turns
//! stored descriptions into structured summaries.

pub mod batch;
pub mod browser;
pub mod common;
pub mod config;
pub mod cycle;
pub mod detail;
pub mod errors;
pub mod ledger;
pub mod listing;
pub mod llms;
pub mod pacer;

pub use batch::{BatchOrchestrator, BatchReport, CandidateOutcome};
pub use browser::{BrowserEngine, BrowserPage, ChromeOptions, ChromeSession};
pub use common::{
    PollIntervalError, TimeUnit, get_database_url, get_db_pool, get_poll_interval, is_env_set, poll_interval,
    setup_logging,
};
pub use config::CrawlConfig;
pub use cycle::{CrawlCycle, CrawlReport, CycleRunner};
pub use detail::DetailFetcher;
pub use errors::Error;
pub use ledger::{DedupLedger, normalize_url};
pub use listing::{CrawlCandidate, ListingCrawler, ListingPage, SearchQuery};
pub use llms::{LlmProvider, enrich_description, provider_from_env};
pub use pacer::{Pacer, PauseKind, TokioPacer};
