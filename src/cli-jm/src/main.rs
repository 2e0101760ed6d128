use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use core_jm::{
    BrowserEngine, ChromeOptions, ChromeSession, CrawlConfig, CrawlCycle, SearchQuery, TimeUnit, TokioPacer,
    get_db_pool, get_poll_interval, llms::provider_from_env, setup_logging,
};
use cron_jm::{DEFAULT_MAX_AGE_HOURS, KeywordFanOut, RetentionSweep};
use data_model_jm::models::PostingFilter;
use data_model_jm::{JobStore, PgJobStore, PgUserDirectory};
use worker_jm::{EnrichmentConfig, EnrichmentProcessor};

/// Postings listed by `jobs` unless told otherwise.
const DEFAULT_LIST_LIMIT: usize = 20;

#[derive(Parser)]
#[command(name = "jobmatch")]
#[command(about = "On-demand triggers for the job-posting pipeline", long_about = None)]
struct JobMatchCli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl one query now, or every active user's keyword when no keyword is given
    Crawl(CrawlArgs),

    /// Run one enrichment cycle over the oldest pending postings
    Enrich {
        /// Maximum number of postings to enrich
        #[arg(short, long, default_value_t = worker_jm::work::DEFAULT_BATCH_SIZE)]
        batch_size: usize,
    },

    /// Delete postings older than the retention age
    Sweep {
        /// Overrides RETENTION_MAX_AGE_H
        #[arg(long)]
        max_age_hours: Option<u32>,
    },

    /// List the newest stored postings
    Jobs {
        /// Case-insensitive substring of the title
        #[arg(short, long, default_value = "")]
        keyword: String,
        /// Case-insensitive substring of the location
        #[arg(short, long, default_value = "")]
        location: String,
        #[arg(short = 'n', long, default_value_t = DEFAULT_LIST_LIMIT)]
        limit: usize,
        /// Print the postings as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug, Default)]
struct CrawlArgs {
    /// Search keyword. Without it, one crawl runs per active user keyword.
    #[arg(short, long)]
    keyword: Option<String>,
    /// Search location
    #[arg(short, long)]
    location: Option<String>,
    /// Do not restrict results to the last 24 hours
    #[arg(long)]
    no_last_24h: bool,
    /// Only remote positions
    #[arg(long)]
    remote: bool,
}

impl CrawlArgs {
    /// The explicit query, or `None` to fan out over the users' keywords.
    fn query(&self, default_location: &str) -> Option<SearchQuery> {
        let keyword = self.keyword.as_ref()?;
        let location = self
            .location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(default_location);
        Some(SearchQuery::new(keyword.trim(), location, !self.no_last_24h, self.remote))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file., if it exists
    dotenvy::dotenv().ok();

    setup_logging("cli_jm=info,core_jm=info,worker_jm=info,cron_jm=info");

    let cli = JobMatchCli::parse();

    let pool = get_db_pool().await;
    let store = Arc::new(PgJobStore::new(pool.clone()));

    match cli.command {
        Commands::Crawl(args) => {
            let config = CrawlConfig::default();
            let browser = Arc::new(ChromeSession::new(ChromeOptions::from_env()));
            let pacer = Arc::new(TokioPacer);
            let cycle = CrawlCycle::new(browser.clone(), store, pacer.clone(), config.clone())?;
            let directory = Arc::new(PgUserDirectory::new(pool));
            let fanout = KeywordFanOut::new(directory, Arc::new(cycle), pacer, &config);

            let outcome = fanout.trigger(args.query(&config.default_location)).await;
            if let Err(e) = browser.shutdown().await {
                tracing::warn!("Failed to close browser session: {}", e);
            }
            let report = outcome.context("crawl could not start")?;

            for cycle in &report.cycles {
                println!(
                    "[{}] pages: {}, candidates: {}, stored: {}, known: {}, filtered: {}, failed: {}",
                    cycle.query.label(),
                    cycle.pages_visited,
                    cycle.candidates,
                    cycle.created,
                    cycle.already_existing,
                    cycle.filtered,
                    cycle.failed
                );
            }
            for keyword in &report.failed_keywords {
                println!("[{}] crawl failed, see logs", keyword);
            }
            println!("{} new postings", report.created());
        }

        Commands::Enrich { batch_size } => {
            let provider = provider_from_env()?;
            let processor = EnrichmentProcessor::new(store, provider, EnrichmentConfig { batch_size });
            let report = processor.run_cycle().await.context("enrichment could not start")?;
            println!(
                "selected: {}, enriched: {}, failed: {}",
                report.selected, report.enriched, report.failed
            );
        }

        Commands::Sweep { max_age_hours } => {
            let max_age = match max_age_hours {
                Some(hours) => chrono::Duration::hours(hours.into()),
                None => {
                    let from_env =
                        get_poll_interval(TimeUnit::Hours, "RETENTION_MAX_AGE_H", DEFAULT_MAX_AGE_HOURS as u64);
                    chrono::Duration::from_std(from_env).context("RETENTION_MAX_AGE_H is out of range")?
                }
            };
            let deleted = RetentionSweep::new(store, max_age).run().await?;
            println!("{} postings deleted", deleted);
        }

        Commands::Jobs {
            keyword,
            location,
            limit,
            json,
        } => {
            let filter = PostingFilter { keyword, location };
            let postings = store.list_recent(&filter, limit).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&postings)?);
            } else {
                for posting in &postings {
                    let state = if posting.enriched { "enriched" } else { "pending" };
                    println!(
                        "{}  {} | {} | {} [{}]\n    {}",
                        posting.created_at.format("%Y-%m-%d %H:%M"),
                        posting.title,
                        posting.company,
                        posting.location,
                        state,
                        posting.url
                    );
                }
                println!("{} postings", postings.len());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crawl_without_keyword_fans_out() {
        assert!(CrawlArgs::default().query("Brasil").is_none());
    }

    #[test]
    fn test_crawl_flag_defaults() {
        let args = CrawlArgs {
            keyword: Some(" Rust ".to_string()),
            ..CrawlArgs::default()
        };
        assert_eq!(args.query("Brasil"), Some(SearchQuery::new("Rust", "Brasil", true, false)));
        assert_eq!(args.query("Portugal"), Some(SearchQuery::new("Rust", "Portugal", true, false)));
    }

    #[test]
    fn test_crawl_flags_from_command_line() {
        let cli = JobMatchCli::parse_from([
            "jobmatch",
            "crawl",
            "--keyword",
            "",
            "--location",
            "Recife",
            "--no-last-24h",
            "--remote",
        ]);
        let Commands::Crawl(args) = cli.command else {
            panic!("expected the crawl command");
        };
        assert_eq!(args.query("Brasil"), Some(SearchQuery::new("", "Recife", false, true)));
    }

    #[test]
    fn test_jobs_defaults() {
        let cli = JobMatchCli::parse_from(["jobmatch", "jobs"]);
        let Commands::Jobs {
            keyword, limit, json, ..
        } = cli.command
        else {
            panic!("expected the jobs command");
        };
        assert_eq!(keyword, "");
        assert_eq!(limit, 20);
        assert!(!json);
    }
}
