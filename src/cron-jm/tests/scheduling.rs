//! Tests for the keyword fan-out and the retention sweep
//!
//! The crawl itself is replaced by a runner that only records which queries it was given, so
//! these tests check sequencing, pacing and isolation without a browser.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use core_jm::browser::mock::MockBrowser;
use core_jm::pacer::{EventLog, RecordingPacer};
use core_jm::{CrawlConfig, CrawlCycle, CrawlReport, CycleRunner, Error as CoreError, PauseKind, SearchQuery};
use cron_jm::{KeywordFanOut, RetentionSweep};
use data_model_jm::test_helpers::{InMemoryJobStore, StaticUserDirectory, posting_created_ago};

/// Records every query in the shared event log and fails for the configured keywords.
struct RecordingRunner {
    events: EventLog,
    queries: Mutex<Vec<SearchQuery>>,
    failing: Vec<String>,
    browser_down: bool,
}

impl RecordingRunner {
    fn new(events: EventLog) -> Self {
        Self {
            events,
            queries: Mutex::new(Vec::new()),
            failing: Vec::new(),
            browser_down: false,
        }
    }

    fn without_browser(mut self) -> Self {
        self.browser_down = true;
        self
    }

    fn failing_on(mut self, keyword: &str) -> Self {
        self.failing.push(keyword.to_string());
        self
    }

    fn queries(&self) -> Vec<SearchQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl CycleRunner for RecordingRunner {
    async fn run_cycle(&self, query: &SearchQuery) -> Result<CrawlReport, CoreError> {
        self.queries.lock().unwrap().push(query.clone());
        self.events.lock().unwrap().push(format!("cycle:{}", query.label()));

        if self.browser_down {
            return Err(CoreError::Browser("browser could not be launched".to_string()));
        }
        if self.failing.contains(&query.keyword) {
            return Err(CoreError::ParseFailure("results page unreadable".to_string()));
        }
        Ok(CrawlReport {
            query: query.clone(),
            pages_visited: 1,
            pages_failed: 0,
            candidates: 1,
            created: 1,
            already_existing: 0,
            filtered: 0,
            failed: 0,
        })
    }
}

const KEYWORD_PAUSE: Duration = Duration::from_secs(5);

fn config() -> CrawlConfig {
    CrawlConfig::builder().keyword_pause(KEYWORD_PAUSE).build()
}

fn fanout(directory: StaticUserDirectory, runner: &Arc<RecordingRunner>, pacer: &Arc<RecordingPacer>) -> KeywordFanOut {
    KeywordFanOut::new(Arc::new(directory), runner.clone(), pacer.clone(), &config())
}

#[tokio::test]
async fn test_two_keywords_run_sequentially_with_pause_between() {
    let events = EventLog::default();
    let runner = Arc::new(RecordingRunner::new(events.clone()));
    let pacer = Arc::new(RecordingPacer::sharing(events.clone()));

    let report = fanout(StaticUserDirectory::new(["Java", "Python"]), &runner, &pacer)
        .run()
        .await
        .unwrap();

    assert_eq!(report.cycles.len(), 2);
    assert_eq!(report.created(), 2);
    assert_eq!(
        events.lock().unwrap().clone(),
        vec!["cycle:Java", "pause:Keyword:5000ms", "cycle:Python"]
    );
    assert_eq!(pacer.pauses(), vec![(PauseKind::Keyword, KEYWORD_PAUSE)]);

    let queries = runner.queries();
    assert!(queries.iter().all(|q| q.location == "Brasil" && q.last_24h && q.remote));
}

#[tokio::test]
async fn test_keywords_are_trimmed_and_deduplicated() {
    let events = EventLog::default();
    let runner = Arc::new(RecordingRunner::new(events.clone()));
    let pacer = Arc::new(RecordingPacer::new());

    fanout(StaticUserDirectory::new([" Java ", "", "Java", "  ", "Rust"]), &runner, &pacer)
        .run()
        .await
        .unwrap();

    let keywords: Vec<String> = runner.queries().into_iter().map(|q| q.keyword).collect();
    assert_eq!(keywords, vec!["Java", "Rust"]);
    assert_eq!(pacer.count(PauseKind::Keyword), 1);
}

#[tokio::test]
async fn test_no_keywords_runs_one_broad_cycle() {
    let runner = Arc::new(RecordingRunner::new(EventLog::default()));
    let pacer = Arc::new(RecordingPacer::new());

    let report = fanout(StaticUserDirectory::new(["", "   "]), &runner, &pacer).run().await.unwrap();

    assert_eq!(report.cycles.len(), 1);
    assert_eq!(runner.queries(), vec![SearchQuery::new("", "Brasil", true, true)]);
    assert_eq!(pacer.count(PauseKind::Keyword), 0);
}

#[tokio::test]
async fn test_failing_keyword_does_not_stop_the_rest() {
    let events = EventLog::default();
    let runner = Arc::new(RecordingRunner::new(events.clone()).failing_on("Java"));
    let pacer = Arc::new(RecordingPacer::new());

    let report = fanout(StaticUserDirectory::new(["Java", "Python", "Go"]), &runner, &pacer)
        .run()
        .await
        .unwrap();

    assert_eq!(report.failed_keywords, vec!["Java"]);
    assert_eq!(report.cycles.len(), 2);
    assert_eq!(runner.queries().len(), 3);
}

#[tokio::test]
async fn test_unreadable_directory_fails_the_fanout() {
    let runner = Arc::new(RecordingRunner::new(EventLog::default()));
    let pacer = Arc::new(RecordingPacer::new());

    let result = fanout(StaticUserDirectory::unavailable(), &runner, &pacer).run().await;

    assert!(matches!(result, Err(cron_jm::Error::StoreError(_))));
    assert!(runner.queries().is_empty());
}

#[tokio::test]
async fn test_unavailable_browser_fails_the_fanout() {
    let runner = Arc::new(RecordingRunner::new(EventLog::default()).without_browser());
    let pacer = Arc::new(RecordingPacer::new());

    let result = fanout(StaticUserDirectory::new(["Java", "Python"]), &runner, &pacer)
        .trigger(None)
        .await;

    assert!(matches!(result, Err(cron_jm::Error::CoreError(CoreError::Browser(_)))));
    // the second keyword is not attempted
    assert_eq!(runner.queries().len(), 1);
    assert_eq!(pacer.count(PauseKind::Keyword), 0);
}

#[tokio::test]
async fn test_unavailable_browser_fails_the_broad_crawl() {
    let runner = Arc::new(RecordingRunner::new(EventLog::default()).without_browser());
    let pacer = Arc::new(RecordingPacer::new());

    let result = fanout(StaticUserDirectory::empty(), &runner, &pacer).run().await;

    assert!(matches!(result, Err(cron_jm::Error::CoreError(CoreError::Browser(_)))));
}

#[tokio::test]
async fn test_fanout_over_crawl_cycle_with_dead_browser() {
    let browser = MockBrowser::new().unavailable();
    let config = CrawlConfig::builder().pauses(Duration::ZERO).build();
    let cycle = CrawlCycle::new(
        Arc::new(browser.clone()),
        Arc::new(InMemoryJobStore::new()),
        Arc::new(RecordingPacer::new()),
        config.clone(),
    )
    .unwrap();
    let fanout = KeywordFanOut::new(
        Arc::new(StaticUserDirectory::new(["Java", "Python"])),
        Arc::new(cycle),
        Arc::new(RecordingPacer::new()),
        &config,
    );

    let result = fanout.trigger(None).await;

    assert!(result.is_err());
    assert!(browser.visits().is_empty());
}

#[tokio::test]
async fn test_keyword_queries_use_configured_location() {
    let runner = Arc::new(RecordingRunner::new(EventLog::default()));
    let pacer = Arc::new(RecordingPacer::new());
    let config = CrawlConfig::builder().default_location("Portugal".to_string()).build();

    KeywordFanOut::new(Arc::new(StaticUserDirectory::empty()), runner.clone(), pacer.clone(), &config)
        .run()
        .await
        .unwrap();
    KeywordFanOut::new(Arc::new(StaticUserDirectory::new(["Rust"])), runner.clone(), pacer, &config)
        .run()
        .await
        .unwrap();

    assert_eq!(
        runner.queries(),
        vec![
            SearchQuery::new("", "Portugal", true, true),
            SearchQuery::new("Rust", "Portugal", true, true)
        ]
    );
}

#[tokio::test]
async fn test_explicit_query_bypasses_fanout() {
    let runner = Arc::new(RecordingRunner::new(EventLog::default()));
    let pacer = Arc::new(RecordingPacer::new());
    let query = SearchQuery::new("Rust", "São Paulo", false, false);

    let report = fanout(StaticUserDirectory::new(["Java"]), &runner, &pacer)
        .trigger(Some(query.clone()))
        .await
        .unwrap();

    assert_eq!(report.cycles.len(), 1);
    assert_eq!(runner.queries(), vec![query]);
}

#[tokio::test]
async fn test_retention_deletes_only_old_postings() {
    let store = Arc::new(InMemoryJobStore::with_postings(vec![
        posting_created_ago("https://br.linkedin.com/jobs/view/old", chrono::Duration::hours(26)),
        posting_created_ago("https://br.linkedin.com/jobs/view/new", chrono::Duration::hours(1)),
    ]));
    let sweep = RetentionSweep::new(store.clone(), chrono::Duration::hours(25));

    let deleted = sweep.run().await.unwrap();

    assert_eq!(deleted, 1);
    assert!(store.get("https://br.linkedin.com/jobs/view/old").is_none());
    assert!(store.get("https://br.linkedin.com/jobs/view/new").is_some());
}

#[tokio::test]
async fn test_retention_with_unreachable_store() {
    let sweep = RetentionSweep::new(Arc::new(InMemoryJobStore::unavailable()), chrono::Duration::hours(25));
    assert!(sweep.run().await.is_err());
}
