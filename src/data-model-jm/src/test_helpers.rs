//! Test utilities for the job store.
//!
//! [`InMemoryJobStore`] and [`StaticUserDirectory`] stand in for Postgres in the other crates'
//! tests. [`test_db_pool`] hands out a pool for the live-database tests, or `None` when
//! `TEST_DATABASE_URL` is not configured.

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::{DbPool, establish_connection_pool};
use crate::models::{JobPosting, NewJobPosting, PostingFilter};
use crate::schema;
use crate::store::{JobStore, StoreError, UserDirectory};

// =============================================================================
// In-memory job store
// =============================================================================

/// Job store backed by a `Vec`. Enforces url uniqueness exactly like the Postgres index.
#[derive(Default)]
pub struct InMemoryJobStore {
    postings: Mutex<Vec<JobPosting>>,
    /// When set, `find_by_url` always misses, so concurrent creates race into `DuplicateKey`.
    stale_lookups: bool,
    /// Urls whose lookup fails with a database error.
    broken_urls: HashSet<String>,
    unavailable: bool,
    create_calls: AtomicUsize,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_postings(postings: Vec<JobPosting>) -> Self {
        Self {
            postings: Mutex::new(postings),
            ..Self::default()
        }
    }

    /// Lookups never find anything; only the uniqueness check on create protects the store.
    pub fn with_stale_lookups() -> Self {
        Self {
            stale_lookups: true,
            ..Self::default()
        }
    }

    /// Every operation fails as if the database were down.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn break_url(mut self, url: &str) -> Self {
        self.broken_urls.insert(url.to_string());
        self
    }

    pub fn insert(&self, posting: JobPosting) {
        self.postings.lock().unwrap().push(posting);
    }

    pub fn all(&self) -> Vec<JobPosting> {
        self.postings.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.postings.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, url: &str) -> Option<JobPosting> {
        self.postings.lock().unwrap().iter().find(|p| p.url == url).cloned()
    }

    /// Number of `create` calls, including the ones rejected as duplicates.
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable {
            Err(StoreError::Pool("in-memory store marked unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn find_by_url(&self, url: &str) -> Result<Option<JobPosting>, StoreError> {
        self.check_available()?;
        if self.broken_urls.contains(url) {
            return Err(StoreError::Db(diesel::result::Error::BrokenTransactionManager));
        }
        if self.stale_lookups {
            return Ok(None);
        }
        Ok(self.get(url))
    }

    async fn create(&self, posting: NewJobPosting) -> Result<JobPosting, StoreError> {
        self.check_available()?;
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let mut postings = self.postings.lock().unwrap();
        if postings.iter().any(|p| p.url == posting.url) {
            return Err(StoreError::DuplicateKey(posting.url));
        }
        let created = posting.into_posting();
        postings.push(created.clone());
        Ok(created)
    }

    async fn select_pending(&self, limit: usize) -> Result<Vec<JobPosting>, StoreError> {
        self.check_available()?;
        let mut pending: Vec<JobPosting> = self
            .postings
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.is_pending())
            .cloned()
            .collect();
        pending.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        pending.truncate(limit);
        Ok(pending)
    }

    async fn mark_enriched(&self, id: Uuid, enriched_description: &str) -> Result<(), StoreError> {
        self.check_available()?;
        let mut postings = self.postings.lock().unwrap();
        let posting = postings.iter_mut().find(|p| p.id == id).ok_or(StoreError::NotFound(id))?;
        posting.enriched_description = Some(enriched_description.to_string());
        posting.enriched = true;
        Ok(())
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        self.check_available()?;
        let mut postings = self.postings.lock().unwrap();
        let before = postings.len();
        postings.retain(|p| p.created_at >= cutoff);
        Ok(before - postings.len())
    }

    async fn list_recent(&self, filter: &PostingFilter, limit: usize) -> Result<Vec<JobPosting>, StoreError> {
        self.check_available()?;
        let mut matching: Vec<JobPosting> = self
            .postings
            .lock()
            .unwrap()
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching.truncate(limit);
        Ok(matching)
    }
}

/// Builds a stored posting created `age` ago, pending enrichment.
pub fn posting_created_ago(url: &str, age: chrono::Duration) -> JobPosting {
    let mut posting = NewJobPosting::new(
        "Desenvolvedor Backend".to_string(),
        "ACME".to_string(),
        "Brasil".to_string(),
        "há 1 dia".to_string(),
        url.to_string(),
        Some("Java, Spring Boot".to_string()),
    )
    .into_posting();
    posting.created_at = Utc::now() - age;
    posting
}

// =============================================================================
// Static user directory
// =============================================================================

/// User directory returning a fixed list of raw keyword values.
#[derive(Default)]
pub struct StaticUserDirectory {
    keywords: Vec<String>,
    unavailable: bool,
}

impl StaticUserDirectory {
    pub fn new<S: Into<String>>(keywords: impl IntoIterator<Item = S>) -> Self {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
            unavailable: false,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn unavailable() -> Self {
        Self {
            keywords: Vec::new(),
            unavailable: true,
        }
    }
}

#[async_trait]
impl UserDirectory for StaticUserDirectory {
    async fn list_active_keywords(&self) -> Result<Vec<String>, StoreError> {
        if self.unavailable {
            return Err(StoreError::Pool("user directory marked unavailable".to_string()));
        }
        Ok(self.keywords.clone())
    }
}

// =============================================================================
// Database Test Helpers
// =============================================================================

/// Connection pool for the live test database, or `None` (after printing `[SKIP]`) when
/// `TEST_DATABASE_URL` is unset, the database is unreachable, or the `job_posting` migration has
/// not been applied to it.
pub async fn test_db_pool() -> Option<DbPool> {
    let Ok(database_url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("[SKIP] TEST_DATABASE_URL is not set");
        return None;
    };

    let pool = match establish_connection_pool(&database_url).await {
        Ok(pool) => pool,
        Err(error) => {
            eprintln!("[SKIP] Test database unreachable: {}", error);
            return None;
        }
    };

    if let Err(error) = count_postings(&pool).await {
        eprintln!(
            "[SKIP] Test database has no usable job_posting table, run `diesel migration run` against it first: {}",
            error
        );
        return None;
    }
    Some(pool)
}

async fn count_postings(pool: &DbPool) -> Result<i64, StoreError> {
    use diesel::prelude::*;
    use diesel_async::RunQueryDsl;

    let mut conn = pool.get().await?;
    Ok(schema::job_posting::table.count().get_result(&mut conn).await?)
}

/// Removes every posting so a test starts from an empty table.
pub async fn clean_test_db(pool: &DbPool) {
    use diesel_async::RunQueryDsl;

    let mut conn = pool.get().await.expect("Failed to get database connection");

    diesel::delete(schema::job_posting::table)
        .execute(&mut conn)
        .await
        .expect("Failed to clean job_posting table");
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_posting(url: &str) -> NewJobPosting {
        NewJobPosting::new(
            "QA".to_string(),
            "ACME".to_string(),
            "Remoto".to_string(),
            "agora".to_string(),
            url.to_string(),
            None,
        )
    }

    #[tokio::test]
    async fn test_in_memory_store_enforces_unique_url() {
        let store = InMemoryJobStore::new();
        store.create(new_posting("https://x/1")).await.unwrap();
        let second = store.create(new_posting("https://x/1")).await;
        assert!(matches!(second, Err(StoreError::DuplicateKey(url)) if url == "https://x/1"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.create_calls(), 2);
    }

    #[tokio::test]
    async fn test_in_memory_store_pending_excludes_null_text_and_enriched() {
        let store = InMemoryJobStore::new();
        let without_text = store.create(new_posting("https://x/1")).await.unwrap();
        assert!(!without_text.is_pending());

        store.insert(posting_created_ago("https://x/2", Duration::hours(2)));
        store.insert(posting_created_ago("https://x/3", Duration::hours(3)));

        let pending = store.select_pending(10).await.unwrap();
        let urls: Vec<_> = pending.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(urls, vec!["https://x/3", "https://x/2"]);

        store.mark_enriched(pending[0].id, "resumo").await.unwrap();
        let pending = store.select_pending(10).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].url, "https://x/2");
    }

    #[tokio::test]
    async fn test_in_memory_store_list_recent_newest_first() {
        let store = InMemoryJobStore::with_postings(vec![
            posting_created_ago("https://x/old", Duration::hours(5)),
            posting_created_ago("https://x/new", Duration::hours(1)),
        ]);
        let listed = store.list_recent(&PostingFilter::default(), 20).await.unwrap();
        assert_eq!(listed[0].url, "https://x/new");
        assert_eq!(listed[1].url, "https://x/old");
    }

    #[tokio::test]
    async fn test_create_calls_count_rejected_duplicates() {
        let store = InMemoryJobStore::with_stale_lookups();
        assert_eq!(store.create_calls(), 0);
        store.create(new_posting("https://x/1")).await.unwrap();
        assert!(store.create(new_posting("https://x/1")).await.is_err());
        assert!(store.create(new_posting("https://x/1")).await.is_err());
        assert_eq!(store.create_calls(), 3);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_db_pool_is_only_handed_out_with_the_table_in_place() {
        let Some(pool) = test_db_pool().await else { return };
        assert!(count_postings(&pool).await.is_ok());
    }

    #[tokio::test]
    async fn test_static_user_directory() {
        let directory = StaticUserDirectory::new([" Java ", "Python"]);
        assert_eq!(directory.list_active_keywords().await.unwrap(), vec![" Java ", "Python"]);
        assert!(StaticUserDirectory::unavailable().list_active_keywords().await.is_err());
    }
}
