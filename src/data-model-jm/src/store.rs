//! Persistence boundary for job postings and the (read-only) user directory.
//!
//! The unique index on `job_posting.url` is the only thing that guarantees at most one
//! posting per url. Callers racing on the same url observe [`StoreError::DuplicateKey`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::PgTextExpressionMethods;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::{DbConnection, DbPool};
use crate::models::{JobPosting, NewJobPosting, PostingFilter};
use crate::schema::{job_posting, users};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("A job posting with url '{0}' already exists")]
    DuplicateKey(String),
    #[error("Job posting {0} not found")]
    NotFound(Uuid),
    #[error("Database error: {0}")]
    Db(DieselError),
    #[error("Database pool error: {0}")]
    Pool(String),
}

impl From<DieselError> for StoreError {
    fn from(error: DieselError) -> Self {
        Self::Db(error)
    }
}

impl<E: std::fmt::Debug> From<deadpool::managed::PoolError<E>> for StoreError {
    fn from(error: deadpool::managed::PoolError<E>) -> Self {
        Self::Pool(format!("{:?}", error))
    }
}

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn find_by_url(&self, url: &str) -> Result<Option<JobPosting>, StoreError>;

    /// Inserts a new posting. Fails with [`StoreError::DuplicateKey`] if the url is already stored.
    async fn create(&self, posting: NewJobPosting) -> Result<JobPosting, StoreError>;

    /// Oldest-first postings with `enriched = false` and a raw description.
    async fn select_pending(&self, limit: usize) -> Result<Vec<JobPosting>, StoreError>;

    async fn mark_enriched(&self, id: Uuid, enriched_description: &str) -> Result<(), StoreError>;

    /// Deletes every posting created strictly before `cutoff`. Returns how many were removed.
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError>;

    /// Newest-first postings matching `filter`.
    async fn list_recent(&self, filter: &PostingFilter, limit: usize) -> Result<Vec<JobPosting>, StoreError>;
}

/// Source of the search keywords configured by active users.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Raw keyword values of active users. Not trimmed nor deduplicated.
    async fn list_active_keywords(&self) -> Result<Vec<String>, StoreError>;
}

#[derive(Clone)]
pub struct PgJobStore {
    pool: DbPool,
}

impl PgJobStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> Result<DbConnection, StoreError> {
        Ok(self.pool.get().await?)
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn find_by_url(&self, url: &str) -> Result<Option<JobPosting>, StoreError> {
        let mut conn = self.conn().await?;
        let posting = job_posting::table
            .filter(job_posting::url.eq(url))
            .select(JobPosting::as_select())
            .first(&mut conn)
            .await
            .optional()?;
        Ok(posting)
    }

    async fn create(&self, posting: NewJobPosting) -> Result<JobPosting, StoreError> {
        let mut conn = self.conn().await?;
        let url = posting.url.clone();
        match diesel::insert_into(job_posting::table)
            .values(&posting)
            .returning(JobPosting::as_returning())
            .get_result(&mut conn)
            .await
        {
            Ok(created) => Ok(created),
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => Err(StoreError::DuplicateKey(url)),
            Err(error) => Err(error.into()),
        }
    }

    async fn select_pending(&self, limit: usize) -> Result<Vec<JobPosting>, StoreError> {
        let mut conn = self.conn().await?;
        let pending = job_posting::table
            .filter(job_posting::enriched.eq(false))
            .filter(job_posting::raw_description.is_not_null())
            // oldest first so nothing starves; ties broken by id for a stable order
            .order((job_posting::created_at.asc(), job_posting::id.asc()))
            .limit(limit as i64)
            .select(JobPosting::as_select())
            .load(&mut conn)
            .await?;
        Ok(pending)
    }

    async fn mark_enriched(&self, id: Uuid, enriched_description: &str) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        let updated = diesel::update(job_posting::table.find(id))
            .set((
                job_posting::enriched_description.eq(Some(enriched_description)),
                job_posting::enriched.eq(true),
            ))
            .execute(&mut conn)
            .await?;
        if updated == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut conn = self.conn().await?;
        let deleted = diesel::delete(job_posting::table.filter(job_posting::created_at.lt(cutoff)))
            .execute(&mut conn)
            .await?;
        Ok(deleted)
    }

    async fn list_recent(&self, filter: &PostingFilter, limit: usize) -> Result<Vec<JobPosting>, StoreError> {
        let mut conn = self.conn().await?;
        let postings = job_posting::table
            .filter(job_posting::title.ilike(like_pattern(&filter.keyword)))
            .filter(job_posting::location.ilike(like_pattern(&filter.location)))
            .order(job_posting::created_at.desc())
            .limit(limit as i64)
            .select(JobPosting::as_select())
            .load(&mut conn)
            .await?;
        Ok(postings)
    }
}

/// `%needle%` with LIKE metacharacters escaped.
fn like_pattern(needle: &str) -> String {
    let escaped = needle.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    format!("%{}%", escaped)
}

#[derive(Clone)]
pub struct PgUserDirectory {
    pool: DbPool,
}

impl PgUserDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn list_active_keywords(&self) -> Result<Vec<String>, StoreError> {
        let mut conn = self.pool.get().await?;
        let keywords: Vec<Option<String>> = users::table
            .filter(users::is_active.eq(true))
            .filter(users::keyword.is_not_null())
            .order(users::id.asc())
            .select(users::keyword)
            .load(&mut conn)
            .await?;
        Ok(keywords.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{clean_test_db, test_db_pool};
    use chrono::Duration;
    use tokio::sync::Mutex;

    static TEST_MUTEX: Mutex<()> = Mutex::const_new(());

    fn new_posting(url: &str) -> NewJobPosting {
        NewJobPosting::new(
            "Engenheiro de Dados".to_string(),
            "ACME".to_string(),
            "Remoto".to_string(),
            "há 1 hora".to_string(),
            url.to_string(),
            Some("Python, SQL".to_string()),
        )
    }

    #[test]
    fn test_like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern(""), "%%");
        assert_eq!(like_pattern("rust"), "%rust%");
        assert_eq!(like_pattern("100%_off"), "%100\\%\\_off%");
    }

    #[tokio::test]
    async fn test_pg_create_rejects_duplicate_url() {
        let Some(pool) = test_db_pool().await else { return };
        let _guard = TEST_MUTEX.lock().await;
        clean_test_db(&pool).await;
        let store = PgJobStore::new(pool);

        let created = store.create(new_posting("https://www.linkedin.com/jobs/view/10")).await.unwrap();
        assert_eq!(created.url, "https://www.linkedin.com/jobs/view/10");

        let again = store.create(new_posting("https://www.linkedin.com/jobs/view/10")).await;
        assert!(matches!(again, Err(StoreError::DuplicateKey(_))));

        let found = store.find_by_url("https://www.linkedin.com/jobs/view/10").await.unwrap();
        assert_eq!(found.map(|p| p.id), Some(created.id));
    }

    #[tokio::test]
    async fn test_pg_enriched_postings_leave_pending_set() {
        let Some(pool) = test_db_pool().await else { return };
        let _guard = TEST_MUTEX.lock().await;
        clean_test_db(&pool).await;
        let store = PgJobStore::new(pool);

        let a = store.create(new_posting("https://www.linkedin.com/jobs/view/11")).await.unwrap();
        let _b = store.create(new_posting("https://www.linkedin.com/jobs/view/12")).await.unwrap();

        store.mark_enriched(a.id, "🏢 Cargo: Engenheiro de Dados").await.unwrap();

        let pending = store.select_pending(10).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].url, "https://www.linkedin.com/jobs/view/12");
    }

    #[tokio::test]
    async fn test_pg_delete_older_than() {
        let Some(pool) = test_db_pool().await else { return };
        let _guard = TEST_MUTEX.lock().await;
        clean_test_db(&pool).await;
        let store = PgJobStore::new(pool);

        let mut old = new_posting("https://www.linkedin.com/jobs/view/13");
        old.created_at = Utc::now() - Duration::hours(26);
        store.create(old).await.unwrap();
        let mut fresh = new_posting("https://www.linkedin.com/jobs/view/14");
        fresh.created_at = Utc::now() - Duration::hours(1);
        store.create(fresh).await.unwrap();

        let deleted = store.delete_older_than(Utc::now() - Duration::hours(25)).await.unwrap();
        assert_eq!(deleted, 1);
        assert!(store.find_by_url("https://www.linkedin.com/jobs/view/13").await.unwrap().is_none());
        assert!(store.find_by_url("https://www.linkedin.com/jobs/view/14").await.unwrap().is_some());
    }
}
