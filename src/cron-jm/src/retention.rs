use std::sync::Arc;

use chrono::{Duration, Utc};
use data_model_jm::JobStore;

use crate::errors::Error;

pub const DEFAULT_MAX_AGE_HOURS: i64 = 25;

/// Deletes postings older than a fixed age.
pub struct RetentionSweep {
    store: Arc<dyn JobStore>,
    max_age: Duration,
}

impl RetentionSweep {
    pub fn new(store: Arc<dyn JobStore>, max_age: Duration) -> Self {
        Self { store, max_age }
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Returns how many postings were deleted.
    pub async fn run(&self) -> Result<usize, Error> {
        let cutoff = Utc::now() - self.max_age;
        let deleted = self.store.delete_older_than(cutoff).await?;
        tracing::info!("Retention sweep removed {} postings created before {}", deleted, cutoff);
        Ok(deleted)
    }
}
