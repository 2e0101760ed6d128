//! Pacing between crawl steps.

use std::time::Duration;

use async_trait::async_trait;

/// Which step of the pipeline a pause separates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PauseKind {
    /// After a scroll-to-bottom on a results page.
    Scroll,
    /// Between two result pages of the same query.
    Page,
    /// Between two candidate groups of the same page.
    Batch,
    /// Between two fan-out keywords.
    Keyword,
}

/// Rate limiter for the crawl. Production code sleeps; tests record.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, kind: PauseKind, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, kind: PauseKind, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        tracing::trace!("Pausing {:?} for {:?}", kind, duration);
        tokio::time::sleep(duration).await;
    }
}

#[cfg(any(test, feature = "test-helpers"))]
pub use recording::{EventLog, RecordingPacer};

#[cfg(any(test, feature = "test-helpers"))]
mod recording {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::{Pacer, PauseKind};

    /// Ordered, shareable log of what happened during a test.
    pub type EventLog = Arc<Mutex<Vec<String>>>;

    /// Records pauses instead of sleeping.
    ///
    /// Each pause is also appended to the shared [`EventLog`] as `pause:<Kind>:<duration>`, so tests
    /// can check how pauses interleave with other recorded events.
    #[derive(Default)]
    pub struct RecordingPacer {
        pauses: Mutex<Vec<(PauseKind, Duration)>>,
        events: EventLog,
    }

    impl RecordingPacer {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn sharing(events: EventLog) -> Self {
            Self {
                pauses: Mutex::new(Vec::new()),
                events,
            }
        }

        pub fn pauses(&self) -> Vec<(PauseKind, Duration)> {
            self.pauses.lock().unwrap().clone()
        }

        pub fn count(&self, kind: PauseKind) -> usize {
            self.pauses.lock().unwrap().iter().filter(|(k, _)| *k == kind).count()
        }

        pub fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Pacer for RecordingPacer {
        async fn pause(&self, kind: PauseKind, duration: Duration) {
            self.pauses.lock().unwrap().push((kind, duration));
            self.events
                .lock()
                .unwrap()
                .push(format!("pause:{:?}:{}ms", kind, duration.as_millis()));
        }
    }
}
