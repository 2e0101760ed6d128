pub mod errors;
pub mod fanout;
pub mod retention;

pub use errors::Error;
pub use fanout::{FanOutReport, KeywordFanOut, normalize_keywords};
pub use retention::{DEFAULT_MAX_AGE_HOURS, RetentionSweep};
