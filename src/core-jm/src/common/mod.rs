pub mod db_env;
pub mod env_check;
pub mod logging;
pub mod poll_interval;

pub use db_env::{get_database_url, get_db_pool};
pub use env_check::is_env_set;
pub use logging::setup_logging;
pub use poll_interval::{PollIntervalError, TimeUnit, get_poll_interval, poll_interval};
