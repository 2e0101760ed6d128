use std::{num::ParseIntError, time::Duration};

/// Same as poll_interval but panics on error.
pub fn get_poll_interval(units: TimeUnit, env_var_name: &str, default: u64) -> Duration {
    poll_interval(units, env_var_name, default)
        .unwrap_or_else(|e| panic!("{} must be a valid number: {}", env_var_name, e))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Hours,
    Seconds,
    Milliseconds,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollIntervalError {
    NotANumber(ParseIntError),
    /// The amount does not fit in a duration once converted to seconds.
    TooLarge(u64),
}

impl std::fmt::Display for PollIntervalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PollIntervalError::NotANumber(err) => write!(f, "{}", err),
            PollIntervalError::TooLarge(amount) => write!(f, "{} is too large", amount),
        }
    }
}

impl std::error::Error for PollIntervalError {}

impl From<ParseIntError> for PollIntervalError {
    fn from(err: ParseIntError) -> Self {
        PollIntervalError::NotANumber(err)
    }
}

/// Retrieves the value of the environment variable as a duration, falling back to `default` when unset.
pub fn poll_interval(units: TimeUnit, env_var_name: &str, default: u64) -> Result<Duration, PollIntervalError> {
    let amount = match std::env::var(env_var_name) {
        Ok(v) => v.trim().parse::<u64>()?,
        Err(_) => default,
    };

    let interval = match units {
        TimeUnit::Hours => {
            let secs = amount.checked_mul(60 * 60).ok_or(PollIntervalError::TooLarge(amount))?;
            Duration::from_secs(secs)
        }
        TimeUnit::Seconds => Duration::from_secs(amount),
        TimeUnit::Milliseconds => Duration::from_millis(amount),
    };
    Ok(interval)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_interval_default_when_unset() {
        let interval = poll_interval(TimeUnit::Seconds, "JM_TEST_POLL_UNSET_VAR", 900).unwrap();
        assert_eq!(interval, Duration::from_secs(900));

        let interval = poll_interval(TimeUnit::Hours, "JM_TEST_POLL_UNSET_VAR", 25).unwrap();
        assert_eq!(interval, Duration::from_secs(25 * 3600));
    }

    #[test]
    fn test_poll_interval_rejects_garbage() {
        unsafe {
            std::env::set_var("JM_TEST_POLL_GARBAGE", "soon");
        }
        assert!(poll_interval(TimeUnit::Milliseconds, "JM_TEST_POLL_GARBAGE", 1).is_err());
        unsafe {
            std::env::remove_var("JM_TEST_POLL_GARBAGE");
        }
    }

    #[test]
    fn test_poll_interval_rejects_hours_that_overflow() {
        unsafe {
            std::env::set_var("JM_TEST_POLL_HUGE_HOURS", u64::MAX.to_string());
        }
        let result = poll_interval(TimeUnit::Hours, "JM_TEST_POLL_HUGE_HOURS", 25);
        unsafe {
            std::env::remove_var("JM_TEST_POLL_HUGE_HOURS");
        }
        assert_eq!(result, Err(PollIntervalError::TooLarge(u64::MAX)));

        let result = poll_interval(TimeUnit::Hours, "JM_TEST_POLL_UNSET_VAR", u64::MAX / 60);
        assert!(matches!(result, Err(PollIntervalError::TooLarge(_))));
    }
}
