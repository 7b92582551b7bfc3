use std::time::Duration;

use core_srt::{RetryPolicy, TimeUnit, parse_duration, parse_number};

use crate::Error;

pub const DEFAULT_REQUESTS_PER_MINUTE: u32 = 60;
pub const DEFAULT_RATE_LIMIT_COOLDOWN: Duration = Duration::from_secs(60);

/// Pacing of a ranking check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckConfig {
    pub retry: RetryPolicy,
    /// Pause between two keywords, whatever the outcome of the first.
    pub request_delay: Duration,
    /// Extra pause after a keyword failed on a rate limit.
    pub rate_limit_cooldown: Duration,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            request_delay: request_delay(DEFAULT_REQUESTS_PER_MINUTE),
            rate_limit_cooldown: DEFAULT_RATE_LIMIT_COOLDOWN,
        }
    }
}

/// Spacing that keeps a sequential loop under `requests_per_minute`.
pub fn request_delay(requests_per_minute: u32) -> Duration {
    Duration::from_millis(60_000 / requests_per_minute.max(1) as u64)
}

impl CheckConfig {
    /// Reads WORKER_REQUESTS_PER_MINUTE, WORKER_MAX_ATTEMPTS, WORKER_RETRY_DELAY_MS and
    /// WORKER_RATE_LIMIT_COOLDOWN_S. Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, Error> {
        let defaults = Self::default();

        let requests_per_minute =
            parse_number::<u32>("WORKER_REQUESTS_PER_MINUTE").map_err(Error::ConfigError)?;
        if requests_per_minute == Some(0) {
            return Err(Error::ConfigError(
                "WORKER_REQUESTS_PER_MINUTE must be positive".to_string(),
            ));
        }

        let max_attempts = parse_number::<u32>("WORKER_MAX_ATTEMPTS").map_err(Error::ConfigError)?;
        if max_attempts == Some(0) {
            return Err(Error::ConfigError("WORKER_MAX_ATTEMPTS must be positive".to_string()));
        }

        let retry_delay =
            parse_duration(TimeUnit::Milliseconds, "WORKER_RETRY_DELAY_MS").map_err(Error::ConfigError)?;
        let cooldown =
            parse_duration(TimeUnit::Seconds, "WORKER_RATE_LIMIT_COOLDOWN_S").map_err(Error::ConfigError)?;

        Ok(Self {
            retry: RetryPolicy {
                max_attempts: max_attempts.unwrap_or(defaults.retry.max_attempts),
                delay: retry_delay.unwrap_or(defaults.retry.delay),
            },
            request_delay: requests_per_minute.map(request_delay).unwrap_or(defaults.request_delay),
            rate_limit_cooldown: cooldown.unwrap_or(defaults.rate_limit_cooldown),
        })
    }
}
