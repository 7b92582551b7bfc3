//! Numeric settings read from environment variables.
//!
//! Unset or blank variables fall back to a default; set-but-malformed ones are errors.

use std::{fmt::Display, str::FromStr, time::Duration};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Seconds,
    Milliseconds,
}

impl TimeUnit {
    pub fn duration(&self, amount: u64) -> Duration {
        match self {
            TimeUnit::Seconds => Duration::from_secs(amount),
            TimeUnit::Milliseconds => Duration::from_millis(amount),
        }
    }
}

/// Same as [`parse_duration`] but panics on a malformed value.
pub fn get_duration(units: TimeUnit, env_var_name: &str, default: u64) -> Duration {
    parse_duration(units, env_var_name)
        .unwrap_or_else(|e| panic!("{}", e))
        .unwrap_or_else(|| units.duration(default))
}

/// Reads the env var as a whole number of `units`. `Ok(None)` when unset or blank.
pub fn parse_duration(units: TimeUnit, env_var_name: &str) -> Result<Option<Duration>, String> {
    Ok(parse_number::<u64>(env_var_name)?.map(|amount| units.duration(amount)))
}

/// Reads and parses the env var. `Ok(None)` when unset or blank.
pub fn parse_number<T>(env_var_name: &str) -> Result<Option<T>, String>
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(env_var_name) {
        Ok(v) if !v.trim().is_empty() => v
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| format!("{} must be a valid number, got '{}': {}", env_var_name, v, e)),
        _ => Ok(None),
    }
}
