//! Scheduler configuration.
//!
//! Values come from the environment (a `.env` file is loaded if present) and
//! fall back to the booking domain defaults.

use std::env;
use std::str::FromStr;

use crate::conflict::CleanupBuffer;
use crate::error::ConfigError;

pub const DEFAULT_CLEANUP_MINUTES: u32 = 10;
pub const DEFAULT_LINK_OFFSET_MINUTES: u32 = 0;
/// Roughly ten years of days.
pub const DEFAULT_MAX_RANGE_DAYS: u32 = 3660;

pub const CLEANUP_MINUTES_VAR: &str = "BOXSCHED_CLEANUP_MINUTES";
pub const LINK_OFFSET_MINUTES_VAR: &str = "BOXSCHED_LINK_OFFSET_MINUTES";
pub const MAX_RANGE_DAYS_VAR: &str = "BOXSCHED_MAX_RANGE_DAYS";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Idle minutes between consecutive slots on a box (default: 10)
    pub cleanup_minutes: u32,

    /// Start offset between the two halves of a double booking (default: 0)
    pub link_offset_minutes: u32,

    /// Longest date range accepted for expansion (default: 3660)
    pub max_range_days: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            cleanup_minutes: DEFAULT_CLEANUP_MINUTES,
            link_offset_minutes: DEFAULT_LINK_OFFSET_MINUTES,
            max_range_days: DEFAULT_MAX_RANGE_DAYS,
        }
    }
}

impl SchedulerConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset variables keep their defaults; set but unparsable ones are errors.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        Ok(Self {
            cleanup_minutes: var_or(CLEANUP_MINUTES_VAR, defaults.cleanup_minutes)?,
            link_offset_minutes: var_or(LINK_OFFSET_MINUTES_VAR, defaults.link_offset_minutes)?,
            max_range_days: var_or(MAX_RANGE_DAYS_VAR, defaults.max_range_days)?,
        })
    }

    pub fn cleanup(&self) -> CleanupBuffer {
        CleanupBuffer::minutes(self.cleanup_minutes)
    }
}

fn var_or<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
            name: name.to_string(),
            value,
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear() {
        env::remove_var(CLEANUP_MINUTES_VAR);
        env::remove_var(LINK_OFFSET_MINUTES_VAR);
        env::remove_var(MAX_RANGE_DAYS_VAR);
    }

    #[test]
    #[serial]
    fn defaults_when_unset() {
        clear();
        let config = SchedulerConfig::from_env().unwrap();
        assert_eq!(config.cleanup_minutes, 10);
        assert_eq!(config.cleanup(), CleanupBuffer::minutes(10));
        assert_eq!(config.max_range_days, DEFAULT_MAX_RANGE_DAYS);
    }

    #[test]
    #[serial]
    fn overrides_from_env() {
        clear();
        env::set_var(CLEANUP_MINUTES_VAR, "15");
        env::set_var(LINK_OFFSET_MINUTES_VAR, " 30 ");

        let config = SchedulerConfig::from_env().unwrap();
        assert_eq!(config.cleanup_minutes, 15);
        assert_eq!(config.link_offset_minutes, 30);

        clear();
    }

    #[test]
    #[serial]
    fn invalid_value_is_reported() {
        clear();
        env::set_var(CLEANUP_MINUTES_VAR, "ten");

        let err = SchedulerConfig::from_env().unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                name: CLEANUP_MINUTES_VAR.to_string(),
                value: "ten".to_string(),
            }
        );

        clear();
    }
}
