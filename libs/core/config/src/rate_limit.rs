use crate::{env_optional, env_parse_or, ConfigError, FromEnv};
use std::num::NonZeroU32;

const DEFAULT_PER_MINUTE: u32 = 60;

/// Per-client request quota.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub per_minute: NonZeroU32,
    pub burst: NonZeroU32,
}

impl RateLimitConfig {
    pub fn new(per_minute: NonZeroU32) -> Self {
        Self {
            per_minute,
            burst: per_minute,
        }
    }

    pub fn with_burst(mut self, burst: NonZeroU32) -> Self {
        self.burst = burst;
        self
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::new(NonZeroU32::new(DEFAULT_PER_MINUTE).unwrap_or(NonZeroU32::MIN))
    }
}

impl FromEnv for RateLimitConfig {
    /// - RATE_LIMIT_PER_MINUTE: defaults to 60
    /// - RATE_LIMIT_BURST: defaults to the per-minute value
    fn from_env() -> Result<Self, ConfigError> {
        let per_minute = non_zero("RATE_LIMIT_PER_MINUTE", DEFAULT_PER_MINUTE)?;
        let burst = match env_optional("RATE_LIMIT_BURST") {
            Some(_) => non_zero("RATE_LIMIT_BURST", per_minute.get())?,
            None => per_minute,
        };
        Ok(Self { per_minute, burst })
    }
}

fn non_zero(key: &str, default: u32) -> Result<NonZeroU32, ConfigError> {
    let value: u32 = env_parse_or(key, default)?;
    NonZeroU32::new(value).ok_or_else(|| ConfigError::ParseError {
        key: key.to_string(),
        details: "must be greater than zero".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        temp_env::with_vars(
            [
                ("RATE_LIMIT_PER_MINUTE", None::<&str>),
                ("RATE_LIMIT_BURST", None::<&str>),
            ],
            || {
                let config = RateLimitConfig::from_env().unwrap();
                assert_eq!(config.per_minute.get(), 60);
                assert_eq!(config.burst.get(), 60);
                assert_eq!(config, RateLimitConfig::default());
            },
        );
    }

    #[test]
    fn test_burst_follows_per_minute_unless_set() {
        temp_env::with_vars(
            [
                ("RATE_LIMIT_PER_MINUTE", Some("120")),
                ("RATE_LIMIT_BURST", None::<&str>),
            ],
            || {
                let config = RateLimitConfig::from_env().unwrap();
                assert_eq!(config.burst.get(), 120);
            },
        );

        temp_env::with_vars(
            [
                ("RATE_LIMIT_PER_MINUTE", Some("120")),
                ("RATE_LIMIT_BURST", Some("10")),
            ],
            || {
                let config = RateLimitConfig::from_env().unwrap();
                assert_eq!(config.per_minute.get(), 120);
                assert_eq!(config.burst.get(), 10);
            },
        );
    }

    #[test]
    fn test_zero_is_rejected() {
        temp_env::with_var("RATE_LIMIT_PER_MINUTE", Some("0"), || {
            let err = RateLimitConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("RATE_LIMIT_PER_MINUTE"));
        });
    }
}
