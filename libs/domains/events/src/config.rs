use core_config::{ConfigError, FromEnv, env_or_default, env_parse_or};
use std::time::Duration;

/// Topic, cache freshness and outbox relay pacing for the events domain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventsConfig {
    pub topic: String,
    pub cache_ttl: Duration,
    pub relay_interval: Duration,
    /// Pending rows published per relay pass
    pub relay_batch_size: u64,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            topic: "events".to_string(),
            cache_ttl: Duration::from_secs(60),
            relay_interval: Duration::from_secs(10),
            relay_batch_size: 100,
        }
    }
}

/// Environment variables:
/// - `EVENTS_TOPIC` (default: events)
/// - `EVENTS_CACHE_TTL_SECS` (default: 60)
/// - `OUTBOX_RELAY_INTERVAL_SECS` (default: 10)
/// - `OUTBOX_RELAY_BATCH_SIZE` (default: 100)
impl FromEnv for EventsConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            topic: env_or_default("EVENTS_TOPIC", &defaults.topic),
            cache_ttl: Duration::from_secs(env_parse_or(
                "EVENTS_CACHE_TTL_SECS",
                defaults.cache_ttl.as_secs(),
            )?),
            relay_interval: Duration::from_secs(env_parse_or(
                "OUTBOX_RELAY_INTERVAL_SECS",
                defaults.relay_interval.as_secs(),
            )?),
            relay_batch_size: env_parse_or("OUTBOX_RELAY_BATCH_SIZE", defaults.relay_batch_size)?,
        })
    }
}
