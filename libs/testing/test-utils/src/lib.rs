//! Container-backed fixtures for integration tests.
//!
//! | Fixture | Feature |
//! |---|---|
//! | [`TestDatabase`] (Postgres, migrated) | `postgres` (default) |
//! | [`TestRedis`] | `redis` |
//! | [`TestKafka`] | `kafka` |
//!
//! [`TestDataBuilder`] is always available and derives client ids and event names from the
//! test name, so tests sharing a container never collide.
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { workspace = true, features = ["redis", "kafka"] }
//! ```

#[cfg(feature = "kafka")]
mod kafka;
#[cfg(feature = "postgres")]
mod postgres;
#[cfg(feature = "redis")]
mod redis;

#[cfg(feature = "kafka")]
pub use kafka::TestKafka;
#[cfg(feature = "postgres")]
pub use postgres::TestDatabase;
#[cfg(feature = "redis")]
pub use redis::TestRedis;

use std::hash::{DefaultHasher, Hash, Hasher};

/// Deterministic identifiers scoped to one test.
///
/// ```
/// use test_utils::TestDataBuilder;
///
/// let data = TestDataBuilder::new(7);
/// assert_eq!(data.client_id(), "client-7");
/// assert_eq!(data.name("event", "launch"), "event-7-launch");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn from_test_name(test: &str) -> Self {
        let mut hasher = DefaultHasher::new();
        test.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// The `azp` a test token is issued to.
    pub fn client_id(&self) -> String {
        format!("client-{:x}", self.seed)
    }

    /// Some other client, never equal to [`client_id`](Self::client_id).
    pub fn other_client_id(&self) -> String {
        format!("client-{:x}", self.seed.wrapping_add(1))
    }

    pub fn name(&self, kind: &str, label: &str) -> String {
        format!("{}-{:x}-{}", kind, self.seed, label)
    }
}
