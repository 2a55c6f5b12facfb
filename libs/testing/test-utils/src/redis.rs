//! Redis container for cache tests.

use redis::aio::ConnectionManager;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::redis::{REDIS_PORT, Redis};

/// A throwaway Redis; dropping it removes the container.
///
/// ```no_run
/// use test_utils::TestRedis;
///
/// # async fn example() {
/// let redis = TestRedis::new().await;
/// let cache = EventCache::new(redis.connection(), Duration::from_secs(60));
/// # }
/// ```
pub struct TestRedis {
    _container: ContainerAsync<Redis>,
    connection: ConnectionManager,
    pub url: String,
}

impl TestRedis {
    pub async fn new() -> Self {
        let container = Redis::default()
            .with_tag("8-alpine")
            .start()
            .await
            .expect("redis container starts");
        let port = container
            .get_host_port_ipv4(REDIS_PORT)
            .await
            .expect("redis port is mapped");

        let url = format!("redis://127.0.0.1:{}", port);
        let client = redis::Client::open(url.as_str()).expect("redis url parses");
        let connection = ConnectionManager::new(client)
            .await
            .expect("test redis accepts connections");

        tracing::info!(port, "Test Redis ready");
        Self {
            _container: container,
            connection,
            url,
        }
    }

    pub fn connection(&self) -> ConnectionManager {
        self.connection.clone()
    }

    /// Remaining TTL of `key` in seconds; `-2` when the key is absent.
    pub async fn ttl(&self, key: &str) -> i64 {
        let mut conn = self.connection();
        redis::cmd("TTL")
            .arg(key)
            .query_async(&mut conn)
            .await
            .unwrap_or_else(|e| panic!("TTL {} failed: {}", key, e))
    }
}
