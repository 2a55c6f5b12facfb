//! Short-lived Redis copy of each client's event list.
//!
//! Every invalidation bumps a per-client generation counter. A list read remembers the
//! generation it saw on the miss, and its write-back only lands if the counter is
//! unchanged, so a snapshot taken before a concurrent create is never cached.

use redis::aio::ConnectionManager;
use std::time::Duration;

use crate::models::Event;

/// KEYS: list, generation. ARGV: seen generation, value, ttl seconds.
const PUT_IF_UNCHANGED: &str = r#"
local current = redis.call('GET', KEYS[2]) or '0'
if current ~= ARGV[1] then
    return 0
end
redis.call('SET', KEYS[1], ARGV[2], 'EX', ARGV[3])
return 1
"#;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Outcome of [`EventCache::read`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheRead {
    Hit(Vec<Event>),
    /// Nothing usable cached; pass `generation` back to [`EventCache::put`].
    Miss { generation: u64 },
}

#[derive(Clone)]
pub struct EventCache {
    redis: ConnectionManager,
    ttl: Duration,
}

impl EventCache {
    pub fn new(redis: ConnectionManager, ttl: Duration) -> Self {
        Self { redis, ttl }
    }

    pub fn key(client_id: &str) -> String {
        format!("events:{}:all", client_id)
    }

    pub fn generation_key(client_id: &str) -> String {
        format!("events:{}:gen", client_id)
    }

    /// Cached list, or the current generation on a miss. Entries that no longer decode
    /// count as a miss.
    pub async fn read(&self, client_id: &str) -> redis::RedisResult<CacheRead> {
        let mut conn = self.redis.clone();
        let key = Self::key(client_id);
        let (generation, cached): (Option<u64>, Option<String>) = redis::pipe()
            .get(Self::generation_key(client_id))
            .get(&key)
            .query_async(&mut conn)
            .await?;

        let decoded = cached.and_then(|raw| match serde_json::from_str(&raw) {
            Ok(events) => Some(events),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Discarding undecodable cache entry");
                None
            }
        });
        Ok(match decoded {
            Some(events) => CacheRead::Hit(events),
            None => CacheRead::Miss {
                generation: generation.unwrap_or(0),
            },
        })
    }

    /// Store `events` unless the list was invalidated after `seen_generation` was read.
    /// Returns whether the entry was written.
    pub async fn put(
        &self,
        client_id: &str,
        events: &[Event],
        seen_generation: u64,
    ) -> Result<bool, CacheError> {
        let mut conn = self.redis.clone();
        let value = serde_json::to_string(events)?;
        let written: i64 = redis::cmd("EVAL")
            .arg(PUT_IF_UNCHANGED)
            .arg(2)
            .arg(Self::key(client_id))
            .arg(Self::generation_key(client_id))
            .arg(seen_generation.to_string())
            .arg(value)
            .arg(self.ttl.as_secs().max(1))
            .query_async(&mut conn)
            .await?;
        Ok(written == 1)
    }

    /// Drop the cached list and bump the generation in one transaction.
    pub async fn invalidate(&self, client_id: &str) -> redis::RedisResult<()> {
        let mut conn = self.redis.clone();
        redis::pipe()
            .atomic()
            .incr(Self::generation_key(client_id), 1)
            .ignore()
            .del(Self::key(client_id))
            .ignore()
            .query_async(&mut conn)
            .await
    }
}
