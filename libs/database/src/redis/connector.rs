use redis::aio::ConnectionManager;
use tracing::info;

use super::RedisConfig;
use crate::common::{RetryConfig, retry_with_backoff};

/// Open a reconnecting [`ConnectionManager`] and prove it answers `PING`.
pub async fn connect(config: &RedisConfig) -> redis::RedisResult<ConnectionManager> {
    let client = redis::Client::open(config.url())?;
    let mut manager = ConnectionManager::new(client).await?;
    let _: String = redis::cmd("PING").query_async(&mut manager).await?;

    info!(url = %config.redacted_url(), "Connected to Redis");
    Ok(manager)
}

/// [`connect`] under a retry policy; `None` means [`RetryConfig::default`].
pub async fn connect_from_config_with_retry(
    config: RedisConfig,
    retry_config: Option<RetryConfig>,
) -> redis::RedisResult<ConnectionManager> {
    retry_with_backoff(|| connect(&config), retry_config.unwrap_or_default()).await
}
