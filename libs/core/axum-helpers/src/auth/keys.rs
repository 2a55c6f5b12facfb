//! Realm signing keys.
//!
//! The identity provider publishes its RS256 public key as a bare base64 string on the
//! realm endpoint (`GET {realm_url}` → `{"public_key": "MIIBIjAN..."}`). [`RealmKeySource`]
//! fetches it lazily and caches it for `key_cache_ttl`.

use async_trait::async_trait;
use jsonwebtoken::DecodingKey;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

use super::config::OidcConfig;
use super::verifier::AuthError;

/// Supplies the key access tokens are verified against.
#[async_trait]
pub trait KeySource: Send + Sync {
    async fn decoding_key(&self) -> Result<DecodingKey, AuthError>;

    /// Drop any cached key so the next call fetches a fresh one.
    ///
    /// Returns `true` when a later [`decoding_key`](Self::decoding_key) may yield a
    /// different key than before.
    async fn invalidate(&self) -> bool {
        false
    }
}

/// A key fixed at startup (`KC_PUBLIC_KEY`, or tests).
#[derive(Clone)]
pub struct StaticKeySource {
    key: DecodingKey,
}

impl StaticKeySource {
    pub fn from_rsa_pem(pem: &[u8]) -> Result<Self, AuthError> {
        let key = DecodingKey::from_rsa_pem(pem)
            .map_err(|e| AuthError::KeyUnavailable(format!("invalid RSA public key: {}", e)))?;
        Ok(Self { key })
    }

    /// Accepts the bare base64 form the realm endpoint publishes.
    pub fn from_realm_public_key(public_key: &str) -> Result<Self, AuthError> {
        Self::from_rsa_pem(realm_key_to_pem(public_key).as_bytes())
    }
}

#[async_trait]
impl KeySource for StaticKeySource {
    async fn decoding_key(&self) -> Result<DecodingKey, AuthError> {
        Ok(self.key.clone())
    }
}

#[derive(Deserialize)]
struct RealmInfo {
    public_key: String,
}

struct CachedKey {
    key: DecodingKey,
    fetched_at: Instant,
}

/// A key is kept at least this long before a bad signature may replace it.
pub const DEFAULT_REFRESH_COOLDOWN: Duration = Duration::from_secs(30);

/// Fetches the realm public key over HTTP and caches it.
///
/// Concurrent misses share one fetch. Invalidation is refused while the cached key is younger
/// than the refresh cooldown, so tokens with forged signatures cannot drive realm requests.
#[derive(Clone)]
pub struct RealmKeySource {
    realm_url: String,
    cache_ttl: Duration,
    refresh_cooldown: Duration,
    cache: Arc<RwLock<Option<CachedKey>>>,
    fetch_lock: Arc<Mutex<()>>,
    client: reqwest::Client,
}

impl RealmKeySource {
    pub fn new(config: &OidcConfig) -> Self {
        Self::with_client(config, reqwest::Client::new())
    }

    pub fn with_client(config: &OidcConfig, client: reqwest::Client) -> Self {
        Self {
            realm_url: config.realm_url.clone(),
            cache_ttl: config.key_cache_ttl,
            refresh_cooldown: DEFAULT_REFRESH_COOLDOWN,
            cache: Arc::new(RwLock::new(None)),
            fetch_lock: Arc::new(Mutex::new(())),
            client,
        }
    }

    pub fn with_refresh_cooldown(mut self, cooldown: Duration) -> Self {
        self.refresh_cooldown = cooldown;
        self
    }

    pub async fn is_cached(&self) -> bool {
        self.fresh_key().await.is_some()
    }

    async fn fresh_key(&self) -> Option<DecodingKey> {
        self.cache
            .read()
            .await
            .as_ref()
            .filter(|entry| entry.fetched_at.elapsed() < self.cache_ttl)
            .map(|entry| entry.key.clone())
    }

    async fn fetch(&self) -> Result<DecodingKey, AuthError> {
        let response = self
            .client
            .get(&self.realm_url)
            .send()
            .await
            .map_err(|e| AuthError::KeyUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::KeyUnavailable(format!(
                "HTTP {} from realm endpoint",
                response.status()
            )));
        }

        let info: RealmInfo = response
            .json()
            .await
            .map_err(|e| AuthError::KeyUnavailable(e.to_string()))?;

        tracing::debug!(realm_url = %self.realm_url, "Fetched realm public key");
        Ok(StaticKeySource::from_realm_public_key(&info.public_key)?.key)
    }
}

#[async_trait]
impl KeySource for RealmKeySource {
    async fn decoding_key(&self) -> Result<DecodingKey, AuthError> {
        if let Some(key) = self.fresh_key().await {
            return Ok(key);
        }

        let _fetching = self.fetch_lock.lock().await;
        // Another caller may have refreshed while this one waited.
        if let Some(key) = self.fresh_key().await {
            return Ok(key);
        }

        let key = self.fetch().await?;
        *self.cache.write().await = Some(CachedKey {
            key: key.clone(),
            fetched_at: Instant::now(),
        });
        Ok(key)
    }

    async fn invalidate(&self) -> bool {
        let mut cache = self.cache.write().await;
        let recent = cache
            .as_ref()
            .is_some_and(|entry| entry.fetched_at.elapsed() < self.refresh_cooldown);
        if recent {
            tracing::debug!("Realm key refreshed recently, keeping it");
            return false;
        }
        cache.take();
        true
    }
}

/// Wrap a bare base64 key in a PEM envelope with 64-character lines.
pub fn realm_key_to_pem(public_key: &str) -> String {
    let body: String = public_key.split_whitespace().collect();
    if body.starts_with("-----BEGIN") {
        return public_key.to_string();
    }

    let mut pem = String::from("-----BEGIN PUBLIC KEY-----\n");
    for chunk in body.as_bytes().chunks(64) {
        // base64 is ASCII, so byte chunks are valid UTF-8
        pem.push_str(&String::from_utf8_lossy(chunk));
        pem.push('\n');
    }
    pem.push_str("-----END PUBLIC KEY-----\n");
    pem
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::testing::{SIGNING_PUBLIC_PEM, realm_public_key};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(realm_url: String) -> OidcConfig {
        OidcConfig::new(realm_url, "backend")
    }

    #[test]
    fn test_realm_key_to_pem_round_trips_fixture() {
        let bare = realm_public_key(SIGNING_PUBLIC_PEM);
        assert!(!bare.contains('\n'));

        let pem = realm_key_to_pem(&bare);
        assert!(pem.starts_with("-----BEGIN PUBLIC KEY-----\n"));
        assert!(pem.ends_with("-----END PUBLIC KEY-----\n"));
        assert!(pem.lines().all(|line| line.len() <= 64));
        assert!(DecodingKey::from_rsa_pem(pem.as_bytes()).is_ok());
    }

    #[test]
    fn test_realm_key_to_pem_keeps_existing_pem() {
        assert_eq!(realm_key_to_pem(SIGNING_PUBLIC_PEM), SIGNING_PUBLIC_PEM);
    }

    #[test]
    fn test_static_source_rejects_garbage() {
        let err = StaticKeySource::from_realm_public_key("not-a-key").err().unwrap();
        assert!(matches!(err, AuthError::KeyUnavailable(_)));
    }

    #[tokio::test]
    async fn test_realm_source_fetches_once_within_ttl() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/realms/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "realm": "events",
                "public_key": realm_public_key(SIGNING_PUBLIC_PEM),
            })))
            .expect(1)
            .mount(&server)
            .await;

        let source = RealmKeySource::new(&config(format!("{}/realms/events", server.uri())));
        assert!(!source.is_cached().await);

        source.decoding_key().await.unwrap();
        source.decoding_key().await.unwrap();
        assert!(source.is_cached().await);
    }

    #[tokio::test]
    async fn test_realm_source_refetches_after_invalidate() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "public_key": realm_public_key(SIGNING_PUBLIC_PEM),
            })))
            .expect(2)
            .mount(&server)
            .await;

        let source =
            RealmKeySource::new(&config(server.uri())).with_refresh_cooldown(Duration::ZERO);
        source.decoding_key().await.unwrap();
        assert!(source.invalidate().await);
        assert!(!source.is_cached().await);
        source.decoding_key().await.unwrap();
    }

    #[tokio::test]
    async fn test_invalidate_within_cooldown_keeps_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "public_key": realm_public_key(SIGNING_PUBLIC_PEM),
            })))
            .expect(1)
            .mount(&server)
            .await;

        let source = RealmKeySource::new(&config(server.uri()));
        source.decoding_key().await.unwrap();
        assert!(!source.invalidate().await);
        assert!(source.is_cached().await);
        source.decoding_key().await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_misses_share_one_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({
                        "public_key": realm_public_key(SIGNING_PUBLIC_PEM),
                    }))
                    .set_delay(Duration::from_millis(200)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let source = RealmKeySource::new(&config(server.uri()));
        let lookups = (0..10).map(|_| {
            let source = source.clone();
            tokio::spawn(async move { source.decoding_key().await.map(|_| ()) })
        });
        for lookup in futures::future::join_all(lookups).await {
            lookup.unwrap().unwrap();
        }
    }

    #[tokio::test]
    async fn test_realm_source_reports_http_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let source = RealmKeySource::new(&config(server.uri()));
        let err = source.decoding_key().await.err().unwrap();
        assert!(matches!(err, AuthError::KeyUnavailable(ref msg) if msg.contains("404")));
    }
}
