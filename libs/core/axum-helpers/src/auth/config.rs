//! Token verification settings, loaded with `core_config::FromEnv`.

use core_config::{ConfigError, FromEnv, env_optional, env_or_default, env_parse_or, env_required};
use std::time::Duration;

/// Where to find signing keys and how strictly to validate access tokens.
#[derive(Clone, Debug)]
pub struct OidcConfig {
    /// `{server}/realms/{realm}`; serves the realm public key
    pub realm_url: String,
    /// Client whose `resource_access` entry carries the roles checked by gates
    pub client_id: String,
    /// Base64 realm key; when set no key is fetched
    pub public_key: Option<String>,
    /// Expected `iss`; unchecked when `None`
    pub issuer: Option<String>,
    pub leeway: Duration,
    pub key_cache_ttl: Duration,
}

impl OidcConfig {
    pub fn new(realm_url: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            realm_url: realm_url.into(),
            client_id: client_id.into(),
            public_key: None,
            issuer: None,
            leeway: Duration::from_secs(60),
            key_cache_ttl: Duration::from_secs(300),
        }
    }
}

/// Base URL of the identity provider.
///
/// `KC_SERVER_URL` wins; otherwise `http://{KC_HOSTNAME_CONTAINER}:{KC_PORT}{KC_BASE_PATH}`
/// with `KC_BASE_PATH` defaulting to `/auth`.
pub fn keycloak_server_url() -> Result<String, ConfigError> {
    if let Some(url) = env_optional("KC_SERVER_URL") {
        return Ok(url.trim_end_matches('/').to_string());
    }
    let host = env_required("KC_HOSTNAME_CONTAINER")?;
    let port: u16 = env_parse_or("KC_PORT", 8080)?;
    let base_path = env_or_default("KC_BASE_PATH", "/auth");
    let base_path = base_path.trim_end_matches('/');
    Ok(format!("http://{}:{}{}", host, port, base_path))
}

/// Environment variables:
/// - `KC_SERVER_URL` or `KC_HOSTNAME_CONTAINER` + `KC_PORT` (+ `KC_BASE_PATH`)
/// - `KC_REALM_NAME` (required)
/// - `KC_CLIENT_ID` (required)
/// - `KC_PUBLIC_KEY`, `KC_ISSUER` (optional)
/// - `JWT_LEEWAY_SECS` (default: 60), `JWKS_CACHE_TTL_SECS` (default: 300)
impl FromEnv for OidcConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let realm = env_required("KC_REALM_NAME")?;
        let realm_url = format!("{}/realms/{}", keycloak_server_url()?, realm);
        let client_id = env_required("KC_CLIENT_ID")?;

        Ok(Self {
            realm_url,
            client_id,
            public_key: env_optional("KC_PUBLIC_KEY"),
            issuer: env_optional("KC_ISSUER"),
            leeway: Duration::from_secs(env_parse_or("JWT_LEEWAY_SECS", 60)?),
            key_cache_ttl: Duration::from_secs(env_parse_or("JWKS_CACHE_TTL_SECS", 300)?),
        })
    }
}
