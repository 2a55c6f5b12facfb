use axum_helpers::auth::keycloak_server_url;
use core_config::{ConfigError, FromEnv, env_optional, env_or_default, env_parse_or, env_required};
use std::time::Duration;

/// Keycloak realm, OIDC client and admin credentials.
#[derive(Clone, Debug)]
pub struct KeycloakConfig {
    /// Base URL including any context path, e.g. `http://keycloak:8080/auth`
    pub server_url: String,
    pub realm: String,
    /// OIDC client used for token grants
    pub client_id: String,
    pub client_secret: Option<String>,
    /// Realm user allowed to manage users through the admin API
    pub admin_username: String,
    pub admin_password: String,
    pub admin_client_id: String,
    /// Public URL of this service; the OIDC callback hangs off it
    pub backend_url: String,
    pub request_timeout: Duration,
}

impl KeycloakConfig {
    pub fn new(
        server_url: impl Into<String>,
        realm: impl Into<String>,
        client_id: impl Into<String>,
    ) -> Self {
        Self {
            server_url: server_url.into().trim_end_matches('/').to_string(),
            realm: realm.into(),
            client_id: client_id.into(),
            client_secret: None,
            admin_username: String::new(),
            admin_password: String::new(),
            admin_client_id: "admin-cli".to_string(),
            backend_url: "http://localhost:8080".to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_admin(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.admin_username = username.into();
        self.admin_password = password.into();
        self
    }

    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    pub fn with_backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn realm_url(&self) -> String {
        format!("{}/realms/{}", self.server_url, self.realm)
    }

    pub fn openid_endpoint(&self, name: &str) -> String {
        format!("{}/protocol/openid-connect/{}", self.realm_url(), name)
    }

    pub fn admin_users_url(&self) -> String {
        format!("{}/admin/realms/{}/users", self.server_url, self.realm)
    }

    pub fn redirect_uri(&self) -> String {
        format!("{}/api/v1/auth/callback", self.backend_url)
    }
}

/// Environment variables:
/// - `KC_SERVER_URL` or `KC_HOSTNAME_CONTAINER` + `KC_PORT` (+ `KC_BASE_PATH`)
/// - `KC_REALM_NAME`, `KC_REALM_COMMON_CLIENT` (required)
/// - `KC_CLIENT_SECRET_KEY` (optional)
/// - `KC_REALM_COMMON_USER`, `KC_REALM_COMMON_USER_PASSWORD` (required)
/// - `KC_ADMIN_CLIENT_ID` (default: admin-cli)
/// - `REACT_APP_BACKEND_URL` or `BACKEND_URL` (default: http://localhost:8080)
/// - `KC_REQUEST_TIMEOUT_SECS` (default: 10)
impl FromEnv for KeycloakConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let backend_url = env_optional("REACT_APP_BACKEND_URL")
            .or_else(|| env_optional("BACKEND_URL"))
            .unwrap_or_else(|| "http://localhost:8080".to_string());

        let mut config = Self::new(
            keycloak_server_url()?,
            env_required("KC_REALM_NAME")?,
            env_required("KC_REALM_COMMON_CLIENT")?,
        )
        .with_admin(
            env_required("KC_REALM_COMMON_USER")?,
            env_required("KC_REALM_COMMON_USER_PASSWORD")?,
        )
        .with_backend_url(backend_url);

        config.client_secret = env_optional("KC_CLIENT_SECRET_KEY");
        config.admin_client_id = env_or_default("KC_ADMIN_CLIENT_ID", "admin-cli");
        config.request_timeout = Duration::from_secs(env_parse_or("KC_REQUEST_TIMEOUT_SECS", 10)?);
        Ok(config)
    }
}
