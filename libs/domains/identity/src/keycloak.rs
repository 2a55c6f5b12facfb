use async_trait::async_trait;
use reqwest::{Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, instrument, warn};

use crate::config::KeycloakConfig;
use crate::error::{IdentityError, IdentityResult};
use crate::models::{CallbackTokens, ProviderTokens, TokenPair, UserSummary};
use crate::provider::IdentityProvider;

/// Keycloak realm client speaking the OpenID Connect and admin REST APIs.
#[derive(Clone)]
pub struct KeycloakClient {
    config: KeycloakConfig,
    http_client: reqwest::Client,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    error_description: Option<String>,
    #[serde(rename = "errorMessage")]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AdminToken {
    access_token: String,
}

/// A non-success answer, kept until the caller decides what it means.
struct Rejection {
    status: StatusCode,
    message: String,
}

impl Rejection {
    async fn read(response: Response) -> Self {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
        let message = body
            .error_description
            .or(body.error_message)
            .or(body.error)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| {
                if text.is_empty() {
                    status.canonical_reason().unwrap_or("unknown error").to_string()
                } else {
                    text
                }
            });
        Self { status, message }
    }

    fn into_provider_error(self) -> IdentityError {
        IdentityError::Provider {
            status: self.status.as_u16(),
            message: self.message,
        }
    }
}

impl KeycloakClient {
    pub fn new(config: KeycloakConfig) -> IdentityResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| IdentityError::Unavailable(format!("HTTP client: {}", e)))?;
        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn config(&self) -> &KeycloakConfig {
        &self.config
    }

    /// `client_id` (and `client_secret` for confidential clients) followed by `params`.
    fn client_form<'a>(&'a self, params: &[(&'a str, &'a str)]) -> Vec<(&'a str, &'a str)> {
        let mut form = vec![("client_id", self.config.client_id.as_str())];
        if let Some(secret) = &self.config.client_secret {
            form.push(("client_secret", secret.as_str()));
        }
        form.extend_from_slice(params);
        form
    }

    async fn post_form(&self, endpoint: &str, form: &[(&str, &str)]) -> IdentityResult<Response> {
        let response = self
            .http_client
            .post(self.config.openid_endpoint(endpoint))
            .form(form)
            .send()
            .await?;
        Ok(response)
    }

    /// Token endpoint call; non-success answers are handed back for the caller to classify.
    async fn token_grant(
        &self,
        params: &[(&str, &str)],
    ) -> IdentityResult<Result<ProviderTokens, Rejection>> {
        let response = self.post_form("token", &self.client_form(params)).await?;
        if response.status().is_success() {
            Ok(Ok(response.json().await?))
        } else {
            Ok(Err(Rejection::read(response).await))
        }
    }

    /// Short-lived token for the realm's user administrator.
    async fn admin_token(&self) -> IdentityResult<String> {
        let form = [
            ("client_id", self.config.admin_client_id.as_str()),
            ("grant_type", "password"),
            ("username", self.config.admin_username.as_str()),
            ("password", self.config.admin_password.as_str()),
        ];
        let response = self.post_form("token", &form).await?;
        if !response.status().is_success() {
            let rejection = Rejection::read(response).await;
            warn!(status = %rejection.status, "Keycloak admin login failed");
            return Err(rejection.into_provider_error());
        }
        let token: AdminToken = response.json().await?;
        Ok(token.access_token)
    }

    /// `{admin users}/{user_id}/{tail..}` with every segment percent-encoded, so an id can
    /// never climb out of the users collection.
    fn user_url(&self, user_id: &str, tail: &[&str]) -> IdentityResult<Url> {
        let invalid = |detail: String| IdentityError::Provider {
            status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            message: format!("invalid admin endpoint: {}", detail),
        };
        let mut url = Url::parse(&self.config.admin_users_url()).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .push(user_id)
            .extend(tail);
        Ok(url)
    }
}

fn is_client_error(status: StatusCode) -> bool {
    matches!(status, StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED)
}

#[async_trait]
impl IdentityProvider for KeycloakClient {
    #[instrument(skip(self, password))]
    async fn register(&self, username: &str, password: &str) -> IdentityResult<()> {
        let admin_token = self.admin_token().await?;
        let user = json!({
            "username": username,
            "email": format!("{}@{}.com", username, username),
            "enabled": true,
            "credentials": [
                { "type": "password", "value": password, "temporary": false }
            ],
        });

        let response = self
            .http_client
            .post(self.config.admin_users_url())
            .bearer_auth(admin_token)
            .json(&user)
            .send()
            .await?;

        if response.status().is_success() {
            debug!("User created");
            return Ok(());
        }
        let rejection = Rejection::read(response).await;
        Err(match rejection.status {
            StatusCode::CONFLICT => IdentityError::UserExists,
            StatusCode::BAD_REQUEST => IdentityError::Validation(rejection.message),
            _ => rejection.into_provider_error(),
        })
    }

    #[instrument(skip(self, password))]
    async fn login(&self, username: &str, password: &str) -> IdentityResult<TokenPair> {
        let grant = [
            ("grant_type", "password"),
            ("username", username),
            ("password", password),
            ("scope", "openid"),
        ];
        match self.token_grant(&grant).await? {
            Ok(tokens) => Ok(tokens.into()),
            Err(rejection) if is_client_error(rejection.status) => {
                Err(IdentityError::InvalidCredentials(rejection.message))
            }
            Err(rejection) => Err(rejection.into_provider_error()),
        }
    }

    #[instrument(skip_all)]
    async fn refresh(&self, refresh_token: &str) -> IdentityResult<TokenPair> {
        let grant = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];
        match self.token_grant(&grant).await? {
            Ok(tokens) => Ok(tokens.into()),
            Err(rejection) if is_client_error(rejection.status) => {
                Err(IdentityError::InvalidToken(rejection.message))
            }
            Err(rejection) => Err(rejection.into_provider_error()),
        }
    }

    #[instrument(skip_all)]
    async fn logout(&self, refresh_token: &str) -> IdentityResult<()> {
        let form = self.client_form(&[("refresh_token", refresh_token)]);
        let response = self.post_form("logout", &form).await?;
        if response.status().is_success() {
            return Ok(());
        }
        let rejection = Rejection::read(response).await;
        if is_client_error(rejection.status) {
            Err(IdentityError::InvalidToken(rejection.message))
        } else {
            Err(rejection.into_provider_error())
        }
    }

    #[instrument(skip_all)]
    async fn introspect(&self, token: &str) -> IdentityResult<Value> {
        let form = self.client_form(&[("token", token)]);
        let response = self.post_form("token/introspect", &form).await?;
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(Rejection::read(response).await.into_provider_error())
        }
    }

    fn authorization_url(&self) -> IdentityResult<String> {
        let redirect_uri = self.config.redirect_uri();
        let url = Url::parse_with_params(
            &self.config.openid_endpoint("auth"),
            [
                ("client_id", self.config.client_id.as_str()),
                ("response_type", "code"),
                ("scope", "openid"),
                ("redirect_uri", redirect_uri.as_str()),
            ],
        )
        .map_err(|e| IdentityError::Provider {
            status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            message: format!("invalid authorization endpoint: {}", e),
        })?;
        Ok(url.into())
    }

    #[instrument(skip_all)]
    async fn exchange_code(&self, code: &str) -> IdentityResult<CallbackTokens> {
        let redirect_uri = self.config.redirect_uri();
        let grant = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri.as_str()),
        ];
        match self.token_grant(&grant).await? {
            Ok(tokens) => Ok(tokens.into()),
            Err(rejection) if is_client_error(rejection.status) => {
                Err(IdentityError::InvalidToken(rejection.message))
            }
            Err(rejection) => Err(rejection.into_provider_error()),
        }
    }

    #[instrument(skip(self))]
    async fn list_users(&self) -> IdentityResult<Vec<UserSummary>> {
        let admin_token = self.admin_token().await?;
        let response = self
            .http_client
            .get(self.config.admin_users_url())
            .bearer_auth(admin_token)
            .send()
            .await?;
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(Rejection::read(response).await.into_provider_error())
        }
    }

    #[instrument(skip(self, new_password))]
    async fn update_password(&self, user_id: &str, new_password: &str) -> IdentityResult<()> {
        let admin_token = self.admin_token().await?;
        let credential = json!({ "type": "password", "value": new_password, "temporary": false });
        let response = self
            .http_client
            .put(self.user_url(user_id, &["reset-password"])?)
            .bearer_auth(admin_token)
            .json(&credential)
            .send()
            .await?;
        user_admin_outcome(response, user_id).await
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, user_id: &str) -> IdentityResult<()> {
        let admin_token = self.admin_token().await?;
        let response = self
            .http_client
            .delete(self.user_url(user_id, &[])?)
            .bearer_auth(admin_token)
            .send()
            .await?;
        user_admin_outcome(response, user_id).await
    }
}

async fn user_admin_outcome(response: Response, user_id: &str) -> IdentityResult<()> {
    if response.status().is_success() {
        return Ok(());
    }
    let rejection = Rejection::read(response).await;
    Err(match rejection.status {
        StatusCode::NOT_FOUND => IdentityError::UserNotFound(user_id.to_string()),
        StatusCode::BAD_REQUEST => IdentityError::Validation(rejection.message),
        _ => rejection.into_provider_error(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TOKEN_PATH: &str = "/realms/demo/protocol/openid-connect/token";
    const USERS_PATH: &str = "/admin/realms/demo/users";

    fn client_for(server: &MockServer) -> KeycloakClient {
        let config = KeycloakConfig::new(server.uri(), "demo", "frontend")
            .with_admin("realm-admin", "admin-pw")
            .with_backend_url("http://api.local");
        KeycloakClient::new(config).unwrap()
    }

    async fn mount_admin_token(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .and(body_string_contains("client_id=admin-cli"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "admin-token",
                "expires_in": 60
            })))
            .mount(server)
            .await;
    }

    fn token_body() -> Value {
        json!({
            "access_token": "access",
            "refresh_token": "refresh",
            "expires_in": 300,
            "refresh_expires_in": 1800,
            "not-before-policy": 0,
            "id_token": "id"
        })
    }

    #[tokio::test]
    async fn test_register_creates_enabled_user() {
        let server = MockServer::start().await;
        mount_admin_token(&server).await;
        Mock::given(method("POST"))
            .and(path(USERS_PATH))
            .and(header("authorization", "Bearer admin-token"))
            .and(body_string_contains(r#""email":"alice@alice.com""#))
            .and(body_string_contains(r#""temporary":false"#))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server).register("alice", "pw").await.unwrap();
    }

    #[tokio::test]
    async fn test_register_conflict_is_user_exists() {
        let server = MockServer::start().await;
        mount_admin_token(&server).await;
        Mock::given(method("POST"))
            .and(path(USERS_PATH))
            .respond_with(
                ResponseTemplate::new(409)
                    .set_body_json(json!({ "errorMessage": "User exists with same username" })),
            )
            .mount(&server)
            .await;

        let err = client_for(&server).register("alice", "pw").await.unwrap_err();
        assert_eq!(err, IdentityError::UserExists);
    }

    #[tokio::test]
    async fn test_login_returns_token_pair() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .and(body_string_contains("grant_type=password"))
            .and(body_string_contains("client_id=frontend"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body()))
            .mount(&server)
            .await;

        let pair = client_for(&server).login("alice", "pw").await.unwrap();
        assert_eq!(pair.access_token, "access");
        assert_eq!(pair.expires_in, "300");
    }

    #[tokio::test]
    async fn test_login_rejected_is_invalid_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid user credentials"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).login("alice", "nope").await.unwrap_err();
        assert_eq!(
            err,
            IdentityError::InvalidCredentials("Invalid user credentials".into())
        );
    }

    #[tokio::test]
    async fn test_refresh_with_stale_token_is_invalid_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Token is not active"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).refresh("stale").await.unwrap_err();
        assert_eq!(err, IdentityError::InvalidToken("Token is not active".into()));
    }

    #[tokio::test]
    async fn test_exchange_code_sends_redirect_uri() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=abc"))
            .and(body_string_contains("redirect_uri=http%3A%2F%2Fapi.local%2Fapi%2Fv1%2Fauth%2Fcallback"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body()))
            .mount(&server)
            .await;

        let tokens = client_for(&server).exchange_code("abc").await.unwrap();
        assert_eq!(tokens.id_token, "id");
    }

    #[tokio::test]
    async fn test_introspect_returns_document() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/realms/demo/protocol/openid-connect/token/introspect"))
            .and(body_string_contains("token=abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "active": false })))
            .mount(&server)
            .await;

        let document = client_for(&server).introspect("abc").await.unwrap();
        assert_eq!(document["active"], false);
    }

    #[tokio::test]
    async fn test_delete_unknown_user_is_not_found() {
        let server = MockServer::start().await;
        mount_admin_token(&server).await;
        Mock::given(method("DELETE"))
            .and(path(format!("{}/missing", USERS_PATH)))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({ "error": "User not found" })),
            )
            .mount(&server)
            .await;

        let err = client_for(&server).delete_user("missing").await.unwrap_err();
        assert_eq!(err, IdentityError::UserNotFound("missing".into()));
    }

    #[tokio::test]
    async fn test_user_id_cannot_escape_users_collection() {
        let server = MockServer::start().await;
        mount_admin_token(&server).await;
        Mock::given(path("/admin/realms/demo/clients/abc"))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path(format!("{}/..%2Fclients%2Fabc", USERS_PATH)))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server)
            .delete_user("../clients/abc")
            .await
            .unwrap_err();
        assert_eq!(err, IdentityError::UserNotFound("../clients/abc".into()));
    }

    #[test]
    fn test_user_url_encodes_segments() {
        let config = KeycloakConfig::new("http://kc:8080", "demo", "frontend");
        let client = KeycloakClient::new(config).unwrap();

        let url = client.user_url("u-1", &["reset-password"]).unwrap();
        assert_eq!(url.as_str(), "http://kc:8080/admin/realms/demo/users/u-1/reset-password");

        let url = client.user_url("a/b?c", &[]).unwrap();
        assert_eq!(url.path(), "/admin/realms/demo/users/a%2Fb%3Fc");
    }

    #[tokio::test]
    async fn test_update_password_resets_credential() {
        let server = MockServer::start().await;
        mount_admin_token(&server).await;
        Mock::given(method("PUT"))
            .and(path(format!("{}/u-1/reset-password", USERS_PATH)))
            .and(body_string_contains(r#""value":"new-pw""#))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server).update_password("u-1", "new-pw").await.unwrap();
    }

    #[tokio::test]
    async fn test_admin_login_failure_surfaces_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid user credentials"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).list_users().await.unwrap_err();
        assert!(matches!(err, IdentityError::Provider { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(token_body())
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let mut config = client_for(&server).config().clone();
        config.request_timeout = Duration::from_millis(100);
        let err = KeycloakClient::new(config)
            .unwrap()
            .login("alice", "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_unavailable() {
        let config = KeycloakConfig::new("http://127.0.0.1:1", "demo", "frontend");
        let err = KeycloakClient::new(config)
            .unwrap()
            .login("alice", "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::Unavailable(_)));
    }

    #[test]
    fn test_authorization_url() {
        let config = KeycloakConfig::new("http://kc:8080", "demo", "frontend")
            .with_backend_url("http://api.local");
        let url = KeycloakClient::new(config).unwrap().authorization_url().unwrap();

        assert!(url.starts_with("http://kc:8080/realms/demo/protocol/openid-connect/auth?"));
        assert!(url.contains("client_id=frontend"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("scope=openid"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Fapi.local%2Fapi%2Fv1%2Fauth%2Fcallback"));
    }
}
