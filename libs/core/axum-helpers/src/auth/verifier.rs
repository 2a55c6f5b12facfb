use axum::response::{IntoResponse, Response};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, Validation, decode};
use std::sync::Arc;
use thiserror::Error;

use super::claims::Claims;
use super::config::OidcConfig;
use super::keys::KeySource;
use crate::errors::{AppError, ErrorCode};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AuthError {
    #[error("Not authenticated")]
    MissingToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Invalid token: {0}")]
    MalformedToken(String),

    #[error("Role '{0}' is required to perform this action")]
    MissingRole(String),

    #[error("Signing key unavailable: {0}")]
    KeyUnavailable(String),
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => Self::TokenExpired,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            _ => Self::MalformedToken(err.to_string()),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        let code = match &err {
            AuthError::MissingToken => ErrorCode::Unauthorized,
            AuthError::TokenExpired => ErrorCode::TokenExpired,
            AuthError::InvalidSignature => ErrorCode::InvalidSignature,
            AuthError::MalformedToken(_) => ErrorCode::InvalidToken,
            AuthError::MissingRole(_) => return AppError::Forbidden(err.to_string()),
            AuthError::KeyUnavailable(msg) => {
                return AppError::Upstream {
                    code: ErrorCode::IdentityProviderError,
                    message: msg.clone(),
                };
            }
        };
        AppError::Unauthorized {
            code,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}

/// Verifies RS256 access tokens locally and checks client roles.
pub struct TokenVerifier {
    keys: Arc<dyn KeySource>,
    validation: Validation,
    client_id: String,
}

impl TokenVerifier {
    pub fn new(keys: Arc<dyn KeySource>, config: &OidcConfig) -> Self {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = config.leeway.as_secs();
        // Provider tokens carry `aud: account`; the client is checked through roles instead.
        validation.validate_aud = false;
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }

        Self {
            keys,
            validation,
            client_id: config.client_id.clone(),
        }
    }

    /// Client whose `resource_access` roles are checked.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Decode and verify signature and expiry.
    pub async fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let key = self.keys.decoding_key().await?;
        match decode::<Claims>(token, &key, &self.validation) {
            Ok(data) => Ok(data.claims),
            Err(err) if matches!(err.kind(), ErrorKind::InvalidSignature) => {
                // The realm key may have rotated since it was cached.
                if !self.keys.invalidate().await {
                    return Err(AuthError::InvalidSignature);
                }
                tracing::debug!("Signature check failed, retrying with a fresh realm key");
                let key = self.keys.decoding_key().await?;
                Ok(decode::<Claims>(token, &key, &self.validation)?.claims)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// [`verify`](Self::verify), then require every role in `required`.
    ///
    /// An empty `required` set accepts any valid token.
    pub async fn authorize(&self, token: &str, required: &[String]) -> Result<Claims, AuthError> {
        let claims = self.verify(token).await?;
        if let Some(role) = claims.first_missing_role(&self.client_id, required) {
            tracing::info!(
                username = claims.username(),
                role,
                "Request rejected for missing role"
            );
            return Err(AuthError::MissingRole(role.to_string()));
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::keys::StaticKeySource;
    use crate::auth::testing::{
        ROTATED_PRIVATE_PEM, ROTATED_PUBLIC_PEM, SIGNING_PUBLIC_PEM, claims_for, sign,
        sign_with, static_verifier,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
    }

    fn roles(names: &[&str]) -> Vec<String> {
        names.iter().map(|r| r.to_string()).collect()
    }

    #[tokio::test]
    async fn test_verify_returns_claims() {
        let verifier = static_verifier("backend");
        let token = sign(&claims_for("app-1", "alice", &["user"]));

        let claims = verifier.verify(&token).await.unwrap();
        assert_eq!(claims.client_id(), Some("app-1"));
        assert_eq!(claims.username(), "alice");
    }

    #[tokio::test]
    async fn test_expired_malformed_and_bad_signature_are_distinct() {
        let verifier = static_verifier("backend");

        let mut expired = claims_for("app-1", "alice", &[]);
        expired.exp = now() - 3600;
        assert_eq!(
            verifier.verify(&sign(&expired)).await.unwrap_err(),
            AuthError::TokenExpired
        );

        assert!(matches!(
            verifier.verify("not.a.jwt").await.unwrap_err(),
            AuthError::MalformedToken(_)
        ));

        let forged = sign_with(ROTATED_PRIVATE_PEM, &claims_for("app-1", "alice", &[]));
        assert_eq!(
            verifier.verify(&forged).await.unwrap_err(),
            AuthError::InvalidSignature
        );
    }

    #[tokio::test]
    async fn test_leeway_accepts_recently_expired_token() {
        let verifier = static_verifier("backend");
        let mut claims = claims_for("app-1", "alice", &[]);
        claims.exp = now() - 10;
        assert!(verifier.verify(&sign(&claims)).await.is_ok());
    }

    #[tokio::test]
    async fn test_issuer_is_checked_when_configured() {
        let mut config = OidcConfig::new("http://kc/realms/events", "backend");
        config.issuer = Some("http://kc/realms/events".into());
        let keys = Arc::new(StaticKeySource::from_rsa_pem(SIGNING_PUBLIC_PEM.as_bytes()).unwrap());
        let verifier = TokenVerifier::new(keys, &config);

        let mut claims = claims_for("app-1", "alice", &[]);
        claims.iss = Some("http://evil/realms/events".into());
        assert!(matches!(
            verifier.verify(&sign(&claims)).await.unwrap_err(),
            AuthError::MalformedToken(_)
        ));

        claims.iss = config.issuer.clone();
        assert!(verifier.verify(&sign(&claims)).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_role_is_named_and_present_role_passes() {
        let verifier = static_verifier("backend");
        let without = sign(&claims_for("app-1", "alice", &["user"]));
        let with = sign(&claims_for("app-1", "alice", &["user", "admin"]));

        let err = verifier
            .authorize(&without, &roles(&["admin"]))
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::MissingRole("admin".into()));
        assert_eq!(err.to_string(), "Role 'admin' is required to perform this action");

        assert!(verifier.authorize(&with, &roles(&["admin"])).await.is_ok());
    }

    #[tokio::test]
    async fn test_realm_admin_without_client_role_is_forbidden() {
        let verifier = static_verifier("backend");
        let mut claims = claims_for("app-1", "alice", &[]);
        claims.resource_access.clear();
        claims.realm_access = Some(crate::auth::RoleSet {
            roles: roles(&["admin"]),
        });

        let err = verifier
            .authorize(&sign(&claims), &roles(&["admin"]))
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::MissingRole("admin".into()));
        assert_eq!(
            AppError::from(err).status(),
            axum::http::StatusCode::FORBIDDEN
        );
    }

    #[tokio::test]
    async fn test_empty_role_set_accepts_any_valid_token() {
        let verifier = static_verifier("backend");
        let token = sign(&claims_for("app-1", "alice", &[]));
        assert!(verifier.authorize(&token, &[]).await.is_ok());
    }

    /// Serves the signing key first and the rotated key after invalidation.
    struct RotatingKeys {
        fetches: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl KeySource for RotatingKeys {
        async fn decoding_key(&self) -> Result<jsonwebtoken::DecodingKey, AuthError> {
            let pem = if self.fetches.fetch_add(1, Ordering::SeqCst) == 0 {
                SIGNING_PUBLIC_PEM
            } else {
                ROTATED_PUBLIC_PEM
            };
            Ok(jsonwebtoken::DecodingKey::from_rsa_pem(pem.as_bytes()).unwrap())
        }

        async fn invalidate(&self) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn test_signature_failure_refetches_key_once() {
        let keys = Arc::new(RotatingKeys {
            fetches: AtomicUsize::new(0),
        });
        let config = OidcConfig::new("http://kc/realms/events", "backend");
        let verifier = TokenVerifier::new(keys.clone(), &config);

        let token = sign_with(ROTATED_PRIVATE_PEM, &claims_for("app-1", "alice", &[]));
        assert!(verifier.verify(&token).await.is_ok());
        assert_eq!(keys.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_forged_tokens_do_not_refetch_fresh_key() {
        use crate::auth::keys::RealmKeySource;
        use crate::auth::testing::realm_public_key;
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "public_key": realm_public_key(SIGNING_PUBLIC_PEM),
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = OidcConfig::new(server.uri(), "backend");
        let verifier = TokenVerifier::new(Arc::new(RealmKeySource::new(&config)), &config);

        assert!(verifier.verify(&sign(&claims_for("app-1", "alice", &[]))).await.is_ok());
        let forged = sign_with(ROTATED_PRIVATE_PEM, &claims_for("app-1", "mallory", &[]));
        for _ in 0..10 {
            assert_eq!(
                verifier.verify(&forged).await.unwrap_err(),
                AuthError::InvalidSignature
            );
        }
    }

    #[test]
    fn test_app_error_mapping() {
        use axum::http::StatusCode;

        assert_eq!(
            AppError::from(AuthError::TokenExpired).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::from(AuthError::MissingRole("admin".into())).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::from(AuthError::KeyUnavailable("down".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
