use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

use crate::error::{IdentityError, IdentityResult};
use crate::models::{CallbackTokens, Credentials, TokenPair, UpdatePassword, UserSummary};
use crate::provider::IdentityProvider;

fn validated<T: Validate>(input: &T) -> IdentityResult<()> {
    input
        .validate()
        .map_err(|e| IdentityError::Validation(e.to_string()))
}

/// Provider user ids are UUIDs; anything outside `[A-Za-z0-9_-]` is rejected.
fn checked_user_id(user_id: &str) -> IdentityResult<&str> {
    let well_formed = !user_id.is_empty()
        && user_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if well_formed {
        Ok(user_id)
    } else {
        Err(IdentityError::Validation(format!("malformed user id '{}'", user_id)))
    }
}

/// Account and session operations delegated to the identity provider.
pub struct AuthService<P: IdentityProvider> {
    provider: Arc<P>,
}

impl<P: IdentityProvider> Clone for AuthService<P> {
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
        }
    }
}

impl<P: IdentityProvider> AuthService<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider: Arc::new(provider),
        }
    }

    #[instrument(skip_all, fields(username = %credentials.username))]
    pub async fn register(&self, credentials: Credentials) -> IdentityResult<()> {
        validated(&credentials)?;
        self.provider
            .register(&credentials.username, &credentials.password)
            .await?;
        info!("User registered");
        Ok(())
    }

    #[instrument(skip_all, fields(username = %credentials.username))]
    pub async fn login(&self, credentials: Credentials) -> IdentityResult<TokenPair> {
        validated(&credentials)?;
        self.provider
            .login(&credentials.username, &credentials.password)
            .await
    }

    #[instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> IdentityResult<TokenPair> {
        self.provider.refresh(refresh_token).await
    }

    #[instrument(skip_all)]
    pub async fn logout(&self, refresh_token: &str) -> IdentityResult<()> {
        self.provider.logout(refresh_token).await
    }

    /// Introspection document of a live token; inactive tokens are rejected.
    #[instrument(skip_all)]
    pub async fn introspect(&self, token: &str) -> IdentityResult<Value> {
        let document = self.provider.introspect(token).await?;
        if document.get("active").and_then(Value::as_bool) == Some(true) {
            Ok(document)
        } else {
            Err(IdentityError::InactiveToken)
        }
    }

    pub fn authorization_url(&self) -> IdentityResult<String> {
        self.provider.authorization_url()
    }

    #[instrument(skip_all)]
    pub async fn callback(&self, code: Option<&str>) -> IdentityResult<CallbackTokens> {
        match code.filter(|c| !c.is_empty()) {
            Some(code) => self.provider.exchange_code(code).await,
            None => Err(IdentityError::MissingCode),
        }
    }

    pub async fn list_users(&self) -> IdentityResult<Vec<UserSummary>> {
        self.provider.list_users().await
    }

    #[instrument(skip(self, update))]
    pub async fn update_password(&self, user_id: &str, update: UpdatePassword) -> IdentityResult<()> {
        validated(&update)?;
        self.provider
            .update_password(checked_user_id(user_id)?, &update.new_password)
            .await?;
        info!("Password reset");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete_user(&self, user_id: &str) -> IdentityResult<()> {
        self.provider.delete_user(checked_user_id(user_id)?).await?;
        info!("User deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockIdentityProvider;
    use mockall::predicate::eq;
    use serde_json::json;

    fn credentials(username: &str, password: &str) -> Credentials {
        Credentials {
            username: username.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn test_register_forwards_credentials() {
        let mut provider = MockIdentityProvider::new();
        provider
            .expect_register()
            .with(eq("alice"), eq("pw"))
            .times(1)
            .returning(|_, _| Ok(()));

        AuthService::new(provider)
            .register(credentials("alice", "pw"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_empty_password_never_reaches_provider() {
        let mut provider = MockIdentityProvider::new();
        provider.expect_login().never();

        let err = AuthService::new(provider)
            .login(credentials("alice", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::Validation(_)));
    }

    #[tokio::test]
    async fn test_inactive_token_rejected() {
        let mut provider = MockIdentityProvider::new();
        provider
            .expect_introspect()
            .returning(|_| Ok(json!({ "active": false })));

        let err = AuthService::new(provider).introspect("t").await.unwrap_err();
        assert_eq!(err, IdentityError::InactiveToken);
    }

    #[tokio::test]
    async fn test_active_token_document_returned() {
        let mut provider = MockIdentityProvider::new();
        provider
            .expect_introspect()
            .returning(|_| Ok(json!({ "active": true, "username": "alice" })));

        let document = AuthService::new(provider).introspect("t").await.unwrap();
        assert_eq!(document["username"], "alice");
    }

    #[tokio::test]
    async fn test_malformed_user_id_never_reaches_provider() {
        let mut provider = MockIdentityProvider::new();
        provider.expect_delete_user().never();
        provider.expect_update_password().never();
        let service = AuthService::new(provider);

        for id in ["../clients/abc", "", "a b", "u-1/reset-password"] {
            assert!(matches!(
                service.delete_user(id).await.unwrap_err(),
                IdentityError::Validation(_)
            ));
        }
        let update = UpdatePassword {
            new_password: "new-pw".into(),
        };
        assert!(matches!(
            service.update_password("..", update).await.unwrap_err(),
            IdentityError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn test_uuid_user_id_is_forwarded() {
        let id = "4c0d3a6e-2f1b-4a57-9d1e-8f6b2c7a9e10";
        let mut provider = MockIdentityProvider::new();
        provider
            .expect_delete_user()
            .with(eq(id))
            .times(1)
            .returning(|_| Ok(()));

        AuthService::new(provider).delete_user(id).await.unwrap();
    }

    #[tokio::test]
    async fn test_callback_without_code() {
        let mut provider = MockIdentityProvider::new();
        provider.expect_exchange_code().never();
        let service = AuthService::new(provider);

        assert_eq!(service.callback(None).await.unwrap_err(), IdentityError::MissingCode);
        assert_eq!(service.callback(Some("")).await.unwrap_err(), IdentityError::MissingCode);
    }
}
