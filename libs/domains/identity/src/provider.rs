use async_trait::async_trait;
use serde_json::Value;

use crate::error::IdentityResult;
use crate::models::{CallbackTokens, TokenPair, UserSummary};

/// Operations this service delegates to the identity provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create an enabled realm user with a permanent password.
    async fn register(&self, username: &str, password: &str) -> IdentityResult<()>;

    /// Resource owner password grant.
    async fn login(&self, username: &str, password: &str) -> IdentityResult<TokenPair>;

    async fn refresh(&self, refresh_token: &str) -> IdentityResult<TokenPair>;

    /// End the session the refresh token belongs to.
    async fn logout(&self, refresh_token: &str) -> IdentityResult<()>;

    /// Raw introspection document; `active` tells whether the token is live.
    async fn introspect(&self, token: &str) -> IdentityResult<Value>;

    /// Where to send a browser to start the authorization code flow.
    fn authorization_url(&self) -> IdentityResult<String>;

    async fn exchange_code(&self, code: &str) -> IdentityResult<CallbackTokens>;

    async fn list_users(&self) -> IdentityResult<Vec<UserSummary>>;

    async fn update_password(&self, user_id: &str, new_password: &str) -> IdentityResult<()>;

    async fn delete_user(&self, user_id: &str) -> IdentityResult<()>;
}
