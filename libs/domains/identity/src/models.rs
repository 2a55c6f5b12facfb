use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Username and password, posted as an HTML form.
#[derive(Clone, Deserialize, Validate, ToSchema)]
pub struct Credentials {
    #[validate(length(min = 1, max = 255))]
    pub username: String,
    #[validate(length(min = 1))]
    #[schema(format = Password)]
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// A refresh token submitted for refresh or logout.
#[derive(Clone, Deserialize, Validate, ToSchema)]
pub struct TokenRequest {
    #[validate(length(min = 1))]
    pub token: String,
}

/// Access/refresh tokens handed back to the caller.
///
/// Lifetimes are rendered as strings, the shape existing clients consume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: String,
    pub refresh_expires_in: String,
    pub not_before_policy: String,
}

/// Token endpoint response as Keycloak sends it.
#[derive(Debug, Deserialize)]
pub(crate) struct ProviderTokens {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: u64,
    #[serde(default)]
    pub refresh_expires_in: u64,
    #[serde(rename = "not-before-policy", default)]
    pub not_before_policy: i64,
    #[serde(default)]
    pub id_token: Option<String>,
}

impl From<ProviderTokens> for TokenPair {
    fn from(tokens: ProviderTokens) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_in: tokens.expires_in.to_string(),
            refresh_expires_in: tokens.refresh_expires_in.to_string(),
            not_before_policy: tokens.not_before_policy.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CallbackQuery {
    /// Authorization code issued by the identity provider
    pub code: Option<String>,
}

/// Tokens obtained by exchanging an authorization code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CallbackTokens {
    pub access_token: String,
    pub id_token: String,
}

impl From<ProviderTokens> for CallbackTokens {
    fn from(tokens: ProviderTokens) -> Self {
        Self {
            access_token: tokens.access_token,
            id_token: tokens.id_token.unwrap_or_default(),
        }
    }
}

/// Realm user as listed by the admin API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, rename(deserialize = "createdTimestamp"))]
    pub created_timestamp: Option<i64>,
}

#[derive(Clone, Deserialize, Validate, ToSchema)]
pub struct UpdatePassword {
    #[validate(length(min = 1))]
    #[schema(format = Password)]
    pub new_password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
