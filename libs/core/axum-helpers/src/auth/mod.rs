//! Bearer-token verification and role-based permission gates.
//!
//! Tokens are RS256 JWTs issued by the identity provider. They are verified locally
//! against the realm public key (cached, see [`RealmKeySource`]), then the gate checks
//! the client roles found under `resource_access[client_id].roles`. Realm roles are not
//! consulted.
//!
//! ```ignore
//! use axum_helpers::auth::{OidcConfig, PermissionGate, RealmKeySource, TokenVerifier, require_permissions};
//!
//! let config = OidcConfig::from_env()?;
//! let verifier = Arc::new(TokenVerifier::new(Arc::new(RealmKeySource::new(&config)), &config));
//!
//! let admin_only = Router::new()
//!     .route("/users", get(list_users))
//!     .layer(axum::middleware::from_fn_with_state(
//!         PermissionGate::require(verifier.clone(), ["admin"]),
//!         require_permissions,
//!     ));
//! ```

pub mod claims;
pub mod config;
pub mod keys;
pub mod middleware;
pub mod verifier;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use claims::{Claims, RoleSet};
pub use config::{OidcConfig, keycloak_server_url};
pub use keys::{KeySource, RealmKeySource, StaticKeySource, realm_key_to_pem};
pub use middleware::{BearerToken, PermissionGate, extract_bearer_token, require_permissions};
pub use verifier::{AuthError, TokenVerifier};
