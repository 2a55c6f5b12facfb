//! Identity domain: account and session operations backed by Keycloak.
//!
//! Token *verification* for protected routes is local and lives in
//! `axum_helpers::auth`; this crate covers everything that needs the provider:
//!
//! - registration and user administration through the admin REST API
//! - password, refresh-token and authorization-code grants
//! - logout and remote introspection
//!
//! ```ignore
//! let client = KeycloakClient::new(KeycloakConfig::from_env()?)?;
//! let routes = handlers::router(AuthService::new(client), verifier.clone());
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod keycloak;
pub mod models;
pub mod provider;
pub mod service;

pub use config::KeycloakConfig;
pub use error::{IdentityError, IdentityResult};
pub use handlers::{ADMIN_ROLE, ApiDoc};
pub use keycloak::KeycloakClient;
pub use models::*;
pub use provider::IdentityProvider;
pub use service::AuthService;
