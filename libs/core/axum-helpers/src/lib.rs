//! # Axum Helpers
//!
//! Shared building blocks for the HTTP services in this workspace.
//!
//! ## Modules
//!
//! - **[`auth`]**: bearer-token verification against the identity provider's realm key,
//!   role-based permission gates
//! - **[`server`]**: router setup, health checks, graceful shutdown
//! - **[`http`]**: HTTP middleware (CORS, security headers, rate limiting)
//! - **[`errors`]**: structured error responses with error codes
//! - **[`extractors`]**: validated JSON and form bodies
//!
//! ## Quick Start
//!
//! ```ignore
//! use axum::Router;
//! use axum_helpers::server::{RouterOptions, ShutdownCoordinator, create_production_app, create_router};
//! use core_config::server::ServerConfig;
//! use utoipa::OpenApi;
//!
//! #[derive(OpenApi)]
//! #[openapi(paths())]
//! struct ApiDoc;
//!
//! #[tokio::main]
//! async fn main() -> eyre::Result<()> {
//!     let api_routes = Router::new();
//!     let router = create_router::<ApiDoc>(api_routes, &RouterOptions::default()).await?;
//!
//!     let (coordinator, _rx) = ShutdownCoordinator::new();
//!     create_production_app(router, &ServerConfig::default(), coordinator, Duration::from_secs(30), async {}).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod errors;
pub mod extractors;
pub mod http;
pub mod server;

pub use auth::{
    AuthError, BearerToken, Claims, OidcConfig, PermissionGate, RealmKeySource, StaticKeySource,
    TokenVerifier, require_permissions,
};

pub use server::{
    CleanupCoordinator, HealthCheckFuture, HealthResponse, RouterOptions, ShutdownCoordinator,
    close_postgres, create_production_app, create_router, health_router, run_health_checks,
};

pub use http::{ClientRateLimiter, create_cors_layer, rate_limit, security_headers};

pub use errors::{AppError, ErrorCode, ErrorResponse, error_response};

pub use extractors::{ValidatedForm, ValidatedJson};
