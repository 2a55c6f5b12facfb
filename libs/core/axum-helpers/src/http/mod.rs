//! HTTP middleware: CORS, security headers and per-client rate limiting.
//!
//! # Example
//!
//! ```ignore
//! use axum_helpers::http::{ClientRateLimiter, create_cors_layer, rate_limit, security_headers};
//!
//! let app = Router::new()
//!     .layer(axum::middleware::from_fn_with_state(ClientRateLimiter::new(&limits), rate_limit))
//!     .layer(axum::middleware::from_fn(security_headers))
//!     .layer(create_cors_layer(&origins)?);
//! ```

pub mod cors;
pub mod rate_limit;
pub mod security;

pub use cors::create_cors_layer;
pub use rate_limit::{ClientRateLimiter, rate_limit};
pub use security::security_headers;
