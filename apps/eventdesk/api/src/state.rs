//! Shared handles built once at startup.

use axum_helpers::TokenVerifier;
use messaging::KafkaBroker;
use std::sync::Arc;

/// Cloned into every router that needs it; every field is a cheap handle.
#[derive(Clone)]
pub struct AppState {
    pub config: crate::config::Config,
    /// PostgreSQL connection pool
    pub db: database::postgres::DatabaseConnection,
    /// Redis connection manager
    pub redis: database::redis::ConnectionManager,
    /// Producer and admin client shared by every request
    pub broker: Arc<KafkaBroker>,
    /// Local bearer-token verification against the realm key
    pub verifier: Arc<TokenVerifier>,
}
