//! Server infrastructure module.
//!
//! This module provides:
//! - Router setup with OpenAPI documentation and the cross-cutting layers
//! - Health and readiness endpoints
//! - Graceful shutdown coordination
//! - Connection cleanup
//!
//! # Example
//!
//! ```ignore
//! use axum_helpers::server::{
//!     ShutdownCoordinator, create_production_app, create_router, health_router,
//! };
//! use core_config::app_info;
//!
//! let router = create_router::<ApiDoc>(api_routes, &options).await?;
//! let app = router.merge(health_router(app_info!()));
//!
//! let (coordinator, _rx) = ShutdownCoordinator::new();
//! create_production_app(app, &server_config, coordinator, Duration::from_secs(30), cleanup).await?;
//! ```

pub mod app;
pub mod cleanup;
pub mod health;
pub mod shutdown;

pub use app::{RouterOptions, create_production_app, create_router};
pub use cleanup::{CleanupCoordinator, close_postgres};
pub use health::{HealthCheckFuture, HealthResponse, health_router, run_health_checks};
pub use shutdown::{ShutdownCoordinator, shutdown_signal};
