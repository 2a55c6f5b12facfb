use crate::errors::handlers::not_found;
use crate::http::{ClientRateLimiter, create_cors_layer, rate_limit, security_headers};
use super::shutdown::ShutdownCoordinator;
use axum::{Router, http::StatusCode, middleware};
use core_config::rate_limit::RateLimitConfig;
use core_config::server::ServerConfig;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::compression::CompressionLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info};
use utoipa::OpenApi;

/// Cross-cutting settings applied by [`create_router`].
#[derive(Clone, Debug)]
pub struct RouterOptions {
    /// Allowed CORS origins; empty allows any origin without credentials
    pub cors_origins: Vec<String>,
    /// Requests still running after this are answered with 408
    pub request_timeout: Duration,
    /// Per-client quota on `/api` routes; `None` disables limiting
    pub rate_limit: Option<RateLimitConfig>,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            cors_origins: Vec::new(),
            request_timeout: Duration::from_secs(30),
            rate_limit: None,
        }
    }
}

/// Creates a configured Axum router with common middleware and documentation.
///
/// This function sets up:
/// - OpenAPI documentation (Swagger UI, ReDoc, RapiDoc, Scalar)
/// - API routes nested under `/api`, rate limited per client when configured
/// - A per-request deadline answering 408
/// - Common middleware (tracing, security headers, CORS, compression)
/// - 404 fallback handler
///
/// Health endpoints (`/health`, `/ready`) are merged by the app with
/// [`health_router`](super::health::health_router) and its own ready handler.
///
/// # Errors
/// Returns `InvalidInput` when a CORS origin is not a valid header value.
///
/// # Example
/// ```ignore
/// let api_routes = Router::new()
///     .nest("/v1/events", domain_events::handlers::router(event_state))
///     .nest("/v1/auth", domain_identity::handlers::router(auth_state));
///
/// let router = create_router::<ApiDoc>(api_routes, &RouterOptions::default()).await?;
/// ```
pub async fn create_router<T>(apis: Router, options: &RouterOptions) -> io::Result<Router>
where
    T: OpenApi + 'static,
{
    use utoipa_rapidoc::RapiDoc;
    use utoipa_redoc::{Redoc, Servable as RedocServable};
    use utoipa_scalar::{Scalar, Servable as ScalarServable};
    use utoipa_swagger_ui::SwaggerUi;

    let cors_layer = create_cors_layer(&options.cors_origins)?;

    let apis = match &options.rate_limit {
        Some(limits) => {
            info!(
                per_minute = limits.per_minute.get(),
                burst = limits.burst.get(),
                "Rate limiting enabled"
            );
            apis.layer(middleware::from_fn_with_state(
                ClientRateLimiter::new(limits),
                rate_limit,
            ))
        }
        None => apis,
    };

    let router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", T::openapi()))
        .merge(Redoc::with_url("/redoc", T::openapi()))
        .merge(RapiDoc::new("/api-docs/openapi.json").path("/rapidoc"))
        .merge(Scalar::with_url("/scalar", T::openapi()))
        .nest("/api", apis)
        .fallback(not_found)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            options.request_timeout,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(middleware::from_fn(security_headers))
        .layer(cors_layer)
        // gzip, br, deflate, zstd per Accept-Encoding
        .layer(CompressionLayer::new());

    Ok(router)
}

/// Production-ready server with coordinated shutdown and cleanup.
///
/// Serves with peer addresses available to the rate limiter. On SIGINT/SIGTERM (or
/// `coordinator.shutdown()`) in-flight requests drain while `cleanup` runs, bounded by
/// `shutdown_timeout`.
///
/// # Example
/// ```ignore
/// let (coordinator, _rx) = ShutdownCoordinator::new();
/// let cleanup = async move {
///     broker.stop().await;
///     close_postgres(db, "main").await;
/// };
///
/// create_production_app(router, &config, coordinator, Duration::from_secs(30), cleanup).await?;
/// ```
pub async fn create_production_app<F>(
    router: Router,
    server_config: &ServerConfig,
    coordinator: ShutdownCoordinator,
    shutdown_timeout: Duration,
    cleanup: F,
) -> io::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let shutdown_handle = coordinator.clone();

    let listener = tokio::net::TcpListener::bind(server_config.address()).await?;
    info!("Server starting on {}", listener.local_addr()?);

    let cleanup_handle = tokio::spawn(async move {
        shutdown_handle.wait_for_signal().await;

        info!("Starting cleanup tasks (timeout: {:?})", shutdown_timeout);
        match tokio::time::timeout(shutdown_timeout, cleanup).await {
            Ok(_) => info!("Cleanup completed successfully"),
            Err(_) => {
                tracing::warn!(
                    "Cleanup exceeded timeout of {:?}, forcing shutdown",
                    shutdown_timeout
                );
            }
        }
    });

    let serve_result = axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move { coordinator.wait_for_signal().await })
    .await
    .inspect_err(|e| {
        tracing::error!("Server encountered an error: {:?}", e);
    });

    cleanup_handle.await.ok();

    serve_result
}
