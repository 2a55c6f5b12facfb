use axum_helpers::auth::{KeySource, RealmKeySource, StaticKeySource};
use axum_helpers::server::{
    CleanupCoordinator, ShutdownCoordinator, close_postgres, create_production_app,
    create_router, health_router,
};
use axum_helpers::TokenVerifier;
use core_config::tracing::{init_tracing, install_color_eyre};
use database::common::{RetryConfig, retry_with_backoff};
use domain_events::{EventCache, EventNotifier, EventService, PgEventRepository};
use domain_identity::{AuthService, KeycloakClient};
use messaging::KafkaBroker;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;

    init_tracing(&config.environment);

    let postgres_future = async {
        database::postgres::connect_from_config_with_retry(config.database.clone(), None)
            .await
            .map_err(|e| eyre::eyre!("PostgreSQL connection failed: {}", e))
    };

    let redis_future = async {
        database::redis::connect_from_config_with_retry(config.redis.clone(), None)
            .await
            .map_err(|e| eyre::eyre!("Redis connection failed: {}", e))
    };

    let (db, redis) = tokio::try_join!(postgres_future, redis_future)?;

    database::postgres::run_migrations::<migration::Migrator>(&db, config.app.name).await?;

    let broker = Arc::new(KafkaBroker::new(config.kafka.clone()));
    retry_with_backoff(
        || broker.start(),
        RetryConfig::new()
            .with_max_retries(5)
            .with_initial_delay(Duration::from_millis(500)),
    )
    .await
    .map_err(|e| eyre::eyre!("Kafka broker failed to start: {}", e))?;

    let keys: Arc<dyn KeySource> = match &config.oidc.public_key {
        Some(public_key) => Arc::new(StaticKeySource::from_realm_public_key(public_key)?),
        None => Arc::new(RealmKeySource::new(&config.oidc)),
    };
    let verifier = Arc::new(TokenVerifier::new(keys, &config.oidc));

    let state = AppState {
        config,
        db,
        redis,
        broker,
        verifier,
    };

    let notifier: Arc<dyn EventNotifier> = state.broker.clone();
    let events = EventService::new(
        PgEventRepository::new(state.db.clone()),
        notifier,
        state.config.events.clone(),
    )
    .with_cache(EventCache::new(
        state.redis.clone(),
        state.config.events.cache_ttl,
    ));
    let identity = AuthService::new(KeycloakClient::new(state.config.keycloak.clone())?);

    let (relay_stop, relay_stopped) = watch::channel(false);
    let relay = tokio::spawn(events.outbox_relay().run(relay_stopped));

    let api_routes = api::routes(&state, events, identity);
    let router =
        create_router::<openapi::ApiDoc>(api_routes, &state.config.router_options()).await?;

    // /health: liveness with app name/version; /ready: database, redis and broker checks
    let app = router
        .merge(health_router(state.config.app))
        .merge(api::ready_router(state.clone()));

    let (coordinator, _shutdown_rx) = ShutdownCoordinator::new();
    let server_config = state.config.server.clone();

    info!("Starting eventdesk API with graceful shutdown (30s timeout)");

    create_production_app(
        app,
        &server_config,
        coordinator,
        Duration::from_secs(30),
        async move {
            let _ = relay_stop.send(true);
            if let Err(e) = relay.await {
                warn!(error = %e, "Outbox relay task failed");
            }

            let AppState {
                db, redis, broker, ..
            } = state;

            let mut cleanup = CleanupCoordinator::new();
            cleanup.add_task("kafka", async move { broker.stop().await });
            cleanup.add_task("postgres", async move { close_postgres(db, "main").await });
            cleanup.add_task("redis", async move {
                // ConnectionManager closes on drop
                drop(redis);
            });
            cleanup.run().await;
        },
    )
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Eventdesk API shutdown complete");
    Ok(())
}
