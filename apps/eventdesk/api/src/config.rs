use core_config::{
    AppInfo, FromEnv, app_info, env_list, rate_limit::RateLimitConfig, server::ServerConfig,
};
use database::postgres::PostgresConfig;
use database::redis::RedisConfig;
use domain_events::EventsConfig;
use domain_identity::KeycloakConfig;
use messaging::KafkaConfig;

use axum_helpers::{OidcConfig, RouterOptions};

pub use core_config::Environment;

/// Everything the service reads from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub environment: Environment,
    pub server: ServerConfig,
    pub rate_limit: RateLimitConfig,
    /// `CORS_ALLOWED_ORIGIN`, falling back to `ORIGINS`
    pub cors_origins: Vec<String>,
    pub database: PostgresConfig,
    pub redis: RedisConfig,
    pub kafka: KafkaConfig,
    pub keycloak: KeycloakConfig,
    pub oidc: OidcConfig,
    pub events: EventsConfig,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let mut cors_origins = env_list("CORS_ALLOWED_ORIGIN");
        if cors_origins.is_empty() {
            cors_origins = env_list("ORIGINS");
        }

        Ok(Self {
            app: app_info!(),
            environment: Environment::from_env(),
            server: ServerConfig::from_env()?,
            rate_limit: RateLimitConfig::from_env()?,
            cors_origins,
            database: PostgresConfig::from_env()?, // Required - will fail if not set
            redis: RedisConfig::from_env()?,
            kafka: KafkaConfig::from_env()?,
            keycloak: KeycloakConfig::from_env()?,
            oidc: OidcConfig::from_env()?,
            events: EventsConfig::from_env()?,
        })
    }

    pub fn router_options(&self) -> RouterOptions {
        RouterOptions {
            cors_origins: self.cors_origins.clone(),
            request_timeout: self.server.request_timeout,
            rate_limit: Some(self.rate_limit.clone()),
        }
    }
}
