//! PostgreSQL pool, migrations and the readiness check.

mod config;
mod connector;
mod health;

pub use config::PostgresConfig;
pub use connector::{connect, connect_from_config_with_retry, is_unique_violation, run_migrations};
pub use health::check_health;

pub use sea_orm::{DatabaseConnection, DbErr};
