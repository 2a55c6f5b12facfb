//! Storage plumbing shared by the services: a SeaORM Postgres pool, a Redis
//! `ConnectionManager`, startup retry with backoff, readiness checks and
//! [`BaseRepository`], the generic per-entity data access layer.
//!
//! Features: `postgres` and `redis` (both default) select the backends; `config` adds
//! `core_config::FromEnv` for [`postgres::PostgresConfig`] and [`redis::RedisConfig`].
//!
//! ```ignore
//! let db = database::postgres::connect_from_config_with_retry(PostgresConfig::from_env()?, None).await?;
//! database::postgres::run_migrations::<migration::Migrator>(&db, "eventdesk_api").await?;
//! let cache = database::redis::connect_from_config_with_retry(RedisConfig::from_env()?, None).await?;
//! ```

pub mod common;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "postgres")]
pub mod repository;

#[cfg(feature = "redis")]
pub mod redis;

pub use common::{DatabaseError, DatabaseResult};

#[cfg(feature = "postgres")]
pub use repository::{BaseRepository, FilterableEntity, Filters};
