//! Events Domain
//!
//! Events are named, dated records owned by the client that created them. Names are
//! unique system-wide; every read is scoped to the caller's client.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints behind the permission gate
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐      ┌───────────────┐
//! │   Service   │─────▶│  EventCache   │  ← Redis, per-client list
//! └──────┬──────┘      └───────────────┘
//!        │
//! ┌──────▼──────┐      ┌───────────────┐
//! │ Repository  │◀─────│  OutboxRelay  │  ← re-publishes pending notifications
//! └──────┬──────┘      └───────┬───────┘
//!        │                     │
//! ┌──────▼──────┐      ┌───────▼───────┐
//! │  Postgres   │      │ EventNotifier │  ← Kafka
//! └─────────────┘      └───────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_events::{EventService, EventsConfig, PgEventRepository, handlers};
//!
//! let service = EventService::new(PgEventRepository::new(db), broker.clone(), config)
//!     .with_cache(EventCache::new(redis, ttl));
//! let relay = service.outbox_relay();
//! tokio::spawn(relay.run(shutdown_rx));
//!
//! let router = handlers::router(service, PermissionGate::authenticated(verifier));
//! ```

pub mod cache;
pub mod config;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod notifier;
pub mod postgres;
pub mod relay;
pub mod repository;
pub mod service;

pub use cache::{CacheError, CacheRead, EventCache};
pub use config::EventsConfig;
pub use error::{EventError, EventResult};
pub use models::{CreateEvent, Event, EventSearch, PendingNotification};
pub use notifier::EventNotifier;
pub use postgres::PgEventRepository;
pub use relay::{OutboxRelay, RelayReport};
pub use repository::{EventRepository, OutboxMessage};
pub use service::EventService;
