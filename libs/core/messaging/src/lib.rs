//! Kafka broker client.
//!
//! One producer and one admin client are shared by every request. Both live inside
//! [`KafkaBroker`], which walks an explicit lifecycle:
//!
//! ```text
//! Uninitialized ──start()──▶ Starting ──ok──▶ Ready ──stop()──▶ Stopping ──▶ Stopped
//!       ▲                       │                                              │
//!       └──────── failure ──────┘          start() again from Stopped ◀────────┘
//! ```
//!
//! Send and topic operations on [`KafkaBroker`] are only valid while `Ready`; calling them
//! in any other state is a programming error and panics. Callers that may race shutdown
//! take a [`ReadyBroker`] from [`KafkaBroker::try_ready`] and get
//! [`BrokerError::Unavailable`] instead.
//!
//! # Example
//!
//! ```rust,ignore
//! use messaging::{KafkaBroker, KafkaConfig};
//! use core_config::FromEnv;
//!
//! let broker = KafkaBroker::new(KafkaConfig::from_env()?);
//! broker.start().await?;
//!
//! broker.create_topic("events", 1, 1).await?;
//! broker.send_message("events", "Launch was created").await?;
//!
//! broker.stop().await;
//! ```

mod broker;
mod config;
mod error;
mod lifecycle;
mod payload;

pub use broker::{KafkaBroker, ReadyBroker};
pub use config::KafkaConfig;
pub use error::BrokerError;
pub use lifecycle::BrokerState;
pub use payload::Payload;
