//! SeaORM entities for the `events` and `event_notifications` tables.

pub mod event;
pub mod notification;
