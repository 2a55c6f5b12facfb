use chrono::NaiveDate;
use database::Filters;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;
use validator::Validate;

/// A stored event. `client_info` is the client the creator's token was issued to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Event {
    pub id: i32,
    pub name: String,
    #[schema(value_type = String, format = Date, example = "2025-01-01")]
    pub date: NaiveDate,
    pub client_info: Option<String>,
}

/// Body of `POST /events/create`. Ownership comes from the caller's token, never the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateEvent {
    #[validate(length(min = 1, max = 255))]
    #[schema(example = "Launch")]
    pub name: String,
    #[schema(value_type = String, format = Date, example = "2025-01-01")]
    pub date: NaiveDate,
}

/// Query string of `GET /events/search`: field name to substring.
///
/// Accepted fields are `name`, `date` and `client_info`; anything else is rejected.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct EventSearch {
    pub fields: HashMap<String, String>,
}

impl From<EventSearch> for Filters {
    fn from(search: EventSearch) -> Self {
        search.fields.into_iter().collect()
    }
}

/// Outbox row still owed to the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingNotification {
    pub id: i32,
    pub event_id: i32,
    pub topic: String,
    pub payload: String,
    pub attempts: i32,
}

/// Message published when `name` is created.
pub fn created_message(name: &str) -> String {
    format!("{} was created", name)
}
