use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::models::PendingNotification;

/// Delivery state of an outbox row.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[strum(serialize_all = "lowercase")]
pub enum NotificationStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "delivered")]
    Delivered,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "event_notifications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub event_id: i32,
    pub topic: String,
    #[sea_orm(column_type = "Text")]
    pub payload: String,
    pub status: NotificationStatus,
    pub attempts: i32,
    #[sea_orm(column_type = "Text", nullable)]
    pub last_error: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub delivered_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::event::Entity",
        from = "Column::EventId",
        to = "super::event::Column::Id",
        on_delete = "Cascade"
    )]
    Event,
}

impl Related<super::event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Event.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub fn pending(event_id: i32, topic: &str, payload: &str) -> Self {
        Self {
            id: NotSet,
            event_id: Set(event_id),
            topic: Set(topic.to_string()),
            payload: Set(payload.to_string()),
            status: Set(NotificationStatus::Pending),
            attempts: Set(0),
            last_error: Set(None),
            created_at: Set(chrono::Utc::now().into()),
            delivered_at: Set(None),
        }
    }
}

impl From<Model> for PendingNotification {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            event_id: model.event_id,
            topic: model.topic,
            payload: model.payload,
            attempts: model.attempts,
        }
    }
}
