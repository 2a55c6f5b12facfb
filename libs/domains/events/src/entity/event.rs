use database::FilterableEntity;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::entity::prelude::*;

use crate::models::{CreateEvent, Event};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub date: Date,
    pub client_info: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::notification::Entity")]
    Notification,
}

impl Related<super::notification::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notification.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl FilterableEntity for Entity {
    fn filterable_column(field: &str) -> Option<Column> {
        match field {
            "name" => Some(Column::Name),
            "date" => Some(Column::Date),
            "client_info" => Some(Column::ClientInfo),
            _ => None,
        }
    }
}

impl From<Model> for Event {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            date: model.date,
            client_info: model.client_info,
        }
    }
}

impl ActiveModel {
    /// New row owned by `client_id`; the id is assigned by the database.
    pub fn for_client(input: CreateEvent, client_id: &str) -> Self {
        Self {
            id: NotSet,
            name: Set(input.name),
            date: Set(input.date),
            client_info: Set(Some(client_id.to_string())),
        }
    }
}
