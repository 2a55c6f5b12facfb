use async_trait::async_trait;
use database::{BaseRepository, Filters};
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait,
};

use crate::entity::notification::NotificationStatus;
use crate::entity::{event, notification};
use crate::error::{EventError, EventResult};
use crate::models::{CreateEvent, Event, PendingNotification};
use crate::repository::{EventRepository, OutboxMessage};

#[derive(Clone)]
pub struct PgEventRepository {
    base: BaseRepository<event::Entity>,
}

impl PgEventRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    fn owned_by(client_id: &str) -> Condition {
        Condition::all().add(event::Column::ClientInfo.eq(client_id))
    }
}

#[async_trait]
impl EventRepository for PgEventRepository {
    async fn exists_by_name(&self, name: &str) -> EventResult<bool> {
        let found = event::Entity::find()
            .filter(event::Column::Name.eq(name))
            .one(self.base.db())
            .await?;
        Ok(found.is_some())
    }

    async fn create(
        &self,
        input: CreateEvent,
        client_id: &str,
        message: OutboxMessage,
    ) -> EventResult<(Event, i32)> {
        let name = input.name.clone();
        let txn = self.base.db().begin().await?;

        let model = match event::ActiveModel::for_client(input, client_id)
            .insert(&txn)
            .await
        {
            Ok(model) => model,
            Err(err) if database::postgres::is_unique_violation(&err) => {
                return Err(EventError::Duplicate(name));
            }
            Err(err) => return Err(err.into()),
        };

        let outbox = notification::ActiveModel::pending(model.id, &message.topic, &message.payload)
            .insert(&txn)
            .await?;

        txn.commit().await?;

        tracing::info!(event_id = model.id, notification_id = outbox.id, "Created event");
        Ok((model.into(), outbox.id))
    }

    async fn get_for_client(&self, id: i32, client_id: &str) -> EventResult<Option<Event>> {
        let model = event::Entity::find_by_id(id)
            .filter(Self::owned_by(client_id))
            .one(self.base.db())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn list_for_client(&self, client_id: &str) -> EventResult<Vec<Event>> {
        let models = event::Entity::find()
            .filter(Self::owned_by(client_id))
            .order_by_asc(event::Column::Id)
            .all(self.base.db())
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn search(&self, filters: Filters, client_id: &str) -> EventResult<Vec<Event>> {
        let models = self
            .base
            .find_by_filters_within(&filters, Self::owned_by(client_id))
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn pending_notifications(&self, limit: u64) -> EventResult<Vec<PendingNotification>> {
        let models = notification::Entity::find()
            .filter(notification::Column::Status.eq(NotificationStatus::Pending))
            .order_by_asc(notification::Column::CreatedAt)
            .order_by_asc(notification::Column::Id)
            .limit(limit)
            .all(self.base.db())
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn mark_delivered(&self, notification_id: i32) -> EventResult<()> {
        notification::ActiveModel {
            id: Set(notification_id),
            status: Set(NotificationStatus::Delivered),
            delivered_at: Set(Some(chrono::Utc::now().into())),
            ..Default::default()
        }
        .update(self.base.db())
        .await?;
        Ok(())
    }

    async fn record_failure(&self, notification_id: i32, error: &str) -> EventResult<()> {
        notification::Entity::update_many()
            .col_expr(notification::Column::Attempts, Expr::cust(r#""attempts" + 1"#))
            .col_expr(notification::Column::LastError, Expr::value(error))
            .filter(notification::Column::Id.eq(notification_id))
            .exec(self.base.db())
            .await?;
        Ok(())
    }
}
