use sea_orm_migration::{prelude::*, schema::*};

use crate::m20250101_000001_create_events::Events;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Outbox: one row per broker message owed for a created event
        manager
            .create_table(
                Table::create()
                    .table(EventNotifications::Table)
                    .if_not_exists()
                    .col(pk_auto(EventNotifications::Id))
                    .col(integer(EventNotifications::EventId))
                    .col(string(EventNotifications::Topic))
                    .col(text(EventNotifications::Payload))
                    .col(string_len(EventNotifications::Status, 16).default("pending"))
                    .col(integer(EventNotifications::Attempts).default(0))
                    .col(text_null(EventNotifications::LastError))
                    .col(
                        timestamp_with_time_zone(EventNotifications::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(timestamp_with_time_zone_null(
                        EventNotifications::DeliveredAt,
                    ))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_event_notifications_event")
                            .from(EventNotifications::Table, EventNotifications::EventId)
                            .to(Events::Table, Events::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // The relay scans pending rows oldest first
        manager
            .create_index(
                Index::create()
                    .name("idx_event_notifications_status_created_at")
                    .table(EventNotifications::Table)
                    .col(EventNotifications::Status)
                    .col(EventNotifications::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EventNotifications::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum EventNotifications {
    Table,
    Id,
    EventId,
    Topic,
    Payload,
    Status,
    Attempts,
    LastError,
    CreatedAt,
    DeliveredAt,
}
