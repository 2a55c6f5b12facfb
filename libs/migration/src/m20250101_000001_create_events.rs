use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Events::Table)
                    .if_not_exists()
                    .col(pk_auto(Events::Id))
                    .col(string_len(Events::Name, 255))
                    .col(date(Events::Date))
                    .col(string_null(Events::ClientInfo))
                    .to_owned(),
            )
            .await?;

        // Concurrent creates with the same name race past the service-level check
        manager
            .create_index(
                Index::create()
                    .name("idx_events_name_unique")
                    .table(Events::Table)
                    .col(Events::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_events_client_info")
                    .table(Events::Table)
                    .col(Events::ClientInfo)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Events::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum Events {
    Table,
    Id,
    Name,
    Date,
    ClientInfo,
}
