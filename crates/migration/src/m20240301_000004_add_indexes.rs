use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Schedule: owner lookups and the default listing order
        manager
            .create_index(
                Index::create()
                    .name("idx_schedule_owner")
                    .table(Schedule::Table)
                    .col(Schedule::OwnerId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_schedule_starts_at")
                    .table(Schedule::Table)
                    .col(Schedule::StartsAt)
                    .to_owned(),
            )
            .await?;

        // User: admin listing sorts by creation time
        manager
            .create_index(
                Index::create()
                    .name("idx_user_created_at")
                    .table(User::Table)
                    .col(User::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_schedule_owner").table(Schedule::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_schedule_starts_at").table(Schedule::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_user_created_at").table(User::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum User { Table, CreatedAt }

#[derive(DeriveIden)]
enum Schedule { Table, OwnerId, StartsAt }
