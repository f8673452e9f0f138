//! Create `schedule` table with FK to `user`.
//!
//! Deleting a user removes the schedules it owns.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Schedule::Table)
                    .if_not_exists()
                    .col(uuid(Schedule::Id).primary_key())
                    .col(uuid(Schedule::OwnerId).not_null())
                    .col(string_len(Schedule::Title, 200).not_null())
                    .col(ColumnDef::new(Schedule::Description).text().null())
                    .col(timestamp_with_time_zone(Schedule::StartsAt).not_null())
                    .col(timestamp_with_time_zone(Schedule::EndsAt).not_null())
                    .col(string_len(Schedule::Status, 32).not_null().default("planned"))
                    .col(timestamp_with_time_zone(Schedule::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Schedule::UpdatedAt).not_null())
                    .check(Expr::col(Schedule::EndsAt).gte(Expr::col(Schedule::StartsAt)))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_schedule_owner")
                            .from(Schedule::Table, Schedule::OwnerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Schedule::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Schedule {
    Table,
    Id,
    OwnerId,
    Title,
    Description,
    StartsAt,
    EndsAt,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum User { Table, Id }
