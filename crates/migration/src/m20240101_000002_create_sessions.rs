//! Create `sessions` table with FK to `users`.
//!
//! Rows are never updated except for `valid` and `last_used`; idle rows
//! stay until the purge task removes them.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Sessions::Table)
                    .if_not_exists()
                    .col(string_len(Sessions::Id, 64).primary_key())
                    .col(string_len(Sessions::Username, 64).not_null())
                    .col(boolean(Sessions::Valid).not_null())
                    .col(string_len(Sessions::Ip, 64).not_null())
                    .col(ColumnDef::new(Sessions::UserAgent).text().null())
                    .col(timestamp_with_time_zone(Sessions::LastUsed).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sessions_user")
                            .from(Sessions::Table, Sessions::Username)
                            .to(Users::Table, Users::Name)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Sessions::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Sessions { Table, Id, Username, Valid, Ip, UserAgent, LastUsed }

#[derive(DeriveIden)]
enum Users { Table, Name }
