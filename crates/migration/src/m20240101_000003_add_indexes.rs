//! Secondary indexes for the session lookups that are not by primary key:
//! bulk invalidation per user and the purge scan by `last_used`.
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_sessions_username")
                    .table(Sessions::Table)
                    .col(Sessions::Username)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_sessions_last_used")
                    .table(Sessions::Table)
                    .col(Sessions::LastUsed)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_sessions_last_used").table(Sessions::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_sessions_username").table(Sessions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Sessions { Table, Username, LastUsed }
