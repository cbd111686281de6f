//! Create `users` table.
//!
//! `pass` holds either a password hash or, for accounts created before
//! hashing existed, the plaintext that is rewritten on next login.
//! `balance` is in minor units (cents).
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(string_len(Users::Name, 64).primary_key())
                    .col(string_len(Users::Pass, 255).not_null())
                    .col(big_integer(Users::Balance).not_null().default(0))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Users::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Users { Table, Name, Pass, Balance }
