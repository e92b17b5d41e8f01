use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Crew::Table)
                    .if_not_exists()
                    .col(pk_auto(Crew::Id))
                    .col(string_len(Crew::FirstName, 65).not_null())
                    .col(string_len(Crew::LastName, 65).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Crew::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Crew {
    Table,
    Id,
    FirstName,
    LastName,
}
