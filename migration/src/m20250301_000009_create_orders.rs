use sea_orm_migration::{prelude::*, schema::*};

use super::m20250301_000001_create_users::User;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Order::Table)
                    .if_not_exists()
                    .col(pk_auto(Order::Id))
                    .col(uuid(Order::UserId).not_null())
                    .col(timestamp_with_time_zone(Order::CreatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_user")
                            .from(Order::Table, Order::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Order::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Order {
    #[sea_orm(iden = "orders")]
    Table,
    Id,
    UserId,
    CreatedAt,
}
