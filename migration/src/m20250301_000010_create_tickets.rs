use sea_orm_migration::{prelude::*, schema::*};

use super::m20250301_000008_create_journeys::Journey;
use super::m20250301_000009_create_orders::Order;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Ticket::Table)
                    .if_not_exists()
                    .col(pk_auto(Ticket::Id))
                    .col(integer(Ticket::Cargo).not_null())
                    .col(integer(Ticket::Seat).not_null())
                    .col(integer(Ticket::JourneyId).not_null())
                    .col(integer(Ticket::OrderId).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ticket_journey")
                            .from(Ticket::Table, Ticket::JourneyId)
                            .to(Journey::Table, Journey::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ticket_order")
                            .from(Ticket::Table, Ticket::OrderId)
                            .to(Order::Table, Order::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // A seat can be sold once per journey
        manager
            .create_index(
                Index::create()
                    .name("unique_journey_cargo_seat")
                    .table(Ticket::Table)
                    .col(Ticket::JourneyId)
                    .col(Ticket::Cargo)
                    .col(Ticket::Seat)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Ticket::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Ticket {
    Table,
    Id,
    Cargo,
    Seat,
    JourneyId,
    OrderId,
}
