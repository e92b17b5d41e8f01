use sea_orm_migration::{prelude::*, schema::*};

use super::m20250301_000006_create_stations::Station;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Route::Table)
                    .if_not_exists()
                    .col(pk_auto(Route::Id))
                    .col(integer(Route::SourceId).not_null())
                    .col(integer(Route::DestinationId).not_null())
                    .col(integer(Route::Distance).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_route_source_station")
                            .from(Route::Table, Route::SourceId)
                            .to(Station::Table, Station::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_route_destination_station")
                            .from(Route::Table, Route::DestinationId)
                            .to(Station::Table, Station::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Route::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Route {
    Table,
    Id,
    SourceId,
    DestinationId,
    Distance,
}
