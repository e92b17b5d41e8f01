use sea_orm_migration::{prelude::*, schema::*};

use super::m20250301_000002_create_train_types::TrainType;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Train::Table)
                    .if_not_exists()
                    .col(pk_auto(Train::Id))
                    .col(string_len(Train::Name, 65).not_null())
                    .col(integer(Train::CargoNum).not_null())
                    .col(integer(Train::PlacesInCargo).not_null())
                    .col(integer(Train::TrainTypeId).not_null())
                    .col(string_len_null(Train::Image, 255))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_train_train_type")
                            .from(Train::Table, Train::TrainTypeId)
                            .to(TrainType::Table, TrainType::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Train::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Train {
    Table,
    Id,
    Name,
    CargoNum,
    PlacesInCargo,
    TrainTypeId,
    Image,
}
