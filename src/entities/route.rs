use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "route")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub source_id: i32,
    pub destination_id: i32,
    pub distance: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::station::Entity",
        from = "Column::SourceId",
        to = "super::station::Column::Id"
    )]
    Source,
    #[sea_orm(
        belongs_to = "super::station::Entity",
        from = "Column::DestinationId",
        to = "super::station::Column::Id"
    )]
    Destination,
    #[sea_orm(has_many = "super::journey::Entity")]
    Journeys,
}

impl Related<super::journey::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Journeys.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
