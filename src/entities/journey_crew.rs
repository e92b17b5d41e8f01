use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "journey_crew")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub journey_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub crew_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::journey::Entity",
        from = "Column::JourneyId",
        to = "super::journey::Column::Id",
        on_delete = "Cascade"
    )]
    Journey,
    #[sea_orm(
        belongs_to = "super::crew::Entity",
        from = "Column::CrewId",
        to = "super::crew::Column::Id",
        on_delete = "Cascade"
    )]
    Crew,
}

impl ActiveModelBehavior for ActiveModel {}
