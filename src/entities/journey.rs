use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "journey")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub route_id: i32,
    pub train_id: i32,
    pub departure_time: DateTimeWithTimeZone,
    pub arrival_time: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::route::Entity",
        from = "Column::RouteId",
        to = "super::route::Column::Id"
    )]
    Route,
    #[sea_orm(
        belongs_to = "super::train::Entity",
        from = "Column::TrainId",
        to = "super::train::Column::Id"
    )]
    Train,
    #[sea_orm(has_many = "super::ticket::Entity")]
    Tickets,
}

impl Related<super::route::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Route.def()
    }
}

impl Related<super::train::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Train.def()
    }
}

impl Related<super::ticket::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tickets.def()
    }
}

impl Related<super::crew::Entity> for Entity {
    fn to() -> RelationDef {
        super::journey_crew::Relation::Crew.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::journey_crew::Relation::Journey.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
