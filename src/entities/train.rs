use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "train")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub cargo_num: i32,
    pub places_in_cargo: i32,
    pub train_type_id: i32,
    pub image: Option<String>,
}

impl Model {
    /// Total number of seats on the train.
    pub fn capacity(&self) -> i64 {
        i64::from(self.cargo_num) * i64::from(self.places_in_cargo)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::train_type::Entity",
        from = "Column::TrainTypeId",
        to = "super::train_type::Column::Id"
    )]
    TrainType,
    #[sea_orm(has_many = "super::journey::Entity")]
    Journeys,
}

impl Related<super::train_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TrainType.def()
    }
}

impl Related<super::journey::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Journeys.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
