use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "train_type")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::train::Entity")]
    Trains,
}

impl Related<super::train::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Trains.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
