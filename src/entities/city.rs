use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "city")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::station::Entity")]
    Stations,
}

impl Related<super::station::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Stations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
