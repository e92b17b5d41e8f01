pub mod auth;
pub mod cities;
pub mod crews;
pub mod journeys;
pub mod orders;
pub mod routes;
pub mod stations;
pub mod train_types;
pub mod trains;

use sea_orm::{DatabaseConnection, EntityTrait, PrimaryKeyTrait};

use crate::error::{AppError, AppResult};

/// Load a row referenced by a request body, reporting a missing one against `field`.
pub async fn referenced<E>(db: &DatabaseConnection, id: i32, field: &str) -> AppResult<E::Model>
where
    E: EntityTrait,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<i32>,
{
    E::find_by_id(id).one(db).await?.ok_or_else(|| {
        AppError::field(
            field,
            format!("Invalid pk \"{}\" - object does not exist.", id),
        )
    })
}
