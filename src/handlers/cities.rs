use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, QueryOrder, Set};
use serde::Deserialize;
use validator::Validate;

use crate::entities::city;
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::utils::pagination::{Page, PageParams};
use crate::utils::validation::not_blank;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CityRequest {
    #[validate(custom = "not_blank", length(max = 155, message = "Ensure this field has no more than 155 characters."))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCityRequest {
    #[validate(custom = "not_blank", length(max = 155, message = "Ensure this field has no more than 155 characters."))]
    pub name: Option<String>,
}

/// List all cities
pub async fn list(
    State(state): State<AppState>,
    AppQuery(page): AppQuery<PageParams>,
) -> AppResult<Json<Page<city::Model>>> {
    let paginator = city::Entity::find()
        .order_by_asc(city::Column::Id)
        .paginate(&state.db, page.page_size());
    let count = paginator.num_items().await?;
    let results = paginator.fetch_page(page.page_index()).await?;

    Ok(Json(Page::new(results, count, page)))
}

pub async fn retrieve(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> AppResult<Json<city::Model>> {
    let found = city::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("City not found".to_string()))?;

    Ok(Json(found))
}

pub async fn create(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CityRequest>,
) -> AppResult<(StatusCode, Json<city::Model>)> {
    payload.validate()?;

    let created = city::ActiveModel {
        name: Set(payload.name),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<UpdateCityRequest>,
) -> AppResult<Json<city::Model>> {
    payload.validate()?;

    let found = city::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("City not found".to_string()))?;

    let mut active: city::ActiveModel = found.into();

    if let Some(name) = payload.name {
        active.name = Set(name);
    }

    Ok(Json(active.update(&state.db).await?))
}

/// Delete a city along with its stations
pub async fn delete(State(state): State<AppState>, AppPath(id): AppPath<i32>) -> AppResult<StatusCode> {
    let result = city::Entity::delete_by_id(id).exec(&state.db).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("City not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
