use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, QueryOrder, Set};
use serde::Deserialize;
use validator::Validate;

use crate::entities::train_type;
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::utils::pagination::{Page, PageParams};
use crate::utils::validation::not_blank;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct TrainTypeRequest {
    #[validate(custom = "not_blank", length(max = 65, message = "Ensure this field has no more than 65 characters."))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTrainTypeRequest {
    #[validate(custom = "not_blank", length(max = 65, message = "Ensure this field has no more than 65 characters."))]
    pub name: Option<String>,
}

/// List train types
pub async fn list(
    State(state): State<AppState>,
    AppQuery(page): AppQuery<PageParams>,
) -> AppResult<Json<Page<train_type::Model>>> {
    let paginator = train_type::Entity::find()
        .order_by_asc(train_type::Column::Id)
        .paginate(&state.db, page.page_size());
    let count = paginator.num_items().await?;
    let results = paginator.fetch_page(page.page_index()).await?;

    Ok(Json(Page::new(results, count, page)))
}

pub async fn retrieve(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> AppResult<Json<train_type::Model>> {
    let found = train_type::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Train type not found".to_string()))?;

    Ok(Json(found))
}

/// Create a train type (staff)
pub async fn create(
    State(state): State<AppState>,
    AppJson(payload): AppJson<TrainTypeRequest>,
) -> AppResult<(StatusCode, Json<train_type::Model>)> {
    payload.validate()?;

    let created = train_type::ActiveModel {
        name: Set(payload.name),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// Update a train type (staff)
pub async fn update(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<UpdateTrainTypeRequest>,
) -> AppResult<Json<train_type::Model>> {
    payload.validate()?;

    let found = train_type::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Train type not found".to_string()))?;

    let mut active: train_type::ActiveModel = found.into();

    if let Some(name) = payload.name {
        active.name = Set(name);
    }

    let result = active.update(&state.db).await?;
    Ok(Json(result))
}

/// Delete a train type and, by cascade, its trains (staff)
pub async fn delete(State(state): State<AppState>, AppPath(id): AppPath<i32>) -> AppResult<StatusCode> {
    let result = train_type::Entity::delete_by_id(id).exec(&state.db).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Train type not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
