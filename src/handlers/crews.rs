use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, QueryOrder, Set};
use serde::Deserialize;
use validator::Validate;

use crate::entities::crew;
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::utils::pagination::{Page, PageParams};
use crate::utils::validation::not_blank;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CrewRequest {
    #[validate(custom = "not_blank", length(max = 65, message = "Ensure this field has no more than 65 characters."))]
    pub first_name: String,
    #[validate(custom = "not_blank", length(max = 65, message = "Ensure this field has no more than 65 characters."))]
    pub last_name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCrewRequest {
    #[validate(custom = "not_blank", length(max = 65, message = "Ensure this field has no more than 65 characters."))]
    pub first_name: Option<String>,
    #[validate(custom = "not_blank", length(max = 65, message = "Ensure this field has no more than 65 characters."))]
    pub last_name: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    AppQuery(page): AppQuery<PageParams>,
) -> AppResult<Json<Page<crew::Model>>> {
    let paginator = crew::Entity::find()
        .order_by_asc(crew::Column::Id)
        .paginate(&state.db, page.page_size());
    let count = paginator.num_items().await?;
    let results = paginator.fetch_page(page.page_index()).await?;

    Ok(Json(Page::new(results, count, page)))
}

pub async fn retrieve(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> AppResult<Json<crew::Model>> {
    let found = crew::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Crew member not found".to_string()))?;

    Ok(Json(found))
}

pub async fn create(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CrewRequest>,
) -> AppResult<(StatusCode, Json<crew::Model>)> {
    payload.validate()?;

    let created = crew::ActiveModel {
        first_name: Set(payload.first_name),
        last_name: Set(payload.last_name),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<UpdateCrewRequest>,
) -> AppResult<Json<crew::Model>> {
    let found = crew::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Crew member not found".to_string()))?;

    payload.validate()?;

    let mut active: crew::ActiveModel = found.into();
    if let Some(first_name) = payload.first_name {
        active.first_name = Set(first_name);
    }
    if let Some(last_name) = payload.last_name {
        active.last_name = Set(last_name);
    }

    Ok(Json(active.update(&state.db).await?))
}

pub async fn delete(State(state): State<AppState>, AppPath(id): AppPath<i32>) -> AppResult<StatusCode> {
    let result = crew::Entity::delete_by_id(id).exec(&state.db).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Crew member not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
