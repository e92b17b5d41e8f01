use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::entities::{train, train_type};
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::handlers::referenced;
use crate::services::queries::{CatalogLookup, TrainResponse};
use crate::utils::pagination::{Page, PageParams};
use crate::utils::validation::not_blank;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTrainRequest {
    #[validate(custom = "not_blank", length(max = 65, message = "Ensure this field has no more than 65 characters."))]
    pub name: String,
    #[validate(range(min = 1, message = "Ensure this value is greater than or equal to 1."))]
    pub cargo_num: i32,
    #[validate(range(min = 1, message = "Ensure this value is greater than or equal to 1."))]
    pub places_in_cargo: i32,
    pub train_type: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTrainRequest {
    #[validate(custom = "not_blank", length(max = 65, message = "Ensure this field has no more than 65 characters."))]
    pub name: Option<String>,
    #[validate(range(min = 1, message = "Ensure this value is greater than or equal to 1."))]
    pub cargo_num: Option<i32>,
    #[validate(range(min = 1, message = "Ensure this value is greater than or equal to 1."))]
    pub places_in_cargo: Option<i32>,
    pub train_type: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct TrainImageResponse {
    pub id: i32,
    pub image: Option<String>,
}

/// List trains with their type names
pub async fn list(
    State(state): State<AppState>,
    AppQuery(page): AppQuery<PageParams>,
) -> AppResult<Json<Page<TrainResponse>>> {
    let paginator = train::Entity::find()
        .order_by_asc(train::Column::Id)
        .paginate(&state.db, page.page_size());
    let count = paginator.num_items().await?;
    let trains = paginator.fetch_page(page.page_index()).await?;

    let lookup = CatalogLookup::for_trains(&state.db, &trains).await?;
    let results = trains.iter().map(|t| lookup.train(t)).collect();

    Ok(Json(Page::new(results, count, page)))
}

pub async fn retrieve(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> AppResult<Json<TrainResponse>> {
    let found = find_train(&state, id).await?;
    let lookup = CatalogLookup::for_trains(&state.db, std::slice::from_ref(&found)).await?;

    Ok(Json(lookup.train(&found)))
}

/// Create a train (staff)
pub async fn create(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateTrainRequest>,
) -> AppResult<(StatusCode, Json<train::Model>)> {
    payload.validate()?;

    referenced::<train_type::Entity>(&state.db, payload.train_type, "train_type").await?;

    let created = train::ActiveModel {
        name: Set(payload.name),
        cargo_num: Set(payload.cargo_num),
        places_in_cargo: Set(payload.places_in_cargo),
        train_type_id: Set(payload.train_type),
        image: Set(None),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    tracing::info!(train_id = created.id, capacity = created.capacity(), "Train created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update a train (staff)
pub async fn update(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<UpdateTrainRequest>,
) -> AppResult<Json<train::Model>> {
    let found = find_train(&state, id).await?;

    payload.validate()?;

    let mut active: train::ActiveModel = found.into();

    if let Some(type_id) = payload.train_type {
        referenced::<train_type::Entity>(&state.db, type_id, "train_type").await?;
        active.train_type_id = Set(type_id);
    }
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(cargo_num) = payload.cargo_num {
        active.cargo_num = Set(cargo_num);
    }
    if let Some(places) = payload.places_in_cargo {
        active.places_in_cargo = Set(places);
    }

    Ok(Json(active.update(&state.db).await?))
}

/// Delete a train; its journeys and their tickets go with it (staff)
pub async fn delete(State(state): State<AppState>, AppPath(id): AppPath<i32>) -> AppResult<StatusCode> {
    let result = train::Entity::delete_by_id(id).exec(&state.db).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Train not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Attach an uploaded image to a train (staff)
pub async fn upload_image(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    mut multipart: Multipart,
) -> AppResult<Json<TrainImageResponse>> {
    let found = find_train(&state, id).await?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("image") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;
        upload = Some((file_name, bytes));
        break;
    }

    let (file_name, bytes) =
        upload.ok_or_else(|| AppError::field("image", "No file was submitted."))?;
    if bytes.is_empty() {
        return Err(AppError::field("image", "The submitted file is empty."));
    }

    let path = state.media.save_image(&found.name, &file_name, &bytes).await?;

    let mut active: train::ActiveModel = found.into();
    active.image = Set(Some(path));
    let updated = active.update(&state.db).await?;

    tracing::info!(train_id = updated.id, image = ?updated.image, "Train image uploaded");
    Ok(Json(TrainImageResponse {
        id: updated.id,
        image: updated.image,
    }))
}

async fn find_train(state: &AppState, id: i32) -> AppResult<train::Model> {
    train::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Train not found".to_string()))
}
