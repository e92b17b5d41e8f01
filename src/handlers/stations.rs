use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, Set};
use serde::Deserialize;
use validator::Validate;

use crate::entities::{city, station};
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::handlers::referenced;
use crate::services::queries::{stations_query, CatalogLookup, StationResponse};
use crate::utils::filter::non_empty;
use crate::utils::pagination::{Page, PageParams};
use crate::utils::validation::not_blank;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct StationFilter {
    /// Case-insensitive substring of the station's city name
    pub city: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateStationRequest {
    #[validate(custom = "not_blank", length(max = 65, message = "Ensure this field has no more than 65 characters."))]
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub city: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStationRequest {
    #[validate(custom = "not_blank", length(max = 65, message = "Ensure this field has no more than 65 characters."))]
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub city: Option<i32>,
}

/// List stations, optionally filtered by city name
pub async fn list(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<StationFilter>,
    AppQuery(page): AppQuery<PageParams>,
) -> AppResult<Json<Page<StationResponse>>> {
    let paginator = stations_query(non_empty(&filter.city)).paginate(&state.db, page.page_size());
    let count = paginator.num_items().await?;
    let stations = paginator.fetch_page(page.page_index()).await?;

    let lookup = CatalogLookup::for_stations(&state.db, &stations).await?;
    let results = stations.iter().map(|s| lookup.station(s)).collect();

    Ok(Json(Page::new(results, count, page)))
}

pub async fn retrieve(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> AppResult<Json<StationResponse>> {
    let found = find_station(&state, id).await?;
    let lookup = CatalogLookup::for_stations(&state.db, std::slice::from_ref(&found)).await?;

    Ok(Json(lookup.station(&found)))
}

pub async fn create(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateStationRequest>,
) -> AppResult<(StatusCode, Json<station::Model>)> {
    payload.validate()?;

    referenced::<city::Entity>(&state.db, payload.city, "city").await?;

    let created = station::ActiveModel {
        name: Set(payload.name),
        latitude: Set(payload.latitude),
        longitude: Set(payload.longitude),
        city_id: Set(payload.city),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<UpdateStationRequest>,
) -> AppResult<Json<station::Model>> {
    payload.validate()?;

    let found = find_station(&state, id).await?;
    let mut active: station::ActiveModel = found.into();

    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(city_id) = payload.city {
        referenced::<city::Entity>(&state.db, city_id, "city").await?;
        active.city_id = Set(city_id);
    }
    if let Some(latitude) = payload.latitude {
        active.latitude = Set(latitude);
    }
    if let Some(longitude) = payload.longitude {
        active.longitude = Set(longitude);
    }

    Ok(Json(active.update(&state.db).await?))
}

pub async fn delete(State(state): State<AppState>, AppPath(id): AppPath<i32>) -> AppResult<StatusCode> {
    let result = station::Entity::delete_by_id(id).exec(&state.db).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Station not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn find_station(state: &AppState, id: i32) -> AppResult<station::Model> {
    station::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Station not found".to_string()))
}
