use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, QueryOrder, Set};
use serde::Deserialize;

use crate::entities::{route, station};
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::handlers::referenced;
use crate::services::queries::{CatalogLookup, RouteDetailResponse, RouteResponse};
use crate::utils::pagination::{Page, PageParams};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateRouteRequest {
    pub source: i32,
    pub destination: i32,
    pub distance: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRouteRequest {
    pub source: Option<i32>,
    pub destination: Option<i32>,
    pub distance: Option<i32>,
}

/// List routes with both ends shown by city
pub async fn list(
    State(state): State<AppState>,
    AppQuery(page): AppQuery<PageParams>,
) -> AppResult<Json<Page<RouteResponse>>> {
    let paginator = route::Entity::find()
        .order_by_asc(route::Column::Id)
        .paginate(&state.db, page.page_size());
    let count = paginator.num_items().await?;
    let routes = paginator.fetch_page(page.page_index()).await?;

    let lookup = CatalogLookup::for_routes(&state.db, &routes).await?;
    let results = routes.iter().map(|r| lookup.route(r)).collect();

    Ok(Json(Page::new(results, count, page)))
}

/// Route detail with full source and destination stations
pub async fn retrieve(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> AppResult<Json<RouteDetailResponse>> {
    let found = find_route(&state, id).await?;
    let lookup = CatalogLookup::for_routes(&state.db, std::slice::from_ref(&found)).await?;

    let detail = lookup
        .route_detail(&found)
        .ok_or_else(|| AppError::Internal(format!("Route {} references a missing station", id)))?;

    Ok(Json(detail))
}

/// Create a route (staff). Source and destination may be the same station.
pub async fn create(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateRouteRequest>,
) -> AppResult<(StatusCode, Json<route::Model>)> {
    referenced::<station::Entity>(&state.db, payload.source, "source").await?;
    referenced::<station::Entity>(&state.db, payload.destination, "destination").await?;

    let created = route::ActiveModel {
        source_id: Set(payload.source),
        destination_id: Set(payload.destination),
        distance: Set(payload.distance),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<UpdateRouteRequest>,
) -> AppResult<Json<route::Model>> {
    let found = find_route(&state, id).await?;
    let mut active: route::ActiveModel = found.into();

    if let Some(source) = payload.source {
        referenced::<station::Entity>(&state.db, source, "source").await?;
        active.source_id = Set(source);
    }
    if let Some(destination) = payload.destination {
        referenced::<station::Entity>(&state.db, destination, "destination").await?;
        active.destination_id = Set(destination);
    }
    if let Some(distance) = payload.distance {
        active.distance = Set(distance);
    }

    Ok(Json(active.update(&state.db).await?))
}

pub async fn delete(State(state): State<AppState>, AppPath(id): AppPath<i32>) -> AppResult<StatusCode> {
    let result = route::Entity::delete_by_id(id).exec(&state.db).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Route not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn find_route(state: &AppState, id: i32) -> AppResult<route::Model> {
    route::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Route not found".to_string()))
}
