use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};

use crate::entities::{crew, journey, journey_crew, route, train};
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::handlers::referenced;
use crate::services::queries::{journeys_query, CatalogLookup, JourneyDetail, JourneyListItem};
use crate::utils::filter::non_empty;
use crate::utils::pagination::{Page, PageParams};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct JourneyFilter {
    /// Case-insensitive substring of the departure city
    pub start: Option<String>,
    /// Case-insensitive substring of the arrival city
    pub finish: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateJourneyRequest {
    pub route: i32,
    pub train: i32,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    #[serde(default)]
    pub crew: Vec<i32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateJourneyRequest {
    pub route: Option<i32>,
    pub train: Option<i32>,
    pub departure_time: Option<DateTime<Utc>>,
    pub arrival_time: Option<DateTime<Utc>>,
    pub crew: Option<Vec<i32>>,
}

/// Journey as written: references by id
#[derive(Debug, Serialize)]
pub struct JourneyRecord {
    pub id: i32,
    pub route: i32,
    pub train: i32,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub crew: Vec<i32>,
}

impl JourneyRecord {
    fn new(j: journey::Model, mut crew: Vec<i32>) -> Self {
        crew.sort_unstable();
        crew.dedup();
        Self {
            id: j.id,
            route: j.route_id,
            train: j.train_id,
            departure_time: j.departure_time.with_timezone(&Utc),
            arrival_time: j.arrival_time.with_timezone(&Utc),
            crew,
        }
    }
}

/// List journeys, filtered by departure/arrival city
pub async fn list(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<JourneyFilter>,
    AppQuery(page): AppQuery<PageParams>,
) -> AppResult<Json<Page<JourneyListItem>>> {
    let query = journeys_query(non_empty(&filter.start), non_empty(&filter.finish));
    let paginator = query.paginate(&state.db, page.page_size());
    let count = paginator.num_items().await?;
    let journeys = paginator.fetch_page(page.page_index()).await?;

    let lookup = CatalogLookup::for_journeys(&state.db, &journeys).await?;
    let results = journeys.iter().map(|j| lookup.journey_item(j)).collect();

    Ok(Json(Page::new(results, count, page)))
}

/// Journey detail with remaining ticket count
pub async fn retrieve(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> AppResult<Json<JourneyDetail>> {
    let found = journey::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Journey not found".to_string()))?;

    let lookup = CatalogLookup::for_journeys(&state.db, std::slice::from_ref(&found)).await?;
    let detail = lookup
        .journey_detail(&found)
        .ok_or_else(|| AppError::Internal(format!("Journey {} is missing its route or train", id)))?;

    Ok(Json(detail))
}

/// Create a journey with its crew (staff)
pub async fn create(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateJourneyRequest>,
) -> AppResult<(StatusCode, Json<JourneyRecord>)> {
    referenced::<route::Entity>(&state.db, payload.route, "route").await?;
    referenced::<train::Entity>(&state.db, payload.train, "train").await?;
    check_crew(&state, &payload.crew).await?;

    let txn = state.db.begin().await?;

    let created = journey::ActiveModel {
        route_id: Set(payload.route),
        train_id: Set(payload.train),
        departure_time: Set(payload.departure_time.into()),
        arrival_time: Set(payload.arrival_time.into()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    assign_crew(&txn, created.id, &payload.crew).await?;

    txn.commit().await?;

    tracing::info!(journey_id = created.id, "Journey created");
    Ok((StatusCode::CREATED, Json(JourneyRecord::new(created, payload.crew))))
}

/// Update a journey; a provided crew list replaces the current one (staff)
pub async fn update(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<UpdateJourneyRequest>,
) -> AppResult<Json<JourneyRecord>> {
    let found = journey::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Journey not found".to_string()))?;

    if let Some(route_id) = payload.route {
        referenced::<route::Entity>(&state.db, route_id, "route").await?;
    }
    if let Some(train_id) = payload.train {
        referenced::<train::Entity>(&state.db, train_id, "train").await?;
    }
    if let Some(crew) = &payload.crew {
        check_crew(&state, crew).await?;
    }

    let mut active: journey::ActiveModel = found.into();
    if let Some(route_id) = payload.route {
        active.route_id = Set(route_id);
    }
    if let Some(train_id) = payload.train {
        active.train_id = Set(train_id);
    }
    if let Some(time) = payload.departure_time {
        active.departure_time = Set(time.into());
    }
    if let Some(time) = payload.arrival_time {
        active.arrival_time = Set(time.into());
    }

    let txn = state.db.begin().await?;

    let updated = active.update(&txn).await?;
    if let Some(crew) = &payload.crew {
        journey_crew::Entity::delete_many()
            .filter(journey_crew::Column::JourneyId.eq(id))
            .exec(&txn)
            .await?;
        assign_crew(&txn, id, crew).await?;
    }
    let crew_ids = journey_crew::Entity::find()
        .filter(journey_crew::Column::JourneyId.eq(id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|a| a.crew_id)
        .collect();

    txn.commit().await?;

    Ok(Json(JourneyRecord::new(updated, crew_ids)))
}

/// Delete a journey and every ticket sold for it (staff)
pub async fn delete(State(state): State<AppState>, AppPath(id): AppPath<i32>) -> AppResult<StatusCode> {
    let result = journey::Entity::delete_by_id(id).exec(&state.db).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Journey not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn check_crew(state: &AppState, crew_ids: &[i32]) -> AppResult<()> {
    for &crew_id in crew_ids {
        referenced::<crew::Entity>(&state.db, crew_id, "crew").await?;
    }
    Ok(())
}

async fn assign_crew<C: ConnectionTrait>(db: &C, journey_id: i32, crew_ids: &[i32]) -> AppResult<()> {
    let mut crew_ids = crew_ids.to_vec();
    crew_ids.sort_unstable();
    crew_ids.dedup();
    if crew_ids.is_empty() {
        return Ok(());
    }

    let rows = crew_ids.into_iter().map(|crew_id| journey_crew::ActiveModel {
        journey_id: Set(journey_id),
        crew_id: Set(crew_id),
    });
    journey_crew::Entity::insert_many(rows).exec(db).await?;

    Ok(())
}
