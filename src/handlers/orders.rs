use std::collections::HashMap;

use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};
use serde::{Deserialize, Serialize};

use crate::entities::{journey, order, ticket};
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::services::booking::{self, TicketRequest};
use crate::services::queries::{CatalogLookup, JourneyDetail};
use crate::utils::jwt::Claims;
use crate::utils::pagination::{Page, PageParams};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub tickets: Vec<TicketRequest>,
}

#[derive(Debug, Serialize)]
pub struct TicketResponse {
    pub id: i32,
    pub cargo: i32,
    pub seat: i32,
    pub journey: i32,
}

#[derive(Debug, Serialize)]
pub struct TicketDetail {
    pub id: i32,
    pub cargo: i32,
    pub seat: i32,
    pub journey: JourneyDetail,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: i32,
    pub tickets: Vec<TicketResponse>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct OrderDetailResponse {
    pub id: i32,
    pub tickets: Vec<TicketDetail>,
    pub created_at: DateTime<Utc>,
}

/// Caller's orders, newest first
pub async fn list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppQuery(page): AppQuery<PageParams>,
) -> AppResult<Json<Page<OrderResponse>>> {
    let paginator = order::Entity::find()
        .filter(order::Column::UserId.eq(claims.sub))
        .order_by_desc(order::Column::CreatedAt)
        .order_by_desc(order::Column::Id)
        .paginate(&state.db, page.page_size());
    let count = paginator.num_items().await?;
    let orders = paginator.fetch_page(page.page_index()).await?;

    let order_ids: Vec<i32> = orders.iter().map(|o| o.id).collect();
    let mut tickets_by_order: HashMap<i32, Vec<TicketResponse>> = HashMap::new();
    for t in ticket::Entity::find()
        .filter(ticket::Column::OrderId.is_in(order_ids))
        .order_by_asc(ticket::Column::Id)
        .all(&state.db)
        .await?
    {
        tickets_by_order
            .entry(t.order_id)
            .or_default()
            .push(TicketResponse {
                id: t.id,
                cargo: t.cargo,
                seat: t.seat,
                journey: t.journey_id,
            });
    }

    let results = orders
        .into_iter()
        .map(|o| OrderResponse {
            id: o.id,
            tickets: tickets_by_order.remove(&o.id).unwrap_or_default(),
            created_at: o.created_at.with_timezone(&Utc),
        })
        .collect();

    Ok(Json(Page::new(results, count, page)))
}

/// Book tickets for the caller in a single order
pub async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(payload): AppJson<CreateOrderRequest>,
) -> AppResult<(StatusCode, Json<OrderDetailResponse>)> {
    let (created, tickets) = booking::create_order(&state.db, claims.sub, &payload.tickets)
        .await
        .inspect_err(|e| {
            tracing::warn!(user_id = %claims.sub, error = %e, "Order rejected");
        })?;

    let detail = order_detail(&state.db, created, tickets).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// One of the caller's orders; someone else's order is reported as missing
pub async fn retrieve(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppPath(id): AppPath<i32>,
) -> AppResult<Json<OrderDetailResponse>> {
    let found = order::Entity::find_by_id(id)
        .filter(order::Column::UserId.eq(claims.sub))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

    let tickets = ticket::Entity::find()
        .filter(ticket::Column::OrderId.eq(found.id))
        .order_by_asc(ticket::Column::Id)
        .all(&state.db)
        .await?;

    Ok(Json(order_detail(&state.db, found, tickets).await?))
}

async fn order_detail<C: ConnectionTrait>(
    db: &C,
    found: order::Model,
    tickets: Vec<ticket::Model>,
) -> AppResult<OrderDetailResponse> {
    let mut journey_ids: Vec<i32> = tickets.iter().map(|t| t.journey_id).collect();
    journey_ids.sort_unstable();
    journey_ids.dedup();

    let journeys = journey::Entity::find()
        .filter(journey::Column::Id.is_in(journey_ids))
        .all(db)
        .await?;
    let lookup = CatalogLookup::for_journeys(db, &journeys).await?;
    let details: HashMap<i32, JourneyDetail> = journeys
        .iter()
        .filter_map(|j| lookup.journey_detail(j).map(|d| (j.id, d)))
        .collect();

    let tickets = tickets
        .into_iter()
        .map(|t| {
            let journey = details.get(&t.journey_id).cloned().ok_or_else(|| {
                AppError::Internal(format!("Journey {} of ticket {} not found", t.journey_id, t.id))
            })?;
            Ok(TicketDetail {
                id: t.id,
                cargo: t.cargo,
                seat: t.seat,
                journey,
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    Ok(OrderDetailResponse {
        id: found.id,
        tickets,
        created_at: found.created_at.with_timezone(&Utc),
    })
}
