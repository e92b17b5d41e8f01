use std::collections::HashMap;

use sea_orm::{sea_query::Expr, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect};

use crate::entities::ticket;
use crate::error::AppResult;

/// Seats left once `sold` tickets are taken from `capacity`.
pub fn remaining(capacity: i64, sold: i64) -> i64 {
    capacity - sold
}

/// Sold ticket counts for a batch of journeys. Journeys without tickets are absent.
pub async fn sold_tickets_by_journey<C: ConnectionTrait>(
    db: &C,
    journey_ids: &[i32],
) -> AppResult<HashMap<i32, i64>> {
    if journey_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(i32, i64)> = ticket::Entity::find()
        .select_only()
        .column(ticket::Column::JourneyId)
        .column_as(Expr::col(ticket::Column::Id).count(), "sold")
        .filter(ticket::Column::JourneyId.is_in(journey_ids.iter().copied()))
        .group_by(ticket::Column::JourneyId)
        .into_tuple()
        .all(db)
        .await?;

    Ok(rows.into_iter().collect())
}
