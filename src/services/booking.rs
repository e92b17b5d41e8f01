//! Order creation.
//!
//! Every ticket is validated against its journey's train before anything is
//! written. The order and all of its tickets are then written in one
//! transaction; a seat that is already sold is rejected by the
//! `(journey_id, cargo, seat)` unique index, which rolls the whole order back.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::ValidationError;

use crate::entities::{journey, order, ticket, train};
use crate::error::{AppError, AppResult, FieldErrors};
use crate::utils::validation::{describe, invalid};

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TicketRequest {
    pub cargo: i32,
    pub seat: i32,
    pub journey: i32,
}

/// Bound violations for one ticket against the train serving its journey.
pub fn ticket_bound_errors(cargo: i32, seat: i32, train: &train::Model) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if !(1..=train.cargo_num).contains(&cargo) {
        errors.push(out_of_range(
            "cargo",
            cargo,
            train.cargo_num,
            format!("Cargo num must be between 1 and {}.", train.cargo_num),
        ));
    }
    if !(1..=train.places_in_cargo).contains(&seat) {
        errors.push(out_of_range(
            "seat",
            seat,
            train.places_in_cargo,
            format!("Seat number must be between 1 and {}.", train.places_in_cargo),
        ));
    }

    errors
}

fn out_of_range(code: &'static str, value: i32, max: i32, message: String) -> ValidationError {
    let mut error = invalid(code, message);
    error.add_param("value".into(), &value);
    error.add_param("min".into(), &1);
    error.add_param("max".into(), &max);
    error
}

/// Create an order owned by `user_id` holding one ticket per request.
///
/// Either the order and every ticket are committed, or nothing is.
pub async fn create_order(
    db: &DatabaseConnection,
    user_id: Uuid,
    requests: &[TicketRequest],
) -> AppResult<(order::Model, Vec<ticket::Model>)> {
    if requests.is_empty() {
        return Err(AppError::field("tickets", "This list may not be empty."));
    }

    let trains = trains_for_journeys(db, requests).await?;
    validate_tickets(requests, &trains)?;

    // Dropping the transaction without commit rolls it back
    let txn = db.begin().await?;

    let order = order::ActiveModel {
        user_id: Set(user_id),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut tickets = Vec::with_capacity(requests.len());
    for (index, request) in requests.iter().enumerate() {
        let inserted = ticket::ActiveModel {
            cargo: Set(request.cargo),
            seat: Set(request.seat),
            journey_id: Set(request.journey),
            order_id: Set(order.id),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| seat_taken(e, index, request))?;

        tickets.push(inserted);
    }

    txn.commit().await?;

    tracing::info!(
        order_id = order.id,
        user_id = %user_id,
        tickets = tickets.len(),
        "Order created"
    );

    Ok((order, tickets))
}

/// Resolve each requested journey to the train serving it.
async fn trains_for_journeys(
    db: &DatabaseConnection,
    requests: &[TicketRequest],
) -> AppResult<HashMap<i32, train::Model>> {
    let mut journey_ids: Vec<i32> = requests.iter().map(|r| r.journey).collect();
    journey_ids.sort_unstable();
    journey_ids.dedup();

    let rows = journey::Entity::find()
        .filter(journey::Column::Id.is_in(journey_ids))
        .find_also_related(train::Entity)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(journey, train)| train.map(|t| (journey.id, t)))
        .collect())
}

fn validate_tickets(
    requests: &[TicketRequest],
    trains: &HashMap<i32, train::Model>,
) -> AppResult<()> {
    let mut fields = FieldErrors::new();

    for (index, request) in requests.iter().enumerate() {
        let errors = match trains.get(&request.journey) {
            None => vec![invalid(
                "does_not_exist",
                format!(
                    "Invalid pk \"{}\" - journey does not exist.",
                    request.journey
                ),
            )],
            Some(train) => ticket_bound_errors(request.cargo, request.seat, train),
        };
        if !errors.is_empty() {
            fields.insert(
                format!("tickets[{}]", index),
                errors.iter().map(describe).collect(),
            );
        }
    }

    if fields.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(fields))
    }
}

fn seat_taken(err: sea_orm::DbErr, index: usize, request: &TicketRequest) -> AppError {
    match AppError::from(err) {
        AppError::Conflict(_) => {
            tracing::warn!(
                journey_id = request.journey,
                cargo = request.cargo,
                seat = request.seat,
                "Seat already sold"
            );
            AppError::Conflict(format!(
                "tickets[{}]: cargo {} seat {} is already booked for journey {}",
                index, request.cargo, request.seat, request.journey
            ))
        }
        other => other,
    }
}
