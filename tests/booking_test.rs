mod common;

use std::future::IntoFuture;

use axum::http::StatusCode;
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::{json, Value};

use common::setup;
use train_service_backend::entities::{order, ticket, user::UserRole};

#[tokio::test]
async fn customer_books_tickets() {
    let app = setup().await;
    let token = app.customer().await;
    let seeded = app.seed_journey().await;

    let response = app
        .server
        .post("/api/orders")
        .authorization_bearer(&token)
        .json(&json!({ "tickets": [
            { "cargo": 1, "seat": 1, "journey": seeded.journey_id },
            { "cargo": 1, "seat": 2, "journey": seeded.journey_id }
        ]}))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);

    let body: Value = response.json();
    let tickets = body["tickets"].as_array().unwrap();
    assert_eq!(tickets.len(), 2);
    assert_eq!(tickets[0]["journey"]["id"], seeded.journey_id);
    assert_eq!(tickets[0]["journey"]["route"]["source"], "Chernivtsi");
    assert_eq!(tickets[1]["journey"]["available_tickets"], 118);

    let response = app
        .server
        .get(&format!("/api/journeys/{}", seeded.journey_id))
        .authorization_bearer(&token)
        .await;
    assert_eq!(response.json::<Value>()["available_tickets"], 118);
}

#[tokio::test]
async fn cargo_out_of_range_is_rejected() {
    let app = setup().await;
    let token = app.customer().await;
    let seeded = app.seed_journey().await;

    let response = app
        .server
        .post("/api/orders")
        .authorization_bearer(&token)
        .json(&json!({ "tickets": [{ "cargo": 31, "seat": 1, "journey": seeded.journey_id }] }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(
        body["fields"]["tickets[0]"],
        json!(["Cargo num must be between 1 and 30."])
    );
}

#[tokio::test]
async fn seat_out_of_range_is_rejected() {
    let app = setup().await;
    let token = app.customer().await;
    let seeded = app.seed_journey().await;

    let response = app
        .server
        .post("/api/orders")
        .authorization_bearer(&token)
        .json(&json!({ "tickets": [{ "cargo": 1, "seat": 5, "journey": seeded.journey_id }] }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(
        body["fields"]["tickets[0]"],
        json!(["Seat number must be between 1 and 4."])
    );
}

#[tokio::test]
async fn empty_ticket_list_is_rejected() {
    let app = setup().await;
    let token = app.customer().await;

    let response = app
        .server
        .post("/api/orders")
        .authorization_bearer(&token)
        .json(&json!({ "tickets": [] }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["fields"]["tickets"],
        json!(["This list may not be empty."])
    );
}

#[tokio::test]
async fn unknown_journey_writes_nothing() {
    let app = setup().await;
    let token = app.customer().await;
    let seeded = app.seed_journey().await;

    let response = app
        .server
        .post("/api/orders")
        .authorization_bearer(&token)
        .json(&json!({ "tickets": [
            { "cargo": 1, "seat": 1, "journey": seeded.journey_id },
            { "cargo": 1, "seat": 1, "journey": 999 }
        ]}))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(order::Entity::find().count(&app.db).await.unwrap(), 0);
    assert_eq!(ticket::Entity::find().count(&app.db).await.unwrap(), 0);
}

#[tokio::test]
async fn taken_seat_conflicts_and_rolls_back_whole_order() {
    let app = setup().await;
    let (_, first) = app.user_token("first@test.com", UserRole::Customer).await;
    let (_, second) = app.user_token("second@test.com", UserRole::Customer).await;
    let seeded = app.seed_journey().await;

    app.server
        .post("/api/orders")
        .authorization_bearer(&first)
        .json(&json!({ "tickets": [{ "cargo": 2, "seat": 3, "journey": seeded.journey_id }] }))
        .await
        .assert_status(StatusCode::CREATED);

    // Free seat first, taken seat second: neither may persist
    let response = app
        .server
        .post("/api/orders")
        .authorization_bearer(&second)
        .json(&json!({ "tickets": [
            { "cargo": 5, "seat": 1, "journey": seeded.journey_id },
            { "cargo": 2, "seat": 3, "journey": seeded.journey_id }
        ]}))
        .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);

    assert_eq!(order::Entity::find().count(&app.db).await.unwrap(), 1);
    assert_eq!(ticket::Entity::find().count(&app.db).await.unwrap(), 1);
}

#[tokio::test]
async fn duplicate_seat_within_one_order_conflicts() {
    let app = setup().await;
    let token = app.customer().await;
    let seeded = app.seed_journey().await;

    let response = app
        .server
        .post("/api/orders")
        .authorization_bearer(&token)
        .json(&json!({ "tickets": [
            { "cargo": 1, "seat": 1, "journey": seeded.journey_id },
            { "cargo": 1, "seat": 1, "journey": seeded.journey_id }
        ]}))
        .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
    assert_eq!(order::Entity::find().count(&app.db).await.unwrap(), 0);
}

#[tokio::test]
async fn orders_are_scoped_to_their_owner() {
    let app = setup().await;
    let (_, owner) = app.user_token("owner@test.com", UserRole::Customer).await;
    let (_, other) = app.user_token("other@test.com", UserRole::Customer).await;
    let seeded = app.seed_journey().await;

    let response = app
        .server
        .post("/api/orders")
        .authorization_bearer(&owner)
        .json(&json!({ "tickets": [{ "cargo": 1, "seat": 1, "journey": seeded.journey_id }] }))
        .await;
    let order_id = response.json::<Value>()["id"].as_i64().unwrap();

    let response = app
        .server
        .get("/api/orders")
        .authorization_bearer(&owner)
        .await;
    let body: Value = response.json();
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["tickets"][0]["journey"], seeded.journey_id);

    let response = app
        .server
        .get(&format!("/api/orders/{order_id}"))
        .authorization_bearer(&owner)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = app
        .server
        .get("/api/orders")
        .authorization_bearer(&other)
        .await;
    assert_eq!(response.json::<Value>()["count"], 0);

    let foreign = app
        .server
        .get(&format!("/api/orders/{order_id}"))
        .authorization_bearer(&other)
        .await;
    let missing = app
        .server
        .get("/api/orders/9999")
        .authorization_bearer(&other)
        .await;
    assert_eq!(foreign.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(foreign.json::<Value>(), missing.json::<Value>());
}

#[tokio::test]
async fn deleting_journey_removes_its_tickets() {
    let app = setup().await;
    let staff = app.staff().await;
    let customer = app.customer().await;
    let seeded = app.seed_journey().await;

    app.server
        .post("/api/orders")
        .authorization_bearer(&customer)
        .json(&json!({ "tickets": [{ "cargo": 1, "seat": 1, "journey": seeded.journey_id }] }))
        .await
        .assert_status(StatusCode::CREATED);

    app.server
        .delete(&format!("/api/journeys/{}", seeded.journey_id))
        .authorization_bearer(&staff)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    assert_eq!(ticket::Entity::find().count(&app.db).await.unwrap(), 0);
}

#[tokio::test]
async fn missing_ticket_field_is_a_validation_error() {
    let app = setup().await;
    let token = app.customer().await;
    let seeded = app.seed_journey().await;

    let response = app
        .server
        .post("/api/orders")
        .authorization_bearer(&token)
        .json(&json!({ "tickets": [{ "cargo": 1, "journey": seeded.journey_id }] }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["error"], "Validation Error");
    assert_eq!(body["fields"]["tickets[0].seat"], json!(["This field is required."]));
    assert_eq!(order::Entity::find().count(&app.db).await.unwrap(), 0);
}

#[tokio::test]
async fn same_seat_on_another_journey_is_free() {
    let app = setup().await;
    let token = app.customer().await;
    let seeded = app.seed_journey().await;
    let other_journey = app.another_journey(&seeded).await;

    for journey in [seeded.journey_id, other_journey] {
        app.server
            .post("/api/orders")
            .authorization_bearer(&token)
            .json(&json!({ "tickets": [{ "cargo": 1, "seat": 1, "journey": journey }] }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    assert_eq!(ticket::Entity::find().count(&app.db).await.unwrap(), 2);
}

#[tokio::test]
async fn simultaneous_bookings_of_one_seat_have_one_winner() {
    let app = setup().await;
    let (_, first) = app.user_token("first@test.com", UserRole::Customer).await;
    let (_, second) = app.user_token("second@test.com", UserRole::Customer).await;
    let seeded = app.seed_journey().await;
    let body = json!({ "tickets": [{ "cargo": 3, "seat": 2, "journey": seeded.journey_id }] });

    let (a, b) = tokio::join!(
        app.server
            .post("/api/orders")
            .authorization_bearer(&first)
            .json(&body)
            .into_future(),
        app.server
            .post("/api/orders")
            .authorization_bearer(&second)
            .json(&body)
            .into_future(),
    );

    let mut statuses = vec![a.status_code(), b.status_code()];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::CREATED, StatusCode::CONFLICT]);
    assert_eq!(order::Entity::find().count(&app.db).await.unwrap(), 1);
    assert_eq!(ticket::Entity::find().count(&app.db).await.unwrap(), 1);
}
