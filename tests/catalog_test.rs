mod common;

use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use serde_json::{json, Value};

use common::setup;

#[tokio::test]
async fn stations_filter_by_city_case_insensitively() {
    let app = setup().await;
    let token = app.customer().await;
    app.station("Chernivtsi", "Chernivtsi-Pivnichna").await;
    app.station("Odessa", "Odessa-Holovna").await;

    let response = app
        .server
        .get("/api/stations")
        .add_query_param("city", "chernivtsi")
        .authorization_bearer(&token)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["city"], "Chernivtsi");
    assert_eq!(body["results"][0]["name"], "Chernivtsi-Pivnichna");
}

#[tokio::test]
async fn wildcards_in_filters_match_literally() {
    let app = setup().await;
    let token = app.customer().await;
    app.station("Chernivtsi", "Chernivtsi-Pivnichna").await;

    let response = app
        .server
        .get("/api/stations")
        .add_query_param("city", "%")
        .authorization_bearer(&token)
        .await;
    assert_eq!(response.json::<Value>()["count"], 0);
}

#[tokio::test]
async fn filter_values_are_not_trimmed() {
    let app = setup().await;
    let token = app.customer().await;
    app.station("Chernivtsi", "Chernivtsi-Pivnichna").await;

    let response = app
        .server
        .get("/api/stations")
        .add_query_param("city", " chernivtsi")
        .authorization_bearer(&token)
        .await;
    assert_eq!(response.json::<Value>()["count"], 0);

    let response = app
        .server
        .get("/api/stations")
        .add_query_param("city", "")
        .authorization_bearer(&token)
        .await;
    assert_eq!(response.json::<Value>()["count"], 1);
}

#[tokio::test]
async fn malformed_page_parameter_is_a_validation_error() {
    let app = setup().await;
    let token = app.customer().await;

    let response = app
        .server
        .get("/api/cities")
        .add_query_param("page", "first")
        .authorization_bearer(&token)
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["fields"]["page"].is_array());
}

#[tokio::test]
async fn journeys_filter_by_start_and_finish() {
    let app = setup().await;
    let token = app.customer().await;
    let seeded = app.seed_journey().await;

    let response = app
        .server
        .get("/api/journeys")
        .add_query_param("start", "cherniv")
        .add_query_param("finish", "ODES")
        .authorization_bearer(&token)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["count"], 1);
    let item = &body["results"][0];
    assert_eq!(item["id"], seeded.journey_id);
    assert_eq!(item["route"], "Chernivtsi - Odessa");
    assert_eq!(item["train"], "TrainTest");
    assert_eq!(item["crew"], json!(["Taras Shevchenko"]));

    // Filters are conjunctive and directional
    let response = app
        .server
        .get("/api/journeys")
        .add_query_param("start", "odessa")
        .add_query_param("finish", "chernivtsi")
        .authorization_bearer(&token)
        .await;
    assert_eq!(response.json::<Value>()["count"], 0);
}

#[tokio::test]
async fn journey_detail_shows_full_capacity_when_nothing_sold() {
    let app = setup().await;
    let token = app.customer().await;
    let seeded = app.seed_journey().await;

    let response = app
        .server
        .get(&format!("/api/journeys/{}", seeded.journey_id))
        .authorization_bearer(&token)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["available_tickets"], 120);
    assert_eq!(body["route"]["source"], "Chernivtsi");
    assert_eq!(body["route"]["destination"], "Odessa");
    assert_eq!(body["route"]["distance"], 450);
    assert_eq!(body["train"]["train_type"], "Intercity");
    assert_eq!(body["crew"][0]["full_name"], "Taras Shevchenko");
}

#[tokio::test]
async fn route_detail_expands_stations() {
    let app = setup().await;
    let token = app.customer().await;
    let seeded = app.seed_journey().await;

    let response = app
        .server
        .get("/api/routes")
        .authorization_bearer(&token)
        .await;
    let list: Value = response.json();
    assert_eq!(list["results"][0]["source"], "Chernivtsi");

    let response = app
        .server
        .get(&format!("/api/routes/{}", seeded.route_id))
        .authorization_bearer(&token)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["source"]["name"], "Chernivtsi-Pivnichna");
    assert_eq!(body["destination"]["city"], "Odessa");
}

#[tokio::test]
async fn staff_creates_journey_with_crew() {
    let app = setup().await;
    let token = app.staff().await;
    let seeded = app.seed_journey().await;

    let response = app
        .server
        .post("/api/journeys")
        .authorization_bearer(&token)
        .json(&json!({
            "route": seeded.route_id,
            "train": seeded.train_id,
            "departure_time": "2026-12-01T06:00:00Z",
            "arrival_time": "2026-12-01T16:00:00Z",
            "crew": [seeded.crew_id]
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let created: Value = response.json();
    assert_eq!(created["crew"], json!([seeded.crew_id]));

    let id = created["id"].as_i64().unwrap();
    let response = app
        .server
        .patch(&format!("/api/journeys/{id}"))
        .authorization_bearer(&token)
        .json(&json!({ "crew": [] }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["crew"], json!([]));

    let response = app
        .server
        .post("/api/journeys")
        .authorization_bearer(&token)
        .json(&json!({
            "route": 999,
            "train": seeded.train_id,
            "departure_time": "2026-12-01T06:00:00Z",
            "arrival_time": "2026-12-01T16:00:00Z"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["fields"]["route"].is_array());
}

#[tokio::test]
async fn pagination_reports_total_count() {
    let app = setup().await;
    let token = app.staff().await;

    for name in ["Kyiv", "Lviv", "Kharkiv"] {
        app.server
            .post("/api/cities")
            .authorization_bearer(&token)
            .json(&json!({ "name": name }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let response = app
        .server
        .get("/api/cities")
        .add_query_param("page", 2)
        .add_query_param("page_size", 2)
        .authorization_bearer(&token)
        .await;
    let body: Value = response.json();
    assert_eq!(body["count"], 3);
    assert_eq!(body["page"], 2);
    assert_eq!(body["results"].as_array().unwrap().len(), 1);
    assert_eq!(body["results"][0]["name"], "Kharkiv");
}

#[tokio::test]
async fn staff_uploads_train_image() {
    let app = setup().await;
    let token = app.staff().await;
    let seeded = app.seed_journey().await;

    let form = MultipartForm::new().add_part(
        "image",
        Part::bytes(vec![0x89, 0x50, 0x4e, 0x47])
            .file_name("photo.png")
            .mime_type("image/png"),
    );

    let response = app
        .server
        .post(&format!("/api/trains/{}/image", seeded.train_id))
        .authorization_bearer(&token)
        .multipart(form)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: Value = response.json();
    let image = body["image"].as_str().unwrap();
    assert!(image.starts_with("uploads/traintest-"));
    assert!(image.ends_with(".png"));
    assert!(app.media.path().join(image).exists());
}

#[tokio::test]
async fn non_image_upload_is_rejected() {
    let app = setup().await;
    let token = app.staff().await;
    let seeded = app.seed_journey().await;

    let form = MultipartForm::new()
        .add_part("image", Part::text("hello").file_name("notes.txt"));

    let response = app
        .server
        .post(&format!("/api/trains/{}/image", seeded.train_id))
        .authorization_bearer(&token)
        .multipart(form)
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}
