use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{
    auth, cities, crews, journeys, orders, routes, stations, train_types, trains,
};
use crate::middleware::auth::{auth_middleware, require_authenticated, require_catalog_access};
use crate::middleware::rate_limit::{create_global_governor, log_request};
use crate::middleware::user_rate_limit::create_booking_governor;
use crate::AppState;

const IMAGE_BODY_LIMIT: usize = 10 * 1024 * 1024;

pub fn create_router(state: AppState) -> Router {
    let booking_governor = create_booking_governor();

    // Public identity routes
    let user_public = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let user_private = Router::new()
        .route("/me", get(auth::me).patch(auth::update_me).put(auth::update_me))
        .layer(middleware::from_fn(require_authenticated))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Catalog: read for any authenticated user, write for staff
    let catalog_routes = Router::new()
        .route("/type-trains", get(train_types::list).post(train_types::create))
        .route(
            "/type-trains/{id}",
            get(train_types::retrieve)
                .put(train_types::update)
                .patch(train_types::update)
                .delete(train_types::delete),
        )
        .route("/trains", get(trains::list).post(trains::create))
        .route(
            "/trains/{id}",
            get(trains::retrieve)
                .put(trains::update)
                .patch(trains::update)
                .delete(trains::delete),
        )
        .route(
            "/trains/{id}/image",
            post(trains::upload_image).layer(DefaultBodyLimit::max(IMAGE_BODY_LIMIT)),
        )
        .route("/crews", get(crews::list).post(crews::create))
        .route(
            "/crews/{id}",
            get(crews::retrieve)
                .put(crews::update)
                .patch(crews::update)
                .delete(crews::delete),
        )
        .route("/cities", get(cities::list).post(cities::create))
        .route(
            "/cities/{id}",
            get(cities::retrieve)
                .put(cities::update)
                .patch(cities::update)
                .delete(cities::delete),
        )
        .route("/stations", get(stations::list).post(stations::create))
        .route(
            "/stations/{id}",
            get(stations::retrieve)
                .put(stations::update)
                .patch(stations::update)
                .delete(stations::delete),
        )
        .route("/routes", get(routes::list).post(routes::create))
        .route(
            "/routes/{id}",
            get(routes::retrieve)
                .put(routes::update)
                .patch(routes::update)
                .delete(routes::delete),
        )
        .route("/journeys", get(journeys::list).post(journeys::create))
        .route(
            "/journeys/{id}",
            get(journeys::retrieve)
                .put(journeys::update)
                .patch(journeys::update)
                .delete(journeys::delete),
        )
        .layer(middleware::from_fn(require_catalog_access))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Orders: scoped to the caller, rate limited per user
    let order_routes = Router::new()
        .route("/orders", get(orders::list).post(orders::create))
        .route("/orders/{id}", get(orders::retrieve))
        .layer(booking_governor)
        .layer(middleware::from_fn(require_authenticated))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/user", user_public.merge(user_private))
        .nest("/api", catalog_routes.merge(order_routes))
        .with_state(state)
}

/// Outer layers of the served app. The per-IP limiter and request logging read the
/// peer address, so the router must be served with `ConnectInfo<SocketAddr>`.
pub fn with_global_layers(router: Router) -> Router {
    router
        .layer(middleware::from_fn(log_request))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(create_global_governor())
}
