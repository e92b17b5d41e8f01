use std::net::SocketAddr;

use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use sea_orm_migration::MigratorTrait;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use train_service_backend::{
    config::Config,
    db,
    entities::user::{self, UserRole},
    handlers::auth::hash_password,
    routes,
    utils::media::MediaStore,
    AppState,
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "train_service_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    tracing::info!("Starting server at {}", config.server_addr());

    let db = db::connect(&config)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Connected to database");

    migration::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    tracing::info!("Migrations complete");

    seed_staff(&db, &config).await;

    tokio::fs::create_dir_all(&config.media_root)
        .await
        .expect("Failed to create media root");

    let state = AppState {
        db,
        media: MediaStore::new(config.media_root.clone()),
        config: config.clone(),
    };

    let app = routes::with_global_layers(routes::create_router(state));

    let addr: SocketAddr = config.server_addr().parse().expect("Invalid address");
    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Failed to start server");
}

/// Create the configured staff account if it doesn't exist
async fn seed_staff(db: &DatabaseConnection, config: &Config) {
    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(&config.admin_email))
        .one(db)
        .await
        .expect("Failed to check for staff account");

    if existing.is_some() {
        return;
    }

    let password_hash =
        hash_password(&config.admin_password).expect("Failed to hash staff password");

    user::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(config.admin_email.clone()),
        password_hash: Set(password_hash),
        name: Set("Admin".to_string()),
        role: Set(UserRole::Staff),
        created_at: Set(chrono::Utc::now().into()),
    }
    .insert(db)
    .await
    .expect("Failed to create staff account");

    tracing::info!("Staff account created: {}", config.admin_email);
}
