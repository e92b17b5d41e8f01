#![allow(dead_code)]

use axum_test::TestServer;
use chrono::{TimeZone, Utc};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;
use tempfile::{NamedTempFile, TempDir};
use uuid::Uuid;

use train_service_backend::{
    config::Config,
    entities::{city, crew, journey, journey_crew, route, station, train, train_type, user},
    entities::user::UserRole,
    routes::create_router,
    utils::{jwt::create_token, media::MediaStore},
    AppState,
};

pub const JWT_SECRET: &str = "test-secret";

/// Router over a fresh SQLite file with migrations applied
pub struct TestApp {
    pub server: TestServer,
    pub db: DatabaseConnection,
    pub media: TempDir,
    state: AppState,
    _db_file: NamedTempFile,
}

pub async fn setup() -> TestApp {
    let db_file = NamedTempFile::new().unwrap();
    let db_url = format!("sqlite://{}?mode=rwc", db_file.path().display());

    let db = Database::connect(&db_url).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();

    let media = TempDir::new().unwrap();
    let config = Config {
        database_url: db_url,
        jwt_secret: JWT_SECRET.to_string(),
        jwt_expiration_hours: 1,
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        media_root: media.path().to_path_buf(),
        admin_email: "admin@trainservice.com".to_string(),
        admin_password: "admin123".to_string(),
    };

    let state = AppState {
        db: db.clone(),
        media: MediaStore::new(media.path()),
        config,
    };
    let server = TestServer::new(create_router(state.clone())).unwrap();

    TestApp {
        server,
        db,
        media,
        state,
        _db_file: db_file,
    }
}

impl TestApp {
    /// State shared with `server`, for building routers with other layers
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Insert a user directly and return a bearer token for it
    pub async fn user_token(&self, email: &str, role: UserRole) -> (Uuid, String) {
        let created = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email.to_string()),
            password_hash: Set("unused".to_string()),
            name: Set("Test".to_string()),
            role: Set(role),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await
        .unwrap();

        let token = create_token(created.id, &created.email, role, JWT_SECRET, 1).unwrap();
        (created.id, token)
    }

    pub async fn staff(&self) -> String {
        self.user_token("staff@test.com", UserRole::Staff).await.1
    }

    pub async fn customer(&self) -> String {
        self.user_token("customer@test.com", UserRole::Customer).await.1
    }

    /// Chernivtsi -> Odessa on a 30 cargo x 4 seat train, one crew member
    pub async fn seed_journey(&self) -> Seeded {
        let train_type = train_type::ActiveModel {
            name: Set("Intercity".to_string()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .unwrap();

        let train = train::ActiveModel {
            name: Set("TrainTest".to_string()),
            cargo_num: Set(30),
            places_in_cargo: Set(4),
            train_type_id: Set(train_type.id),
            image: Set(None),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .unwrap();

        let source = self.station("Chernivtsi", "Chernivtsi-Pivnichna").await;
        let destination = self.station("Odessa", "Odessa-Holovna").await;

        let route = route::ActiveModel {
            source_id: Set(source.id),
            destination_id: Set(destination.id),
            distance: Set(450),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .unwrap();

        let journey = journey::ActiveModel {
            route_id: Set(route.id),
            train_id: Set(train.id),
            departure_time: Set(Utc.with_ymd_and_hms(2026, 11, 1, 8, 0, 0).unwrap().into()),
            arrival_time: Set(Utc.with_ymd_and_hms(2026, 11, 1, 18, 30, 0).unwrap().into()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .unwrap();

        let driver = crew::ActiveModel {
            first_name: Set("Taras".to_string()),
            last_name: Set("Shevchenko".to_string()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .unwrap();

        journey_crew::ActiveModel {
            journey_id: Set(journey.id),
            crew_id: Set(driver.id),
        }
        .insert(&self.db)
        .await
        .unwrap();

        Seeded {
            train_type_id: train_type.id,
            train_id: train.id,
            route_id: route.id,
            journey_id: journey.id,
            crew_id: driver.id,
        }
    }

    /// A second departure of the seeded route and train
    pub async fn another_journey(&self, seeded: &Seeded) -> i32 {
        journey::ActiveModel {
            route_id: Set(seeded.route_id),
            train_id: Set(seeded.train_id),
            departure_time: Set(Utc.with_ymd_and_hms(2026, 11, 2, 8, 0, 0).unwrap().into()),
            arrival_time: Set(Utc.with_ymd_and_hms(2026, 11, 2, 18, 30, 0).unwrap().into()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .unwrap()
        .id
    }

    pub async fn station(&self, city_name: &str, station_name: &str) -> station::Model {
        let city = city::ActiveModel {
            name: Set(city_name.to_string()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .unwrap();

        station::ActiveModel {
            name: Set(station_name.to_string()),
            latitude: Set(48.29),
            longitude: Set(25.93),
            city_id: Set(city.id),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .unwrap()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Seeded {
    pub train_type_id: i32,
    pub train_id: i32,
    pub route_id: i32,
    pub journey_id: i32,
    pub crew_id: i32,
}
