pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod policy;
pub mod routes;
pub mod services;
pub mod utils;

use sea_orm::DatabaseConnection;

pub use config::Config;
pub use error::{AppError, AppResult};

use utils::media::MediaStore;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Config,
    pub media: MediaStore,
}
