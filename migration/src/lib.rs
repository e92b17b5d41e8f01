pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_users;
mod m20250301_000002_create_train_types;
mod m20250301_000003_create_trains;
mod m20250301_000004_create_crews;
mod m20250301_000005_create_cities;
mod m20250301_000006_create_stations;
mod m20250301_000007_create_routes;
mod m20250301_000008_create_journeys;
mod m20250301_000009_create_orders;
mod m20250301_000010_create_tickets;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_users::Migration),
            Box::new(m20250301_000002_create_train_types::Migration),
            Box::new(m20250301_000003_create_trains::Migration),
            Box::new(m20250301_000004_create_crews::Migration),
            Box::new(m20250301_000005_create_cities::Migration),
            Box::new(m20250301_000006_create_stations::Migration),
            Box::new(m20250301_000007_create_routes::Migration),
            Box::new(m20250301_000008_create_journeys::Migration),
            Box::new(m20250301_000009_create_orders::Migration),
            Box::new(m20250301_000010_create_tickets::Migration),
        ]
    }
}
