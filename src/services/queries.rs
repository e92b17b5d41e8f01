//! Read side of the catalog.
//!
//! Display strings and nested views are assembled from explicit batch lookups
//! (`CatalogLookup`) instead of walking relations one row at a time.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::{Expr, Query, SelectStatement},
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Select,
};
use serde::Serialize;

use crate::entities::{city, crew, journey, journey_crew, route, station, train, train_type};
use crate::error::AppResult;
use crate::services::availability::{remaining, sold_tickets_by_journey};
use crate::utils::filter::icontains;

// ============ Read models ============

#[derive(Debug, Clone, Serialize)]
pub struct TrainResponse {
    pub id: i32,
    pub name: String,
    pub cargo_num: i32,
    pub places_in_cargo: i32,
    pub train_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StationResponse {
    pub id: i32,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub city: String,
}

/// Route with both ends shown as city names
#[derive(Debug, Clone, Serialize)]
pub struct RouteResponse {
    pub id: i32,
    pub source: String,
    pub destination: String,
    pub distance: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RouteDetailResponse {
    pub id: i32,
    pub source: StationResponse,
    pub destination: StationResponse,
    pub distance: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CrewInfo {
    pub id: i32,
    pub full_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct JourneyListItem {
    pub id: i32,
    pub route: String,
    pub train: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub crew: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JourneyDetail {
    pub id: i32,
    pub route: RouteResponse,
    pub train: TrainResponse,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub crew: Vec<CrewInfo>,
    pub available_tickets: i64,
}

// ============ Filters ============

/// Stations, optionally restricted to cities whose name contains `city_name`.
pub fn stations_query(city_name: Option<&str>) -> Select<station::Entity> {
    let mut query = station::Entity::find().order_by_asc(station::Column::Id);

    if let Some(needle) = city_name {
        query = query
            .inner_join(city::Entity)
            .filter(icontains((city::Entity, city::Column::Name), needle));
    }

    query
}

/// Journeys whose route starts in a city matching `start` and ends in one matching `finish`.
pub fn journeys_query(start: Option<&str>, finish: Option<&str>) -> Select<journey::Entity> {
    let mut query = journey::Entity::find().order_by_asc(journey::Column::Id);

    if let Some(start) = start {
        query = query.filter(
            journey::Column::RouteId.in_subquery(routes_by_city(route::Column::SourceId, start)),
        );
    }
    if let Some(finish) = finish {
        query = query.filter(
            journey::Column::RouteId
                .in_subquery(routes_by_city(route::Column::DestinationId, finish)),
        );
    }

    query
}

/// `SELECT route.id` for routes whose `end` station lies in a city matching `needle`.
fn routes_by_city(end: route::Column, needle: &str) -> SelectStatement {
    Query::select()
        .column((route::Entity, route::Column::Id))
        .from(route::Entity)
        .inner_join(
            station::Entity,
            Expr::col((station::Entity, station::Column::Id))
                .equals((route::Entity, end)),
        )
        .inner_join(
            city::Entity,
            Expr::col((city::Entity, city::Column::Id))
                .equals((station::Entity, station::Column::CityId)),
        )
        .and_where(icontains((city::Entity, city::Column::Name), needle))
        .to_owned()
}

// ============ Lookups ============

/// Batch-loaded related rows needed to render stations, routes and journeys.
#[derive(Debug, Default)]
pub struct CatalogLookup {
    cities: HashMap<i32, city::Model>,
    stations: HashMap<i32, station::Model>,
    routes: HashMap<i32, route::Model>,
    trains: HashMap<i32, train::Model>,
    train_types: HashMap<i32, train_type::Model>,
    crews: HashMap<i32, crew::Model>,
    journey_crew: HashMap<i32, Vec<i32>>,
    sold: HashMap<i32, i64>,
}

impl CatalogLookup {
    pub async fn for_stations<C: ConnectionTrait>(
        db: &C,
        stations: &[station::Model],
    ) -> AppResult<Self> {
        let mut lookup = Self::default();
        lookup.load_cities(db, stations).await?;
        Ok(lookup)
    }

    pub async fn for_trains<C: ConnectionTrait>(db: &C, trains: &[train::Model]) -> AppResult<Self> {
        let mut lookup = Self::default();
        lookup.load_train_types(db, trains).await?;
        Ok(lookup)
    }

    pub async fn for_routes<C: ConnectionTrait>(db: &C, routes: &[route::Model]) -> AppResult<Self> {
        let mut lookup = Self::default();
        lookup.load_stations(db, routes).await?;
        Ok(lookup)
    }

    pub async fn for_journeys<C: ConnectionTrait>(
        db: &C,
        journeys: &[journey::Model],
    ) -> AppResult<Self> {
        let mut lookup = Self::default();
        if journeys.is_empty() {
            return Ok(lookup);
        }

        let journey_ids: Vec<i32> = journeys.iter().map(|j| j.id).collect();
        let route_ids = distinct(journeys.iter().map(|j| j.route_id));
        let train_ids = distinct(journeys.iter().map(|j| j.train_id));

        let routes = route::Entity::find()
            .filter(route::Column::Id.is_in(route_ids))
            .all(db)
            .await?;
        lookup.load_stations(db, &routes).await?;
        lookup.routes = routes.into_iter().map(|r| (r.id, r)).collect();

        let trains = train::Entity::find()
            .filter(train::Column::Id.is_in(train_ids))
            .all(db)
            .await?;
        lookup.load_train_types(db, &trains).await?;
        lookup.trains = trains.into_iter().map(|t| (t.id, t)).collect();

        let assignments = journey_crew::Entity::find()
            .filter(journey_crew::Column::JourneyId.is_in(journey_ids.clone()))
            .all(db)
            .await?;
        let crew_ids = distinct(assignments.iter().map(|a| a.crew_id));
        if !crew_ids.is_empty() {
            lookup.crews = crew::Entity::find()
                .filter(crew::Column::Id.is_in(crew_ids))
                .all(db)
                .await?
                .into_iter()
                .map(|c| (c.id, c))
                .collect();
        }
        for a in assignments {
            lookup.journey_crew.entry(a.journey_id).or_default().push(a.crew_id);
        }
        for crew_ids in lookup.journey_crew.values_mut() {
            crew_ids.sort_unstable();
        }

        lookup.sold = sold_tickets_by_journey(db, &journey_ids).await?;

        Ok(lookup)
    }

    async fn load_cities<C: ConnectionTrait>(
        &mut self,
        db: &C,
        stations: &[station::Model],
    ) -> AppResult<()> {
        let city_ids = distinct(stations.iter().map(|s| s.city_id));
        if city_ids.is_empty() {
            return Ok(());
        }

        self.cities = city::Entity::find()
            .filter(city::Column::Id.is_in(city_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();
        Ok(())
    }

    async fn load_stations<C: ConnectionTrait>(
        &mut self,
        db: &C,
        routes: &[route::Model],
    ) -> AppResult<()> {
        let station_ids = distinct(
            routes
                .iter()
                .flat_map(|r| [r.source_id, r.destination_id]),
        );
        if station_ids.is_empty() {
            return Ok(());
        }

        let stations = station::Entity::find()
            .filter(station::Column::Id.is_in(station_ids))
            .all(db)
            .await?;
        self.load_cities(db, &stations).await?;
        self.stations = stations.into_iter().map(|s| (s.id, s)).collect();
        Ok(())
    }

    async fn load_train_types<C: ConnectionTrait>(
        &mut self,
        db: &C,
        trains: &[train::Model],
    ) -> AppResult<()> {
        let type_ids = distinct(trains.iter().map(|t| t.train_type_id));
        if type_ids.is_empty() {
            return Ok(());
        }

        self.train_types = train_type::Entity::find()
            .filter(train_type::Column::Id.is_in(type_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|t| (t.id, t))
            .collect();
        Ok(())
    }

    fn city_name(&self, city_id: i32) -> String {
        self.cities
            .get(&city_id)
            .map(|c| c.name.clone())
            .unwrap_or_default()
    }

    fn station_city_name(&self, station_id: i32) -> String {
        self.stations
            .get(&station_id)
            .map(|s| self.city_name(s.city_id))
            .unwrap_or_default()
    }

    pub fn station(&self, s: &station::Model) -> StationResponse {
        StationResponse {
            id: s.id,
            name: s.name.clone(),
            latitude: s.latitude,
            longitude: s.longitude,
            city: self.city_name(s.city_id),
        }
    }

    pub fn train(&self, t: &train::Model) -> TrainResponse {
        TrainResponse {
            id: t.id,
            name: t.name.clone(),
            cargo_num: t.cargo_num,
            places_in_cargo: t.places_in_cargo,
            train_type: self
                .train_types
                .get(&t.train_type_id)
                .map(|tt| tt.name.clone())
                .unwrap_or_default(),
        }
    }

    pub fn route(&self, r: &route::Model) -> RouteResponse {
        RouteResponse {
            id: r.id,
            source: self.station_city_name(r.source_id),
            destination: self.station_city_name(r.destination_id),
            distance: r.distance,
        }
    }

    /// `None` when either end station is missing from the lookup.
    pub fn route_detail(&self, r: &route::Model) -> Option<RouteDetailResponse> {
        let source = self.stations.get(&r.source_id)?;
        let destination = self.stations.get(&r.destination_id)?;

        Some(RouteDetailResponse {
            id: r.id,
            source: self.station(source),
            destination: self.station(destination),
            distance: r.distance,
        })
    }

    /// "Source City - Destination City"
    fn route_label(&self, route_id: i32) -> String {
        self.routes
            .get(&route_id)
            .map(|r| {
                format!(
                    "{} - {}",
                    self.station_city_name(r.source_id),
                    self.station_city_name(r.destination_id)
                )
            })
            .unwrap_or_default()
    }

    fn crew_of(&self, journey_id: i32) -> impl Iterator<Item = &crew::Model> {
        self.journey_crew
            .get(&journey_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.crews.get(id))
    }

    pub fn journey_item(&self, j: &journey::Model) -> JourneyListItem {
        JourneyListItem {
            id: j.id,
            route: self.route_label(j.route_id),
            train: self
                .trains
                .get(&j.train_id)
                .map(|t| t.name.clone())
                .unwrap_or_default(),
            departure_time: j.departure_time.with_timezone(&Utc),
            arrival_time: j.arrival_time.with_timezone(&Utc),
            crew: self.crew_of(j.id).map(crew::Model::full_name).collect(),
        }
    }

    /// `None` when the journey's route or train is missing from the lookup.
    pub fn journey_detail(&self, j: &journey::Model) -> Option<JourneyDetail> {
        let route = self.routes.get(&j.route_id)?;
        let train = self.trains.get(&j.train_id)?;
        let sold = self.sold.get(&j.id).copied().unwrap_or(0);

        Some(JourneyDetail {
            id: j.id,
            route: self.route(route),
            train: self.train(train),
            departure_time: j.departure_time.with_timezone(&Utc),
            arrival_time: j.arrival_time.with_timezone(&Utc),
            crew: self
                .crew_of(j.id)
                .map(|c| CrewInfo {
                    id: c.id,
                    full_name: c.full_name(),
                })
                .collect(),
            available_tickets: remaining(train.capacity(), sold),
        })
    }
}

fn distinct(ids: impl Iterator<Item = i32>) -> Vec<i32> {
    let mut ids: Vec<i32> = ids.collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, QueryTrait};

    #[test]
    fn distinct_sorts_and_dedups() {
        assert_eq!(distinct([3, 1, 3, 2, 1].into_iter()), vec![1, 2, 3]);
    }

    #[test]
    fn station_filter_joins_city_case_insensitively() {
        let sql = stations_query(Some("Cher"))
            .build(DbBackend::Postgres)
            .to_string();

        assert!(sql.contains(r#"INNER JOIN "city""#));
        assert!(sql.contains(r#"LOWER("city"."name") LIKE '%cher%'"#));
    }

    #[test]
    fn unfiltered_station_query_has_no_join() {
        let sql = stations_query(None).build(DbBackend::Postgres).to_string();
        assert!(!sql.contains("JOIN"));
    }

    #[test]
    fn journey_filters_combine_conjunctively() {
        let sql = journeys_query(Some("Cher"), Some("Odes"))
            .build(DbBackend::Postgres)
            .to_string();

        assert!(sql.contains(r#""route"."source_id""#));
        assert!(sql.contains(r#""route"."destination_id""#));
        assert!(sql.contains("'%cher%'"));
        assert!(sql.contains("'%odes%'"));
        assert!(sql.contains(" AND "));
    }

    fn lookup_with_route() -> (CatalogLookup, journey::Model) {
        let mut lookup = CatalogLookup::default();
        lookup.cities.insert(1, city::Model { id: 1, name: "Chernivtsi".into() });
        lookup.cities.insert(2, city::Model { id: 2, name: "Odesa".into() });
        for (id, city_id) in [(10, 1), (20, 2)] {
            lookup.stations.insert(
                id,
                station::Model {
                    id,
                    name: format!("Station {id}"),
                    latitude: 0.0,
                    longitude: 0.0,
                    city_id,
                },
            );
        }
        lookup.routes.insert(
            5,
            route::Model {
                id: 5,
                source_id: 10,
                destination_id: 20,
                distance: 450,
            },
        );
        lookup.train_types.insert(1, train_type::Model { id: 1, name: "Intercity".into() });
        lookup.trains.insert(
            7,
            train::Model {
                id: 7,
                name: "Tarpan".into(),
                cargo_num: 30,
                places_in_cargo: 4,
                train_type_id: 1,
                image: None,
            },
        );
        lookup.crews.insert(
            3,
            crew::Model {
                id: 3,
                first_name: "Jaims".into(),
                last_name: "Williams".into(),
            },
        );
        lookup.journey_crew.insert(9, vec![3]);
        lookup.sold.insert(9, 2);

        let departure = chrono::DateTime::parse_from_rfc3339("2025-03-20T10:00:00+00:00").unwrap();
        let arrival = chrono::DateTime::parse_from_rfc3339("2025-03-20T13:30:00+00:00").unwrap();
        let journey = journey::Model {
            id: 9,
            route_id: 5,
            train_id: 7,
            departure_time: departure,
            arrival_time: arrival,
        };
        (lookup, journey)
    }

    #[test]
    fn journey_item_condenses_route_to_city_names() {
        let (lookup, journey) = lookup_with_route();
        let item = lookup.journey_item(&journey);

        assert_eq!(item.route, "Chernivtsi - Odesa");
        assert_eq!(item.train, "Tarpan");
        assert_eq!(item.crew, vec!["Jaims Williams".to_string()]);
    }

    #[test]
    fn journey_detail_reports_available_tickets() {
        let (lookup, journey) = lookup_with_route();
        let detail = lookup.journey_detail(&journey).unwrap();

        assert_eq!(detail.available_tickets, 30 * 4 - 2);
        assert_eq!(detail.route.source, "Chernivtsi");
        assert_eq!(detail.route.destination, "Odesa");
        assert_eq!(detail.train.train_type, "Intercity");
        assert_eq!(detail.crew[0].full_name, "Jaims Williams");
    }

    #[test]
    fn route_detail_expands_stations() {
        let (lookup, _) = lookup_with_route();
        let route = lookup.routes[&5].clone();
        let detail = lookup.route_detail(&route).unwrap();

        assert_eq!(detail.source.name, "Station 10");
        assert_eq!(detail.source.city, "Chernivtsi");
        assert_eq!(detail.destination.city, "Odesa");
    }
}
