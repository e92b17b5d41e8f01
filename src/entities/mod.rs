pub mod city;
pub mod crew;
pub mod journey;
pub mod journey_crew;
pub mod order;
pub mod route;
pub mod station;
pub mod ticket;
pub mod train;
pub mod train_type;
pub mod user;
