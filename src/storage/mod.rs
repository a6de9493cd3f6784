//! SQLite storage for the relational model and its aggregates.
//!
//! The store is an explicit handle opened once per run and passed to every
//! component that reads or writes entities.

pub mod entity;
pub mod repository;
pub mod schema;
pub mod views;

pub use entity::{
    Circuit, Constructor, Driver, DriverCategory, DriverConstructor, DriverRating, Entity,
    LapTime, QualifyingResult, Race, RaceConstructorResult, RaceConstructorStandings,
    RaceDriverResult, RaceDriverStandings, Round, Status,
};
pub use repository::Store;
pub use schema::{create_tables, drop_tables};
pub use views::{AggregateView, Perspective, RoundResults, SeasonResults};
