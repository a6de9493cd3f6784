//! Formula 1 history ETL and driver rating model.
//!
//! CSV exports are extracted into typed rows, transformed into relational
//! entities, loaded into SQLite and aggregated per driver-season. The
//! aggregates feed one feature row per driver-season for the rating model.

pub mod cli;
pub mod config;
pub mod convert;
pub mod error;
pub mod extract;
pub mod features;
pub mod identity;
pub mod model;
pub mod pipeline;
pub mod storage;
pub mod transform;

pub use error::{EtlError, Result};
pub use extract::DataSources;
pub use features::{assemble, DriverRatingFeatures, FEATURE_NAMES};
pub use model::{fit, Criterion, FitConfig, ModelKind, RatingModel};
pub use pipeline::{build_training_set, rebuild_views, reload_all};
pub use storage::Store;
