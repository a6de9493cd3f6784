//! Entity transformation: typed source rows to store records.
//!
//! One function per entity type, each taking the extracted rows plus the
//! lookup tables it depends on and returning a lazy, single-pass iterator of
//! records. Lookups are built by the caller before the iterator is pulled, so
//! emitting records never touches the store.

pub mod labels;
pub mod reference;
pub mod results;
pub mod standings;

pub use labels::{driver_categories, driver_ratings};
pub use reference::{
    circuits, constructors, driver_constructors, drivers, races, rounds, statuses, EntryKey,
};
pub use results::{lap_times, qualifying_results, race_constructor_results, race_driver_results};
pub use standings::{constructor_standings, driver_standings};
