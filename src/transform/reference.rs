//! Reference data, calendar and driver-constructor identities.

use std::collections::HashSet;

use crate::error::Result;
use crate::extract::{
    CircuitRow, ConstructorRow, DriverRow, QualifyingRow, RaceRow, ResultRow, StatusRow,
};
use crate::identity::{RaceLookup, RoundLookup};
use crate::storage::{Circuit, Constructor, Driver, DriverConstructor, Race, Round, Status};

pub fn drivers(rows: Vec<DriverRow>) -> impl Iterator<Item = Result<Driver>> {
    rows.into_iter().map(|row| {
        Ok(Driver {
            id: row.driver_id,
            name: row.forename,
            surname: row.surname,
        })
    })
}

pub fn constructors(rows: Vec<ConstructorRow>) -> impl Iterator<Item = Result<Constructor>> {
    rows.into_iter().map(|row| {
        Ok(Constructor {
            id: row.constructor_id,
            name: row.name,
        })
    })
}

pub fn statuses(rows: Vec<StatusRow>) -> impl Iterator<Item = Result<Status>> {
    rows.into_iter().map(|row| {
        Ok(Status {
            id: row.status_id,
            status: row.status,
        })
    })
}

pub fn circuits(rows: Vec<CircuitRow>) -> impl Iterator<Item = Result<Circuit>> {
    rows.into_iter().map(|row| {
        Ok(Circuit {
            id: row.circuit_id,
            name: row.name,
        })
    })
}

/// One race per distinct event name, numbered from 1 in row order.
///
/// When a name appears at several circuits the first row wins.
pub fn races(rows: Vec<RaceRow>) -> impl Iterator<Item = Result<Race>> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(move |row| seen.insert(row.name.clone()))
        .zip(1..)
        .map(|(row, id)| {
            Ok(Race {
                id,
                name: row.name,
                circuit_id: row.circuit_id,
            })
        })
}

/// One round per source event, keeping the export's raceId as id.
pub fn rounds<'a>(
    rows: Vec<RaceRow>,
    races: &'a RaceLookup,
) -> impl Iterator<Item = Result<Round>> + 'a {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(move |row| seen.insert(row.race_id))
        .map(move |row| {
            Ok(Round {
                id: row.race_id,
                year: row.year,
                round_number: row.round,
                race_id: races.resolve(&row.name)?,
            })
        })
}

/// A driver/constructor pairing observed at one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryKey {
    pub race_id: i64,
    pub driver_id: i64,
    pub constructor_id: i64,
}

impl From<&ResultRow> for EntryKey {
    fn from(row: &ResultRow) -> Self {
        Self {
            race_id: row.race_id,
            driver_id: row.driver_id,
            constructor_id: row.constructor_id,
        }
    }
}

impl From<&QualifyingRow> for EntryKey {
    fn from(row: &QualifyingRow) -> Self {
        Self {
            race_id: row.race_id,
            driver_id: row.driver_id,
            constructor_id: row.constructor_id,
        }
    }
}

/// One identity per distinct (driver, constructor, season), numbered from 1
/// in first-seen order. The season comes from the event's round.
pub fn driver_constructors<'a>(
    entries: Vec<EntryKey>,
    rounds: &'a RoundLookup,
) -> impl Iterator<Item = Result<DriverConstructor>> + 'a {
    let mut seen = HashSet::new();
    let mut next_id = 0;
    entries.into_iter().filter_map(move |entry| {
        let year = match rounds.year_of(entry.race_id) {
            Ok(year) => year,
            Err(e) => return Some(Err(e)),
        };
        if !seen.insert((entry.driver_id, entry.constructor_id, year)) {
            return None;
        }
        next_id += 1;
        Some(Ok(DriverConstructor {
            id: next_id,
            driver_id: entry.driver_id,
            constructor_id: entry.constructor_id,
            year,
        }))
    })
}
