//! Race results, qualifying and lap times.

use crate::convert::{convert_time_to_ms, optional_time_ms, parse_position, parse_speed};
use crate::error::Result;
use crate::extract::{ConstructorResultRow, LapTimeRow, QualifyingRow, ResultRow};
use crate::identity::{DriverConstructorLookup, RaceEntryLookup, RoundLookup};
use crate::storage::{LapTime, QualifyingResult, RaceConstructorResult, RaceDriverResult};

pub fn race_driver_results<'a>(
    rows: Vec<ResultRow>,
    rounds: &'a RoundLookup,
    identities: &'a DriverConstructorLookup,
) -> impl Iterator<Item = Result<RaceDriverResult>> + 'a {
    rows.into_iter().map(move |row| {
        let year = rounds.year_of(row.race_id)?;
        Ok(RaceDriverResult {
            id: row.result_id,
            driver_constructor_id: identities.resolve(row.driver_id, row.constructor_id, year)?,
            round_id: row.race_id,
            status_id: row.status_id,
            position: parse_position(row.position.as_deref())?,
            points: row.points,
            fastest_lap_time: convert_time_to_ms(row.fastest_lap_time.as_deref())?,
            fastest_lap_speed: parse_speed(row.fastest_lap_speed.as_deref())?,
        })
    })
}

pub fn race_constructor_results(
    rows: Vec<ConstructorResultRow>,
) -> impl Iterator<Item = Result<RaceConstructorResult>> {
    rows.into_iter().map(|row| {
        Ok(RaceConstructorResult {
            id: row.constructor_result_id,
            constructor_id: row.constructor_id,
            round_id: row.race_id,
            points: row.points,
        })
    })
}

pub fn qualifying_results<'a>(
    rows: Vec<QualifyingRow>,
    rounds: &'a RoundLookup,
    identities: &'a DriverConstructorLookup,
) -> impl Iterator<Item = Result<QualifyingResult>> + 'a {
    rows.into_iter().map(move |row| {
        let year = rounds.year_of(row.race_id)?;
        Ok(QualifyingResult {
            id: row.qualify_id,
            round_id: row.race_id,
            driver_constructor_id: identities.resolve(row.driver_id, row.constructor_id, year)?,
            position: parse_position(row.position.as_deref())?,
            q1: optional_time_ms(row.q1.as_deref())?,
            q2: optional_time_ms(row.q2.as_deref())?,
            q3: optional_time_ms(row.q3.as_deref())?,
        })
    })
}

/// Lap times, numbered from 1 in row order.
///
/// The constructor is the one the driver raced for in that round.
pub fn lap_times<'a>(
    rows: Vec<LapTimeRow>,
    rounds: &'a RoundLookup,
    entries: &'a RaceEntryLookup,
    identities: &'a DriverConstructorLookup,
) -> impl Iterator<Item = Result<LapTime>> + 'a {
    rows.into_iter().zip(1..).map(move |(row, id)| {
        let year = rounds.year_of(row.race_id)?;
        let constructor_id = entries.constructor_in_round(row.race_id, row.driver_id)?;
        Ok(LapTime {
            id,
            lap: row.lap,
            position: parse_position(row.position.as_deref())?,
            time: convert_time_to_ms(row.time.as_deref())?,
            round_id: row.race_id,
            driver_constructor_id: identities.resolve(row.driver_id, constructor_id, year)?,
        })
    })
}
