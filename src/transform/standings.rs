//! Season standings.
//!
//! The exports hold cumulative standings after every race; a season's
//! standing is the row of the last round that has standings in the export.

use std::collections::HashSet;

use crate::convert::parse_position;
use crate::error::Result;
use crate::extract::{ConstructorStandingRow, DriverStandingRow};
use crate::identity::{DriverConstructorLookup, RaceEntryLookup, RoundLookup};
use crate::storage::{RaceConstructorStandings, RaceDriverStandings};

pub fn driver_standings<'a>(
    rows: Vec<DriverStandingRow>,
    rounds: &'a RoundLookup,
    entries: &'a RaceEntryLookup,
    identities: &'a DriverConstructorLookup,
) -> impl Iterator<Item = Result<RaceDriverStandings>> + 'a {
    let finals = rounds.final_rounds_among(rows.iter().map(|row| row.race_id));
    rows.into_iter()
        .filter(move |row| finals.contains(&row.race_id))
        .map(move |row| {
            let year = rounds.year_of(row.race_id)?;
            let constructor_id = entries.constructor_in_season(row.driver_id, year)?;
            Ok(RaceDriverStandings {
                id: row.driver_standings_id,
                year,
                points: row.points,
                position: parse_position(row.position.as_deref())?,
                wins: row.wins,
                driver_constructor_id: identities.resolve(row.driver_id, constructor_id, year)?,
            })
        })
}

pub fn constructor_standings<'a>(
    rows: Vec<ConstructorStandingRow>,
    rounds: &'a RoundLookup,
) -> impl Iterator<Item = Result<RaceConstructorStandings>> + 'a {
    let finals: HashSet<i64> = rounds.final_rounds_among(rows.iter().map(|row| row.race_id));
    rows.into_iter()
        .filter(move |row| finals.contains(&row.race_id))
        .map(move |row| {
            Ok(RaceConstructorStandings {
                id: row.constructor_standings_id,
                year: rounds.year_of(row.race_id)?,
                points: row.points,
                position: parse_position(row.position.as_deref())?,
                wins: row.wins,
                constructor_id: row.constructor_id,
            })
        })
}
