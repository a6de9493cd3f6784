//! Typed rows, one struct per source file.
//!
//! Cells that may legitimately hold the missing-value marker are kept raw
//! (`Option<String>`) and resolved by the transformers; everything else is
//! required and typed here.

use super::{Record, SourceRow};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq)]
pub struct DriverRow {
    pub driver_id: i64,
    pub forename: String,
    pub surname: String,
}

impl SourceRow for DriverRow {
    const FILE: &'static str = "drivers.csv";
    const COLUMNS: &'static [&'static str] = &["driverId", "forename", "surname"];

    fn from_record(record: &Record<'_>) -> Result<Self> {
        Ok(Self {
            driver_id: record.int("driverId")?,
            forename: record.text("forename")?,
            surname: record.text("surname")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorRow {
    pub constructor_id: i64,
    pub name: String,
}

impl SourceRow for ConstructorRow {
    const FILE: &'static str = "constructors.csv";
    const COLUMNS: &'static [&'static str] = &["constructorId", "name"];

    fn from_record(record: &Record<'_>) -> Result<Self> {
        Ok(Self {
            constructor_id: record.int("constructorId")?,
            name: record.text("name")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusRow {
    pub status_id: i64,
    pub status: String,
}

impl SourceRow for StatusRow {
    const FILE: &'static str = "status.csv";
    const COLUMNS: &'static [&'static str] = &["statusId", "status"];

    fn from_record(record: &Record<'_>) -> Result<Self> {
        Ok(Self {
            status_id: record.int("statusId")?,
            status: record.text("status")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CircuitRow {
    pub circuit_id: i64,
    pub name: String,
}

impl SourceRow for CircuitRow {
    const FILE: &'static str = "circuits.csv";
    const COLUMNS: &'static [&'static str] = &["circuitId", "name"];

    fn from_record(record: &Record<'_>) -> Result<Self> {
        Ok(Self {
            circuit_id: record.int("circuitId")?,
            name: record.text("name")?,
        })
    }
}

/// One calendar event; feeds both races and rounds.
#[derive(Debug, Clone, PartialEq)]
pub struct RaceRow {
    pub race_id: i64,
    pub year: i64,
    pub round: i64,
    pub circuit_id: i64,
    pub name: String,
}

impl SourceRow for RaceRow {
    const FILE: &'static str = "races.csv";
    const COLUMNS: &'static [&'static str] = &["raceId", "year", "round", "circuitId", "name"];

    fn from_record(record: &Record<'_>) -> Result<Self> {
        Ok(Self {
            race_id: record.int("raceId")?,
            year: record.int("year")?,
            round: record.int("round")?,
            circuit_id: record.int("circuitId")?,
            name: record.text("name")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub result_id: i64,
    pub race_id: i64,
    pub driver_id: i64,
    pub constructor_id: i64,
    pub position: Option<String>,
    pub points: f64,
    pub fastest_lap_time: Option<String>,
    pub fastest_lap_speed: Option<String>,
    pub status_id: i64,
}

impl SourceRow for ResultRow {
    const FILE: &'static str = "results.csv";
    const COLUMNS: &'static [&'static str] = &[
        "resultId",
        "raceId",
        "driverId",
        "constructorId",
        "position",
        "points",
        "fastestLapTime",
        "fastestLapSpeed",
        "statusId",
    ];

    fn from_record(record: &Record<'_>) -> Result<Self> {
        Ok(Self {
            result_id: record.int("resultId")?,
            race_id: record.int("raceId")?,
            driver_id: record.int("driverId")?,
            constructor_id: record.int("constructorId")?,
            position: record.raw("position").map(str::to_string),
            points: record.float("points")?,
            fastest_lap_time: record.raw("fastestLapTime").map(str::to_string),
            fastest_lap_speed: record.raw("fastestLapSpeed").map(str::to_string),
            status_id: record.int("statusId")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorResultRow {
    pub constructor_result_id: i64,
    pub race_id: i64,
    pub constructor_id: i64,
    pub points: f64,
}

impl SourceRow for ConstructorResultRow {
    const FILE: &'static str = "constructor_results.csv";
    const COLUMNS: &'static [&'static str] =
        &["constructorResultsId", "raceId", "constructorId", "points"];

    fn from_record(record: &Record<'_>) -> Result<Self> {
        Ok(Self {
            constructor_result_id: record.int("constructorResultsId")?,
            race_id: record.int("raceId")?,
            constructor_id: record.int("constructorId")?,
            points: record.float("points")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QualifyingRow {
    pub qualify_id: i64,
    pub race_id: i64,
    pub driver_id: i64,
    pub constructor_id: i64,
    pub position: Option<String>,
    pub q1: Option<String>,
    pub q2: Option<String>,
    pub q3: Option<String>,
}

impl SourceRow for QualifyingRow {
    const FILE: &'static str = "qualifying.csv";
    const COLUMNS: &'static [&'static str] = &[
        "qualifyId",
        "raceId",
        "driverId",
        "constructorId",
        "position",
        "q1",
        "q2",
        "q3",
    ];

    fn from_record(record: &Record<'_>) -> Result<Self> {
        Ok(Self {
            qualify_id: record.int("qualifyId")?,
            race_id: record.int("raceId")?,
            driver_id: record.int("driverId")?,
            constructor_id: record.int("constructorId")?,
            position: record.raw("position").map(str::to_string),
            q1: record.raw("q1").map(str::to_string),
            q2: record.raw("q2").map(str::to_string),
            q3: record.raw("q3").map(str::to_string),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LapTimeRow {
    pub race_id: i64,
    pub driver_id: i64,
    pub lap: i64,
    pub position: Option<String>,
    pub time: Option<String>,
}

impl SourceRow for LapTimeRow {
    const FILE: &'static str = "lap_times.csv";
    const COLUMNS: &'static [&'static str] = &["raceId", "driverId", "lap", "position", "time"];

    fn from_record(record: &Record<'_>) -> Result<Self> {
        Ok(Self {
            race_id: record.int("raceId")?,
            driver_id: record.int("driverId")?,
            lap: record.int("lap")?,
            position: record.raw("position").map(str::to_string),
            time: record.raw("time").map(str::to_string),
        })
    }
}

/// Cumulative driver standing after one race.
#[derive(Debug, Clone, PartialEq)]
pub struct DriverStandingRow {
    pub driver_standings_id: i64,
    pub race_id: i64,
    pub driver_id: i64,
    pub points: f64,
    pub position: Option<String>,
    pub wins: i64,
}

impl SourceRow for DriverStandingRow {
    const FILE: &'static str = "driver_standings.csv";
    const COLUMNS: &'static [&'static str] = &[
        "driverStandingsId",
        "raceId",
        "driverId",
        "points",
        "position",
        "wins",
    ];

    fn from_record(record: &Record<'_>) -> Result<Self> {
        Ok(Self {
            driver_standings_id: record.int("driverStandingsId")?,
            race_id: record.int("raceId")?,
            driver_id: record.int("driverId")?,
            points: record.float("points")?,
            position: record.raw("position").map(str::to_string),
            wins: record.int("wins")?,
        })
    }
}

/// Cumulative constructor standing after one race.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorStandingRow {
    pub constructor_standings_id: i64,
    pub race_id: i64,
    pub constructor_id: i64,
    pub points: f64,
    pub position: Option<String>,
    pub wins: i64,
}

impl SourceRow for ConstructorStandingRow {
    const FILE: &'static str = "constructor_standings.csv";
    const COLUMNS: &'static [&'static str] = &[
        "constructorStandingsId",
        "raceId",
        "constructorId",
        "points",
        "position",
        "wins",
    ];

    fn from_record(record: &Record<'_>) -> Result<Self> {
        Ok(Self {
            constructor_standings_id: record.int("constructorStandingsId")?,
            race_id: record.int("raceId")?,
            constructor_id: record.int("constructorId")?,
            points: record.float("points")?,
            position: record.raw("position").map(str::to_string),
            wins: record.int("wins")?,
        })
    }
}

/// Saved driver rating, the regression label.
#[derive(Debug, Clone, PartialEq)]
pub struct DriverRatingRow {
    pub driver_id: i64,
    pub year: i64,
    pub rating: f64,
}

impl SourceRow for DriverRatingRow {
    const FILE: &'static str = "driver_ratings.csv";
    const COLUMNS: &'static [&'static str] = &["driverId", "year", "rating"];

    fn from_record(record: &Record<'_>) -> Result<Self> {
        Ok(Self {
            driver_id: record.int("driverId")?,
            year: record.int("year")?,
            rating: record.float("rating")?,
        })
    }
}

/// Saved driver category, the classification label.
#[derive(Debug, Clone, PartialEq)]
pub struct DriverCategoryRow {
    pub driver_id: i64,
    pub year: i64,
    pub category: i64,
}

impl SourceRow for DriverCategoryRow {
    const FILE: &'static str = "driver_categories.csv";
    const COLUMNS: &'static [&'static str] = &["driverId", "year", "category"];

    fn from_record(record: &Record<'_>) -> Result<Self> {
        Ok(Self {
            driver_id: record.int("driverId")?,
            year: record.int("year")?,
            category: record.int("category")?,
        })
    }
}
