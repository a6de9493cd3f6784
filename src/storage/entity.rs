//! Persisted entities and their row mappings.

use rusqlite::{params, Connection, Row};
use serde::Serialize;

/// A record stored in one table.
pub trait Entity: Sized {
    /// Table name
    const TABLE: &'static str;
    /// Column list used for reads, in `from_row` order
    const COLUMNS: &'static str;

    fn insert(&self, conn: &Connection) -> rusqlite::Result<usize>;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Driver {
    pub id: i64,
    pub name: String,
    pub surname: String,
}

impl Entity for Driver {
    const TABLE: &'static str = "driver";
    const COLUMNS: &'static str = "id, name, surname";

    fn insert(&self, conn: &Connection) -> rusqlite::Result<usize> {
        let mut stmt = conn.prepare_cached(
            "INSERT INTO driver (id, name, surname) VALUES (?1, ?2, ?3)",
        )?;
        stmt.execute(params![self.id, self.name, self.surname])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            surname: row.get(2)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Constructor {
    pub id: i64,
    pub name: String,
}

impl Entity for Constructor {
    const TABLE: &'static str = "constructor";
    const COLUMNS: &'static str = "id, name";

    fn insert(&self, conn: &Connection) -> rusqlite::Result<usize> {
        let mut stmt = conn.prepare_cached(
            "INSERT INTO constructor (id, name) VALUES (?1, ?2)",
        )?;
        stmt.execute(params![self.id, self.name])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    }
}

/// Free-text finish status ("Finished", "+1 Lap", "Engine", ...)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Status {
    pub id: i64,
    pub status: String,
}

impl Entity for Status {
    const TABLE: &'static str = "status";
    const COLUMNS: &'static str = "id, status";

    fn insert(&self, conn: &Connection) -> rusqlite::Result<usize> {
        let mut stmt = conn.prepare_cached(
            "INSERT INTO status (id, status) VALUES (?1, ?2)",
        )?;
        stmt.execute(params![self.id, self.status])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            status: row.get(1)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Circuit {
    pub id: i64,
    pub name: String,
}

impl Entity for Circuit {
    const TABLE: &'static str = "circuit";
    const COLUMNS: &'static str = "id, name";

    fn insert(&self, conn: &Connection) -> rusqlite::Result<usize> {
        let mut stmt = conn.prepare_cached(
            "INSERT INTO circuit (id, name) VALUES (?1, ?2)",
        )?;
        stmt.execute(params![self.id, self.name])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    }
}

/// A named event, independent of the season it is held in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Race {
    pub id: i64,
    pub name: String,
    pub circuit_id: i64,
}

impl Entity for Race {
    const TABLE: &'static str = "race";
    const COLUMNS: &'static str = "id, name, circuit_id";

    fn insert(&self, conn: &Connection) -> rusqlite::Result<usize> {
        let mut stmt = conn.prepare_cached(
            "INSERT INTO race (id, name, circuit_id) VALUES (?1, ?2, ?3)",
        )?;
        stmt.execute(params![self.id, self.name, self.circuit_id])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            circuit_id: row.get(2)?,
        })
    }
}

/// One calendar instance of a race; `id` is the export's raceId.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Round {
    pub id: i64,
    pub year: i64,
    pub round_number: i64,
    pub race_id: i64,
}

impl Entity for Round {
    const TABLE: &'static str = "round";
    const COLUMNS: &'static str = "id, year, round_number, race_id";

    fn insert(&self, conn: &Connection) -> rusqlite::Result<usize> {
        let mut stmt = conn.prepare_cached(
            "INSERT INTO round (id, year, round_number, race_id) VALUES (?1, ?2, ?3, ?4)",
        )?;
        stmt.execute(params![self.id, self.year, self.round_number, self.race_id])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            year: row.get(1)?,
            round_number: row.get(2)?,
            race_id: row.get(3)?,
        })
    }
}

/// A driver driving for a constructor in one season.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverConstructor {
    pub id: i64,
    pub driver_id: i64,
    pub constructor_id: i64,
    pub year: i64,
}

impl Entity for DriverConstructor {
    const TABLE: &'static str = "driver_constructor";
    const COLUMNS: &'static str = "id, driver_id, constructor_id, year";

    fn insert(&self, conn: &Connection) -> rusqlite::Result<usize> {
        let mut stmt = conn.prepare_cached(
            "INSERT INTO driver_constructor (id, driver_id, constructor_id, year) VALUES (?1, ?2, ?3, ?4)",
        )?;
        stmt.execute(params![self.id, self.driver_id, self.constructor_id, self.year])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            driver_id: row.get(1)?,
            constructor_id: row.get(2)?,
            year: row.get(3)?,
        })
    }
}

/// Qualifying session times in ms; `None` when no time was set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualifyingResult {
    pub id: i64,
    pub round_id: i64,
    pub driver_constructor_id: i64,
    pub position: i64,
    pub q1: Option<i64>,
    pub q2: Option<i64>,
    pub q3: Option<i64>,
}

impl Entity for QualifyingResult {
    const TABLE: &'static str = "qualifying_result";
    const COLUMNS: &'static str = "id, round_id, driver_constructor_id, position, q1, q2, q3";

    fn insert(&self, conn: &Connection) -> rusqlite::Result<usize> {
        let mut stmt = conn.prepare_cached(
            r#"
            INSERT INTO qualifying_result
            (id, round_id, driver_constructor_id, position, q1, q2, q3)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )?;
        stmt.execute(params![
            self.id,
            self.round_id,
            self.driver_constructor_id,
            self.position,
            self.q1,
            self.q2,
            self.q3,
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            round_id: row.get(1)?,
            driver_constructor_id: row.get(2)?,
            position: row.get(3)?,
            q1: row.get(4)?,
            q2: row.get(5)?,
            q3: row.get(6)?,
        })
    }
}

/// Race result; `position` 0 means not classified.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RaceDriverResult {
    pub id: i64,
    pub driver_constructor_id: i64,
    pub round_id: i64,
    pub status_id: i64,
    pub position: i64,
    pub points: f64,
    pub fastest_lap_time: i64,
    pub fastest_lap_speed: f64,
}

impl Entity for RaceDriverResult {
    const TABLE: &'static str = "race_driver_result";
    const COLUMNS: &'static str = "id, driver_constructor_id, round_id, status_id, position, points, fastest_lap_time, fastest_lap_speed";

    fn insert(&self, conn: &Connection) -> rusqlite::Result<usize> {
        let mut stmt = conn.prepare_cached(
            r#"
            INSERT INTO race_driver_result
            (id, driver_constructor_id, round_id, status_id, position, points,
             fastest_lap_time, fastest_lap_speed)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )?;
        stmt.execute(params![
            self.id,
            self.driver_constructor_id,
            self.round_id,
            self.status_id,
            self.position,
            self.points,
            self.fastest_lap_time,
            self.fastest_lap_speed,
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            driver_constructor_id: row.get(1)?,
            round_id: row.get(2)?,
            status_id: row.get(3)?,
            position: row.get(4)?,
            points: row.get(5)?,
            fastest_lap_time: row.get(6)?,
            fastest_lap_speed: row.get(7)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RaceConstructorResult {
    pub id: i64,
    pub constructor_id: i64,
    pub round_id: i64,
    pub points: f64,
}

impl Entity for RaceConstructorResult {
    const TABLE: &'static str = "race_constructor_result";
    const COLUMNS: &'static str = "id, constructor_id, round_id, points";

    fn insert(&self, conn: &Connection) -> rusqlite::Result<usize> {
        let mut stmt = conn.prepare_cached(
            "INSERT INTO race_constructor_result (id, constructor_id, round_id, points) VALUES (?1, ?2, ?3, ?4)",
        )?;
        stmt.execute(params![self.id, self.constructor_id, self.round_id, self.points])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            constructor_id: row.get(1)?,
            round_id: row.get(2)?,
            points: row.get(3)?,
        })
    }
}

/// Final season standing of a driver-constructor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RaceDriverStandings {
    pub id: i64,
    pub year: i64,
    pub points: f64,
    pub position: i64,
    pub wins: i64,
    pub driver_constructor_id: i64,
}

impl Entity for RaceDriverStandings {
    const TABLE: &'static str = "race_driver_standings";
    const COLUMNS: &'static str = "id, year, points, position, wins, driver_constructor_id";

    fn insert(&self, conn: &Connection) -> rusqlite::Result<usize> {
        let mut stmt = conn.prepare_cached(
            r#"
            INSERT INTO race_driver_standings
            (id, year, points, position, wins, driver_constructor_id)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )?;
        stmt.execute(params![
            self.id,
            self.year,
            self.points,
            self.position,
            self.wins,
            self.driver_constructor_id,
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            year: row.get(1)?,
            points: row.get(2)?,
            position: row.get(3)?,
            wins: row.get(4)?,
            driver_constructor_id: row.get(5)?,
        })
    }
}

/// Final season standing of a constructor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RaceConstructorStandings {
    pub id: i64,
    pub year: i64,
    pub points: f64,
    pub position: i64,
    pub wins: i64,
    pub constructor_id: i64,
}

impl Entity for RaceConstructorStandings {
    const TABLE: &'static str = "race_constructor_standings";
    const COLUMNS: &'static str = "id, year, points, position, wins, constructor_id";

    fn insert(&self, conn: &Connection) -> rusqlite::Result<usize> {
        let mut stmt = conn.prepare_cached(
            r#"
            INSERT INTO race_constructor_standings
            (id, year, points, position, wins, constructor_id)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )?;
        stmt.execute(params![
            self.id,
            self.year,
            self.points,
            self.position,
            self.wins,
            self.constructor_id,
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            year: row.get(1)?,
            points: row.get(2)?,
            position: row.get(3)?,
            wins: row.get(4)?,
            constructor_id: row.get(5)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LapTime {
    pub id: i64,
    pub lap: i64,
    pub position: i64,
    pub time: i64,
    pub round_id: i64,
    pub driver_constructor_id: i64,
}

impl Entity for LapTime {
    const TABLE: &'static str = "lap_time";
    const COLUMNS: &'static str = "id, lap, position, time, round_id, driver_constructor_id";

    fn insert(&self, conn: &Connection) -> rusqlite::Result<usize> {
        let mut stmt = conn.prepare_cached(
            r#"
            INSERT INTO lap_time
            (id, lap, position, time, round_id, driver_constructor_id)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )?;
        stmt.execute(params![
            self.id,
            self.lap,
            self.position,
            self.time,
            self.round_id,
            self.driver_constructor_id,
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            lap: row.get(1)?,
            position: row.get(2)?,
            time: row.get(3)?,
            round_id: row.get(4)?,
            driver_constructor_id: row.get(5)?,
        })
    }
}

/// Supervised-learning label for regression.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverRating {
    pub id: i64,
    pub driver_id: i64,
    pub year: i64,
    pub rating: f64,
}

impl Entity for DriverRating {
    const TABLE: &'static str = "driver_rating";
    const COLUMNS: &'static str = "id, driver_id, year, rating";

    fn insert(&self, conn: &Connection) -> rusqlite::Result<usize> {
        let mut stmt = conn.prepare_cached(
            "INSERT INTO driver_rating (id, driver_id, year, rating) VALUES (?1, ?2, ?3, ?4)",
        )?;
        stmt.execute(params![self.id, self.driver_id, self.year, self.rating])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            driver_id: row.get(1)?,
            year: row.get(2)?,
            rating: row.get(3)?,
        })
    }
}

/// Supervised-learning label for classification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverCategory {
    pub id: i64,
    pub driver_id: i64,
    pub year: i64,
    pub category: i64,
}

impl Entity for DriverCategory {
    const TABLE: &'static str = "driver_category";
    const COLUMNS: &'static str = "id, driver_id, year, category";

    fn insert(&self, conn: &Connection) -> rusqlite::Result<usize> {
        let mut stmt = conn.prepare_cached(
            "INSERT INTO driver_category (id, driver_id, year, category) VALUES (?1, ?2, ?3, ?4)",
        )?;
        stmt.execute(params![self.id, self.driver_id, self.year, self.category])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            driver_id: row.get(1)?,
            year: row.get(2)?,
            category: row.get(3)?,
        })
    }
}
