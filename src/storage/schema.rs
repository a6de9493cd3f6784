//! SQLite schema for the relational model.
//!
//! Tables, in load order:
//! - driver, circuit, status, constructor: independent reference data
//! - race, round, driver_constructor: calendar and identities
//! - race_driver_result, race_constructor_result, qualifying_result, lap_time: facts
//! - race_driver_standings, race_constructor_standings: final season standings
//! - driver_rating, driver_category: training labels

use rusqlite::{Connection, Result};

use super::views::AggregateView;

/// Tables in dependency order; dropped in reverse.
pub const TABLES: [&str; 15] = [
    "driver",
    "circuit",
    "status",
    "constructor",
    "race",
    "round",
    "driver_constructor",
    "race_driver_result",
    "race_constructor_result",
    "qualifying_result",
    "lap_time",
    "race_driver_standings",
    "race_constructor_standings",
    "driver_rating",
    "driver_category",
];

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS driver (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    surname TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS circuit (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS status (
    id INTEGER PRIMARY KEY,
    status TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS constructor (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS race (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    circuit_id INTEGER NOT NULL REFERENCES circuit(id)
);

CREATE TABLE IF NOT EXISTS round (
    id INTEGER PRIMARY KEY,
    year INTEGER NOT NULL,
    round_number INTEGER NOT NULL,
    race_id INTEGER NOT NULL REFERENCES race(id)
);

CREATE TABLE IF NOT EXISTS driver_constructor (
    id INTEGER PRIMARY KEY,
    driver_id INTEGER NOT NULL REFERENCES driver(id),
    constructor_id INTEGER NOT NULL REFERENCES constructor(id),
    year INTEGER NOT NULL,
    UNIQUE(driver_id, constructor_id, year)
);

CREATE TABLE IF NOT EXISTS race_driver_result (
    id INTEGER PRIMARY KEY,
    driver_constructor_id INTEGER NOT NULL REFERENCES driver_constructor(id),
    round_id INTEGER NOT NULL REFERENCES round(id),
    status_id INTEGER NOT NULL REFERENCES status(id),
    position INTEGER NOT NULL,
    points REAL NOT NULL,
    fastest_lap_time INTEGER NOT NULL,
    fastest_lap_speed REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS race_constructor_result (
    id INTEGER PRIMARY KEY,
    constructor_id INTEGER NOT NULL REFERENCES constructor(id),
    round_id INTEGER NOT NULL REFERENCES round(id),
    points REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS qualifying_result (
    id INTEGER PRIMARY KEY,
    round_id INTEGER NOT NULL REFERENCES round(id),
    driver_constructor_id INTEGER NOT NULL REFERENCES driver_constructor(id),
    position INTEGER NOT NULL,
    q1 INTEGER,
    q2 INTEGER,
    q3 INTEGER
);

CREATE TABLE IF NOT EXISTS lap_time (
    id INTEGER PRIMARY KEY,
    lap INTEGER NOT NULL,
    position INTEGER NOT NULL,
    time INTEGER NOT NULL,
    round_id INTEGER NOT NULL REFERENCES round(id),
    driver_constructor_id INTEGER NOT NULL REFERENCES driver_constructor(id)
);

CREATE TABLE IF NOT EXISTS race_driver_standings (
    id INTEGER PRIMARY KEY,
    year INTEGER NOT NULL,
    points REAL NOT NULL,
    position INTEGER NOT NULL,
    wins INTEGER NOT NULL,
    driver_constructor_id INTEGER NOT NULL REFERENCES driver_constructor(id)
);

CREATE TABLE IF NOT EXISTS race_constructor_standings (
    id INTEGER PRIMARY KEY,
    year INTEGER NOT NULL,
    points REAL NOT NULL,
    position INTEGER NOT NULL,
    wins INTEGER NOT NULL,
    constructor_id INTEGER NOT NULL REFERENCES constructor(id)
);

CREATE TABLE IF NOT EXISTS driver_rating (
    id INTEGER PRIMARY KEY,
    driver_id INTEGER NOT NULL REFERENCES driver(id),
    year INTEGER NOT NULL,
    rating REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS driver_category (
    id INTEGER PRIMARY KEY,
    driver_id INTEGER NOT NULL REFERENCES driver(id),
    year INTEGER NOT NULL,
    category INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_round_year ON round(year);
CREATE INDEX IF NOT EXISTS idx_driver_constructor_driver ON driver_constructor(driver_id, year);
CREATE INDEX IF NOT EXISTS idx_race_driver_result_round ON race_driver_result(round_id, driver_constructor_id);
CREATE INDEX IF NOT EXISTS idx_qualifying_result_round ON qualifying_result(round_id, driver_constructor_id);
CREATE INDEX IF NOT EXISTS idx_lap_time_round ON lap_time(round_id);
"#;

/// Create all tables in the database
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}

/// Drop aggregate tables and every entity table.
pub fn drop_tables(conn: &Connection) -> Result<()> {
    for view in AggregateView::ALL {
        conn.execute(&format!("DROP TABLE IF EXISTS {}", view.table()), [])?;
    }
    for table in TABLES.iter().rev() {
        conn.execute(&format!("DROP TABLE IF EXISTS {}", table), [])?;
    }
    Ok(())
}
