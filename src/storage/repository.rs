//! Store handle: one SQLite connection scoped to a pipeline run.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use super::entity::{Driver, DriverCategory, DriverRating, Entity};
use super::schema::{create_tables, drop_tables};
use crate::error::{EtlError, Result};

/// Relational store for the loaded entities and their aggregates.
pub struct Store {
    pub(crate) conn: Connection,
}

impl Store {
    /// Open (or create) the database file, creating the schema if needed
    pub fn open(db_path: &Path) -> Result<Self> {
        // Create parent directories if needed
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;
        debug!("Opened database at {}", db_path.display());
        Self::init(conn)
    }

    /// Create an in-memory store
    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        create_tables(&conn)?;
        Ok(Self { conn })
    }

    /// Raw connection, for parametrized queries outside the typed API
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Drop every table (aggregates included) and recreate the empty schema.
    pub fn reset_schema(&mut self) -> Result<()> {
        let tx = self.conn.transaction()?;
        drop_tables(&tx)?;
        create_tables(&tx)?;
        tx.commit()?;
        info!("Database schema recreated");
        Ok(())
    }

    /// Persist one load phase in a single transaction.
    ///
    /// The first failing record aborts the phase and nothing of it is kept.
    pub fn load<E, I>(&mut self, records: I) -> Result<usize>
    where
        E: Entity,
        I: IntoIterator<Item = Result<E>>,
    {
        let tx = self.conn.transaction()?;
        let mut count = 0;
        for record in records {
            record?.insert(&tx)?;
            count += 1;
        }
        tx.commit()?;
        info!("Loaded {} {} records", count, E::TABLE);
        Ok(count)
    }

    // ==================== Query Operations ====================

    /// All committed records of one entity type, ordered by id
    pub fn all<E: Entity>(&self) -> Result<Vec<E>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM {} ORDER BY id",
            E::COLUMNS,
            E::TABLE
        ))?;
        let records = stmt
            .query_map([], |row| E::from_row(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Row count of an entity table
    pub fn count<E: Entity>(&self) -> Result<i64> {
        let count = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", E::TABLE),
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn driver(&self, driver_id: i64) -> Result<Option<Driver>> {
        let driver = self
            .conn
            .query_row(
                &format!("SELECT {} FROM driver WHERE id = ?1", Driver::COLUMNS),
                [driver_id],
                |row| Driver::from_row(row),
            )
            .optional()?;
        Ok(driver)
    }

    /// Driver by id, failing when absent
    pub fn require_driver(&self, driver_id: i64) -> Result<Driver> {
        self.driver(driver_id)?
            .ok_or(EtlError::DriverNotFound(driver_id))
    }

    pub fn driver_rating(&self, driver_id: i64, year: i64) -> Result<Option<DriverRating>> {
        self.label_by_driver(driver_id, year)
    }

    pub fn driver_ratings_by_year(&self, year: i64) -> Result<Vec<DriverRating>> {
        self.labels_by_year(year)
    }

    pub fn driver_category(&self, driver_id: i64, year: i64) -> Result<Option<DriverCategory>> {
        self.label_by_driver(driver_id, year)
    }

    pub fn driver_categories_by_year(&self, year: i64) -> Result<Vec<DriverCategory>> {
        self.labels_by_year(year)
    }

    /// The single label of a driver-season; several rows are an error.
    fn label_by_driver<E: Entity>(&self, driver_id: i64, year: i64) -> Result<Option<E>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM {} WHERE driver_id = ?1 AND year = ?2 ORDER BY id",
            E::COLUMNS,
            E::TABLE
        ))?;
        let mut labels = stmt
            .query_map(params![driver_id, year], |row| E::from_row(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        if labels.len() > 1 {
            return Err(EtlError::DuplicateLabel {
                table: E::TABLE,
                driver_id,
                year,
                count: labels.len(),
            });
        }
        Ok(labels.pop())
    }

    fn labels_by_year<E: Entity>(&self, year: i64) -> Result<Vec<E>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM {} WHERE year = ?1 ORDER BY id",
            E::COLUMNS,
            E::TABLE
        ))?;
        let labels = stmt
            .query_map([year], |row| E::from_row(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(labels)
    }
}
