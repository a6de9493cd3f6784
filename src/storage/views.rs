//! Aggregate statistics per driver-season.
//!
//! SQLite has no materialized views, so each aggregate is materialized as a
//! table built from a `SELECT` over the loaded facts. Rebuilding drops and
//! recreates all four; they are read-only for feature assembly.

use rusqlite::{params, OptionalExtension};
use serde::Serialize;
use tracing::info;

use super::repository::Store;
use crate::error::Result;

/// Whose statistics an aggregate row describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Perspective {
    /// The driver themself
    Driver,
    /// The driver's teammates at the same constructor in the same season
    Opponent,
}

/// The four materialized aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateView {
    DriverSeason,
    OpponentSeason,
    DriverRound,
    OpponentRound,
}

impl AggregateView {
    pub const ALL: [AggregateView; 4] = [
        AggregateView::DriverSeason,
        AggregateView::OpponentSeason,
        AggregateView::DriverRound,
        AggregateView::OpponentRound,
    ];

    pub fn season(perspective: Perspective) -> Self {
        match perspective {
            Perspective::Driver => AggregateView::DriverSeason,
            Perspective::Opponent => AggregateView::OpponentSeason,
        }
    }

    pub fn round(perspective: Perspective) -> Self {
        match perspective {
            Perspective::Driver => AggregateView::DriverRound,
            Perspective::Opponent => AggregateView::OpponentRound,
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            AggregateView::DriverSeason => "drivers_seasons_results",
            AggregateView::OpponentSeason => "opponents_seasons_results",
            AggregateView::DriverRound => "drivers_rounds_results",
            AggregateView::OpponentRound => "opponents_rounds_results",
        }
    }

    fn select_sql(&self) -> &'static str {
        match self {
            AggregateView::DriverSeason => DRIVER_SEASON_SQL,
            AggregateView::OpponentSeason => OPPONENT_SEASON_SQL,
            AggregateView::DriverRound => DRIVER_ROUND_SQL,
            AggregateView::OpponentRound => OPPONENT_ROUND_SQL,
        }
    }
}

const DRIVER_SEASON_SQL: &str = r#"
SELECT dc.driver_id        AS driver_id,
       dc.year             AS year,
       SUM(rds.points)     AS season_points,
       AVG(rds.position)   AS season_position,
       SUM(rds.wins)       AS wins
FROM race_driver_standings rds
         JOIN driver_constructor dc ON rds.driver_constructor_id = dc.id
GROUP BY dc.year, dc.driver_id
ORDER BY dc.year
"#;

const OPPONENT_SEASON_SQL: &str = r#"
SELECT d.driver_id         AS driver_id,
       d.year              AS year,
       SUM(rds.points)     AS season_points,
       AVG(rds.position)   AS season_position,
       SUM(rds.wins)       AS wins
FROM driver_constructor d
         JOIN driver_constructor o
              ON d.constructor_id = o.constructor_id AND d.driver_id != o.driver_id AND d.year = o.year
         JOIN race_driver_standings rds ON rds.driver_constructor_id = o.id
GROUP BY d.year, d.driver_id
ORDER BY d.year
"#;

// Shared aggregate columns of the round views. A DNF is any status other
// than "Finished" or "+N Lap(s)".
macro_rules! round_aggregates {
    () => {
        r#"
       AVG(qs.position)                                                    AS avg_qualifying_position,
       SUM(CASE WHEN COALESCE(qs.q2, 0) != 0 THEN 1 ELSE 0 END)            AS q2_appearances,
       SUM(CASE WHEN COALESCE(qs.q3, 0) != 0 THEN 1 ELSE 0 END)            AS q3_appearances,
       SUM(CASE WHEN qs.position = 1 THEN 1 ELSE 0 END)                    AS pole_positions,
       SUM(CASE WHEN qs.position = 2 THEN 1 ELSE 0 END)                    AS front_row_second,
       SUM(CASE WHEN rdr.position BETWEEN 1 AND 3 THEN 1 ELSE 0 END)       AS podiums,
       SUM(CASE WHEN s.status = 'Finished' OR s.status LIKE '+%Lap%'
                THEN 0 ELSE 1 END)                                         AS dnfs
"#
    };
}

const DRIVER_ROUND_SQL: &str = concat!(
    r#"
SELECT dc.driver_id AS driver_id,
       dc.year      AS year,
"#,
    round_aggregates!(),
    r#"
FROM qualifying_result qs
         JOIN race_driver_result rdr
              ON qs.round_id = rdr.round_id AND rdr.driver_constructor_id = qs.driver_constructor_id
         JOIN status s ON rdr.status_id = s.id
         JOIN driver_constructor dc ON qs.driver_constructor_id = dc.id
GROUP BY dc.year, dc.driver_id
ORDER BY dc.year
"#
);

const OPPONENT_ROUND_SQL: &str = concat!(
    r#"
SELECT d.driver_id AS driver_id,
       d.year      AS year,
"#,
    round_aggregates!(),
    r#"
FROM driver_constructor d
         JOIN driver_constructor o
              ON d.constructor_id = o.constructor_id AND d.driver_id != o.driver_id AND d.year = o.year
         JOIN qualifying_result qs ON qs.driver_constructor_id = o.id
         JOIN race_driver_result rdr
              ON qs.round_id = rdr.round_id AND rdr.driver_constructor_id = qs.driver_constructor_id
         JOIN status s ON rdr.status_id = s.id
GROUP BY d.year, d.driver_id
ORDER BY d.year
"#
);

/// Season totals from the final standings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonResults {
    pub driver_id: i64,
    pub year: i64,
    pub season_points: f64,
    pub season_position: f64,
    pub wins: i64,
}

/// Qualifying and race aggregates across a season's rounds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundResults {
    pub driver_id: i64,
    pub year: i64,
    pub avg_qualifying_position: f64,
    pub q2_appearances: i64,
    pub q3_appearances: i64,
    pub pole_positions: i64,
    pub front_row_second: i64,
    pub podiums: i64,
    pub dnfs: i64,
}

impl Store {
    /// Drop and recreate every aggregate table.
    pub fn rebuild_views(&mut self) -> Result<()> {
        let tx = self.conn.transaction()?;
        for view in AggregateView::ALL {
            tx.execute(&format!("DROP TABLE IF EXISTS {}", view.table()), [])?;
            tx.execute(
                &format!(
                    "CREATE TABLE IF NOT EXISTS {} AS {}",
                    view.table(),
                    view.select_sql()
                ),
                [],
            )?;
            let rows: i64 = tx.query_row(
                &format!("SELECT COUNT(*) FROM {}", view.table()),
                [],
                |row| row.get(0),
            )?;
            info!("Built {} ({} rows)", view.table(), rows);
        }
        tx.commit()?;
        Ok(())
    }

    /// Season aggregate row for a driver-season, if any.
    pub fn season_results(
        &self,
        perspective: Perspective,
        driver_id: i64,
        year: i64,
    ) -> Result<Option<SeasonResults>> {
        let sql = format!(
            r#"
            SELECT driver_id, year, season_points, season_position, wins
            FROM {}
            WHERE driver_id = ?1 AND year = ?2
            "#,
            AggregateView::season(perspective).table()
        );

        let row = self
            .conn
            .query_row(&sql, params![driver_id, year], |row| {
                Ok(SeasonResults {
                    driver_id: row.get(0)?,
                    year: row.get(1)?,
                    season_points: row.get(2)?,
                    season_position: row.get(3)?,
                    wins: row.get(4)?,
                })
            })
            .optional()?;
        Ok(row)
    }

    /// Round aggregate row for a driver-season, if any.
    pub fn round_results(
        &self,
        perspective: Perspective,
        driver_id: i64,
        year: i64,
    ) -> Result<Option<RoundResults>> {
        let sql = format!(
            r#"
            SELECT driver_id, year, avg_qualifying_position, q2_appearances, q3_appearances,
                   pole_positions, front_row_second, podiums, dnfs
            FROM {}
            WHERE driver_id = ?1 AND year = ?2
            "#,
            AggregateView::round(perspective).table()
        );

        let row = self
            .conn
            .query_row(&sql, params![driver_id, year], |row| {
                Ok(RoundResults {
                    driver_id: row.get(0)?,
                    year: row.get(1)?,
                    avg_qualifying_position: row.get(2)?,
                    q2_appearances: row.get(3)?,
                    q3_appearances: row.get(4)?,
                    pole_positions: row.get(5)?,
                    front_row_second: row.get(6)?,
                    podiums: row.get(7)?,
                    dnfs: row.get(8)?,
                })
            })
            .optional()?;
        Ok(row)
    }
}
