//! Feature assembly for the rating model.
//!
//! One row per driver-season, joined from the driver's own season and round
//! aggregates and the teammates' (opponent) aggregates.

use serde::{Deserialize, Serialize};

use crate::error::{EtlError, Result};
use crate::storage::{AggregateView, Perspective, RoundResults, SeasonResults, Store};

/// Number of model inputs per row
pub const FEATURE_COUNT: usize = 11;

/// Column names, in `to_vector` order
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "wins",
    "season_position",
    "avg_qualifying_position",
    "q2_appearances",
    "q3_appearances",
    "pole_positions",
    "front_row_second",
    "podiums",
    "dnfs",
    "head_to_head_qualifying",
    "percentage_constructor_points",
];

/// Feature row for one driver-season
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverRatingFeatures {
    pub driver_id: i64,
    pub name: String,
    pub surname: String,
    pub year: i64,
    // Season (2)
    pub wins: i64,
    pub season_position: f64,
    // Qualifying (5)
    pub avg_qualifying_position: f64,
    pub q2_appearances: i64,
    pub q3_appearances: i64,
    pub pole_positions: i64,
    pub front_row_second: i64,
    // Race (2)
    pub podiums: i64,
    pub dnfs: i64,
    // Teammate comparison (2)
    pub head_to_head_qualifying: bool,
    pub percentage_constructor_points: f64,
}

impl DriverRatingFeatures {
    /// Combine the four aggregate rows of a driver-season.
    ///
    /// Pure: identical aggregates always yield an identical row.
    pub fn from_aggregates(
        name: String,
        surname: String,
        own_season: &SeasonResults,
        own_round: &RoundResults,
        opponent_season: &SeasonResults,
        opponent_round: &RoundResults,
    ) -> Self {
        Self {
            driver_id: own_season.driver_id,
            name,
            surname,
            year: own_season.year,
            wins: own_season.wins,
            season_position: own_season.season_position,
            avg_qualifying_position: own_round.avg_qualifying_position,
            q2_appearances: own_round.q2_appearances,
            q3_appearances: own_round.q3_appearances,
            pole_positions: own_round.pole_positions,
            front_row_second: own_round.front_row_second,
            podiums: own_round.podiums,
            dnfs: own_round.dnfs,
            head_to_head_qualifying: head_to_head_qualifying(own_round, opponent_round),
            percentage_constructor_points: percentage_constructor_points(
                own_season.season_points,
                opponent_season.season_points,
            ),
        }
    }

    /// Convert to array for model input
    pub fn to_vector(&self) -> [f64; FEATURE_COUNT] {
        [
            self.wins as f64,
            self.season_position,
            self.avg_qualifying_position,
            self.q2_appearances as f64,
            self.q3_appearances as f64,
            self.pole_positions as f64,
            self.front_row_second as f64,
            self.podiums as f64,
            self.dnfs as f64,
            if self.head_to_head_qualifying { 1.0 } else { 0.0 },
            self.percentage_constructor_points,
        ]
    }
}

/// Whether the driver out-qualified the teammates over the season.
///
/// Lower average position wins; on a tie, more Q3 appearances wins.
pub fn head_to_head_qualifying(own: &RoundResults, opponent: &RoundResults) -> bool {
    if own.avg_qualifying_position == opponent.avg_qualifying_position {
        own.q3_appearances > opponent.q3_appearances
    } else {
        own.avg_qualifying_position < opponent.avg_qualifying_position
    }
}

/// Driver's share of the team's season points, in percent.
pub fn percentage_constructor_points(own_points: f64, opponent_points: f64) -> f64 {
    if own_points == 0.0 && opponent_points == 0.0 {
        return 0.0;
    }
    100.0 * own_points / (own_points + opponent_points)
}

/// Assemble the feature row of a driver-season from the aggregate tables.
///
/// Fails with `MissingAggregate` when any of the four rows is absent; the
/// caller decides whether that skips the driver-season or aborts.
pub fn assemble(store: &Store, driver_id: i64, year: i64) -> Result<DriverRatingFeatures> {
    let driver = store.require_driver(driver_id)?;

    let missing = |view: AggregateView| EtlError::MissingAggregate {
        view: view.table(),
        driver_id,
        year,
    };
    let own_season = store
        .season_results(Perspective::Driver, driver_id, year)?
        .ok_or_else(|| missing(AggregateView::DriverSeason))?;
    let own_round = store
        .round_results(Perspective::Driver, driver_id, year)?
        .ok_or_else(|| missing(AggregateView::DriverRound))?;
    let opponent_season = store
        .season_results(Perspective::Opponent, driver_id, year)?
        .ok_or_else(|| missing(AggregateView::OpponentSeason))?;
    let opponent_round = store
        .round_results(Perspective::Opponent, driver_id, year)?
        .ok_or_else(|| missing(AggregateView::OpponentRound))?;

    Ok(DriverRatingFeatures::from_aggregates(
        driver.name,
        driver.surname,
        &own_season,
        &own_round,
        &opponent_season,
        &opponent_round,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn season(points: f64) -> SeasonResults {
        SeasonResults {
            driver_id: 1,
            year: 2020,
            season_points: points,
            season_position: 2.0,
            wins: 3,
        }
    }

    fn round(avg_qualifying_position: f64, q3_appearances: i64) -> RoundResults {
        RoundResults {
            driver_id: 1,
            year: 2020,
            avg_qualifying_position,
            q2_appearances: 15,
            q3_appearances,
            pole_positions: 4,
            front_row_second: 2,
            podiums: 9,
            dnfs: 1,
        }
    }

    fn features(
        own_season: SeasonResults,
        own_round: RoundResults,
        opponent_season: SeasonResults,
        opponent_round: RoundResults,
    ) -> DriverRatingFeatures {
        DriverRatingFeatures::from_aggregates(
            "Lewis".to_string(),
            "Hamilton".to_string(),
            &own_season,
            &own_round,
            &opponent_season,
            &opponent_round,
        )
    }

    #[test]
    fn test_vector_order() {
        let row = features(season(300.0), round(2.5, 14), season(100.0), round(4.0, 10));
        assert_eq!(
            row.to_vector(),
            [3.0, 2.0, 2.5, 15.0, 14.0, 4.0, 2.0, 9.0, 1.0, 1.0, 75.0]
        );
        assert_eq!(FEATURE_NAMES[9], "head_to_head_qualifying");
    }

    #[test]
    fn test_head_to_head_lower_average_wins() {
        assert!(head_to_head_qualifying(&round(3.0, 0), &round(3.5, 20)));
        assert!(!head_to_head_qualifying(&round(3.5, 20), &round(3.0, 0)));
    }

    #[test]
    fn test_head_to_head_tie_uses_q3() {
        assert!(head_to_head_qualifying(&round(5.0, 8), &round(5.0, 6)));
        assert!(!head_to_head_qualifying(&round(5.0, 6), &round(5.0, 6)));
        assert!(!head_to_head_qualifying(&round(5.0, 5), &round(5.0, 6)));
    }

    #[test]
    fn test_percentage_constructor_points() {
        assert_eq!(percentage_constructor_points(0.0, 0.0), 0.0);
        assert_eq!(percentage_constructor_points(0.0, 40.0), 0.0);
        assert_eq!(percentage_constructor_points(30.0, 10.0), 75.0);
        assert_eq!(percentage_constructor_points(12.0, 0.0), 100.0);
    }

    #[test]
    fn test_assembly_is_deterministic() {
        let first = features(season(77.0), round(6.25, 3), season(23.0), round(6.25, 1));
        let second = features(season(77.0), round(6.25, 3), season(23.0), round(6.25, 1));
        assert_eq!(first, second);
        assert_eq!(first.to_vector(), second.to_vector());
    }

    #[test]
    fn test_assemble_requires_driver() {
        let store = Store::in_memory().unwrap();
        assert!(matches!(
            assemble(&store, 1, 2020),
            Err(EtlError::DriverNotFound(1))
        ));
    }

    #[test]
    fn test_assemble_missing_aggregate() {
        let mut store = Store::in_memory().unwrap();
        store
            .load(vec![Ok(crate::storage::Driver {
                id: 1,
                name: "Lewis".to_string(),
                surname: "Hamilton".to_string(),
            })])
            .unwrap();
        store.rebuild_views().unwrap();

        let err = assemble(&store, 1, 2020).unwrap_err();
        assert!(err.is_missing_aggregate());
        assert!(matches!(
            err,
            EtlError::MissingAggregate {
                view: "drivers_seasons_results",
                ..
            }
        ));
    }
}
