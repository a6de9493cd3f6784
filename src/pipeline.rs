//! Pipeline entry points: full reload, view rebuild and training-set build.

use serde::Serialize;
use tracing::{info, warn};

use crate::error::Result;
use crate::extract::{
    CircuitRow, ConstructorResultRow, ConstructorRow, ConstructorStandingRow, DataSources,
    DriverCategoryRow, DriverRatingRow, DriverRow, DriverStandingRow, LapTimeRow, QualifyingRow,
    RaceRow, ResultRow, SourceRow, StatusRow,
};
use crate::features::assemble;
use crate::identity::{DriverConstructorLookup, RaceEntryLookup, RaceLookup, RoundLookup};
use crate::model::{fit, FitConfig, ModelKind, RatingModel, TrainingSet};
use crate::storage::{DriverCategory, DriverRating, Entity, Store};
use crate::transform::{self, EntryKey};

/// Records committed per load phase, in load order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadSummary {
    pub phases: Vec<PhaseCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PhaseCount {
    pub table: &'static str,
    pub records: usize,
}

impl LoadSummary {
    pub fn records(&self, table: &str) -> Option<usize> {
        self.phases
            .iter()
            .find(|p| p.table == table)
            .map(|p| p.records)
    }

    pub fn total(&self) -> usize {
        self.phases.iter().map(|p| p.records).sum()
    }
}

fn load_phase<E, I>(store: &mut Store, summary: &mut LoadSummary, records: I) -> Result<()>
where
    E: Entity,
    I: IntoIterator<Item = Result<E>>,
{
    let records = store.load(records)?;
    summary.phases.push(PhaseCount {
        table: E::TABLE,
        records,
    });
    Ok(())
}

/// Drop everything and load every entity from the CSV exports.
///
/// Phases run in dependency order, each in its own transaction. Lookups for
/// dependent phases are read back from what earlier phases committed.
pub fn reload_all(store: &mut Store, sources: &DataSources) -> Result<LoadSummary> {
    store.reset_schema()?;
    let mut summary = LoadSummary::default();

    // Reference data
    load_phase(
        store,
        &mut summary,
        transform::drivers(sources.extract::<DriverRow>()?),
    )?;
    load_phase(
        store,
        &mut summary,
        transform::circuits(sources.extract::<CircuitRow>()?),
    )?;
    load_phase(
        store,
        &mut summary,
        transform::statuses(sources.extract::<StatusRow>()?),
    )?;
    load_phase(
        store,
        &mut summary,
        transform::constructors(sources.extract::<ConstructorRow>()?),
    )?;

    // Calendar
    let race_rows = sources.extract::<RaceRow>()?;
    load_phase(store, &mut summary, transform::races(race_rows.clone()))?;
    let races = RaceLookup::from_store(store)?;
    load_phase(store, &mut summary, transform::rounds(race_rows, &races))?;
    let rounds = RoundLookup::from_store(store)?;

    // Identities
    let result_rows = sources.extract::<ResultRow>()?;
    let qualifying_rows = sources.extract::<QualifyingRow>()?;
    let entries: Vec<EntryKey> = result_rows
        .iter()
        .map(EntryKey::from)
        .chain(qualifying_rows.iter().map(EntryKey::from))
        .collect();
    load_phase(
        store,
        &mut summary,
        transform::driver_constructors(entries, &rounds),
    )?;
    let identities = DriverConstructorLookup::from_store(store)?;
    let race_entries = RaceEntryLookup::new(&result_rows, &rounds)?;

    // Facts
    load_phase(
        store,
        &mut summary,
        transform::race_driver_results(result_rows, &rounds, &identities),
    )?;
    load_phase(
        store,
        &mut summary,
        transform::race_constructor_results(sources.extract::<ConstructorResultRow>()?),
    )?;
    load_phase(
        store,
        &mut summary,
        transform::qualifying_results(qualifying_rows, &rounds, &identities),
    )?;
    load_phase(
        store,
        &mut summary,
        transform::lap_times(
            sources.extract::<LapTimeRow>()?,
            &rounds,
            &race_entries,
            &identities,
        ),
    )?;
    load_phase(
        store,
        &mut summary,
        transform::driver_standings(
            sources.extract::<DriverStandingRow>()?,
            &rounds,
            &race_entries,
            &identities,
        ),
    )?;
    load_phase(
        store,
        &mut summary,
        transform::constructor_standings(sources.extract::<ConstructorStandingRow>()?, &rounds),
    )?;

    // Labels are optional
    if has_source::<DriverRatingRow>(sources) {
        load_phase(
            store,
            &mut summary,
            transform::driver_ratings(sources.extract::<DriverRatingRow>()?),
        )?;
    }
    if has_source::<DriverCategoryRow>(sources) {
        load_phase(
            store,
            &mut summary,
            transform::driver_categories(sources.extract::<DriverCategoryRow>()?),
        )?;
    }

    info!(
        "Reload complete: {} records in {} phases",
        summary.total(),
        summary.phases.len()
    );
    Ok(summary)
}

fn has_source<R: SourceRow>(sources: &DataSources) -> bool {
    let present = sources.has::<R>();
    if !present {
        warn!(
            "{} not found, skipping",
            sources.path(R::FILE).display()
        );
    }
    present
}

/// Drop and rebuild the four aggregate tables.
pub fn rebuild_views(store: &mut Store) -> Result<()> {
    store.rebuild_views()
}

/// One feature row per stored label of the model's kind.
///
/// Driver-seasons with a missing aggregate are skipped; any other failure
/// aborts.
pub fn build_training_set(store: &Store, kind: ModelKind) -> Result<TrainingSet> {
    let labels: Vec<(i64, i64, f64)> = match kind {
        ModelKind::Linear => store
            .all::<DriverRating>()?
            .into_iter()
            .map(|r| (r.driver_id, r.year, r.rating))
            .collect(),
        ModelKind::DecisionTree | ModelKind::RandomForest => store
            .all::<DriverCategory>()?
            .into_iter()
            .map(|c| (c.driver_id, c.year, c.category as f64))
            .collect(),
    };

    let mut set = TrainingSet::default();
    for (driver_id, year, target) in labels {
        match assemble(store, driver_id, year) {
            Ok(row) => set.push(row, target),
            Err(e) if e.is_missing_aggregate() => {
                warn!("Skipping driver {} in {}: {}", driver_id, year, e);
            }
            Err(e) => return Err(e),
        }
    }
    info!(
        "Training set: {} rows with {} labels",
        set.len(),
        kind.label()
    );
    Ok(set)
}

/// Build the training set and fit the configured model.
pub fn train(store: &Store, config: &FitConfig) -> Result<RatingModel> {
    let set = build_training_set(store, config.kind)?;
    let (x, y) = set.to_arrays();
    fit(config, &x, &y)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::fs;
    use std::path::Path;

    /// A two-round 2020 season: drivers 1 and 2 share constructor 1,
    /// driver 3 races alone for constructor 2.
    pub fn write_season(dir: &Path) {
        let files: [(&str, &str); 12] = [
            (
                "drivers.csv",
                "driverId,driverRef,forename,surname\n\
                 1,hamilton,Lewis,Hamilton\n\
                 2,bottas,Valtteri,Bottas\n\
                 3,verstappen,Max,Verstappen\n",
            ),
            ("constructors.csv", "constructorId,name\n1,Mercedes\n2,Red Bull\n"),
            ("status.csv", "statusId,status\n1,Finished\n5,Engine\n11,+1 Lap\n"),
            ("circuits.csv", "circuitId,name\n1,Red Bull Ring\n"),
            (
                "races.csv",
                "raceId,year,round,circuitId,name\n\
                 1,2020,1,1,Austrian Grand Prix\n\
                 2,2020,2,1,Styrian Grand Prix\n",
            ),
            (
                "results.csv",
                "resultId,raceId,driverId,constructorId,position,points,fastestLapTime,fastestLapSpeed,statusId\n\
                 1,1,2,1,1,25,1:07.657,230.100,1\n\
                 2,1,1,1,4,12,1:07.712,229.900,11\n\
                 3,1,3,2,\\N,0,\\N,\\N,5\n\
                 4,2,1,1,1,26,1:05.619,237.200,1\n\
                 5,2,2,1,3,15,1:06.719,233.000,1\n\
                 6,2,3,2,2,18,1:06.145,235.000,1\n",
            ),
            (
                "constructor_results.csv",
                "constructorResultsId,raceId,constructorId,points\n\
                 1,1,1,37\n\
                 2,1,2,0\n\
                 3,2,1,41\n\
                 4,2,2,18\n",
            ),
            (
                "qualifying.csv",
                "qualifyId,raceId,driverId,constructorId,position,q1,q2,q3\n\
                 1,1,2,1,1,1:04.111,1:03.015,1:02.939\n\
                 2,1,1,1,2,1:04.198,1:03.096,1:02.951\n\
                 3,1,3,2,3,1:04.024,1:03.590,1:03.477\n\
                 4,2,1,1,1,1:18.188,1:17.825,1:19.273\n\
                 5,2,3,2,2,1:17.938,1:17.825,1:19.690\n\
                 6,2,2,1,3,1:17.825,\\N,\\N\n",
            ),
            (
                "lap_times.csv",
                "raceId,driverId,lap,position,time,milliseconds\n\
                 1,1,1,4,1:13.000,73000\n\
                 1,2,1,1,1:12.500,72500\n\
                 2,3,1,2,1:10.300,70300\n",
            ),
            (
                "driver_standings.csv",
                "driverStandingsId,raceId,driverId,points,position,wins\n\
                 1,1,2,25,1,1\n\
                 2,1,1,12,4,0\n\
                 3,1,3,0,10,0\n\
                 4,2,1,38,2,1\n\
                 5,2,2,40,1,1\n\
                 6,2,3,18,5,0\n",
            ),
            (
                "constructor_standings.csv",
                "constructorStandingsId,raceId,constructorId,points,position,wins\n\
                 1,1,1,37,1,1\n\
                 2,1,2,0,5,0\n\
                 3,2,1,78,1,2\n\
                 4,2,2,18,3,0\n",
            ),
            (
                "driver_ratings.csv",
                "driverId,year,rating\n1,2020,9.1\n2,2020,8.2\n3,2020,9.0\n",
            ),
        ];
        for (name, content) in files {
            fs::write(dir.join(name), content).unwrap();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EtlError;
    use crate::storage::{
        Driver, DriverConstructor, LapTime, Perspective, QualifyingResult,
        RaceConstructorStandings, RaceDriverResult, RaceDriverStandings, Round,
    };

    fn loaded_store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        fixtures::write_season(dir.path());
        let mut store = Store::in_memory().unwrap();
        reload_all(&mut store, &DataSources::new(dir.path())).unwrap();
        (dir, store)
    }

    #[test]
    fn test_drivers_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        fixtures::write_season(dir.path());
        let sources = DataSources::new(dir.path());
        let mut store = Store::in_memory().unwrap();

        store
            .load(transform::drivers(sources.extract::<DriverRow>().unwrap()))
            .unwrap();

        let drivers: Vec<Driver> = store.all().unwrap();
        assert_eq!(drivers.len(), 3);
        assert!(drivers.contains(&Driver {
            id: 3,
            name: "Max".to_string(),
            surname: "Verstappen".to_string(),
        }));
    }

    #[test]
    fn test_reload_all_counts() {
        let (_dir, store) = loaded_store();

        assert_eq!(store.count::<Round>().unwrap(), 2);
        assert_eq!(store.count::<DriverConstructor>().unwrap(), 3);
        assert_eq!(store.count::<RaceDriverResult>().unwrap(), 6);
        assert_eq!(store.count::<QualifyingResult>().unwrap(), 6);
        assert_eq!(store.count::<LapTime>().unwrap(), 3);
        // Only the final round's standings are kept
        assert_eq!(store.count::<RaceDriverStandings>().unwrap(), 3);
        assert_eq!(store.count::<RaceConstructorStandings>().unwrap(), 2);
        assert_eq!(store.count::<DriverRating>().unwrap(), 3);
        // No categories file in the fixture
        assert_eq!(store.count::<DriverCategory>().unwrap(), 0);
    }

    #[test]
    fn test_reload_summary_order() {
        let dir = tempfile::tempdir().unwrap();
        fixtures::write_season(dir.path());
        let mut store = Store::in_memory().unwrap();
        let summary = reload_all(&mut store, &DataSources::new(dir.path())).unwrap();

        let tables: Vec<&str> = summary.phases.iter().map(|p| p.table).collect();
        assert_eq!(
            tables,
            vec![
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
            ]
        );
        assert_eq!(summary.records("race"), Some(2));
        assert_eq!(summary.records("driver_category"), None);
    }

    #[test]
    fn test_reload_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        fixtures::write_season(dir.path());
        let sources = DataSources::new(dir.path());
        let mut store = Store::in_memory().unwrap();

        reload_all(&mut store, &sources).unwrap();
        rebuild_views(&mut store).unwrap();
        let drivers: Vec<Driver> = store.all().unwrap();
        let results: Vec<RaceDriverResult> = store.all().unwrap();
        let laps: Vec<LapTime> = store.all().unwrap();
        let standings: Vec<RaceDriverStandings> = store.all().unwrap();
        let season = store.season_results(Perspective::Driver, 1, 2020).unwrap();

        reload_all(&mut store, &sources).unwrap();
        rebuild_views(&mut store).unwrap();
        assert_eq!(store.all::<Driver>().unwrap(), drivers);
        assert_eq!(store.all::<RaceDriverResult>().unwrap(), results);
        assert_eq!(store.all::<LapTime>().unwrap(), laps);
        assert_eq!(store.all::<RaceDriverStandings>().unwrap(), standings);
        assert_eq!(
            store.season_results(Perspective::Driver, 1, 2020).unwrap(),
            season
        );
    }

    #[test]
    fn test_reload_with_unraced_calendar_round() {
        let dir = tempfile::tempdir().unwrap();
        fixtures::write_season(dir.path());
        let races = dir.path().join("races.csv");
        let mut calendar = std::fs::read_to_string(&races).unwrap();
        calendar.push_str("3,2020,3,1,Hungarian Grand Prix\n");
        std::fs::write(&races, calendar).unwrap();

        let mut store = Store::in_memory().unwrap();
        reload_all(&mut store, &DataSources::new(dir.path())).unwrap();
        rebuild_views(&mut store).unwrap();

        assert_eq!(store.count::<Round>().unwrap(), 3);
        // Standings still come from round 2, the last one raced
        assert_eq!(store.count::<RaceDriverStandings>().unwrap(), 3);
        assert_eq!(store.count::<RaceConstructorStandings>().unwrap(), 2);
        assert_eq!(assemble(&store, 1, 2020).unwrap().wins, 1);
        assert_eq!(build_training_set(&store, ModelKind::Linear).unwrap().len(), 2);
    }

    #[test]
    fn test_reload_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        fixtures::write_season(dir.path());
        std::fs::remove_file(dir.path().join("qualifying.csv")).unwrap();
        let mut store = Store::in_memory().unwrap();

        let err = reload_all(&mut store, &DataSources::new(dir.path())).unwrap_err();
        assert!(matches!(err, EtlError::SourceNotFound(_)));
        // Phases committed before the failure remain
        assert_eq!(store.count::<Round>().unwrap(), 2);
    }

    #[test]
    fn test_features_end_to_end() {
        let (_dir, mut store) = loaded_store();
        rebuild_views(&mut store).unwrap();

        let row = assemble(&store, 1, 2020).unwrap();
        assert_eq!(row.surname, "Hamilton");
        assert_eq!(row.wins, 1);
        assert_eq!(row.season_position, 2.0);
        assert_eq!(row.avg_qualifying_position, 1.5);
        assert_eq!(row.q3_appearances, 2);
        assert_eq!(row.pole_positions, 1);
        assert_eq!(row.front_row_second, 1);
        assert_eq!(row.podiums, 1);
        assert_eq!(row.dnfs, 0);
        assert!(row.head_to_head_qualifying);
        assert!((row.percentage_constructor_points - 100.0 * 38.0 / 78.0).abs() < 1e-9);

        let teammate = assemble(&store, 2, 2020).unwrap();
        assert_eq!(teammate.q2_appearances, 1);
        assert_eq!(teammate.podiums, 2);
        assert!(!teammate.head_to_head_qualifying);
    }

    #[test]
    fn test_features_without_teammate() {
        let (_dir, mut store) = loaded_store();
        rebuild_views(&mut store).unwrap();

        let err = assemble(&store, 3, 2020).unwrap_err();
        assert!(err.is_missing_aggregate());
    }

    #[test]
    fn test_build_training_set_skips_unfeaturizable() {
        let (_dir, mut store) = loaded_store();
        rebuild_views(&mut store).unwrap();

        let set = build_training_set(&store, ModelKind::Linear).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.targets, vec![9.1, 8.2]);

        let (x, y) = set.to_arrays();
        assert_eq!(x.dim(), (2, crate::features::FEATURE_COUNT));
        assert_eq!(y.len(), 2);

        // No category labels loaded
        for kind in [ModelKind::DecisionTree, ModelKind::RandomForest] {
            assert!(build_training_set(&store, kind).unwrap().is_empty());
        }
    }
}
