//! Identity resolution: natural keys from the exports to surrogate ids.
//!
//! Lookup tables are built once per load phase, from rows already committed
//! to the store or from source rows, and then queried per record.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::error::{EtlError, Result};
use crate::extract::ResultRow;
use crate::storage::{DriverConstructor, Race, Round, Store};

/// (driver, constructor, year) to driver-constructor id.
#[derive(Debug, Default)]
pub struct DriverConstructorLookup {
    by_season: HashMap<(i64, i64, i64), i64>,
    by_pair: HashMap<(i64, i64), Vec<i64>>,
}

impl DriverConstructorLookup {
    pub fn new<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = DriverConstructor>,
    {
        let mut lookup = Self::default();
        for dc in rows {
            // Duplicate keys resolve to the first id seen
            let key = (dc.driver_id, dc.constructor_id, dc.year);
            if let Entry::Vacant(entry) = lookup.by_season.entry(key) {
                entry.insert(dc.id);
                lookup
                    .by_pair
                    .entry((dc.driver_id, dc.constructor_id))
                    .or_default()
                    .push(dc.id);
            }
        }
        lookup
    }

    pub fn from_store(store: &Store) -> Result<Self> {
        let lookup = Self::new(store.all::<DriverConstructor>()?);
        debug!("Driver constructor lookup: {} identities", lookup.len());
        Ok(lookup)
    }

    pub fn len(&self) -> usize {
        self.by_season.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_season.is_empty()
    }

    /// Resolve a driver driving for a constructor in a given season.
    pub fn resolve(&self, driver_id: i64, constructor_id: i64, year: i64) -> Result<i64> {
        self.by_season
            .get(&(driver_id, constructor_id, year))
            .copied()
            .ok_or(EtlError::UnresolvedIdentity {
                driver_id,
                constructor_id,
                year: Some(year),
            })
    }

    /// Resolve without a season.
    ///
    /// The caller asserts the pair occurs in a single season; a pair that
    /// spans several seasons is an error rather than an arbitrary pick.
    pub fn resolve_unique(&self, driver_id: i64, constructor_id: i64) -> Result<i64> {
        match self.by_pair.get(&(driver_id, constructor_id)).map(Vec::as_slice) {
            Some([id]) => Ok(*id),
            Some(ids) if !ids.is_empty() => Err(EtlError::AmbiguousIdentity {
                driver_id,
                constructor_id,
                candidates: ids.len(),
            }),
            _ => Err(EtlError::UnresolvedIdentity {
                driver_id,
                constructor_id,
                year: None,
            }),
        }
    }
}

/// Round (raceId) to its season and round number.
#[derive(Debug, Default)]
pub struct RoundLookup {
    rounds: HashMap<i64, (i64, i64)>,
}

impl RoundLookup {
    pub fn new<I>(rounds: I) -> Self
    where
        I: IntoIterator<Item = Round>,
    {
        let rounds = rounds
            .into_iter()
            .map(|r| (r.id, (r.year, r.round_number)))
            .collect();
        Self { rounds }
    }

    pub fn from_store(store: &Store) -> Result<Self> {
        let lookup = Self::new(store.all::<Round>()?);
        debug!("Round lookup: {} rounds", lookup.rounds.len());
        Ok(lookup)
    }

    pub fn year_of(&self, round_id: i64) -> Result<i64> {
        self.get(round_id).map(|(year, _)| year)
    }

    pub fn round_number_of(&self, round_id: i64) -> Result<i64> {
        self.get(round_id).map(|(_, number)| number)
    }

    fn get(&self, round_id: i64) -> Result<(i64, i64)> {
        self.rounds
            .get(&round_id)
            .copied()
            .ok_or_else(|| EtlError::UnresolvedReference {
                entity: "round",
                key: round_id.to_string(),
            })
    }

    /// Ids of the last round of every season, among the given rounds.
    ///
    /// Only rounds that actually appear are considered, so calendar entries
    /// not yet raced never shadow the latest one that was. Ids unknown to the
    /// lookup are kept so that resolving them fails downstream.
    pub fn final_rounds_among<I>(&self, round_ids: I) -> HashSet<i64>
    where
        I: IntoIterator<Item = i64>,
    {
        let mut last: HashMap<i64, (i64, i64)> = HashMap::new();
        let mut unknown = HashSet::new();
        for id in round_ids {
            match self.rounds.get(&id) {
                Some(&(year, number)) => {
                    let entry = last.entry(year).or_insert((number, id));
                    if number > entry.0 {
                        *entry = (number, id);
                    }
                }
                None => {
                    unknown.insert(id);
                }
            }
        }
        last.values().map(|&(_, id)| id).chain(unknown).collect()
    }
}

/// Race name to race id.
#[derive(Debug, Default)]
pub struct RaceLookup {
    by_name: HashMap<String, i64>,
}

impl RaceLookup {
    pub fn new<I>(races: I) -> Self
    where
        I: IntoIterator<Item = Race>,
    {
        let mut by_name = HashMap::new();
        for race in races {
            by_name.entry(race.name).or_insert(race.id);
        }
        Self { by_name }
    }

    pub fn from_store(store: &Store) -> Result<Self> {
        Ok(Self::new(store.all::<Race>()?))
    }

    pub fn resolve(&self, name: &str) -> Result<i64> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| EtlError::UnresolvedReference {
                entity: "race",
                key: name.to_string(),
            })
    }
}

/// Which constructor a driver drove for, derived from race results.
///
/// Lap times and standings carry no constructor; this fills it in.
#[derive(Debug, Default)]
pub struct RaceEntryLookup {
    by_round: HashMap<(i64, i64), i64>,
    // (driver, year) -> (round number, constructor) of the latest raced round
    by_season: HashMap<(i64, i64), (i64, i64)>,
}

impl RaceEntryLookup {
    pub fn new(results: &[ResultRow], rounds: &RoundLookup) -> Result<Self> {
        let mut lookup = Self::default();
        for row in results {
            lookup
                .by_round
                .entry((row.race_id, row.driver_id))
                .or_insert(row.constructor_id);

            let year = rounds.year_of(row.race_id)?;
            let number = rounds.round_number_of(row.race_id)?;
            let latest = lookup
                .by_season
                .entry((row.driver_id, year))
                .or_insert((number, row.constructor_id));
            if number > latest.0 {
                *latest = (number, row.constructor_id);
            }
        }
        debug!("Race entry lookup: {} entries", lookup.by_round.len());
        Ok(lookup)
    }

    /// Constructor a driver raced for in one round.
    pub fn constructor_in_round(&self, round_id: i64, driver_id: i64) -> Result<i64> {
        self.by_round
            .get(&(round_id, driver_id))
            .copied()
            .ok_or_else(|| EtlError::UnresolvedReference {
                entity: "race entry",
                key: format!("round {} driver {}", round_id, driver_id),
            })
    }

    /// Constructor of the driver's latest raced round in a season.
    pub fn constructor_in_season(&self, driver_id: i64, year: i64) -> Result<i64> {
        self.by_season
            .get(&(driver_id, year))
            .map(|&(_, constructor)| constructor)
            .ok_or_else(|| EtlError::UnresolvedReference {
                entity: "season entry",
                key: format!("driver {} year {}", driver_id, year),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dc(id: i64, driver_id: i64, constructor_id: i64, year: i64) -> DriverConstructor {
        DriverConstructor {
            id,
            driver_id,
            constructor_id,
            year,
        }
    }

    fn round(id: i64, year: i64, round_number: i64) -> Round {
        Round {
            id,
            year,
            round_number,
            race_id: 1,
        }
    }

    fn result(race_id: i64, driver_id: i64, constructor_id: i64) -> ResultRow {
        ResultRow {
            result_id: race_id * 100 + driver_id,
            race_id,
            driver_id,
            constructor_id,
            position: Some("1".to_string()),
            points: 0.0,
            fastest_lap_time: None,
            fastest_lap_speed: None,
            status_id: 1,
        }
    }

    #[test]
    fn test_resolve_driver_constructor() {
        let lookup = DriverConstructorLookup::new(vec![dc(5, 1, 2, 2020)]);
        assert_eq!(lookup.resolve(1, 2, 2020).unwrap(), 5);
        assert!(matches!(
            lookup.resolve(1, 2, 2021),
            Err(EtlError::UnresolvedIdentity {
                year: Some(2021),
                ..
            })
        ));
    }

    #[test]
    fn test_resolve_tolerates_duplicates() {
        let lookup = DriverConstructorLookup::new(vec![dc(5, 1, 2, 2020), dc(9, 1, 2, 2020)]);
        assert_eq!(lookup.len(), 1);
        assert_eq!(lookup.resolve(1, 2, 2020).unwrap(), 5);
    }

    #[test]
    fn test_resolve_unique_without_year() {
        let lookup = DriverConstructorLookup::new(vec![
            dc(1, 1, 2, 2019),
            dc(2, 1, 2, 2020),
            dc(3, 4, 2, 2020),
        ]);
        assert_eq!(lookup.resolve_unique(4, 2).unwrap(), 3);
        assert!(matches!(
            lookup.resolve_unique(1, 2),
            Err(EtlError::AmbiguousIdentity { candidates: 2, .. })
        ));
        assert!(matches!(
            lookup.resolve_unique(7, 2),
            Err(EtlError::UnresolvedIdentity { year: None, .. })
        ));
    }

    #[test]
    fn test_round_lookup() {
        let lookup = RoundLookup::new(vec![
            round(10, 2020, 1),
            round(11, 2020, 2),
            round(20, 2021, 1),
        ]);
        assert_eq!(lookup.year_of(11).unwrap(), 2020);
        assert!(lookup.year_of(99).is_err());

        let finals = lookup.final_rounds_among([10, 11, 20]);
        assert_eq!(finals.len(), 2);
        assert!(finals.contains(&11));
        assert!(finals.contains(&20));
    }

    #[test]
    fn test_final_rounds_ignore_unraced_calendar() {
        // Round 12 is on the 2020 calendar but has no standings yet
        let lookup = RoundLookup::new(vec![
            round(10, 2020, 1),
            round(11, 2020, 2),
            round(12, 2020, 3),
        ]);

        let finals = lookup.final_rounds_among([10, 11, 10, 11]);
        assert_eq!(finals.len(), 1);
        assert!(finals.contains(&11));

        // Unknown ids stay in so they fail resolution later
        assert!(lookup.final_rounds_among([99]).contains(&99));
    }

    #[test]
    fn test_race_lookup() {
        let lookup = RaceLookup::new(vec![Race {
            id: 3,
            name: "Monaco Grand Prix".to_string(),
            circuit_id: 6,
        }]);
        assert_eq!(lookup.resolve("Monaco Grand Prix").unwrap(), 3);
        assert!(lookup.resolve("Dallas Grand Prix").is_err());
    }

    #[test]
    fn test_race_entry_lookup() {
        let rounds = RoundLookup::new(vec![round(10, 2020, 1), round(11, 2020, 2)]);
        // Driver 1 switches from constructor 2 to 3 mid-season
        let results = vec![result(10, 1, 2), result(11, 1, 3)];
        let lookup = RaceEntryLookup::new(&results, &rounds).unwrap();

        assert_eq!(lookup.constructor_in_round(10, 1).unwrap(), 2);
        assert_eq!(lookup.constructor_in_season(1, 2020).unwrap(), 3);
        assert!(lookup.constructor_in_round(10, 5).is_err());
        assert!(lookup.constructor_in_season(1, 2019).is_err());
    }
}
