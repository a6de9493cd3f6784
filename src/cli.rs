//! CLI commands for f1-predictions.
//!
//! Loads the CSV exports, rebuilds the aggregates, prints feature rows and
//! fits the driver rating model.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use crate::config::AppConfig;
use crate::extract::DataSources;
use crate::features::{assemble, DriverRatingFeatures, FEATURE_NAMES};
use crate::model::{Criterion, Metrics, ModelKind, ModelReport};
use crate::pipeline::{rebuild_views, reload_all, train, LoadSummary};
use crate::storage::Store;

#[derive(Parser)]
#[command(name = "f1-predictions")]
#[command(version, about = "F1 historical data ETL and driver rating model", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Drop the database and reload every entity from the CSV exports
    Reload {
        /// Directory holding the CSV exports
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// SQLite database path override
        #[arg(long)]
        database: Option<PathBuf>,
    },

    /// Rebuild the aggregate tables
    Views {
        /// SQLite database path override
        #[arg(long)]
        database: Option<PathBuf>,
    },

    /// Print the feature row of one driver-season
    Features {
        /// Driver id
        #[arg(short, long)]
        driver: i64,

        /// Season
        #[arg(short, long)]
        year: i64,

        /// Output format (json, table)
        #[arg(short, long, default_value = "json")]
        format: String,
    },

    /// Fit the rating model on the stored labels and print its metrics
    Train {
        #[command(flatten)]
        model: ModelArgs,

        /// Output format (json, table)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Fit the rating model, then predict one driver-season
    Predict {
        /// Driver id
        #[arg(short, long)]
        driver: i64,

        /// Season
        #[arg(short, long)]
        year: i64,

        #[command(flatten)]
        model: ModelArgs,

        /// Output format (json, table)
        #[arg(short, long, default_value = "json")]
        format: String,
    },
}

/// Model overrides shared by `train` and `predict`
#[derive(clap::Args)]
pub struct ModelArgs {
    /// Model kind
    #[arg(short, long, value_enum)]
    pub kind: Option<ModelKind>,

    /// Held-out fraction in [0, 1)
    #[arg(long)]
    pub test_size: Option<f64>,

    /// Shuffle seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Upper bound of the tree depth search
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Tree split quality
    #[arg(long, value_enum)]
    pub criterion: Option<Criterion>,

    /// Upper bound of the forest size search
    #[arg(long)]
    pub max_estimators: Option<usize>,
}

impl ModelArgs {
    fn apply(self, config: &mut AppConfig) {
        if let Some(kind) = self.kind {
            config.model.kind = kind;
        }
        if let Some(test_size) = self.test_size {
            config.model.test_size = test_size;
        }
        if let Some(seed) = self.seed {
            config.model.seed = seed;
        }
        if let Some(max_depth) = self.max_depth {
            config.model.max_depth = max_depth;
        }
        if let Some(criterion) = self.criterion {
            config.model.criterion = criterion;
        }
        if let Some(max_estimators) = self.max_estimators {
            config.model.max_estimators = max_estimators;
        }
    }
}

/// Reload every entity from the CSV exports.
pub fn run_reload(data_dir: Option<PathBuf>, database: Option<PathBuf>) -> anyhow::Result<()> {
    let mut config = AppConfig::load()?;
    if let Some(dir) = data_dir {
        config.data.dir = dir;
    }
    if let Some(path) = database {
        config.database.path = path;
    }

    eprintln!("Loading CSV exports from: {}", config.data.dir.display());
    let mut store = Store::open(&config.database.path)?;
    let summary = reload_all(&mut store, &DataSources::new(&config.data.dir))?;
    print_summary(&summary);

    Ok(())
}

fn print_summary(summary: &LoadSummary) {
    println!("=== Loaded ===");
    for phase in &summary.phases {
        println!("  {:<28} {:>8}", phase.table, phase.records);
    }
    println!("  {:<28} {:>8}", "total", summary.total());
}

/// Rebuild the aggregate tables.
pub fn run_views(database: Option<PathBuf>) -> anyhow::Result<()> {
    let mut config = AppConfig::load()?;
    if let Some(path) = database {
        config.database.path = path;
    }

    let mut store = Store::open(&config.database.path)?;
    rebuild_views(&mut store)?;
    eprintln!("Aggregate tables rebuilt");

    Ok(())
}

/// Print the feature row of one driver-season.
pub fn run_features(driver: i64, year: i64, format: String) -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let store = Store::open(&config.database.path)?;
    let row = assemble(&store, driver, year)?;

    match format.as_str() {
        "table" => print_features(&row),
        "json" => println!("{}", serde_json::to_string_pretty(&row)?),
        _ => {
            eprintln!("Unknown format: {}. Using JSON.", format);
            println!("{}", serde_json::to_string_pretty(&row)?);
        }
    }

    Ok(())
}

fn print_features(row: &DriverRatingFeatures) {
    println!("{} {} ({}), {}", row.name, row.surname, row.driver_id, row.year);
    println!();
    for (name, value) in FEATURE_NAMES.iter().zip(row.to_vector()) {
        println!("  {:<30} {:>10.3}", name, value);
    }
}

/// Fit the model and print its metrics.
pub fn run_train(model: ModelArgs, format: String) -> anyhow::Result<()> {
    let mut config = AppConfig::load()?;
    model.apply(&mut config);

    let store = Store::open(&config.database.path)?;
    eprintln!("Fitting {:?} model...", config.model.kind);
    let fitted = train(&store, &config.model.fit_config())?;
    let report = fitted.report();

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(report)?),
        "table" | _ => print_report(report),
    }

    Ok(())
}

fn print_report(report: &ModelReport) {
    println!("=== {:?} ===", report.kind);
    println!("  Train rows: {}", report.train_rows);
    println!("  Test rows:  {}", report.test_rows);
    match report.metrics {
        Metrics::Regression { r2, mae } => {
            println!("  R2:         {:.4}", r2);
            println!("  MAE:        {:.4}", mae);
        }
        Metrics::Classification {
            accuracy,
            max_depth,
        } => {
            println!("  Accuracy:   {:.2}%", accuracy * 100.0);
            println!("  Depth:      {}", max_depth);
        }
        Metrics::Ensemble {
            accuracy,
            n_estimators,
        } => {
            println!("  Accuracy:   {:.2}%", accuracy * 100.0);
            println!("  Trees:      {}", n_estimators);
        }
    }
}

#[derive(Serialize)]
struct Prediction<'a> {
    driver_id: i64,
    name: &'a str,
    surname: &'a str,
    year: i64,
    kind: ModelKind,
    prediction: f64,
    report: &'a ModelReport,
}

/// Fit the model, then predict one driver-season.
pub fn run_predict(driver: i64, year: i64, model: ModelArgs, format: String) -> anyhow::Result<()> {
    let mut config = AppConfig::load()?;
    model.apply(&mut config);

    let store = Store::open(&config.database.path)?;
    let row = assemble(&store, driver, year)?;
    let fitted = train(&store, &config.model.fit_config())?;

    let prediction = Prediction {
        driver_id: row.driver_id,
        name: &row.name,
        surname: &row.surname,
        year: row.year,
        kind: config.model.kind,
        prediction: fitted.predict(&row.to_vector()),
        report: fitted.report(),
    };

    match format.as_str() {
        "table" => {
            println!(
                "{} {} ({}): predicted {} {:.3}",
                prediction.name,
                prediction.surname,
                prediction.year,
                config.model.kind.label(),
                prediction.prediction
            );
            print_report(prediction.report);
        }
        _ => println!("{}", serde_json::to_string_pretty(&prediction)?),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_train_overrides() {
        let cli = Cli::try_parse_from([
            "f1-predictions",
            "train",
            "--kind",
            "decision_tree",
            "--max-depth",
            "5",
        ])
        .unwrap();

        let Commands::Train { model, format } = cli.command else {
            panic!("expected train");
        };
        assert_eq!(format, "table");

        let mut config = AppConfig::default();
        model.apply(&mut config);
        assert_eq!(config.model.kind, ModelKind::DecisionTree);
        assert_eq!(config.model.max_depth, 5);
        assert_eq!(config.model.test_size, 0.33);
    }

    #[test]
    fn test_parse_forest_overrides() {
        let cli = Cli::try_parse_from([
            "f1-predictions",
            "train",
            "--kind",
            "random_forest",
            "--criterion",
            "entropy",
            "--max-estimators",
            "8",
        ])
        .unwrap();

        let Commands::Train { model, .. } = cli.command else {
            panic!("expected train");
        };
        let mut config = AppConfig::default();
        model.apply(&mut config);
        assert_eq!(config.model.kind, ModelKind::RandomForest);
        assert_eq!(config.model.criterion, Criterion::Entropy);
        assert_eq!(config.model.max_estimators, 8);
        assert_eq!(config.model.max_depth, 12);
    }

    #[test]
    fn test_parse_features() {
        let cli = Cli::try_parse_from([
            "f1-predictions",
            "features",
            "--driver",
            "1",
            "--year",
            "2020",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Features {
                driver: 1,
                year: 2020,
                ..
            }
        ));
    }
}
