//! F1 Predictions
//!
//! CLI for loading Formula 1 history into SQLite and fitting the driver
//! rating model.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use f1_predictions::cli::{self, Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "f1_predictions=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Reload { data_dir, database } => cli::run_reload(data_dir, database),
        Commands::Views { database } => cli::run_views(database),
        Commands::Features {
            driver,
            year,
            format,
        } => cli::run_features(driver, year, format),
        Commands::Train { model, format } => cli::run_train(model, format),
        Commands::Predict {
            driver,
            year,
            model,
            format,
        } => cli::run_predict(driver, year, model, format),
    }
}
