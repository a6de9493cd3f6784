//! Configuration for the F1 predictions pipeline.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::model::{Criterion, FitConfig, ModelKind};

/// Source data configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory holding the CSV exports
    #[serde(default = "default_data_dir")]
    pub dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("data/f1predictions.sqlite")
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

/// Model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_kind")]
    pub kind: ModelKind,
    #[serde(default = "default_test_size")]
    pub test_size: f64,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default)]
    pub criterion: Criterion,
    #[serde(default = "default_max_estimators")]
    pub max_estimators: usize,
}

fn default_kind() -> ModelKind {
    ModelKind::Linear
}

fn default_test_size() -> f64 {
    0.33
}

fn default_seed() -> u64 {
    1
}

fn default_max_depth() -> usize {
    12
}

fn default_max_estimators() -> usize {
    12
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            kind: default_kind(),
            test_size: default_test_size(),
            seed: default_seed(),
            max_depth: default_max_depth(),
            criterion: Criterion::default(),
            max_estimators: default_max_estimators(),
        }
    }
}

impl ModelConfig {
    pub fn fit_config(&self) -> FitConfig {
        FitConfig {
            kind: self.kind,
            test_size: self.test_size,
            seed: self.seed,
            max_depth: self.max_depth,
            criterion: self.criterion,
            max_estimators: self.max_estimators,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub model: ModelConfig,
}

impl AppConfig {
    /// Load configuration from environment and config file
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            // Start with defaults
            .add_source(config::Config::try_from(&AppConfig::default())?)
            // Add config file if exists
            .add_source(config::File::with_name("config").required(false))
            // Override with environment variables
            .add_source(environment())
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

/// `F1_<SECTION>__<KEY>`, e.g. `F1_DATABASE__PATH` or `F1_MODEL__TEST_SIZE`.
///
/// Sections and keys are split on a double underscore so that keys may
/// contain single ones.
fn environment() -> config::Environment {
    config::Environment::with_prefix("F1")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
