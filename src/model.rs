//! Driver rating model: fitting and inference.
//!
//! The regressor predicts the numeric rating, the classifiers the rating
//! category. All train on the feature rows of labelled driver-seasons.

use clap::ValueEnum;
use linfa::prelude::*;
use linfa_ensemble::{EnsembleLearner, EnsembleLearnerParams};
use linfa_linear::{FittedLinearRegression, LinearRegression};
use linfa_trees::{DecisionTree, SplitQuality};
use ndarray::{arr2, Array1, Array2, Ix1};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{EtlError, Result};
use crate::features::{DriverRatingFeatures, FEATURE_COUNT};

/// Model family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Ordinary least squares on the rating
    #[value(name = "linear")]
    Linear,
    /// Classification tree on the rating category
    #[value(name = "decision_tree")]
    DecisionTree,
    /// Bagged classification trees on the rating category
    #[value(name = "random_forest")]
    RandomForest,
}

impl ModelKind {
    /// Label table the model trains on
    pub fn label(&self) -> &'static str {
        match self {
            ModelKind::Linear => "rating",
            ModelKind::DecisionTree | ModelKind::RandomForest => "category",
        }
    }
}

/// Split quality measure of the tree kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    #[default]
    Gini,
    Entropy,
}

impl From<Criterion> for SplitQuality {
    fn from(criterion: Criterion) -> Self {
        match criterion {
            Criterion::Gini => SplitQuality::Gini,
            Criterion::Entropy => SplitQuality::Entropy,
        }
    }
}

/// Fitting parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitConfig {
    pub kind: ModelKind,
    /// Held-out fraction in `[0, 1)`; 0 trains and scores on every row
    pub test_size: f64,
    /// Shuffle and bootstrap seed
    pub seed: u64,
    /// Tree depths `1..max_depth` are tried
    pub max_depth: usize,
    pub criterion: Criterion,
    /// Ensemble sizes `1..max_estimators` are tried
    pub max_estimators: usize,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            kind: ModelKind::Linear,
            test_size: 0.33,
            seed: 1,
            max_depth: 12,
            criterion: Criterion::Gini,
            max_estimators: 12,
        }
    }
}

/// Labelled feature rows.
#[derive(Debug, Clone, Default)]
pub struct TrainingSet {
    pub rows: Vec<DriverRatingFeatures>,
    pub targets: Vec<f64>,
}

impl TrainingSet {
    pub fn push(&mut self, row: DriverRatingFeatures, target: f64) {
        self.rows.push(row);
        self.targets.push(target);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Feature matrix of shape (rows, FEATURE_COUNT) and target vector
    pub fn to_arrays(&self) -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((self.rows.len(), FEATURE_COUNT), |(i, j)| {
            self.rows[i].to_vector()[j]
        });
        (x, Array1::from(self.targets.clone()))
    }
}

/// Held-out scores.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Metrics {
    Regression { r2: f64, mae: f64 },
    Classification { accuracy: f64, max_depth: usize },
    Ensemble { accuracy: f64, n_estimators: usize },
}

/// Summary of a fit, printed by the CLI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelReport {
    pub kind: ModelKind,
    pub train_rows: usize,
    pub test_rows: usize,
    pub metrics: Metrics,
}

/// Feature rows with one target per row.
type Samples<E> = Dataset<f64, E, Ix1>;

enum Fitted {
    Linear(FittedLinearRegression<f64>),
    Tree(DecisionTree<f64, usize>),
    Forest(EnsembleLearner<DecisionTree<f64, usize>>),
}

/// A fitted model with its evaluation.
pub struct RatingModel {
    fitted: Fitted,
    report: ModelReport,
}

impl RatingModel {
    pub fn report(&self) -> &ModelReport {
        &self.report
    }

    /// Predict the rating (or category) of one feature row.
    pub fn predict(&self, features: &[f64; FEATURE_COUNT]) -> f64 {
        let x = arr2(&[*features]);
        match &self.fitted {
            Fitted::Linear(model) => model.predict(&x)[0],
            Fitted::Tree(model) => model.predict(&x)[0] as f64,
            Fitted::Forest(model) => {
                let votes: Array1<usize> = model.predict(&x);
                votes[0] as f64
            }
        }
    }
}

/// Fit a model of the configured kind on `x` (rows × features) and `y`.
pub fn fit(config: &FitConfig, x: &Array2<f64>, y: &Array1<f64>) -> Result<RatingModel> {
    if !(0.0..1.0).contains(&config.test_size) {
        return Err(EtlError::InvalidConfig(format!(
            "test_size must be in [0, 1), got {}",
            config.test_size
        )));
    }
    if x.nrows() != y.len() {
        return Err(EtlError::Model(format!(
            "{} feature rows but {} targets",
            x.nrows(),
            y.len()
        )));
    }
    if x.nrows() < 2 {
        return Err(EtlError::InsufficientData(format!(
            "{} labelled rows, need at least 2",
            x.nrows()
        )));
    }

    let dataset: Samples<f64> = Dataset::new(x.to_owned(), y.to_owned());
    let model = match config.kind {
        ModelKind::Linear => {
            let (train, test) = split(dataset, config.test_size, config.seed);
            fit_regressor(&train, &test)?
        }
        ModelKind::DecisionTree => {
            let (train, test) = split(categories(dataset)?, config.test_size, config.seed);
            fit_tree(&train, &test, config)?
        }
        ModelKind::RandomForest => {
            let (train, test) = split(categories(dataset)?, config.test_size, config.seed);
            fit_forest(&train, &test, config)?
        }
    };
    info!("Fitted {:?} model: {:?}", config.kind, model.report.metrics);
    Ok(model)
}

/// Seeded shuffle, then a train/test split.
///
/// The training side holds `ceil(n * (1 - test_size))` rows, clamped so that
/// both sides keep at least one. A zero `test_size` scores on the training rows.
fn split<E: Copy + 'static>(
    dataset: Samples<E>,
    test_size: f64,
    seed: u64,
) -> (Samples<E>, Samples<E>) {
    let rows = dataset.nsamples();
    let mut rng = StdRng::seed_from_u64(seed);
    let shuffled = dataset.shuffle(&mut rng);
    if test_size == 0.0 {
        return (shuffled.clone(), shuffled);
    }

    let n_train = ((rows as f64 * (1.0 - test_size)).ceil() as usize).clamp(1, rows - 1);
    // split_with_ratio takes the ceil of rows * ratio; aim half a row below
    let (train, test) = shuffled.split_with_ratio((n_train as f32 - 0.5) / rows as f32);
    debug!(
        "Split {} rows: {} train, {} test",
        rows,
        train.nsamples(),
        test.nsamples()
    );
    (train, test)
}

/// Category labels must be non-negative integers.
fn categories(dataset: Samples<f64>) -> Result<Samples<usize>> {
    if let Some(label) = dataset
        .targets()
        .iter()
        .find(|&&v| v < 0.0 || v.fract() != 0.0)
    {
        return Err(EtlError::Model(format!("invalid category label {}", label)));
    }
    Ok(dataset.map_targets(|&v| v as usize))
}

fn fit_regressor(train: &Samples<f64>, test: &Samples<f64>) -> Result<RatingModel> {
    let model = LinearRegression::new()
        .fit(train)
        .map_err(|e| EtlError::Model(e.to_string()))?;

    let predicted = model.predict(test);
    let r2 = predicted.r2(test).map_err(|e| EtlError::Model(e.to_string()))?;
    let mae = predicted
        .mean_absolute_error(test)
        .map_err(|e| EtlError::Model(e.to_string()))?;

    Ok(RatingModel {
        fitted: Fitted::Linear(model),
        report: ModelReport {
            kind: ModelKind::Linear,
            train_rows: train.nsamples(),
            test_rows: test.nsamples(),
            metrics: Metrics::Regression { r2, mae },
        },
    })
}

/// Held-out accuracy of predicted categories.
fn accuracy(predicted: &Array1<usize>, test: &Samples<usize>) -> Result<f64> {
    let matrix = predicted
        .confusion_matrix(test)
        .map_err(|e| EtlError::Model(e.to_string()))?;
    Ok(matrix.accuracy() as f64)
}

fn fit_tree(
    train: &Samples<usize>,
    test: &Samples<usize>,
    config: &FitConfig,
) -> Result<RatingModel> {
    if config.max_depth < 2 {
        return Err(EtlError::InvalidConfig(format!(
            "max_depth must be at least 2, got {}",
            config.max_depth
        )));
    }

    let mut best: Option<(DecisionTree<f64, usize>, f64, usize)> = None;
    for depth in 1..config.max_depth {
        let tree = DecisionTree::<f64, usize>::params()
            .split_quality(config.criterion.into())
            .max_depth(Some(depth))
            .fit(train)
            .map_err(|e| EtlError::Model(e.to_string()))?;
        let score = accuracy(&tree.predict(test), test)?;
        debug!("Tree depth {}: accuracy {:.3}", depth, score);

        // Ties keep the shallower tree
        if best.as_ref().map_or(true, |(_, top, _)| score > *top) {
            best = Some((tree, score, depth));
        }
    }

    let (tree, accuracy, depth) =
        best.ok_or_else(|| EtlError::Model("no tree depth evaluated".to_string()))?;
    Ok(RatingModel {
        fitted: Fitted::Tree(tree),
        report: ModelReport {
            kind: ModelKind::DecisionTree,
            train_rows: train.nsamples(),
            test_rows: test.nsamples(),
            metrics: Metrics::Classification {
                accuracy,
                max_depth: depth,
            },
        },
    })
}

fn fit_forest(
    train: &Samples<usize>,
    test: &Samples<usize>,
    config: &FitConfig,
) -> Result<RatingModel> {
    if config.max_estimators < 2 {
        return Err(EtlError::InvalidConfig(format!(
            "max_estimators must be at least 2, got {}",
            config.max_estimators
        )));
    }

    let mut best: Option<(EnsembleLearner<DecisionTree<f64, usize>>, f64, usize)> = None;
    for size in 1..config.max_estimators {
        let trees = DecisionTree::<f64, usize>::params().split_quality(config.criterion.into());
        // Every size bootstraps from the same seed
        let rng = StdRng::seed_from_u64(config.seed);
        let forest = EnsembleLearnerParams::new_fixed_rng(trees, rng)
            .ensemble_size(size)
            .bootstrap_proportion(1.0)
            .fit(train)
            .map_err(|e| EtlError::Model(e.to_string()))?;
        let predicted: Array1<usize> = forest.predict(test);
        let score = accuracy(&predicted, test)?;
        debug!("Forest of {}: accuracy {:.3}", size, score);

        // Ties keep the smaller forest
        if best.as_ref().map_or(true, |(_, top, _)| score > *top) {
            best = Some((forest, score, size));
        }
    }

    let (forest, accuracy, size) =
        best.ok_or_else(|| EtlError::Model("no ensemble size evaluated".to_string()))?;
    Ok(RatingModel {
        fitted: Fitted::Forest(forest),
        report: ModelReport {
            kind: ModelKind::RandomForest,
            train_rows: train.nsamples(),
            test_rows: test.nsamples(),
            metrics: Metrics::Ensemble {
                accuracy,
                n_estimators: size,
            },
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn synthetic(rows: usize) -> (Array2<f64>, Array1<f64>) {
        let mut rng = StdRng::seed_from_u64(42);
        let x = Array2::from_shape_fn((rows, FEATURE_COUNT), |_| rng.gen_range(0.0..10.0));
        let y = x
            .rows()
            .into_iter()
            .map(|row| 2.0 + 0.5 * row[0] - 0.3 * row[2] + 0.1 * row[10])
            .collect::<Array1<f64>>();
        (x, y)
    }

    /// Category 1 when the first feature is high, else 0
    fn threshold(x: &Array2<f64>) -> Array1<f64> {
        x.column(0).mapv(|v| if v > 5.0 { 1.0 } else { 0.0 })
    }

    fn numbered(rows: usize) -> Samples<f64> {
        let x = Array2::from_shape_fn((rows, FEATURE_COUNT), |(i, _)| i as f64);
        let y = Array1::from_shape_fn(rows, |i| i as f64);
        Dataset::new(x, y)
    }

    #[test]
    fn test_split_sizes() {
        let (train, test) = split(numbered(10), 0.33, 1);
        assert_eq!(train.nsamples(), 7);
        assert_eq!(test.nsamples(), 3);

        // Rows stay paired with their targets and none is lost
        let mut seen: Vec<f64> = train
            .targets()
            .iter()
            .chain(test.targets())
            .copied()
            .collect();
        seen.sort_by(f64::total_cmp);
        assert_eq!(seen, (0..10).map(|i| i as f64).collect::<Vec<_>>());
        for (row, target) in train.records().rows().into_iter().zip(train.targets()) {
            assert_eq!(row[0], *target);
        }
    }

    #[test]
    fn test_split_keeps_both_sides() {
        let (train, test) = split(numbered(2), 0.33, 1);
        assert_eq!(train.nsamples(), 1);
        assert_eq!(test.nsamples(), 1);

        let (train, test) = split(numbered(3), 0.9, 1);
        assert_eq!(train.nsamples(), 1);
        assert_eq!(test.nsamples(), 2);
    }

    #[test]
    fn test_split_is_seeded() {
        let (_, a) = split(numbered(20), 0.25, 7);
        let (_, b) = split(numbered(20), 0.25, 7);
        assert_eq!(a.targets(), b.targets());
    }

    #[test]
    fn test_split_without_holdout() {
        let (train, test) = split(numbered(5), 0.0, 1);
        assert_eq!(train.nsamples(), 5);
        assert_eq!(test.nsamples(), 5);
    }

    #[test]
    fn test_fit_linear_recovers_relationship() {
        let (x, y) = synthetic(60);
        let model = fit(&FitConfig::default(), &x, &y).unwrap();

        assert_eq!(model.report().train_rows, 41);
        assert_eq!(model.report().test_rows, 19);
        match model.report().metrics {
            Metrics::Regression { r2, mae } => {
                assert!(r2 > 0.99, "r2 = {}", r2);
                assert!(mae < 1e-6, "mae = {}", mae);
            }
            ref other => panic!("unexpected metrics {:?}", other),
        }
        let mut row = [0.0; FEATURE_COUNT];
        row[0] = 4.0;
        assert!((model.predict(&row) - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_fit_decision_tree() {
        let (x, _) = synthetic(60);
        let y = threshold(&x);
        let config = FitConfig {
            kind: ModelKind::DecisionTree,
            max_depth: 4,
            ..FitConfig::default()
        };

        let model = fit(&config, &x, &y).unwrap();
        match model.report().metrics {
            Metrics::Classification {
                accuracy,
                max_depth,
            } => {
                assert!(accuracy > 0.9, "accuracy = {}", accuracy);
                assert!((1..4).contains(&max_depth));
            }
            ref other => panic!("unexpected metrics {:?}", other),
        }
        let mut row = [0.0; FEATURE_COUNT];
        row[0] = 9.5;
        assert_eq!(model.predict(&row), 1.0);
    }

    #[test]
    fn test_fit_decision_tree_entropy() {
        let (x, _) = synthetic(60);
        let y = threshold(&x);
        let config = FitConfig {
            kind: ModelKind::DecisionTree,
            criterion: Criterion::Entropy,
            max_depth: 4,
            ..FitConfig::default()
        };

        let model = fit(&config, &x, &y).unwrap();
        assert!(matches!(
            model.report().metrics,
            Metrics::Classification { accuracy, .. } if accuracy > 0.9
        ));
        assert_eq!(SplitQuality::from(Criterion::Entropy), SplitQuality::Entropy);
    }

    #[test]
    fn test_fit_random_forest() {
        let (x, _) = synthetic(80);
        let y = threshold(&x);
        let config = FitConfig {
            kind: ModelKind::RandomForest,
            max_estimators: 6,
            ..FitConfig::default()
        };

        let model = fit(&config, &x, &y).unwrap();
        assert_eq!(model.report().kind, ModelKind::RandomForest);
        match model.report().metrics {
            Metrics::Ensemble {
                accuracy,
                n_estimators,
            } => {
                assert!(accuracy > 0.8, "accuracy = {}", accuracy);
                assert!((1..6).contains(&n_estimators));
            }
            ref other => panic!("unexpected metrics {:?}", other),
        }
        let mut row = [0.0; FEATURE_COUNT];
        row[0] = 9.5;
        assert_eq!(model.predict(&row), 1.0);
    }

    #[test]
    fn test_search_bounds_validated() {
        let (x, _) = synthetic(10);
        let y = threshold(&x);
        let shallow = FitConfig {
            kind: ModelKind::DecisionTree,
            max_depth: 1,
            ..FitConfig::default()
        };
        let tiny = FitConfig {
            kind: ModelKind::RandomForest,
            max_estimators: 1,
            ..FitConfig::default()
        };
        assert!(matches!(fit(&shallow, &x, &y), Err(EtlError::InvalidConfig(_))));
        assert!(matches!(fit(&tiny, &x, &y), Err(EtlError::InvalidConfig(_))));
    }

    #[test]
    fn test_fit_rejects_bad_test_size() {
        let (x, y) = synthetic(10);
        for test_size in [1.0, -0.1, 1.5] {
            let config = FitConfig {
                test_size,
                ..FitConfig::default()
            };
            assert!(matches!(
                fit(&config, &x, &y),
                Err(EtlError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn test_fit_needs_two_rows() {
        let (x, y) = synthetic(1);
        assert!(matches!(
            fit(&FitConfig::default(), &x, &y),
            Err(EtlError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_classifiers_reject_fractional_labels() {
        let (x, y) = synthetic(10);
        for kind in [ModelKind::DecisionTree, ModelKind::RandomForest] {
            let config = FitConfig {
                kind,
                ..FitConfig::default()
            };
            assert!(matches!(fit(&config, &x, &y), Err(EtlError::Model(_))));
        }
    }

    #[test]
    fn test_accuracy_from_confusion_matrix() {
        let truth = Array1::from(vec![1, 0, 1, 0]);
        let test: Samples<usize> = Dataset::new(Array2::zeros((4, 1)), truth);
        let predicted = Array1::from(vec![1, 0, 0, 0]);
        assert_eq!(accuracy(&predicted, &test).unwrap(), 0.75);
    }
}
