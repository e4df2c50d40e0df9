//! The train-and-persist job.
//!
//! Load, encode, split, fit, evaluate, persist. Nothing reaches the sink unless every
//! earlier step succeeded, so a run either produces a complete artifact or none.

use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use diagnos_helpers::{accuracy, train_test_split, LabelEncoder};
use log::info;
use random_forest::RandomForest;

use crate::artifact::ModelArtifact;
use crate::config::TrainConfig;
use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::sink::{ArtifactSink, FileSink};

/// Outcome of a successful training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainReport {
    /// Held-out accuracy in `[0, 1]`.
    pub accuracy: f64,
    pub n_train: usize,
    pub n_test: usize,
    pub n_features: usize,
    /// Class labels indexed by the code the model predicts.
    pub classes: Vec<String>,
    pub output: Option<PathBuf>,
}

impl TrainReport {
    /// Accuracy as a percentage with two decimals, e.g. `93.33%`.
    pub fn accuracy_percent(&self) -> String {
        format!("{:.2}%", self.accuracy * 100.0)
    }
}

impl Display for TrainReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Model Accuracy: {}", self.accuracy_percent())
    }
}

/// Trains on an in-memory dataset and hands the artifact to `sink`.
///
/// # Errors
///
/// * `Error::Config` if the configuration is invalid.
/// * `Error::Encoding` if a label is missing.
/// * `Error::TooFewClasses` if the dataset has fewer than two distinct labels.
/// * `Error::Split` if the split would leave a side empty.
/// * `Error::Fit` / `Error::Evaluation` if fitting or scoring fails.
/// * Whatever the sink returns when persisting.
pub fn train<S: ArtifactSink + ?Sized>(
    dataset: Dataset,
    config: &TrainConfig,
    sink: &mut S,
) -> Result<TrainReport> {
    config.validate()?;

    let (encoder, y) = LabelEncoder::fit_transform(dataset.labels()).map_err(Error::Encoding)?;
    if encoder.n_classes() < 2 {
        return Err(Error::TooFewClasses {
            found: encoder.n_classes(),
        });
    }
    info!(
        "{} rows, {} features, {} classes",
        dataset.n_rows(),
        dataset.n_features(),
        encoder.n_classes()
    );

    let split = train_test_split(dataset.features(), &y, config.test_ratio, config.seed)
        .map_err(Error::Split)?;
    info!(
        "Training on {} rows, holding out {}",
        split.y_train.len(),
        split.y_test.len()
    );

    let params = config.forest_params();
    let model = RandomForest::fit(
        split.x_train.view(),
        split.y_train.view(),
        encoder.n_classes(),
        &params,
    )?;
    info!("Fitted {} trees (seed {})", model.n_trees(), params.seed);

    let y_pred = model.predict(split.x_test.view())?;
    let accuracy = accuracy(split.y_test.view(), y_pred.view()).map_err(Error::Evaluation)?;

    let report = TrainReport {
        accuracy,
        n_train: split.y_train.len(),
        n_test: split.y_test.len(),
        n_features: dataset.n_features(),
        classes: encoder.classes().to_vec(),
        output: sink.location().map(|p| p.to_path_buf()),
    };
    info!("{}", report);

    let artifact = ModelArtifact::new(model, encoder, dataset.feature_names().to_vec())?;
    sink.persist(&artifact)?;
    Ok(report)
}

/// Loads `config.dataset_path` and writes the artifact to `config.output_path`.
pub fn run(config: &TrainConfig) -> Result<TrainReport> {
    config.validate()?;
    let dataset = Dataset::from_path(&config.dataset_path, &config.label_column)?;
    let mut sink = FileSink::new(&config.output_path);
    train(dataset, config, &mut sink)
}
