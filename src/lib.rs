//! diagnos: train a symptom/disease classifier and serve predictions from the saved model.
//!
//! [`pipeline::train`] turns a [`Dataset`] into a [`ModelArtifact`] holding a random
//! forest, the label encoder and the feature column order, and hands it to an
//! [`ArtifactSink`]. [`Predictor`] loads that artifact back and maps symptom names to a
//! disease.
pub mod artifact;
pub mod config;
pub mod dataset;
pub mod error;
pub mod pipeline;
pub mod predictor;
pub mod sink;

pub use artifact::ModelArtifact;
pub use config::{ForestConfig, TrainConfig};
pub use dataset::Dataset;
pub use error::{Error, ErrorKind, Result};
pub use pipeline::{run, train, TrainReport};
pub use predictor::{Prediction, Predictor};
pub use sink::{ArtifactSink, FileSink, MemorySink};

pub use diagnos_helpers::{Float, LabelEncoder};
pub use random_forest::{RandomForest, RandomForestParams};
