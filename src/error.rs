//! Error taxonomy of the training pipeline and the artifact consumer.

use std::path::PathBuf;

use diagnos_helpers::PreprocessError;
use random_forest::ForestError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    // === Data loading ===
    /// The dataset file is missing or unreadable.
    #[error("failed to read dataset {path}: {source}")]
    DataLoad {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The dataset is readable but not a well-formed table.
    #[error("malformed dataset: {0}")]
    MalformedData(#[source] csv::Error),

    /// A feature cell is empty or not a number.
    #[error("feature '{column}' at row {row} is not numeric: '{value}'")]
    InvalidFeature {
        row: usize,
        column: String,
        value: String,
    },

    /// Header present but no data rows.
    #[error("dataset has no rows")]
    EmptyDataset,

    // === Schema ===
    /// The configured label column is not in the header.
    #[error("label column '{column}' not found; available columns: {}", available.join(", "))]
    MissingLabelColumn {
        column: String,
        available: Vec<String>,
    },

    #[error("column '{0}' appears more than once in the header")]
    DuplicateColumn(String),

    #[error("dataset has no feature columns besides '{0}'")]
    NoFeatureColumns(String),

    /// Feature matrix, names and labels disagree in shape.
    #[error("dataset shape mismatch: {0}")]
    ShapeMismatch(String),

    // === Encoding ===
    #[error("failed to encode labels: {0}")]
    Encoding(#[source] PreprocessError),

    // === Preconditions ===
    /// Training needs at least two distinct labels.
    #[error("at least 2 distinct labels are required, found {found}")]
    TooFewClasses { found: usize },

    #[error("failed to split dataset: {0}")]
    Split(#[source] PreprocessError),

    #[error("invalid configuration: {0}")]
    Config(String),

    // === Fitting and evaluation ===
    #[error("model fitting failed: {0}")]
    Fit(#[from] ForestError),

    #[error("evaluation failed: {0}")]
    Evaluation(#[source] PreprocessError),

    // === Persistence ===
    /// The artifact directory or file is not writable.
    #[error("failed to write artifact {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize artifact: {0}")]
    Serialize(#[source] serde_json::Error),

    // === Artifact consumption ===
    #[error("failed to read artifact {path}: {source}")]
    ArtifactRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode artifact: {0}")]
    ArtifactDecode(#[source] serde_json::Error),

    /// The three parts of an artifact do not agree with each other.
    #[error("inconsistent artifact: {0}")]
    InconsistentArtifact(String),

    /// The stored forest is not well formed (no trees, bad node links, wrong leaf sizes).
    #[error("corrupt model in artifact: {0}")]
    CorruptModel(#[source] ForestError),

    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    // === Prediction ===
    #[error("unknown symptom '{0}'")]
    UnknownSymptom(String),

    #[error("no symptoms given")]
    NoSymptoms,

    #[error("expected {expected} feature values, found {found}")]
    FeatureCount { expected: usize, found: usize },

    #[error("prediction failed: {0}")]
    Predict(#[source] ForestError),

    #[error("failed to decode prediction: {0}")]
    Decode(#[source] PreprocessError),
}

impl Error {
    /// Coarse category of the failure, as reported to the operator.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::DataLoad { .. }
            | Error::MalformedData(_)
            | Error::InvalidFeature { .. }
            | Error::EmptyDataset => ErrorKind::DataLoad,
            Error::MissingLabelColumn { .. }
            | Error::DuplicateColumn(_)
            | Error::NoFeatureColumns(_)
            | Error::ShapeMismatch(_) => ErrorKind::Schema,
            Error::Encoding(_) => ErrorKind::Encoding,
            Error::TooFewClasses { .. } | Error::Split(_) | Error::Config(_) => {
                ErrorKind::Precondition
            }
            Error::Fit(_) | Error::Evaluation(_) => ErrorKind::Training,
            Error::Persist { .. } | Error::Serialize(_) => ErrorKind::Persist,
            Error::ArtifactRead { .. }
            | Error::ArtifactDecode(_)
            | Error::InconsistentArtifact(_)
            | Error::CorruptModel(_)
            | Error::ConfigRead { .. }
            | Error::ConfigParse { .. } => ErrorKind::Load,
            Error::UnknownSymptom(_)
            | Error::NoSymptoms
            | Error::FeatureCount { .. }
            | Error::Predict(_)
            | Error::Decode(_) => ErrorKind::Predict,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    DataLoad,
    Schema,
    Encoding,
    Precondition,
    Training,
    Persist,
    Load,
    Predict,
}
