use std::fs;
use std::path::{Path, PathBuf};

use cart::{DecisionTreeParams, MaxFeatures};
use random_forest::RandomForestParams;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_DATASET: &str = "predictor/Symtomps_Disease_dataset.csv";
pub const DEFAULT_ARTIFACT: &str = "model/disease_model.json";
pub const DEFAULT_LABEL_COLUMN: &str = "disease";

/// Everything a training run needs besides the data itself.
///
/// Missing keys in a config file fall back to the defaults below.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TrainConfig {
    pub dataset_path: PathBuf,
    pub output_path: PathBuf,
    pub label_column: String,
    /// Share of rows held out for evaluation.
    pub test_ratio: f64,
    pub seed: u64,
    pub forest: ForestConfig,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from(DEFAULT_DATASET),
            output_path: PathBuf::from(DEFAULT_ARTIFACT),
            label_column: DEFAULT_LABEL_COLUMN.to_string(),
            test_ratio: 0.2,
            seed: 42,
            forest: ForestConfig::default(),
        }
    }
}

/// Random forest hyperparameters. The forest is seeded from [`TrainConfig::seed`].
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    pub bootstrap: bool,
}

impl Default for ForestConfig {
    fn default() -> Self {
        let params = RandomForestParams::default();
        Self {
            n_trees: params.n_trees,
            max_depth: params.tree.max_depth,
            min_samples_split: params.tree.min_samples_split,
            min_samples_leaf: params.tree.min_samples_leaf,
            max_features: params.tree.max_features,
            bootstrap: params.bootstrap,
        }
    }
}

impl TrainConfig {
    /// Reads a JSON config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.test_ratio > 0.0 && self.test_ratio < 1.0) {
            return Err(Error::Config(format!(
                "test_ratio must be in (0, 1), got {}",
                self.test_ratio
            )));
        }
        if self.label_column.is_empty() {
            return Err(Error::Config("label_column must not be empty".into()));
        }
        if self.forest.n_trees == 0 {
            return Err(Error::Config("forest.n_trees must be at least 1".into()));
        }
        self.forest_params()
            .tree
            .validate()
            .map_err(|e| Error::Config(e.to_string()))
    }

    pub fn forest_params(&self) -> RandomForestParams {
        RandomForestParams {
            n_trees: self.forest.n_trees,
            seed: self.seed,
            bootstrap: self.forest.bootstrap,
            tree: DecisionTreeParams {
                max_depth: self.forest.max_depth,
                min_samples_split: self.forest.min_samples_split,
                min_samples_leaf: self.forest.min_samples_leaf,
                max_features: self.forest.max_features,
            },
        }
    }
}
