use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use diagnos_helpers::LabelEncoder;
use random_forest::RandomForest;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Everything needed to serve predictions without retraining.
///
/// Serving must present features in `feature_names` order and decode the forest's class
/// codes through `label_encoder`. The artifact is never modified after it is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub model: RandomForest<f64>,
    pub label_encoder: LabelEncoder,
    pub feature_names: Vec<String>,
}

impl ModelArtifact {
    pub fn new(
        model: RandomForest<f64>,
        label_encoder: LabelEncoder,
        feature_names: Vec<String>,
    ) -> Result<Self> {
        let artifact = Self {
            model,
            label_encoder,
            feature_names,
        };
        artifact.validate()?;
        Ok(artifact)
    }

    /// Checks that the model is well formed and that the model, the encoder and the
    /// feature names describe the same problem.
    pub fn validate(&self) -> Result<()> {
        self.model.validate().map_err(Error::CorruptModel)?;
        if self.model.n_features() != self.feature_names.len() {
            return Err(Error::InconsistentArtifact(format!(
                "model expects {} features but {} names are recorded",
                self.model.n_features(),
                self.feature_names.len()
            )));
        }
        if self.model.n_classes() != self.label_encoder.n_classes() {
            return Err(Error::InconsistentArtifact(format!(
                "model predicts {} classes but the encoder knows {}",
                self.model.n_classes(),
                self.label_encoder.n_classes()
            )));
        }
        Ok(())
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer(writer, self).map_err(Error::Serialize)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(Error::Serialize)
    }

    /// Decodes and validates an artifact.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let artifact: Self = serde_json::from_reader(reader).map_err(Error::ArtifactDecode)?;
        artifact.validate()?;
        Ok(artifact)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::ArtifactRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(BufReader::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use ndarray::array;
    use random_forest::RandomForestParams;
    use serde_json::{Value, json};

    fn flu_cold() -> ModelArtifact {
        let x = array![
            [1.0, 0.0, 1.0],
            [0.0, 1.0, 0.0],
            [1.0, 1.0, 1.0],
            [0.0, 0.0, 0.0],
        ];
        let (encoder, y) = LabelEncoder::fit_transform(&["flu", "cold", "flu", "cold"]).unwrap();
        let params = RandomForestParams {
            n_trees: 5,
            ..Default::default()
        };
        let model = RandomForest::fit(x.view(), y.view(), 2, &params).unwrap();
        let names = ["fever", "cough", "fatigue"].map(String::from).to_vec();
        ModelArtifact::new(model, encoder, names).unwrap()
    }

    fn reload(value: &Value) -> Result<ModelArtifact> {
        ModelArtifact::from_reader(value.to_string().as_bytes())
    }

    #[test]
    fn test_round_trip() {
        let artifact = flu_cold();
        let back = ModelArtifact::from_reader(artifact.to_bytes().unwrap().as_slice()).unwrap();
        assert_eq!(back, artifact);
    }

    #[test]
    fn test_rejects_corrupt_trees() {
        let original: Value = serde_json::from_slice(&flu_cold().to_bytes().unwrap()).unwrap();

        let mut no_trees = original.clone();
        no_trees["model"]["trees"] = json!([]);

        let mut no_nodes = original.clone();
        no_nodes["model"]["trees"][0]["nodes"] = json!([]);

        let mut wide_leaf = original.clone();
        wide_leaf["model"]["trees"][0]["nodes"] = json!([{ "leaf": { "counts": [1, 0, 0, 5] } }]);

        let mut cycle = original.clone();
        cycle["model"]["trees"][0]["nodes"] = json!([
            { "split": { "feature": 0, "threshold": 0.5, "left": 0, "right": 1 } },
            { "leaf": { "counts": [1, 1] } }
        ]);

        let mut bad_feature = original.clone();
        bad_feature["model"]["trees"][0]["nodes"] = json!([
            { "split": { "feature": 7, "threshold": 0.5, "left": 1, "right": 2 } },
            { "leaf": { "counts": [1, 0] } },
            { "leaf": { "counts": [0, 1] } }
        ]);

        for corrupt in [no_trees, no_nodes, wide_leaf, cycle, bad_feature] {
            let err = reload(&corrupt).unwrap_err();
            assert!(matches!(err, Error::CorruptModel(_)), "{:?}", err);
            assert_eq!(err.kind(), ErrorKind::Load);
        }

        assert!(reload(&original).is_ok());
    }

    #[test]
    fn test_rejects_mismatched_parts() {
        let artifact = flu_cold();
        let mut value: Value = serde_json::from_slice(&artifact.to_bytes().unwrap()).unwrap();
        value["feature_names"] = json!(["fever", "cough"]);
        assert!(matches!(reload(&value), Err(Error::InconsistentArtifact(_))));

        let mut value: Value = serde_json::from_slice(&artifact.to_bytes().unwrap()).unwrap();
        value["label_encoder"] = json!(["cold", "flu", "measles"]);
        assert!(matches!(reload(&value), Err(Error::InconsistentArtifact(_))));
    }
}
