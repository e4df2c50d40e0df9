use std::collections::HashMap;
use std::path::Path;

use ndarray::{Array1, ArrayView1};

use crate::artifact::ModelArtifact;
use crate::error::{Error, Result};

/// A decoded prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub disease: String,
    /// Share of trees that voted for `disease`, in `(0, 1]`.
    pub confidence: f64,
}

/// Serves predictions from a loaded artifact.
///
/// Feature vectors are always assembled in the artifact's `feature_names` order, so callers
/// name symptoms instead of positions.
#[derive(Debug, Clone)]
pub struct Predictor {
    artifact: ModelArtifact,
    positions: HashMap<String, usize>,
}

impl Predictor {
    pub fn new(artifact: ModelArtifact) -> Result<Self> {
        artifact.validate()?;
        let positions = artifact
            .feature_names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Ok(Self {
            artifact,
            positions,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(ModelArtifact::load(path)?)
    }

    /// Predicts from the set of present symptoms; every other feature is 0.
    ///
    /// Names must match the training columns exactly. Unknown names are an error rather
    /// than being dropped, since dropping them would silently change the input.
    pub fn predict_symptoms<S: AsRef<str>>(&self, symptoms: &[S]) -> Result<Prediction> {
        if symptoms.is_empty() {
            return Err(Error::NoSymptoms);
        }
        let mut values = Array1::zeros(self.artifact.feature_names.len());
        for symptom in symptoms {
            let symptom = symptom.as_ref();
            let &pos = self
                .positions
                .get(symptom)
                .ok_or_else(|| Error::UnknownSymptom(symptom.to_string()))?;
            values[pos] = 1.0;
        }
        self.predict_values(values.view())
    }

    /// Predicts from a full feature vector already in `feature_names` order.
    pub fn predict_values(&self, values: ArrayView1<f64>) -> Result<Prediction> {
        let expected = self.artifact.feature_names.len();
        if values.len() != expected {
            return Err(Error::FeatureCount {
                expected,
                found: values.len(),
            });
        }
        let votes = self.artifact.model.votes(values).map_err(Error::Predict)?;
        let code = cart::majority(&votes);
        let disease = self
            .artifact
            .label_encoder
            .decode(code)
            .map_err(Error::Decode)?
            .to_string();
        Ok(Prediction {
            disease,
            confidence: votes[code] as f64 / self.artifact.model.n_trees() as f64,
        })
    }

    pub fn feature_names(&self) -> &[String] {
        &self.artifact.feature_names
    }

    pub fn classes(&self) -> &[String] {
        self.artifact.label_encoder.classes()
    }
}
