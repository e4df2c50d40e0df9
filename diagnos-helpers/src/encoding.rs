use ndarray::Array1;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::PreprocessError;

/// Cell values that stand for a missing label, in addition to blank cells.
pub const MISSING_LABEL_TOKENS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// True for blank labels and the usual null markers of tabular exports (`NA`, `NaN`, `null`...).
pub fn is_missing_label(label: &str) -> bool {
    let label = label.trim();
    label.is_empty() || MISSING_LABEL_TOKENS.contains(&label)
}

/// Bijective mapping between string class labels and contiguous codes in `[0, K)`.
///
/// Classes are kept in sorted (byte-wise) order, so a label's code depends only on
/// the set of labels seen during fitting and never on the order rows arrive in.
/// The code of a label is its position in [`LabelEncoder::classes`].
///
/// Labels are taken verbatim, so `"Flu"` and `"Flu "` are different classes. Blank labels
/// and null markers such as `NA` or `NaN` (see [`MISSING_LABEL_TOKENS`]) are rejected as
/// missing rather than becoming a class of their own.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", try_from = "Vec<String>", into = "Vec<String>")
)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Learns the distinct classes of `labels`.
    ///
    /// # Errors
    ///
    /// Returns `PreprocessError::EmptyInput` if `labels` is empty and
    /// `PreprocessError::MissingLabel` for the first blank or null label.
    pub fn fit<S: AsRef<str>>(labels: &[S]) -> Result<Self, PreprocessError> {
        if labels.is_empty() {
            return Err(PreprocessError::EmptyInput);
        }
        let mut classes = Vec::new();
        for (index, label) in labels.iter().enumerate() {
            let label = label.as_ref();
            if is_missing_label(label) {
                return Err(PreprocessError::MissingLabel { index });
            }
            classes.push(label.to_string());
        }
        classes.sort_unstable();
        classes.dedup();
        Ok(Self { classes })
    }

    /// Rebuilds an encoder from an already ordered class list.
    pub fn from_classes(classes: Vec<String>) -> Result<Self, PreprocessError> {
        if classes.is_empty() {
            return Err(PreprocessError::EmptyInput);
        }
        for (index, pair) in classes.windows(2).enumerate() {
            if pair[0] >= pair[1] {
                return Err(PreprocessError::UnsortedClasses(classes[index + 1].clone()));
            }
        }
        if let Some(index) = classes.iter().position(|c| is_missing_label(c)) {
            return Err(PreprocessError::MissingLabel { index });
        }
        Ok(Self { classes })
    }

    /// Fits the encoder and encodes the same labels in one pass.
    pub fn fit_transform<S: AsRef<str>>(
        labels: &[S],
    ) -> Result<(Self, Array1<usize>), PreprocessError> {
        let encoder = Self::fit(labels)?;
        let codes = encoder.transform(labels)?;
        Ok((encoder, codes))
    }

    pub fn transform<S: AsRef<str>>(&self, labels: &[S]) -> Result<Array1<usize>, PreprocessError> {
        labels
            .iter()
            .enumerate()
            .map(|(index, label)| {
                let label = label.as_ref();
                if is_missing_label(label) {
                    return Err(PreprocessError::MissingLabel { index });
                }
                self.encode(label)
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Array1::from)
    }

    pub fn encode(&self, label: &str) -> Result<usize, PreprocessError> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(label))
            .map_err(|_| PreprocessError::UnknownLabel(label.to_string()))
    }

    pub fn decode(&self, code: usize) -> Result<&str, PreprocessError> {
        self.classes
            .get(code)
            .map(String::as_str)
            .ok_or(PreprocessError::UnknownCode {
                code,
                n_classes: self.classes.len(),
            })
    }

    pub fn inverse_transform(&self, codes: &[usize]) -> Result<Vec<String>, PreprocessError> {
        codes
            .iter()
            .map(|&code| self.decode(code).map(str::to_string))
            .collect()
    }

    /// Class labels indexed by their code.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }
}

impl TryFrom<Vec<String>> for LabelEncoder {
    type Error = PreprocessError;

    fn try_from(classes: Vec<String>) -> Result<Self, Self::Error> {
        Self::from_classes(classes)
    }
}

impl From<LabelEncoder> for Vec<String> {
    fn from(encoder: LabelEncoder) -> Self {
        encoder.classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_codes_follow_sorted_order() {
        let labels = ["flu", "cold", "flu", "allergy"];
        let (encoder, codes) = LabelEncoder::fit_transform(&labels).unwrap();

        assert_eq!(encoder.classes(), ["allergy", "cold", "flu"]);
        assert_eq!(codes, array![2, 1, 2, 0]);
    }

    #[test]
    fn test_order_independent_of_input_order() {
        let a = LabelEncoder::fit(&["flu", "cold", "malaria"]).unwrap();
        let b = LabelEncoder::fit(&["malaria", "flu", "cold", "cold"]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_every_label_round_trips() {
        let labels = ["Typhoid", "Dengue", "Common Cold", "Dengue", "Malaria"];
        let encoder = LabelEncoder::fit(&labels).unwrap();
        for label in labels {
            let code = encoder.encode(label).unwrap();
            assert_eq!(encoder.decode(code).unwrap(), label);
        }
    }

    #[test]
    fn test_inverse_transform() {
        let encoder = LabelEncoder::fit(&["b", "a"]).unwrap();
        assert_eq!(
            encoder.inverse_transform(&[1, 0, 1]).unwrap(),
            vec!["b".to_string(), "a".to_string(), "b".to_string()]
        );
        assert_eq!(
            encoder.inverse_transform(&[2]).unwrap_err(),
            PreprocessError::UnknownCode { code: 2, n_classes: 2 }
        );
    }

    #[test]
    fn test_blank_label_is_rejected() {
        let err = LabelEncoder::fit(&["flu", "  ", "cold"]).unwrap_err();
        assert_eq!(err, PreprocessError::MissingLabel { index: 1 });
    }

    #[test]
    fn test_null_markers_are_missing() {
        for marker in ["NA", "NaN", "null", "N/A", "None", " nan "] {
            assert_eq!(
                LabelEncoder::fit(&["flu", marker]).unwrap_err(),
                PreprocessError::MissingLabel { index: 1 }
            );
        }
        let encoder = LabelEncoder::fit(&["flu", "cold"]).unwrap();
        assert_eq!(
            encoder.transform(&["cold", "NULL"]).unwrap_err(),
            PreprocessError::MissingLabel { index: 1 }
        );
        // Only whole-cell markers count.
        assert!(LabelEncoder::fit(&["Nausea", "Naive"]).is_ok());
    }

    #[test]
    fn test_labels_are_not_trimmed() {
        let encoder = LabelEncoder::fit(&["Flu", "Flu "]).unwrap();
        assert_eq!(encoder.n_classes(), 2);
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let labels: [&str; 0] = [];
        assert_eq!(LabelEncoder::fit(&labels).unwrap_err(), PreprocessError::EmptyInput);
    }

    #[test]
    fn test_unknown_label() {
        let encoder = LabelEncoder::fit(&["flu", "cold"]).unwrap();
        assert_eq!(
            encoder.encode("measles").unwrap_err(),
            PreprocessError::UnknownLabel("measles".into())
        );
    }

    #[test]
    fn test_from_classes_requires_sorted_unique() {
        assert!(LabelEncoder::from_classes(vec!["a".into(), "b".into()]).is_ok());
        assert_eq!(
            LabelEncoder::from_classes(vec!["b".into(), "a".into()]).unwrap_err(),
            PreprocessError::UnsortedClasses("a".into())
        );
        assert!(LabelEncoder::from_classes(vec!["a".into(), "a".into()]).is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serializes_as_class_list() {
        let encoder = LabelEncoder::fit(&["flu", "cold"]).unwrap();
        let json = serde_json::to_string(&encoder).unwrap();
        assert_eq!(json, r#"["cold","flu"]"#);

        let back: LabelEncoder = serde_json::from_str(&json).unwrap();
        assert_eq!(back, encoder);
        assert!(serde_json::from_str::<LabelEncoder>(r#"["flu","cold"]"#).is_err());
    }
}
