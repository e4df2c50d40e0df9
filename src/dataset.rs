//! Loading a symptom/disease table into a feature matrix and a label vector.
//!
//! Every column other than the label column is a feature and must already be numeric
//! (symptoms arrive binarized as 0/1). Column order is preserved exactly as it appears in
//! the header, since that order is what the persisted model expects at prediction time.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::{debug, info};
use ndarray::Array2;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    feature_names: Vec<String>,
    features: Array2<f64>,
    labels: Vec<String>,
}

impl Dataset {
    /// Builds a dataset from parts already in memory.
    pub fn new(
        feature_names: Vec<String>,
        features: Array2<f64>,
        labels: Vec<String>,
    ) -> Result<Self> {
        if feature_names.is_empty() {
            return Err(Error::ShapeMismatch("no feature columns".into()));
        }
        if features.ncols() != feature_names.len() {
            return Err(Error::ShapeMismatch(format!(
                "{} feature names for {} columns",
                feature_names.len(),
                features.ncols()
            )));
        }
        if features.nrows() != labels.len() {
            return Err(Error::ShapeMismatch(format!(
                "{} labels for {} rows",
                labels.len(),
                features.nrows()
            )));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = feature_names.iter().find(|name| !seen.insert(name.as_str())) {
            return Err(Error::DuplicateColumn(dup.clone()));
        }
        if labels.is_empty() {
            return Err(Error::EmptyDataset);
        }
        Ok(Self {
            feature_names,
            features,
            labels,
        })
    }

    /// Reads a CSV file with a header row.
    pub fn from_path(path: impl AsRef<Path>, label_column: &str) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::DataLoad {
            path: path.to_path_buf(),
            source: csv::Error::from(e),
        })?;
        info!("Loading dataset from {}", path.display());
        Self::from_reader(file, label_column)
    }

    /// Reads CSV from any reader. The header must contain `label_column` verbatim.
    ///
    /// Header names and labels are taken as written, surrounding whitespace included;
    /// only feature cells are trimmed before being parsed as numbers.
    pub fn from_reader<R: Read>(reader: R, label_column: &str) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let header: Vec<String> = rdr
            .headers()
            .map_err(Error::MalformedData)?
            .iter()
            .map(str::to_string)
            .collect();

        let mut seen = HashSet::new();
        if let Some(dup) = header.iter().find(|name| !seen.insert(name.as_str())) {
            return Err(Error::DuplicateColumn(dup.clone()));
        }
        let label_idx = header
            .iter()
            .position(|name| name == label_column)
            .ok_or_else(|| Error::MissingLabelColumn {
                column: label_column.to_string(),
                available: header.clone(),
            })?;
        if header.len() < 2 {
            return Err(Error::NoFeatureColumns(label_column.to_string()));
        }

        let feature_names: Vec<String> = header
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != label_idx)
            .map(|(_, name)| name.clone())
            .collect();
        let n_features = feature_names.len();

        let mut values = Vec::new();
        let mut labels = Vec::new();
        for (row, record) in rdr.records().enumerate() {
            let record = record.map_err(Error::MalformedData)?;
            let mut feature = 0;
            for (col, cell) in record.iter().enumerate() {
                if col == label_idx {
                    labels.push(cell.to_string());
                    continue;
                }
                let value = cell
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| Error::InvalidFeature {
                        row,
                        column: feature_names[feature].clone(),
                        value: cell.to_string(),
                    })?;
                values.push(value);
                feature += 1;
            }
        }

        if labels.is_empty() {
            return Err(Error::EmptyDataset);
        }
        let features = Array2::from_shape_vec((labels.len(), n_features), values)
            .map_err(|e| Error::ShapeMismatch(e.to_string()))?;
        debug!(
            "Parsed {} rows, {} features, label column '{}'",
            features.nrows(),
            n_features,
            label_column
        );
        Self::new(feature_names, features, labels)
    }

    /// Feature column names in header order.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn features(&self) -> &Array2<f64> {
        &self.features
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn n_rows(&self) -> usize {
        self.labels.len()
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    const FLU_COLD: &str = "\
fever,cough,fatigue,disease
1,0,1,flu
0,1,0,cold
1,1,1,flu
0,0,0,cold
";

    #[test]
    fn test_reads_features_and_labels() {
        let ds = Dataset::from_reader(FLU_COLD.as_bytes(), "disease").unwrap();
        assert_eq!(ds.feature_names(), ["fever", "cough", "fatigue"]);
        assert_eq!(ds.labels(), ["flu", "cold", "flu", "cold"]);
        assert_eq!(
            ds.features(),
            &array![
                [1.0, 0.0, 1.0],
                [0.0, 1.0, 0.0],
                [1.0, 1.0, 1.0],
                [0.0, 0.0, 0.0]
            ]
        );
    }

    #[test]
    fn test_label_column_can_sit_anywhere() {
        let csv = "disease,itching,rash\nallergy,1,1\nnone,0,0\n";
        let ds = Dataset::from_reader(csv.as_bytes(), "disease").unwrap();
        assert_eq!(ds.feature_names(), ["itching", "rash"]);
        assert_eq!(ds.features(), &array![[1.0, 1.0], [0.0, 0.0]]);
    }

    #[test]
    fn test_missing_label_column() {
        let err = Dataset::from_reader(FLU_COLD.as_bytes(), "Disease").unwrap_err();
        match err {
            Error::MissingLabelColumn { column, available } => {
                assert_eq!(column, "Disease");
                assert_eq!(available.len(), 4);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_numeric_feature() {
        let csv = "fever,disease\nyes,flu\n";
        let err = Dataset::from_reader(csv.as_bytes(), "disease").unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidFeature { row: 0, ref column, ref value }
                if column == "fever" && value == "yes"
        ));

        let csv = "fever,disease\n,flu\n";
        assert!(matches!(
            Dataset::from_reader(csv.as_bytes(), "disease"),
            Err(Error::InvalidFeature { .. })
        ));
    }

    #[test]
    fn test_empty_label_cell_is_kept_for_encoding() {
        let csv = "fever,disease\n1,\n0,cold\n";
        let ds = Dataset::from_reader(csv.as_bytes(), "disease").unwrap();
        assert_eq!(ds.labels(), ["", "cold"]);
    }

    #[test]
    fn test_header_and_labels_are_taken_verbatim() {
        let csv = "fever, disease \n1,flu\n";
        assert!(matches!(
            Dataset::from_reader(csv.as_bytes(), "disease"),
            Err(Error::MissingLabelColumn { .. })
        ));

        let csv = "fever,disease\n 1 ,Flu\n0,Flu \n";
        let ds = Dataset::from_reader(csv.as_bytes(), "disease").unwrap();
        assert_eq!(ds.labels(), ["Flu", "Flu "]);
        assert_eq!(ds.features(), &array![[1.0], [0.0]]);
    }

    #[test]
    fn test_ragged_rows_are_malformed() {
        let csv = "fever,cough,disease\n1,0,flu\n1,flu\n";
        assert!(matches!(
            Dataset::from_reader(csv.as_bytes(), "disease"),
            Err(Error::MalformedData(_))
        ));
    }

    #[test]
    fn test_header_only() {
        let csv = "fever,disease\n";
        assert!(matches!(
            Dataset::from_reader(csv.as_bytes(), "disease"),
            Err(Error::EmptyDataset)
        ));
    }

    #[test]
    fn test_schema_errors() {
        let csv = "fever,fever,disease\n1,0,flu\n";
        assert!(matches!(
            Dataset::from_reader(csv.as_bytes(), "disease"),
            Err(Error::DuplicateColumn(ref c)) if c == "fever"
        ));

        let csv = "disease\nflu\n";
        assert!(matches!(
            Dataset::from_reader(csv.as_bytes(), "disease"),
            Err(Error::NoFeatureColumns(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = Dataset::from_path("no/such/dataset.csv", "disease").unwrap_err();
        assert!(matches!(err, Error::DataLoad { .. }));
        assert_eq!(err.kind(), crate::ErrorKind::DataLoad);
    }

    #[test]
    fn test_new_checks_shapes() {
        let names = vec!["a".to_string(), "b".to_string()];
        let labels = vec!["x".to_string()];
        assert!(Dataset::new(names.clone(), array![[1.0, 0.0]], labels.clone()).is_ok());
        assert!(matches!(
            Dataset::new(names.clone(), array![[1.0]], labels.clone()),
            Err(Error::ShapeMismatch(_))
        ));
        assert!(matches!(
            Dataset::new(names, array![[1.0, 0.0], [0.0, 1.0]], labels),
            Err(Error::ShapeMismatch(_))
        ));
    }
}
