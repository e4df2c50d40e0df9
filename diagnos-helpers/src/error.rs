use thiserror::Error;

/// Errors raised while preparing labels and partitions for training.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PreprocessError {
    /// A label at the given position is empty (a null cell in the source table).
    #[error("label at row {index} is missing")]
    MissingLabel { index: usize },
    /// The label was never seen while fitting the encoder.
    #[error("unknown label '{0}'")]
    UnknownLabel(String),
    /// The integer code is outside `[0, n_classes)`.
    #[error("label code {code} is out of range for {n_classes} classes")]
    UnknownCode { code: usize, n_classes: usize },
    /// An encoder was rebuilt from a class list that is not strictly increasing.
    #[error("encoder classes must be unique and sorted, found '{0}' out of order")]
    UnsortedClasses(String),
    /// Nothing to fit or evaluate.
    #[error("input is empty")]
    EmptyInput,
    /// Two parallel sequences disagree in length.
    #[error("length mismatch: expected {expected}, found {found}")]
    LengthMismatch { expected: usize, found: usize },
    /// The held-out ratio must lie strictly between 0 and 1.
    #[error("test ratio must be in (0, 1), got {0}")]
    InvalidRatio(f64),
    /// The split would leave the training or the test side without rows.
    #[error("cannot split {n_rows} rows with test ratio {ratio}: both sides need at least one row")]
    SplitTooSmall { n_rows: usize, ratio: f64 },
}
