use ndarray::ArrayView1;

use crate::PreprocessError;

/// Fraction of positions where `y_pred` equals `y_true`, in `[0, 1]`.
pub fn accuracy(
    y_true: ArrayView1<usize>,
    y_pred: ArrayView1<usize>,
) -> Result<f64, PreprocessError> {
    if y_true.len() != y_pred.len() {
        return Err(PreprocessError::LengthMismatch {
            expected: y_true.len(),
            found: y_pred.len(),
        });
    }
    if y_true.is_empty() {
        return Err(PreprocessError::EmptyInput);
    }
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| t == p)
        .count();
    Ok(correct as f64 / y_true.len() as f64)
}
