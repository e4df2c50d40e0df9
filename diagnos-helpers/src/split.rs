use ndarray::{Array1, Array2, Axis};
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::{Float, PreprocessError};

/// Disjoint training and held-out partitions of a labeled matrix.
#[derive(Debug, Clone)]
pub struct TrainTestSplit<F: Float> {
    pub x_train: Array2<F>,
    pub x_test: Array2<F>,
    pub y_train: Array1<usize>,
    pub y_test: Array1<usize>,
    /// Row indices (into the input) that ended up in the training side.
    pub train_indices: Vec<usize>,
    /// Row indices (into the input) that ended up in the held-out side.
    pub test_indices: Vec<usize>,
}

/// Splits rows into training and held-out subsets.
///
/// The held-out side gets `ceil(test_ratio * n_rows)` rows. Row order is permuted with
/// a `Xoshiro256PlusPlus` generator seeded from `seed`, and the first permuted rows are
/// held out, so the same input, ratio and seed always yield the same partition.
///
/// # Errors
///
/// * `PreprocessError::InvalidRatio` if `test_ratio` is not strictly between 0 and 1.
/// * `PreprocessError::LengthMismatch` if `x` and `y` disagree on the number of rows.
/// * `PreprocessError::SplitTooSmall` if either side would be empty.
pub fn train_test_split<F: Float>(
    x: &Array2<F>,
    y: &Array1<usize>,
    test_ratio: f64,
    seed: u64,
) -> Result<TrainTestSplit<F>, PreprocessError> {
    if !(test_ratio > 0.0 && test_ratio < 1.0) {
        return Err(PreprocessError::InvalidRatio(test_ratio));
    }
    let n_rows = x.nrows();
    if y.len() != n_rows {
        return Err(PreprocessError::LengthMismatch {
            expected: n_rows,
            found: y.len(),
        });
    }

    let n_test = (test_ratio * n_rows as f64).ceil() as usize;
    if n_test == 0 || n_test >= n_rows {
        return Err(PreprocessError::SplitTooSmall {
            n_rows,
            ratio: test_ratio,
        });
    }

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut indices: Vec<usize> = (0..n_rows).collect();
    indices.shuffle(&mut rng);

    let train_indices = indices.split_off(n_test);
    let test_indices = indices;

    Ok(TrainTestSplit {
        x_train: x.select(Axis(0), &train_indices),
        x_test: x.select(Axis(0), &test_indices),
        y_train: y.select(Axis(0), &train_indices),
        y_test: y.select(Axis(0), &test_indices),
        train_indices,
        test_indices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array};

    fn table(n: usize) -> (Array2<f64>, Array1<usize>) {
        let x = Array::from_shape_fn((n, 2), |(i, j)| (i * 2 + j) as f64);
        let y = Array::from_shape_fn(n, |i| i % 3);
        (x, y)
    }

    #[test]
    fn test_sizes_round_test_side_up() {
        let (x, y) = table(10);
        let split = train_test_split(&x, &y, 0.2, 42).unwrap();
        assert_eq!(split.x_test.nrows(), 2);
        assert_eq!(split.x_train.nrows(), 8);

        let (x, y) = table(4);
        let split = train_test_split(&x, &y, 0.2, 42).unwrap();
        assert_eq!(split.test_indices.len(), 1);
        assert_eq!(split.train_indices.len(), 3);
    }

    #[test]
    fn test_partitions_are_disjoint_and_complete() {
        let (x, y) = table(25);
        let split = train_test_split(&x, &y, 0.3, 7).unwrap();
        let mut all: Vec<usize> = split
            .train_indices
            .iter()
            .chain(split.test_indices.iter())
            .copied()
            .collect();
        all.sort_unstable();
        assert_eq!(all, (0..25).collect::<Vec<_>>());
    }

    #[test]
    fn test_rows_follow_their_labels() {
        let (x, y) = table(12);
        let split = train_test_split(&x, &y, 0.25, 3).unwrap();
        for (pos, &row) in split.test_indices.iter().enumerate() {
            assert_eq!(split.x_test.row(pos), x.row(row));
            assert_eq!(split.y_test[pos], y[row]);
        }
        for (pos, &row) in split.train_indices.iter().enumerate() {
            assert_eq!(split.x_train.row(pos), x.row(row));
            assert_eq!(split.y_train[pos], y[row]);
        }
    }

    #[test]
    fn test_same_seed_same_split() {
        let (x, y) = table(30);
        let a = train_test_split(&x, &y, 0.2, 42).unwrap();
        let b = train_test_split(&x, &y, 0.2, 42).unwrap();
        assert_eq!(a.test_indices, b.test_indices);
        assert_eq!(a.train_indices, b.train_indices);
    }

    #[test]
    fn test_invalid_ratio() {
        let (x, y) = table(10);
        for ratio in [0.0, 1.0, -0.5, 1.5, f64::NAN] {
            assert!(matches!(
                train_test_split(&x, &y, ratio, 42),
                Err(PreprocessError::InvalidRatio(_))
            ));
        }
    }

    #[test]
    fn test_single_row_cannot_be_split() {
        let x = array![[1.0, 0.0]];
        let y = array![0];
        assert!(matches!(
            train_test_split(&x, &y, 0.2, 42),
            Err(PreprocessError::SplitTooSmall { n_rows: 1, .. })
        ));
    }

    #[test]
    fn test_length_mismatch() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![0, 1];
        assert_eq!(
            train_test_split(&x, &y, 0.5, 1).unwrap_err(),
            PreprocessError::LengthMismatch { expected: 3, found: 2 }
        );
    }
}
