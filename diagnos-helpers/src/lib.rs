use ndarray::{NdFloat, ScalarOperand};

use num_traits::{AsPrimitive, FromPrimitive, NumCast, Signed};
use rand::distr::uniform::SampleUniform;

use std::iter::Sum;
use std::ops::{AddAssign, DivAssign, MulAssign, SubAssign};

// Include submodules
mod encoding;
mod error;
mod metrics;
mod split;

// Re-export types from submodules
pub use encoding::{is_missing_label, LabelEncoder, MISSING_LABEL_TOKENS};
pub use error::PreprocessError;
pub use metrics::accuracy;
pub use split::{train_test_split, TrainTestSplit};

/// Numeric bound shared by every feature matrix in the workspace.
pub trait Float:
    NdFloat
    + FromPrimitive
    + Default
    + Signed
    + Sum
    + AsPrimitive<usize>
    + for<'a> AddAssign<&'a Self>
    + for<'a> MulAssign<&'a Self>
    + for<'a> SubAssign<&'a Self>
    + for<'a> DivAssign<&'a Self>
    + num_traits::MulAdd<Output = Self>
    + SampleUniform
    + ScalarOperand
    + std::marker::Unpin
{
    fn cast<T: NumCast>(x: T) -> Option<Self> {
        NumCast::from(x)
    }
}

impl Float for f32 {}

impl Float for f64 {}
