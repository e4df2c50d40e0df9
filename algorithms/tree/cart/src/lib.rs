use std::cmp::Ordering;

use diagnos_helpers::Float;
use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::Rng;
use rand::seq::index;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// Errors that can occur when growing or querying a decision tree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TreeError {
    /// No samples were handed to `fit`.
    #[error("cannot grow a tree from an empty training set")]
    EmptyTrainingSet,
    /// The feature matrix has zero columns.
    #[error("feature matrix has no columns")]
    NoFeatures,
    /// The number of labels differs from the number of rows.
    #[error("expected {expected} labels, found {found}")]
    LengthMismatch { expected: usize, found: usize },
    /// A sample index points past the last row.
    #[error("sample index {index} is out of bounds for {n_rows} rows")]
    SampleOutOfBounds { index: usize, n_rows: usize },
    /// A label is not below the declared class count.
    #[error("label {label} is out of range for {n_classes} classes")]
    LabelOutOfRange { label: usize, n_classes: usize },
    /// NaN or infinite feature value.
    #[error("feature value at row {row}, column {column} is not finite")]
    NonFiniteFeature { row: usize, column: usize },
    /// A prediction row has the wrong number of features.
    #[error("expected {expected} features, found {found}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("invalid tree parameters: {0}")]
    InvalidParams(String),
    /// A tree that did not come out of `fit`, e.g. a hand-edited one, is not well formed.
    #[error("malformed tree: {0}")]
    Malformed(String),
}

/// How many candidate features are examined at each split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "snake_case")
)]
pub enum MaxFeatures {
    All,
    Sqrt,
    Log2,
    Fixed(usize),
}

impl MaxFeatures {
    /// Number of candidates for a matrix with `n_features` columns, clamped to `[1, n_features]`.
    pub fn resolve(&self, n_features: usize) -> usize {
        let n = match *self {
            MaxFeatures::All => n_features,
            MaxFeatures::Sqrt => (n_features as f64).sqrt().floor() as usize,
            MaxFeatures::Log2 => (n_features as f64).log2().floor() as usize,
            MaxFeatures::Fixed(n) => n,
        };
        n.clamp(1, n_features.max(1))
    }
}

/// Growth limits for a single tree.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
pub struct DecisionTreeParams {
    /// `None` grows until leaves are pure or too small to split.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
}

impl Default for DecisionTreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::All,
        }
    }
}

impl DecisionTreeParams {
    pub fn validate(&self) -> Result<(), TreeError> {
        if self.max_depth == Some(0) {
            return Err(TreeError::InvalidParams("max_depth must be at least 1".into()));
        }
        if self.min_samples_split < 2 {
            return Err(TreeError::InvalidParams(
                "min_samples_split must be at least 2".into(),
            ));
        }
        if self.min_samples_leaf < 1 {
            return Err(TreeError::InvalidParams(
                "min_samples_leaf must be at least 1".into(),
            ));
        }
        if self.max_features == MaxFeatures::Fixed(0) {
            return Err(TreeError::InvalidParams("max_features must be at least 1".into()));
        }
        Ok(())
    }
}

/// A node of the flattened tree. Children are indices into the node vector.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "snake_case")
)]
pub enum Node<F> {
    /// Class counts of the training samples that reached this leaf.
    Leaf { counts: Vec<usize> },
    /// Rows with `row[feature] <= threshold` go left, the rest go right.
    Split {
        feature: usize,
        threshold: F,
        left: usize,
        right: usize,
    },
}

/// A CART classification tree grown with Gini impurity.
///
/// Nodes are stored in a flat vector with the root at index 0. Labels are integer
/// class codes in `[0, n_classes)`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
pub struct DecisionTree<F> {
    nodes: Vec<Node<F>>,
    n_features: usize,
    n_classes: usize,
}

impl<F: Float> DecisionTree<F> {
    /// Grows a tree on the rows of `x` listed in `sample_indices`.
    ///
    /// Indices may repeat, which is how bootstrap samples are expressed. At every node the
    /// candidate features are visited in an order drawn from `rng`; the search keeps going
    /// past `max_features` candidates only until a valid partition has been found. Among the
    /// visited features the split with the lowest weighted Gini impurity wins, ties going to
    /// the feature visited first. Pure nodes become leaves.
    ///
    /// # Errors
    ///
    /// Returns a `TreeError` if the parameters are invalid, the inputs disagree in shape,
    /// a sample index or label is out of range, or a used feature value is not finite.
    pub fn fit<R: Rng + ?Sized>(
        x: ArrayView2<F>,
        y: ArrayView1<usize>,
        sample_indices: &[usize],
        n_classes: usize,
        params: &DecisionTreeParams,
        rng: &mut R,
    ) -> Result<Self, TreeError> {
        params.validate()?;
        if x.nrows() != y.len() {
            return Err(TreeError::LengthMismatch {
                expected: x.nrows(),
                found: y.len(),
            });
        }
        if sample_indices.is_empty() {
            return Err(TreeError::EmptyTrainingSet);
        }
        if x.ncols() == 0 {
            return Err(TreeError::NoFeatures);
        }
        for &row in sample_indices {
            if row >= x.nrows() {
                return Err(TreeError::SampleOutOfBounds {
                    index: row,
                    n_rows: x.nrows(),
                });
            }
            if y[row] >= n_classes {
                return Err(TreeError::LabelOutOfRange {
                    label: y[row],
                    n_classes,
                });
            }
            if let Some(column) = x.row(row).iter().position(|v| !v.is_finite()) {
                return Err(TreeError::NonFiniteFeature { row, column });
            }
        }

        let mut grower = Grower {
            x: x.view(),
            y: y.view(),
            n_classes,
            params,
            n_candidates: params.max_features.resolve(x.ncols()),
            rng,
            nodes: Vec::new(),
        };
        let mut samples = sample_indices.to_vec();
        grower.grow(&mut samples, 0);

        Ok(Self {
            nodes: grower.nodes,
            n_features: x.ncols(),
            n_classes,
        })
    }

    /// Checks the structure of a tree that was not grown by `fit`, such as a deserialized one.
    ///
    /// The node list must be non-empty, every child index must point past its parent and
    /// inside the node list, split features must be below `n_features`, thresholds must be
    /// finite and every leaf must hold exactly `n_classes` counts. A tree that passes never
    /// panics or loops when queried with a row of the right length.
    pub fn validate(&self) -> Result<(), TreeError> {
        if self.nodes.is_empty() {
            return Err(TreeError::Malformed("tree has no nodes".into()));
        }
        let n_nodes = self.nodes.len();
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Leaf { counts } => {
                    if counts.len() != self.n_classes {
                        return Err(TreeError::Malformed(format!(
                            "leaf {} has {} counts for {} classes",
                            i,
                            counts.len(),
                            self.n_classes
                        )));
                    }
                }
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= self.n_features {
                        return Err(TreeError::Malformed(format!(
                            "node {} splits on feature {} of {}",
                            i, feature, self.n_features
                        )));
                    }
                    if !threshold.is_finite() {
                        return Err(TreeError::Malformed(format!(
                            "node {} has a non-finite threshold",
                            i
                        )));
                    }
                    for &child in [left, right] {
                        if child <= i || child >= n_nodes {
                            return Err(TreeError::Malformed(format!(
                                "node {} points at child {} ({} nodes)",
                                i, child, n_nodes
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Class counts of the leaf that `features` falls into.
    pub fn leaf_counts(&self, features: ArrayView1<F>) -> Result<&[usize], TreeError> {
        if features.len() != self.n_features {
            return Err(TreeError::DimensionMismatch {
                expected: self.n_features,
                found: features.len(),
            });
        }
        let mut node = 0;
        loop {
            match &self.nodes[node] {
                Node::Leaf { counts } => return Ok(counts),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Predicts the majority class of the leaf `features` falls into.
    ///
    /// Ties resolve to the lowest class code.
    pub fn predict_row(&self, features: ArrayView1<F>) -> Result<usize, TreeError> {
        self.leaf_counts(features).map(majority)
    }

    pub fn predict(&self, x: ArrayView2<F>) -> Result<Array1<usize>, TreeError> {
        x.rows()
            .into_iter()
            .map(|row| self.predict_row(row))
            .collect::<Result<Vec<_>, _>>()
            .map(Array1::from)
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    /// Length of the longest root-to-leaf path; a single leaf has depth 0.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            match &self.nodes[node] {
                Node::Leaf { .. } => deepest = deepest.max(depth),
                Node::Split { left, right, .. } => {
                    stack.push((*left, depth + 1));
                    stack.push((*right, depth + 1));
                }
            }
        }
        deepest
    }

    pub fn nodes(&self) -> &[Node<F>] {
        &self.nodes
    }
}

/// Index of the largest count, lowest index on ties.
pub fn majority(counts: &[usize]) -> usize {
    let mut best = 0;
    for (class, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = class;
        }
    }
    best
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum::<f64>()
}

struct Grower<'a, F, R: ?Sized> {
    x: ArrayView2<'a, F>,
    y: ArrayView1<'a, usize>,
    n_classes: usize,
    params: &'a DecisionTreeParams,
    n_candidates: usize,
    rng: &'a mut R,
    nodes: Vec<Node<F>>,
}

struct SplitCandidate<F> {
    impurity: f64,
    feature: usize,
    threshold: F,
}

impl<F: Float, R: Rng + ?Sized> Grower<'_, F, R> {
    fn class_counts(&self, samples: &[usize]) -> Vec<usize> {
        let mut counts = vec![0; self.n_classes];
        for &i in samples {
            counts[self.y[i]] += 1;
        }
        counts
    }

    /// Grows the subtree for `samples` and returns the index of its root.
    fn grow(&mut self, samples: &mut [usize], depth: usize) -> usize {
        let counts = self.class_counts(samples);
        let node = self.nodes.len();
        let is_pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        let depth_reached = self.params.max_depth.is_some_and(|max| depth >= max);
        let too_small = samples.len() < self.params.min_samples_split
            || samples.len() < 2 * self.params.min_samples_leaf;

        if is_pure || depth_reached || too_small {
            self.nodes.push(Node::Leaf { counts });
            return node;
        }

        let Some(split) = self.best_split(samples, &counts) else {
            self.nodes.push(Node::Leaf { counts });
            return node;
        };

        // Placeholder until both children have been grown.
        self.nodes.push(Node::Leaf { counts });

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = samples
            .iter()
            .copied()
            .partition(|&i| self.x[[i, split.feature]] <= split.threshold);
        let n_left = left_rows.len();
        samples[..n_left].copy_from_slice(&left_rows);
        samples[n_left..].copy_from_slice(&right_rows);

        let (left_samples, right_samples) = samples.split_at_mut(n_left);
        let left = self.grow(left_samples, depth + 1);
        let right = self.grow(right_samples, depth + 1);

        self.nodes[node] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        node
    }

    fn best_split(&mut self, samples: &[usize], parent: &[usize]) -> Option<SplitCandidate<F>> {
        let n_features = self.x.ncols();
        let n = samples.len();
        let min_leaf = self.params.min_samples_leaf;
        let two = F::one() + F::one();

        let feature_order = index::sample(&mut *self.rng, n_features, n_features).into_vec();
        let mut order = samples.to_vec();
        let mut best: Option<SplitCandidate<F>> = None;

        for (visited, &feature) in feature_order.iter().enumerate() {
            if visited >= self.n_candidates && best.is_some() {
                break;
            }

            let x = self.x;
            order.sort_by(|&a, &b| {
                x[[a, feature]]
                    .partial_cmp(&x[[b, feature]])
                    .unwrap_or(Ordering::Equal)
            });

            let mut left = vec![0usize; self.n_classes];
            let mut right = parent.to_vec();
            for pos in 0..n - 1 {
                let label = self.y[order[pos]];
                left[label] += 1;
                right[label] -= 1;

                let value = x[[order[pos], feature]];
                let next = x[[order[pos + 1], feature]];
                if value == next {
                    continue;
                }
                let n_left = pos + 1;
                let n_right = n - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }

                let impurity = (n_left as f64 * gini(&left, n_left)
                    + n_right as f64 * gini(&right, n_right))
                    / n as f64;
                if best.as_ref().is_none_or(|b| impurity < b.impurity) {
                    let mut threshold = (value + next) / two;
                    if threshold >= next {
                        threshold = value;
                    }
                    best = Some(SplitCandidate {
                        impurity,
                        feature,
                        threshold,
                    });
                }
            }
        }
        best
    }
}
