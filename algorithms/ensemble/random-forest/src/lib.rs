use cart::{DecisionTree, DecisionTreeParams, MaxFeatures, TreeError, majority};
use diagnos_helpers::Float;
use log::debug;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// Errors that can occur when fitting or querying a random forest.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ForestError {
    /// A forest needs at least one tree.
    #[error("n_trees must be at least 1")]
    NoTrees,
    /// Classification is undefined with fewer than two classes.
    #[error("at least 2 classes are required, found {0}")]
    TooFewClasses(usize),
    #[error("cannot fit a forest on an empty training set")]
    EmptyTrainingSet,
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Hyperparameters of a random forest.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
pub struct RandomForestParams {
    pub n_trees: usize,
    /// Seed of the generator that drives bootstrap sampling and feature subsampling.
    pub seed: u64,
    /// Draw each tree's training rows with replacement. When false every tree sees
    /// all rows and only feature subsampling differs between trees.
    pub bootstrap: bool,
    pub tree: DecisionTreeParams,
}

impl Default for RandomForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            seed: 42,
            bootstrap: true,
            tree: DecisionTreeParams {
                max_features: MaxFeatures::Sqrt,
                ..DecisionTreeParams::default()
            },
        }
    }
}

/// An ensemble of randomized CART trees that predicts by majority vote.
///
/// # Type Parameters
///
/// * `F`: The float type for the features (e.g., `f32`, `f64`).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
pub struct RandomForest<F> {
    trees: Vec<DecisionTree<F>>,
    n_features: usize,
    n_classes: usize,
    params: RandomForestParams,
}

impl<F: Float> RandomForest<F> {
    /// Fits `params.n_trees` trees on `x` against the integer labels `y`.
    ///
    /// A `Xoshiro256PlusPlus` generator seeded from `params.seed` draws, for every tree in
    /// turn, its bootstrap sample and then the seed of the tree's own generator. Fitting the
    /// same data with the same parameters therefore always produces the same forest.
    ///
    /// # Arguments
    ///
    /// * `x`: Feature matrix, one row per sample.
    /// * `y`: Class codes in `[0, n_classes)`, one per row of `x`.
    /// * `n_classes`: Size of the label space. Classes absent from `y` are allowed.
    /// * `params`: Forest hyperparameters.
    ///
    /// # Errors
    ///
    /// Returns `ForestError::TooFewClasses` when `n_classes < 2`, `ForestError::NoTrees`
    /// when `n_trees == 0`, `ForestError::EmptyTrainingSet` for an empty `x`, and
    /// `ForestError::Tree` for anything the individual trees reject.
    pub fn fit(
        x: ArrayView2<F>,
        y: ArrayView1<usize>,
        n_classes: usize,
        params: &RandomForestParams,
    ) -> Result<Self, ForestError> {
        if n_classes < 2 {
            return Err(ForestError::TooFewClasses(n_classes));
        }
        if params.n_trees == 0 {
            return Err(ForestError::NoTrees);
        }
        if x.nrows() == 0 {
            return Err(ForestError::EmptyTrainingSet);
        }
        params.tree.validate()?;
        if y.len() != x.nrows() {
            return Err(TreeError::LengthMismatch {
                expected: x.nrows(),
                found: y.len(),
            }
            .into());
        }
        // Bootstrap samples may skip rows, so labels are checked here rather than per tree.
        if let Some(&label) = y.iter().find(|&&label| label >= n_classes) {
            return Err(TreeError::LabelOutOfRange { label, n_classes }.into());
        }

        let n_rows = x.nrows();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(params.seed);
        let mut trees = Vec::with_capacity(params.n_trees);
        for i in 0..params.n_trees {
            let samples: Vec<usize> = if params.bootstrap {
                (0..n_rows).map(|_| rng.random_range(0..n_rows)).collect()
            } else {
                (0..n_rows).collect()
            };
            let mut tree_rng = Xoshiro256PlusPlus::seed_from_u64(rng.random::<u64>());
            let tree = DecisionTree::fit(x, y, &samples, n_classes, &params.tree, &mut tree_rng)?;
            debug!(
                "tree {}: {} nodes, depth {}",
                i,
                tree.n_nodes(),
                tree.depth()
            );
            trees.push(tree);
        }

        Ok(Self {
            trees,
            n_features: x.ncols(),
            n_classes,
            params: params.clone(),
        })
    }

    /// Checks a forest that was not produced by `fit`, such as a deserialized one.
    ///
    /// The forest must hold at least one tree and every tree must be well formed and agree
    /// with the forest on the number of features and classes.
    pub fn validate(&self) -> Result<(), ForestError> {
        if self.trees.is_empty() {
            return Err(ForestError::NoTrees);
        }
        if self.n_classes < 2 {
            return Err(ForestError::TooFewClasses(self.n_classes));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            if tree.n_features() != self.n_features || tree.n_classes() != self.n_classes {
                return Err(TreeError::Malformed(format!(
                    "tree {} has {} features and {} classes, the forest {} and {}",
                    i,
                    tree.n_features(),
                    tree.n_classes(),
                    self.n_features,
                    self.n_classes
                ))
                .into());
            }
            tree.validate()?;
        }
        Ok(())
    }

    /// Number of trees that vote for each class.
    pub fn votes(&self, features: ArrayView1<F>) -> Result<Vec<usize>, ForestError> {
        let mut votes = vec![0; self.n_classes];
        for tree in &self.trees {
            votes[tree.predict_row(features)?] += 1;
        }
        Ok(votes)
    }

    /// Predicts the class with the most tree votes. Ties resolve to the lowest class code.
    pub fn predict_row(&self, features: ArrayView1<F>) -> Result<usize, ForestError> {
        self.votes(features).map(|v| majority(&v))
    }

    pub fn predict(&self, x: ArrayView2<F>) -> Result<Array1<usize>, ForestError> {
        x.rows()
            .into_iter()
            .map(|row| self.predict_row(row))
            .collect::<Result<Vec<_>, _>>()
            .map(Array1::from)
    }

    /// Share of trees voting for each class, one row per sample. Rows sum to 1.
    pub fn predict_proba(&self, x: ArrayView2<F>) -> Result<Array2<f64>, ForestError> {
        let mut proba = Array2::zeros((x.nrows(), self.n_classes));
        let n_trees = self.trees.len() as f64;
        for (row, mut out) in x.rows().into_iter().zip(proba.rows_mut()) {
            for (class, count) in self.votes(row)?.into_iter().enumerate() {
                out[class] = count as f64 / n_trees;
            }
        }
        Ok(proba)
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn params(&self) -> &RandomForestParams {
        &self.params
    }

    pub fn trees(&self) -> &[DecisionTree<F>] {
        &self.trees
    }
}
