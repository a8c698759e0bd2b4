//! Regression trees and the bagged forest used as the price regressor.
//!
//! This module implements:
//! - CART regression trees (variance-reduction splits, mean-valued leaves)
//! - Random Forest regression (bootstrap-aggregated CART trees)
//!
//! Every prediction is an average of leaf means, so forest output always
//! stays inside the range of training targets, whatever the encoded matrix
//! looks like (duplicated or colinear indicator columns included).
//!
//! # Example
//!
//! ```
//! use appraiser::prelude::*;
//!
//! let x = Matrix::from_vec(5, 1, vec![1.0, 2.0, 3.0, 4.0, 5.0]).expect("5x1");
//! let y = Vector::from_slice(&[2.0, 4.0, 6.0, 8.0, 10.0]);
//!
//! let mut rf = RandomForestRegressor::new(10).with_max_depth(5).with_random_state(42);
//! rf.fit(&x, &y).expect("fit should succeed");
//! let predictions = rf.predict(&x).expect("fitted");
//! assert_eq!(predictions.len(), 5);
//! ```

use crate::error::{AppraiserError, Result};
use crate::primitives::{Matrix, Vector};
use crate::traits::Estimator;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Leaf node in a regression tree.
///
/// Contains the predicted value (mean of training samples) and number of
/// training samples that reached this leaf.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionLeaf {
    /// Predicted value for this leaf (mean of y values)
    pub value: f64,
    /// Number of training samples in this leaf
    pub n_samples: usize,
}

/// Internal node in a regression tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionNode {
    /// Index of the feature to split on
    pub feature_idx: usize,
    /// Threshold value for the split
    pub threshold: f64,
    /// Sum of squared errors removed by this split
    pub sse_decrease: f64,
    /// Left subtree (samples where feature <= threshold)
    pub left: Box<RegressionTreeNode>,
    /// Right subtree (samples where feature > threshold)
    pub right: Box<RegressionTreeNode>,
}

/// A node in a regression tree (either internal node or leaf).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RegressionTreeNode {
    /// Internal decision node with split condition
    Node(RegressionNode),
    /// Leaf node with value prediction
    Leaf(RegressionLeaf),
}

impl RegressionTreeNode {
    /// Returns the depth of the tree rooted at this node.
    ///
    /// Leaf nodes have depth 0, internal nodes have depth 1 + max(left, right).
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            RegressionTreeNode::Leaf(_) => 0,
            RegressionTreeNode::Node(node) => 1 + node.left.depth().max(node.right.depth()),
        }
    }

    fn predict_one(&self, sample: &[f64]) -> f64 {
        let mut node = self;
        loop {
            match node {
                RegressionTreeNode::Leaf(leaf) => return leaf.value,
                RegressionTreeNode::Node(internal) => {
                    node = if sample[internal.feature_idx] <= internal.threshold {
                        &internal.left
                    } else {
                        &internal.right
                    };
                }
            }
        }
    }

    fn accumulate_importances(&self, importances: &mut [f64]) {
        if let RegressionTreeNode::Node(n) = self {
            importances[n.feature_idx] += n.sse_decrease;
            n.left.accumulate_importances(importances);
            n.right.accumulate_importances(importances);
        }
    }
}

/// Stopping parameters shared by every node of one tree.
#[derive(Debug, Clone, Copy)]
struct GrowParams {
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
}

/// Decision tree regressor using the CART algorithm.
///
/// Uses squared error reduction as the split criterion. Leaf nodes predict
/// the mean of the target values that reached them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTreeRegressor {
    tree: Option<RegressionTreeNode>,
    n_features: usize,
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
}

impl DecisionTreeRegressor {
    /// Creates a new decision tree regressor with default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tree: None,
            n_features: 0,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }

    /// Sets the maximum depth of the tree (root has depth 0).
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Sets the minimum number of samples required to split an internal node
    /// (clamped to at least 2).
    #[must_use]
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples.max(2);
        self
    }

    /// Sets the minimum number of samples required at a leaf node (clamped to
    /// at least 1).
    #[must_use]
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples.max(1);
        self
    }

    /// Returns the depth of the fitted tree, or `None` before `fit`.
    #[must_use]
    pub fn depth(&self) -> Option<usize> {
        self.tree.as_ref().map(RegressionTreeNode::depth)
    }

    fn params(&self) -> GrowParams {
        GrowParams {
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
        }
    }
}

impl Default for DecisionTreeRegressor {
    fn default() -> Self {
        Self::new()
    }
}

impl Estimator for DecisionTreeRegressor {
    fn fit(&mut self, x: &Matrix<f64>, y: &Vector<f64>) -> Result<()> {
        let (n_rows, n_cols) = x.shape();
        check_training_shape(n_rows, y.len())?;

        let indices: Vec<usize> = (0..n_rows).collect();
        self.tree = Some(build_regression_tree(x, y.as_slice(), indices, 0, self.params()));
        self.n_features = n_cols;
        Ok(())
    }

    fn predict(&self, x: &Matrix<f64>) -> Result<Vector<f64>> {
        let tree = self.tree.as_ref().ok_or(AppraiserError::NotTrained)?;
        check_width(self.n_features, x.n_cols())?;

        Ok(Vector::from_vec(
            (0..x.n_rows())
                .map(|row| tree.predict_one(x.row_slice(row)))
                .collect(),
        ))
    }
}

/// Random Forest Regressor.
///
/// Ensemble of decision tree regressors trained on bootstrap samples.
/// Predictions are averaged across all trees to reduce variance. Trees are
/// grown in parallel; with a fixed `random_state` tree `i` always sees the
/// bootstrap drawn from seed `random_state + i`, so results are reproducible
/// regardless of scheduling.
///
/// # Examples
///
/// ```
/// use appraiser::tree::RandomForestRegressor;
/// use appraiser::traits::Estimator;
/// use appraiser::primitives::{Matrix, Vector};
///
/// let x = Matrix::from_vec(5, 1, vec![1.0, 2.0, 3.0, 4.0, 5.0]).expect("5x1");
/// let y = Vector::from_slice(&[2.0, 4.0, 6.0, 8.0, 10.0]);
///
/// let mut rf = RandomForestRegressor::new(10).with_max_depth(5);
/// rf.fit(&x, &y).expect("fit should succeed");
/// let r2 = rf.score(&x, &y).expect("fitted");
/// assert!(r2 > 0.0);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    trees: Vec<DecisionTreeRegressor>,
    n_estimators: usize,
    max_depth: Option<usize>,
    min_samples_leaf: usize,
    random_state: Option<u64>,
    n_features: usize,
}

impl RandomForestRegressor {
    /// Creates a new Random Forest regressor with `n_estimators` trees
    /// (clamped to at least one).
    #[must_use]
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators: n_estimators.max(1),
            max_depth: None,
            min_samples_leaf: 1,
            random_state: None,
            n_features: 0,
        }
    }

    /// Sets the maximum depth for each tree.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Sets the minimum number of samples per leaf for each tree.
    #[must_use]
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples.max(1);
        self
    }

    /// Sets the random state for reproducibility.
    #[must_use]
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = Some(random_state);
        self
    }

    /// Number of trees the forest grows.
    #[must_use]
    pub fn n_estimators(&self) -> usize {
        self.n_estimators
    }

    /// True once `fit` has grown the trees.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    /// Returns feature importances based on total squared-error decrease.
    ///
    /// Each tree's split gains are summed per feature, averaged over trees
    /// and normalized to sum to 1.0 (all zeros when no tree ever split).
    ///
    /// # Returns
    ///
    /// `None` if the model has not been fitted.
    #[must_use]
    pub fn feature_importances(&self) -> Option<Vec<f64>> {
        if self.trees.is_empty() {
            return None;
        }

        let mut total = vec![0.0; self.n_features];
        for tree in &self.trees {
            if let Some(root) = &tree.tree {
                root.accumulate_importances(&mut total);
            }
        }

        let sum: f64 = total.iter().sum();
        if sum > 0.0 {
            for importance in &mut total {
                *importance /= sum;
            }
        }
        Some(total)
    }

    fn make_tree(&self) -> DecisionTreeRegressor {
        let tree = DecisionTreeRegressor::new().with_min_samples_leaf(self.min_samples_leaf);
        match self.max_depth {
            Some(depth) => tree.with_max_depth(depth),
            None => tree,
        }
    }
}

impl Default for RandomForestRegressor {
    fn default() -> Self {
        Self::new(100)
    }
}

impl Estimator for RandomForestRegressor {
    fn fit(&mut self, x: &Matrix<f64>, y: &Vector<f64>) -> Result<()> {
        let (n_samples, n_features) = x.shape();
        check_training_shape(n_samples, y.len())?;

        let forest = &*self;
        let trees = (0..forest.n_estimators)
            .into_par_iter()
            .map(|i| {
                let seed = forest.random_state.map(|s| s.wrapping_add(i as u64));
                let bootstrap_indices = bootstrap_sample(n_samples, seed);
                let bootstrap_x = x.select_rows(&bootstrap_indices);
                let bootstrap_y = y.select(&bootstrap_indices);

                let mut tree = forest.make_tree();
                tree.fit(&bootstrap_x, &bootstrap_y)?;
                Ok(tree)
            })
            .collect::<Result<Vec<_>>>()?;

        self.trees = trees;
        self.n_features = n_features;
        Ok(())
    }

    fn predict(&self, x: &Matrix<f64>) -> Result<Vector<f64>> {
        if self.trees.is_empty() {
            return Err(AppraiserError::NotTrained);
        }
        check_width(self.n_features, x.n_cols())?;

        let mut predictions = vec![0.0; x.n_rows()];
        for tree in &self.trees {
            let tree_preds = tree.predict(x)?;
            for (pred, &tree_pred) in predictions.iter_mut().zip(tree_preds.as_slice()) {
                *pred += tree_pred;
            }
        }

        let n_trees = self.trees.len() as f64;
        for pred in &mut predictions {
            *pred /= n_trees;
        }

        Ok(Vector::from_vec(predictions))
    }
}

fn check_training_shape(n_rows: usize, n_targets: usize) -> Result<()> {
    if n_rows != n_targets {
        return Err(AppraiserError::dimension_mismatch("targets", n_rows, n_targets));
    }
    if n_rows == 0 {
        return Err(AppraiserError::empty_input("cannot fit with zero samples"));
    }
    Ok(())
}

fn check_width(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(AppraiserError::dimension_mismatch("features", expected, actual));
    }
    Ok(())
}

/// Creates a bootstrap sample (random sample with replacement).
///
/// Returns indices of samples to include in the bootstrap sample.
fn bootstrap_sample(n_samples: usize, random_state: Option<u64>) -> Vec<usize> {
    use rand::distributions::{Distribution, Uniform};
    use rand::SeedableRng;

    let dist = Uniform::from(0..n_samples);

    match random_state {
        Some(seed) => {
            let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
            (0..n_samples).map(|_| dist.sample(&mut rng)).collect()
        }
        None => {
            let mut rng = rand::thread_rng();
            (0..n_samples).map(|_| dist.sample(&mut rng)).collect()
        }
    }
}

/// Compute the mean of the targets at `indices`.
fn mean_at(y: &[f64], indices: &[usize]) -> f64 {
    if indices.is_empty() {
        return 0.0;
    }
    indices.iter().map(|&i| y[i]).sum::<f64>() / indices.len() as f64
}

/// Sum of squared deviations from the mean of the targets at `indices`.
fn sse_at(y: &[f64], indices: &[usize]) -> f64 {
    let mean = mean_at(y, indices);
    indices.iter().map(|&i| (y[i] - mean).powi(2)).sum()
}

/// Best split found for one node: (feature, threshold, sse decrease).
type Split = (usize, f64, f64);

/// Scan one feature for the threshold that removes the most squared error.
///
/// Samples are sorted by feature value and swept once with running sums of
/// the centered targets, so each candidate costs O(1).
fn best_split_for_feature(
    x: &Matrix<f64>,
    y: &[f64],
    indices: &[usize],
    feature_idx: usize,
    parent_mean: f64,
    parent_sse: f64,
    min_samples_leaf: usize,
) -> Option<(f64, f64)> {
    let mut order: Vec<(f64, f64)> = indices
        .iter()
        .map(|&i| (x.get(i, feature_idx), y[i] - parent_mean))
        .collect();
    order.sort_by(|a, b| a.0.total_cmp(&b.0));

    let n = order.len();
    let total_sum: f64 = order.iter().map(|(_, c)| c).sum();
    let mut left_sum = 0.0;
    let mut best: Option<(f64, f64)> = None;

    for k in 1..n {
        let (prev_value, centered) = order[k - 1];
        left_sum += centered;

        if prev_value == order[k].0 || k < min_samples_leaf || n - k < min_samples_leaf {
            continue;
        }

        let n_left = k as f64;
        let n_right = (n - k) as f64;
        let right_sum = total_sum - left_sum;
        // parent_sse - sse_left - sse_right, expanded on centered targets
        let decrease = left_sum * left_sum / n_left + right_sum * right_sum / n_right
            - total_sum * total_sum / n as f64;

        if decrease > parent_sse * 1e-12 && best.map_or(true, |(_, g)| decrease > g) {
            best = Some(((prev_value + order[k].0) / 2.0, decrease));
        }
    }

    best
}

fn find_best_regression_split(
    x: &Matrix<f64>,
    y: &[f64],
    indices: &[usize],
    parent_sse: f64,
    min_samples_leaf: usize,
) -> Option<Split> {
    let parent_mean = mean_at(y, indices);
    let mut best: Option<Split> = None;

    for feature_idx in 0..x.n_cols() {
        if let Some((threshold, gain)) = best_split_for_feature(
            x,
            y,
            indices,
            feature_idx,
            parent_mean,
            parent_sse,
            min_samples_leaf,
        ) {
            if best.map_or(true, |(_, _, g)| gain > g) {
                best = Some((feature_idx, threshold, gain));
            }
        }
    }

    best
}

fn make_regression_leaf(y: &[f64], indices: &[usize]) -> RegressionTreeNode {
    RegressionTreeNode::Leaf(RegressionLeaf {
        value: mean_at(y, indices),
        n_samples: indices.len(),
    })
}

/// Build a regression tree recursively over the rows in `indices`.
fn build_regression_tree(
    x: &Matrix<f64>,
    y: &[f64],
    indices: Vec<usize>,
    depth: usize,
    params: GrowParams,
) -> RegressionTreeNode {
    let n_samples = indices.len();
    let sse = sse_at(y, &indices);

    if n_samples < params.min_samples_split
        || params.max_depth.is_some_and(|max_d| depth >= max_d)
        || sse / (n_samples.max(1) as f64) < 1e-10
    {
        return make_regression_leaf(y, &indices);
    }

    let Some((feature_idx, threshold, sse_decrease)) =
        find_best_regression_split(x, y, &indices, sse, params.min_samples_leaf)
    else {
        return make_regression_leaf(y, &indices);
    };

    let (left, right): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .copied()
        .partition(|&row| x.get(row, feature_idx) <= threshold);

    if left.is_empty() || right.is_empty() {
        return make_regression_leaf(y, &indices);
    }

    RegressionTreeNode::Node(RegressionNode {
        feature_idx,
        threshold,
        sse_decrease,
        left: Box::new(build_regression_tree(x, y, left, depth + 1, params)),
        right: Box::new(build_regression_tree(x, y, right, depth + 1, params)),
    })
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
