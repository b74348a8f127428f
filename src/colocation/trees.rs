// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tree-ensemble estimators: random forests and gradient-boosted trees.
//!
//! Trees are stored flattened, one entry per node. Node 0 is the root. A node
//! is a leaf when its `children_left` entry is negative; otherwise a row goes
//! left when `x[feature] <= threshold` and right otherwise. Children always
//! come after their parent, so walking a valid tree always terminates.

use ndarray::prelude::*;
use serde::{Deserialize, Serialize};

use super::{ColocationError, ColocationEstimator};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<f64>,
}

impl RegressionTree {
    fn num_nodes(&self) -> usize {
        self.value.len()
    }

    fn validate(&self, tree: usize, num_features: usize) -> Result<(), ColocationError> {
        let bad = |node: usize, reason: String| ColocationError::BadTree { tree, node, reason };

        let n = self.num_nodes();
        if n == 0 {
            return Err(bad(0, "the tree has no nodes".to_string()));
        }
        for (what, len) in [
            ("children_left", self.children_left.len()),
            ("children_right", self.children_right.len()),
            ("feature", self.feature.len()),
            ("threshold", self.threshold.len()),
        ] {
            if len != n {
                return Err(bad(0, format!("{what} has {len} entries, expected {n}")));
            }
        }

        for node in 0..n {
            let left = self.children_left[node];
            if left < 0 {
                continue;
            }
            let right = self.children_right[node];
            for child in [left, right] {
                if child <= node as i64 || child >= n as i64 {
                    return Err(bad(node, format!("child {child} is out of order")));
                }
            }
            let feature = self.feature[node];
            if feature < 0 || feature >= num_features as i64 {
                return Err(bad(node, format!("feature {feature} doesn't exist")));
            }
        }
        Ok(())
    }

    /// The leaf value for one row. The tree must have been validated.
    fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        let mut node = 0;
        while self.children_left[node] >= 0 {
            let feature = self.feature[node] as usize;
            node = if row[feature] <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }
        self.value[node]
    }
}

fn check_trees(trees: &[RegressionTree], num_features: usize) -> Result<(), ColocationError> {
    if trees.is_empty() {
        return Err(ColocationError::EmptyEnsemble);
    }
    for (i, tree) in trees.iter().enumerate() {
        tree.validate(i, num_features)?;
    }
    Ok(())
}

fn check_features(x: ArrayView2<f64>, expected: usize) -> Result<(), ColocationError> {
    let got = x.len_of(Axis(1));
    if got != expected {
        return Err(ColocationError::FeatureCount {
            what: "estimator",
            expected,
            got,
        });
    }
    Ok(())
}

/// A random forest; the prediction is the mean of the trees' predictions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestEstimator {
    pub num_features: usize,
    pub trees: Vec<RegressionTree>,
}

impl ForestEstimator {
    pub(super) fn validate(&self) -> Result<(), ColocationError> {
        check_trees(&self.trees, self.num_features)
    }
}

impl ColocationEstimator for ForestEstimator {
    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>, ColocationError> {
        check_features(x, self.num_features)?;
        self.validate()?;
        let num_trees = self.trees.len() as f64;
        Ok(x.outer_iter()
            .map(|row| {
                self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>() / num_trees
            })
            .collect())
    }
}

/// Gradient-boosted trees: `init + learning_rate * Σ tree(x)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostedEstimator {
    pub num_features: usize,
    pub init: f64,
    pub learning_rate: f64,
    pub trees: Vec<RegressionTree>,
}

impl BoostedEstimator {
    pub(super) fn validate(&self) -> Result<(), ColocationError> {
        check_trees(&self.trees, self.num_features)
    }
}

impl ColocationEstimator for BoostedEstimator {
    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>, ColocationError> {
        check_features(x, self.num_features)?;
        self.validate()?;
        Ok(x.outer_iter()
            .map(|row| {
                self.init
                    + self.learning_rate
                        * self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>()
            })
            .collect())
    }
}
