// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ColocationError {
    #[error("The colocation model file '{0}' does not exist")]
    MissingArtifact(String),

    #[error("Couldn't read the colocation model from '{file}': {err}")]
    BadArtifact { file: String, err: String },

    #[error("The fitted scaler has {mean} means but {scale} scales")]
    ScalerShape { mean: usize, scale: usize },

    #[error("The fitted {what} expects {expected} features, but {got} were supplied")]
    FeatureCount {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("The fitted scaler was trained on the features [{expected}], but the engineered features are [{got}]")]
    FeatureNames { expected: String, got: String },

    #[error("The tree ensemble has no trees")]
    EmptyEnsemble,

    #[error("Tree {tree} of the ensemble is malformed at node {node}: {reason}")]
    BadTree {
        tree: usize,
        node: usize,
        reason: String,
    },

    #[error(transparent)]
    Timeseries(#[from] crate::timeseries::TimeseriesError),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
