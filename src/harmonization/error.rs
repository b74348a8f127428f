// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarmonizeError {
    #[error("The colocation pod '{0}' is not present in the harmonization data")]
    ColocationPodMissing(String),

    #[error("There are no pods to harmonize to the colocation pod '{0}'")]
    NoPodsToHarmonize(String),

    #[error("No aligned rows remain for sensor {sensor} after resampling and dropping missing values; cannot fit a harmonization model to empty data")]
    EmptyPair { sensor: String },

    #[error("Sensor column '{0}' disappeared while aligning data")]
    MissingSensor(String),

    #[error("At least 2 folds are required for cross validation, but {0} was specified")]
    TooFewFolds(usize),

    #[error("Cannot split {rows} aligned rows into {k} folds")]
    TooFewRows { rows: usize, k: usize },

    #[error(transparent)]
    Timeseries(#[from] crate::timeseries::TimeseriesError),

    #[error(transparent)]
    LeastSquares(#[from] crate::math::LeastSquaresError),

    #[error(transparent)]
    Model(#[from] crate::models::ModelError),
}
