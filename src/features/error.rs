// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeatureError {
    #[error("Unknown preprocessing step '{name}'; valid feature transforms: {valid}")]
    UnknownTransform { name: String, valid: String },

    #[error("The feature transform '{transform}' needs the channel '{channel}', but the data only has: {available}")]
    MissingChannel {
        transform: String,
        channel: String,
        available: String,
    },

    #[error("The elapsed-time feature was requested, but no earliest time is available to measure it from")]
    MissingEarliestTime,

    #[error(transparent)]
    Timeseries(#[from] crate::timeseries::TimeseriesError),
}
