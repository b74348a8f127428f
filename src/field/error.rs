// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FieldError {
    #[error("Pod {pod} has harmonization models, but none for sensor '{sensor}'")]
    MissingSensorModel { pod: String, sensor: String },

    #[error("The harmonization model of pod {pod} needs the field feature '{feature}', which is unavailable")]
    MissingFeature { pod: String, feature: String },

    #[error("The harmonization model of pod {pod} sensor {sensor} uses elapsed time, but the harmonization's earliest time is unknown")]
    MissingElapsedReference { pod: String, sensor: String },

    #[error(transparent)]
    Timeseries(#[from] crate::timeseries::TimeseriesError),

    #[error(transparent)]
    Model(#[from] crate::models::ModelError),
}
