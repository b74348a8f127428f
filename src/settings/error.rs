// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("The settings file '{0}' does not exist")]
    MissingFile(String),

    #[error("Couldn't decode the settings in '{file}': {err}")]
    Decode {
        file: String,
        err: serde_json::Error,
    },

    #[error("The setting '{0}' is required but wasn't given")]
    MissingKey(&'static str),

    #[error("The setting '{key}' is invalid: {err}")]
    BadValue { key: &'static str, err: String },

    #[error("No sensors were specified in 'sensors_included'")]
    NoSensors,

    #[error("Only one colocation pod may be specified, but got: {0}")]
    MultipleColocationPods(String),

    #[error(transparent)]
    Feature(#[from] crate::features::FeatureError),

    #[error(transparent)]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
