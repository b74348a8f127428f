// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with harmonization models and their persistence.

use thiserror::Error;

use super::MODEL_STORE_EXTENSIONS;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("The colocation pod '{0}' cannot have a harmonization model")]
    ColocationPodEntry(String),

    #[error("The harmonization model expects {expected} feature columns, but {got} were supplied")]
    FeatureCount { expected: usize, got: usize },
}

#[derive(Error, Debug)]
pub enum ModelStoreReadError {
    #[error("Tried to read a harmonization model file with an unsupported extension '{ext}'! Supported: {}", *MODEL_STORE_EXTENSIONS)]
    UnsupportedExt { ext: String },

    #[error("When reading {file}, expected PODHARM as the first 7 characters, got '{got}' instead!")]
    BinaryMagic { file: String, got: String },

    #[error("When reading {file}, got format version {got}, but only version {expected} is supported")]
    BinaryVersion { file: String, expected: u8, got: u8 },

    #[error("When reading {file}, a string was not valid UTF-8")]
    BinaryUtf8 { file: String },

    #[error("When reading {file}, expected a string of {expected} bytes, but the file ended after {got}")]
    BinaryTruncated {
        file: String,
        expected: u32,
        got: usize,
    },

    #[error("When reading {file}, the model for pod '{pod}' sensor '{sensor}' has {names} feature names but {coefficients} coefficients")]
    BadShape {
        file: String,
        pod: String,
        sensor: String,
        names: usize,
        coefficients: usize,
    },

    #[error("When reading {file}, the colocation pod '{pod}' had models")]
    ColocationPodEntry { file: String, pod: String },

    #[error("Couldn't decode harmonization models from json: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ModelStoreWriteError {
    #[error("Tried to write a harmonization model file with an unsupported extension '{ext}'! Supported: {}", *MODEL_STORE_EXTENSIONS)]
    UnsupportedExt { ext: String },

    #[error("Couldn't encode harmonization models as json: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
