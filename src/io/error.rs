// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors from reading pod data, writing reports and the stage cache.

use std::path::PathBuf;

use thiserror::Error;

use super::GlobError;

#[derive(Error, Debug)]
pub enum DataReadError {
    #[error("There are no '{deployment}' deployments in the deployment log")]
    NoDeployments { deployment: String },

    #[error("No {deployment} data were found in {dir}")]
    NoData { deployment: String, dir: PathBuf },

    #[error("The data directory {0} does not exist")]
    MissingDir(PathBuf),

    #[error("{file}: there is no '{column}' column")]
    MissingColumn { file: PathBuf, column: String },

    #[error("{file} line {line}: couldn't parse '{got}' as a date and time")]
    BadTimestamp {
        file: PathBuf,
        line: u64,
        got: String,
    },

    #[error("{file} line {line}: couldn't parse '{got}' in column '{column}' as a finite number")]
    BadValue {
        file: PathBuf,
        line: u64,
        column: String,
        got: String,
    },

    #[error("Couldn't read {file}: {err}")]
    Csv { file: PathBuf, err: csv::Error },

    #[error(transparent)]
    Glob(#[from] GlobError),

    #[error(transparent)]
    Timeseries(#[from] crate::timeseries::TimeseriesError),
}

#[derive(Error, Debug)]
pub enum ReportWriteError {
    #[error("Couldn't write {file}: {err}")]
    Csv { file: PathBuf, err: csv::Error },

    #[error(transparent)]
    IO(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum StageCacheError {
    #[error("The cached data in {file} couldn't be decoded: {err}")]
    Decode {
        file: PathBuf,
        err: serde_json::Error,
    },

    #[error("Couldn't encode data for the cache: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Timeseries(#[from] crate::timeseries::TimeseriesError),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
