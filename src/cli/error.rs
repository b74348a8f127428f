// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type for all podcal-related errors. This should be the *only* error
//! enum that is publicly visible.

use thiserror::Error;

use super::common::RunArgsError;
use crate::{
    colocation::ColocationError,
    deployment::DeploymentLogError,
    features::FeatureError,
    field::FieldError,
    harmonization::HarmonizeError,
    io::{DataReadError, ReportWriteError, StageCacheError},
    models::{ModelStoreReadError, ModelStoreWriteError},
    params::{FieldRunError, HarmonizeRunError, RunFolderError},
    settings::SettingsError,
};

/// The *only* publicly visible error from podcal. Each error message should
/// include a hint on what to check, unless it's "generic".
#[derive(Error, Debug)]
pub enum PodcalError {
    /// An error related to run settings.
    #[error("{0}\n\nCheck run_settings.json in the colocation output folder and the supplied arguments.")]
    Settings(String),

    /// An error related to harmonizing pods against the colocation pod.
    #[error("{0}\n\nCheck the harmonization data, the sensors (sensors_included) and the colocation pod (colo_pod_name).")]
    Harmonization(String),

    /// An error related to harmonizing field data.
    #[error("{0}\n\nCheck the field data, the harmonization models and the field time window (field_start, field_end).")]
    Field(String),

    /// An error related to harmonization model files.
    #[error("{0}\n\nHarmonization models are written to a run folder as harmonization_models.json or harmonization_models.bin.")]
    ModelStore(String),

    /// An error related to the colocation scaler and estimator.
    #[error("{0}\n\nCheck the scaler in run_settings.json, the estimator file <best_model>_model.json and the preprocess list.")]
    Colocation(String),

    /// An error related to feature engineering.
    #[error("{0}\n\nCheck the preprocess list in run_settings.json.")]
    Features(String),

    /// An error related to reading pod data or the deployment log.
    #[error("{0}\n\nCheck the data directory (Harmonization and Field sub-directories) and the deployment log.")]
    Data(String),

    /// An error related to argument files.
    #[error("{0}\n\nArgument files are toml or json files with the same keys as the long command-line arguments.")]
    ArgFile(String),

    /// An error related to the run output folder.
    #[error("{0}\n\nEach run writes to its own new folder; change the run name (hf_run_name).")]
    OutputFolder(String),

    /// A generic error that can't be clarified further, e.g. IO errors.
    #[error("{0}")]
    Generic(String),
}

// When changing the error propagation below, ensure `Self::from(e)` uses the
// correct `e`!

impl From<RunArgsError> for PodcalError {
    fn from(e: RunArgsError) -> Self {
        let s = e.to_string();
        match e {
            RunArgsError::NoColocationFolder
            | RunArgsError::MissingColocationFolder(_)
            | RunArgsError::NoHarmonizationFolder
            | RunArgsError::MissingHarmonizationFolder(_) => Self::Settings(s),
            RunArgsError::NoModelStore(_) | RunArgsError::BadModelStoreType(_) => {
                Self::ModelStore(s)
            }
        }
    }
}

impl From<HarmonizeRunError> for PodcalError {
    fn from(e: HarmonizeRunError) -> Self {
        match e {
            HarmonizeRunError::RunFolder(e) => Self::from(e),
            HarmonizeRunError::DataRead(e) => Self::from(e),
            HarmonizeRunError::StageCache(e) => Self::from(e),
            HarmonizeRunError::Harmonize(e) => Self::from(e),
            HarmonizeRunError::ReportWrite(e) => Self::from(e),
            HarmonizeRunError::ModelStoreWrite(e) => Self::from(e),
            HarmonizeRunError::Settings(e) => Self::from(e),
            HarmonizeRunError::Field(e) => Self::from(e),
        }
    }
}

impl From<FieldRunError> for PodcalError {
    fn from(e: FieldRunError) -> Self {
        match e {
            FieldRunError::NoFieldEstimates => Self::Field(e.to_string()),
            FieldRunError::RunFolder(e) => Self::from(e),
            FieldRunError::DataRead(e) => Self::from(e),
            FieldRunError::StageCache(e) => Self::from(e),
            FieldRunError::Field(e) => Self::from(e),
            FieldRunError::Feature(e) => Self::from(e),
            FieldRunError::Colocation(e) => Self::from(e),
            FieldRunError::ReportWrite(e) => Self::from(e),
            FieldRunError::Settings(e) => Self::from(e),
        }
    }
}

// Library code errors.

impl From<SettingsError> for PodcalError {
    fn from(e: SettingsError) -> Self {
        let s = e.to_string();
        match e {
            SettingsError::MissingFile(_)
            | SettingsError::Decode { .. }
            | SettingsError::MissingKey(_)
            | SettingsError::BadValue { .. }
            | SettingsError::NoSensors
            | SettingsError::MultipleColocationPods(_) => Self::Settings(s),
            SettingsError::Feature(e) => Self::from(e),
            SettingsError::Encode(_) | SettingsError::IO(_) => Self::Generic(s),
        }
    }
}

impl From<HarmonizeError> for PodcalError {
    fn from(e: HarmonizeError) -> Self {
        let s = e.to_string();
        match e {
            HarmonizeError::ColocationPodMissing(_)
            | HarmonizeError::NoPodsToHarmonize(_)
            | HarmonizeError::EmptyPair { .. }
            | HarmonizeError::MissingSensor(_)
            | HarmonizeError::TooFewRows { .. }
            | HarmonizeError::Timeseries(_)
            | HarmonizeError::LeastSquares(_)
            | HarmonizeError::Model(_) => Self::Harmonization(s),
            HarmonizeError::TooFewFolds(_) => Self::Settings(s),
        }
    }
}

impl From<FieldError> for PodcalError {
    fn from(e: FieldError) -> Self {
        let s = e.to_string();
        match e {
            FieldError::MissingSensorModel { .. } | FieldError::MissingFeature { .. } => {
                Self::ModelStore(s)
            }
            FieldError::MissingElapsedReference { .. } => Self::Settings(s),
            FieldError::Timeseries(_) | FieldError::Model(_) => Self::Field(s),
        }
    }
}

impl From<FeatureError> for PodcalError {
    fn from(e: FeatureError) -> Self {
        let s = e.to_string();
        match e {
            FeatureError::UnknownTransform { .. }
            | FeatureError::MissingChannel { .. }
            | FeatureError::MissingEarliestTime => Self::Features(s),
            FeatureError::Timeseries(_) => Self::Generic(s),
        }
    }
}

impl From<ColocationError> for PodcalError {
    fn from(e: ColocationError) -> Self {
        let s = e.to_string();
        match e {
            ColocationError::MissingArtifact(_)
            | ColocationError::BadArtifact { .. }
            | ColocationError::ScalerShape { .. }
            | ColocationError::FeatureCount { .. }
            | ColocationError::FeatureNames { .. }
            | ColocationError::EmptyEnsemble
            | ColocationError::BadTree { .. } => Self::Colocation(s),
            ColocationError::Timeseries(_) | ColocationError::IO(_) => Self::Generic(s),
        }
    }
}

impl From<ModelStoreReadError> for PodcalError {
    fn from(e: ModelStoreReadError) -> Self {
        let s = e.to_string();
        match e {
            ModelStoreReadError::UnsupportedExt { .. }
            | ModelStoreReadError::BinaryMagic { .. }
            | ModelStoreReadError::BinaryVersion { .. }
            | ModelStoreReadError::BinaryUtf8 { .. }
            | ModelStoreReadError::BinaryTruncated { .. }
            | ModelStoreReadError::BadShape { .. }
            | ModelStoreReadError::ColocationPodEntry { .. }
            | ModelStoreReadError::Json(_) => Self::ModelStore(s),
            ModelStoreReadError::IO(e) => Self::from(e),
        }
    }
}

impl From<ModelStoreWriteError> for PodcalError {
    fn from(e: ModelStoreWriteError) -> Self {
        let s = e.to_string();
        match e {
            ModelStoreWriteError::UnsupportedExt { .. } | ModelStoreWriteError::Json(_) => {
                Self::ModelStore(s)
            }
            ModelStoreWriteError::IO(e) => Self::from(e),
        }
    }
}

impl From<DataReadError> for PodcalError {
    fn from(e: DataReadError) -> Self {
        Self::Data(e.to_string())
    }
}

impl From<DeploymentLogError> for PodcalError {
    fn from(e: DeploymentLogError) -> Self {
        Self::Data(e.to_string())
    }
}

impl From<StageCacheError> for PodcalError {
    fn from(e: StageCacheError) -> Self {
        let s = e.to_string();
        match e {
            StageCacheError::Decode { .. } => Self::Data(format!(
                "{s}\nDeleting the cache file will cause the pod data to be read again"
            )),
            StageCacheError::Encode(_)
            | StageCacheError::Timeseries(_)
            | StageCacheError::IO(_) => Self::Generic(s),
        }
    }
}

impl From<ReportWriteError> for PodcalError {
    fn from(e: ReportWriteError) -> Self {
        Self::Generic(e.to_string())
    }
}

impl From<RunFolderError> for PodcalError {
    fn from(e: RunFolderError) -> Self {
        let s = e.to_string();
        match e {
            RunFolderError::Exists(_) => Self::OutputFolder(s),
            RunFolderError::IO(e) => Self::from(e),
        }
    }
}

impl From<toml::ser::Error> for PodcalError {
    fn from(e: toml::ser::Error) -> Self {
        Self::ArgFile(e.to_string())
    }
}

impl From<std::io::Error> for PodcalError {
    fn from(e: std::io::Error) -> Self {
        Self::Generic(e.to_string())
    }
}
