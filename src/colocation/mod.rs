// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The colocation model artifact: a fitted feature scaler and a fitted
//! estimator, both produced by an earlier colocation stage. Nothing here
//! refits anything.

mod error;
mod trees;

pub use error::ColocationError;
pub use trees::{BoostedEstimator, ForestEstimator, RegressionTree};

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use ndarray::prelude::*;
use serde::{Deserialize, Serialize};

use crate::timeseries::PodTimeseries;

/// Something that transforms engineered features into the space an estimator
/// was trained in.
pub trait FeatureScaler {
    /// Transform (rows, features) with the already-fitted parameters.
    /// `feature_names` are the names of the columns of `x`.
    fn transform(
        &self,
        x: ArrayView2<f64>,
        feature_names: &[&str],
    ) -> Result<Array2<f64>, ColocationError>;
}

/// A fitted estimator mapping scaled features to pollutant concentrations.
pub trait ColocationEstimator {
    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>, ColocationError>;
}

/// A scaler that centres and scales each feature, i.e. `(x - mean) / scale`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,

    /// If available, the names of the features, in order, that this scaler
    /// was fit on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
}

impl FeatureScaler for StandardScaler {
    fn transform(
        &self,
        x: ArrayView2<f64>,
        feature_names: &[&str],
    ) -> Result<Array2<f64>, ColocationError> {
        if self.mean.len() != self.scale.len() {
            return Err(ColocationError::ScalerShape {
                mean: self.mean.len(),
                scale: self.scale.len(),
            });
        }
        let num_features = x.len_of(Axis(1));
        if num_features != self.mean.len() {
            return Err(ColocationError::FeatureCount {
                what: "scaler",
                expected: self.mean.len(),
                got: num_features,
            });
        }
        if let Some(expected) = &self.feature_names {
            if !expected.iter().map(|s| s.as_str()).eq(feature_names.iter().copied()) {
                return Err(ColocationError::FeatureNames {
                    expected: expected.join(", "),
                    got: feature_names.join(", "),
                });
            }
        }

        let mean = ArrayView1::from(self.mean.as_slice());
        // A zero scale means the feature was constant during fitting.
        let scale = self
            .scale
            .iter()
            .map(|&s| if s == 0.0 { 1.0 } else { s })
            .collect::<Array1<f64>>();
        Ok((&x - &mean) / &scale)
    }
}

/// A linear estimator: `x β + c`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearEstimator {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl ColocationEstimator for LinearEstimator {
    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>, ColocationError> {
        let num_features = x.len_of(Axis(1));
        if num_features != self.coefficients.len() {
            return Err(ColocationError::FeatureCount {
                what: "estimator",
                expected: self.coefficients.len(),
                got: num_features,
            });
        }
        Ok(x.dot(&ArrayView1::from(self.coefficients.as_slice())) + self.intercept)
    }
}

/// A fitted estimator as persisted by the colocation stage. The "model" field
/// names the estimator family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model")]
pub enum EstimatorArtifact {
    #[serde(rename = "lin_reg")]
    LinReg(LinearEstimator),

    #[serde(rename = "ridge")]
    Ridge(LinearEstimator),

    #[serde(rename = "lasso")]
    Lasso(LinearEstimator),

    #[serde(rename = "elastic_net")]
    ElasticNet(LinearEstimator),

    #[serde(rename = "random_forest")]
    RandomForest(ForestEstimator),

    #[serde(rename = "gradboost")]
    GradBoost(BoostedEstimator),
}

impl EstimatorArtifact {
    /// Read `<folder>/<best_model>_model.json`.
    pub fn read(folder: &Path, best_model: &str) -> Result<EstimatorArtifact, ColocationError> {
        let file = folder.join(format!("{best_model}_model.json"));
        if !file.exists() {
            return Err(ColocationError::MissingArtifact(file.display().to_string()));
        }
        let reader = BufReader::new(File::open(&file)?);
        let artifact: EstimatorArtifact =
            serde_json::from_reader(reader).map_err(|e| ColocationError::BadArtifact {
                file: file.display().to_string(),
                err: e.to_string(),
            })?;
        match &artifact {
            EstimatorArtifact::RandomForest(e) => e.validate()?,
            EstimatorArtifact::GradBoost(e) => e.validate()?,
            _ => (),
        }
        Ok(artifact)
    }

    pub fn name(&self) -> &'static str {
        match self {
            EstimatorArtifact::LinReg(_) => "lin_reg",
            EstimatorArtifact::Ridge(_) => "ridge",
            EstimatorArtifact::Lasso(_) => "lasso",
            EstimatorArtifact::ElasticNet(_) => "elastic_net",
            EstimatorArtifact::RandomForest(_) => "random_forest",
            EstimatorArtifact::GradBoost(_) => "gradboost",
        }
    }
}

impl ColocationEstimator for EstimatorArtifact {
    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>, ColocationError> {
        match self {
            EstimatorArtifact::LinReg(e)
            | EstimatorArtifact::Ridge(e)
            | EstimatorArtifact::Lasso(e)
            | EstimatorArtifact::ElasticNet(e) => e.predict(x),
            EstimatorArtifact::RandomForest(e) => e.predict(x),
            EstimatorArtifact::GradBoost(e) => e.predict(x),
        }
    }
}

/// The output of [`predict`].
#[derive(Debug, Clone)]
pub struct ColocationPrediction {
    /// The engineered features after scaling, with the same columns.
    pub standardized: PodTimeseries,

    /// A single column named after the pollutant.
    pub estimates: PodTimeseries,
}

/// Scale a pod's engineered features and estimate the pollutant
/// concentration at every timestamp.
pub fn predict<S: FeatureScaler + ?Sized, E: ColocationEstimator + ?Sized>(
    features: &PodTimeseries,
    scaler: &S,
    estimator: &E,
    pollutant: &str,
) -> Result<ColocationPrediction, ColocationError> {
    let names: Vec<&str> = features.column_names().collect();
    let scaled = scaler.transform(features.to_array().view(), &names)?;
    let estimates = estimator.predict(scaled.view())?;

    let timestamps = features.timestamps().to_vec();
    let standardized = PodTimeseries::from_array(
        timestamps.clone(),
        names.iter().map(|n| n.to_string()).collect(),
        scaled.view(),
    )?;
    let estimates = PodTimeseries::new(
        timestamps,
        [(pollutant.to_string(), estimates.to_vec())]
            .into_iter()
            .collect(),
    )?;
    Ok(ColocationPrediction {
        standardized,
        estimates,
    })
}
