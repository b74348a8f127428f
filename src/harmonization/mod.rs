// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Harmonization: fit a linear correction from every pod's sensor readings to
//! the colocation pod's readings of the same sensor.
//!
//! For each (pod, sensor) pair, the two readings are resampled onto a common
//! time grid (see [`build_aligned_pair`]), k-fold cross validation with
//! contiguous, non-shuffled folds reports how well a linear fit generalises,
//! and finally a linear fit on all of the aligned data becomes the production
//! model.

mod error;
mod stats;

pub use error::HarmonizeError;
pub use stats::{FoldStatistics, HarmonizationStats, Statistic, StatisticTable};

use std::ops::Range;

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use indicatif::ProgressBar;
use log::{debug, info, trace};
use ndarray::prelude::*;
use vec1::Vec1;

use crate::{
    constants::{COLOCATION_SUFFIX, TIME_ELAPSED_COLUMN},
    math::{mean_bias_error, r2_score, rmse, round_dp, LinearFit},
    models::{HarmonizationModel, HarmonizationModels},
    timeseries::{elapsed_days, PodTimeseries, Resampler},
};

/// One pod's sensor readings aligned with the colocation pod's readings of the
/// same sensor. All rows are complete.
#[derive(Debug, Clone)]
pub struct AlignedPair {
    pub(crate) sensor: String,
    pub(crate) timestamps: Vec<NaiveDateTime>,

    /// The names of the columns of `features`. The first is the sensor.
    pub(crate) feature_names: Vec<String>,

    /// Dimensions (rows, features).
    pub(crate) features: Array2<f64>,

    /// The colocation pod's readings.
    pub(crate) target: Array1<f64>,
}

impl AlignedPair {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    /// The pod's (unharmonized) sensor readings.
    pub fn sensor_readings(&self) -> ArrayView1<f64> {
        self.features.column(0)
    }

    pub fn target(&self) -> ArrayView1<f64> {
        self.target.view()
    }
}

/// Align one pod's `sensor` with the colocation pod's `sensor`. Each column is
/// resampled with `resampler`, the two are joined on the bucket timestamps and
/// any incomplete row is dropped.
///
/// If `elapsed_reference` is given, an elapsed-time column (fractional days
/// since the reference) is appended to the features. The reference must be
/// shared by all pods of a harmonization session.
pub fn build_aligned_pair(
    colocation: &PodTimeseries,
    pod: &PodTimeseries,
    sensor: &str,
    resampler: &Resampler,
    elapsed_reference: Option<NaiveDateTime>,
) -> Result<AlignedPair, HarmonizeError> {
    let colocation_column = format!("{sensor}{COLOCATION_SUFFIX}");
    let target = resampler.resample(&colocation.select(&[sensor])?.with_suffix(COLOCATION_SUFFIX));
    let readings = resampler.resample(&pod.select(&[sensor])?);
    let joined = target.outer_join(&readings)?.drop_missing();

    let timestamps = joined.timestamps().to_vec();
    let mut feature_names = vec![sensor.to_string()];
    let mut feature_columns = vec![joined
        .column(sensor)
        .ok_or_else(|| HarmonizeError::MissingSensor(sensor.to_string()))?
        .to_vec()];
    if let Some(reference) = elapsed_reference {
        feature_names.push(TIME_ELAPSED_COLUMN.to_string());
        feature_columns.push(elapsed_days(&timestamps, reference));
    }

    let mut features = Array2::zeros((timestamps.len(), feature_columns.len()));
    for (mut column, values) in features.axis_iter_mut(Axis(1)).zip(feature_columns) {
        column.assign(&ArrayView1::from(values.as_slice()));
    }
    let target = Array1::from(
        joined
            .column(&colocation_column)
            .ok_or_else(|| HarmonizeError::MissingSensor(colocation_column.clone()))?
            .to_vec(),
    );

    Ok(AlignedPair {
        sensor: sensor.to_string(),
        timestamps,
        feature_names,
        features,
        target,
    })
}

/// Split `num_rows` rows into `k` contiguous folds, in order. The first
/// `num_rows % k` folds get one extra row.
pub fn kfold_splits(num_rows: usize, k: usize) -> Result<Vec1<Range<usize>>, HarmonizeError> {
    if k < 2 {
        return Err(HarmonizeError::TooFewFolds(k));
    }
    if num_rows < k {
        return Err(HarmonizeError::TooFewRows { rows: num_rows, k });
    }

    let base = num_rows / k;
    let remainder = num_rows % k;
    let mut start = 0;
    let mut folds = Vec::with_capacity(k);
    for fold in 0..k {
        let size = base + usize::from(fold < remainder);
        folds.push(start..start + size);
        start += size;
    }
    // k >= 2, so this can't fail.
    Vec1::try_from_vec(folds).map_err(|_| HarmonizeError::TooFewFolds(k))
}

/// The output of training one (pod, sensor) pair.
#[derive(Debug, Clone)]
pub struct TrainedHarmonization {
    /// One entry per fold, in fold order.
    pub folds: Vec1<FoldStatistics>,

    /// The production model, fit on all aligned rows.
    pub model: HarmonizationModel,

    /// The production model's predictions over all aligned rows.
    pub fitted: Array1<f64>,
}

/// Cross-validate and fit a harmonization model on an aligned pair.
pub fn train(pair: &AlignedPair, k: usize) -> Result<TrainedHarmonization, HarmonizeError> {
    if pair.is_empty() {
        return Err(HarmonizeError::EmptyPair {
            sensor: pair.sensor.clone(),
        });
    }
    let splits = kfold_splits(pair.len(), k)?;

    let mut folds = Vec::with_capacity(k);
    for (i_fold, test_range) in splits.iter().enumerate() {
        let train_indices: Vec<usize> = (0..pair.len())
            .filter(|i| !test_range.contains(i))
            .collect();
        let x_train = pair.features.select(Axis(0), &train_indices);
        let y_train = pair.target.select(Axis(0), &train_indices);
        let x_test = pair.features.slice(s![test_range.clone(), ..]);
        let y_test = pair.target.slice(s![test_range.clone()]);

        let cv_fit = LinearFit::fit(x_train.view(), y_train.view())?;
        let y_train_predicted = cv_fit.predict(x_train.view());
        let y_test_predicted = cv_fit.predict(x_test);

        let stats = FoldStatistics {
            training_r2: round_dp(r2_score(y_train.view(), y_train_predicted.view()), 2),
            testing_r2: round_dp(r2_score(y_test, y_test_predicted.view()), 2),
            training_rmse: rmse(y_train.view(), y_train_predicted.view()),
            testing_rmse: rmse(y_test, y_test_predicted.view()),
            training_mbe: mean_bias_error(y_train.view(), y_train_predicted.view()),
            testing_mbe: mean_bias_error(y_test, y_test_predicted.view()),
        };
        trace!("{} fold {i_fold}: {stats:?}", pair.sensor);
        folds.push(stats);
    }

    let fit = LinearFit::fit(pair.features.view(), pair.target.view())?;
    let fitted = fit.predict(pair.features.view());
    let folds = Vec1::try_from_vec(folds).map_err(|_| HarmonizeError::TooFewFolds(k))?;

    Ok(TrainedHarmonization {
        folds,
        model: HarmonizationModel {
            features: pair.feature_names.clone(),
            fit,
        },
        fitted,
    })
}

/// Everything produced by harmonizing all pods against the colocation pod.
/// All maps are keyed by pod name and exclude the colocation pod.
#[derive(Debug, Clone)]
pub struct HarmonizationResults {
    pub models: HarmonizationModels,
    pub stats: HarmonizationStats,

    /// Each pod's resampled, unharmonized sensor readings.
    pub preprocessed: IndexMap<String, PodTimeseries>,

    /// Each pod's harmonized (colocation-equivalent) sensor readings.
    pub fitted: IndexMap<String, PodTimeseries>,

    /// The colocation pod's resampled readings aligned to each pod.
    pub colocation_targets: IndexMap<String, PodTimeseries>,
}

/// Settings shared by every (pod, sensor) pair of a harmonization.
#[derive(Debug, Clone)]
pub struct HarmonizationConfig<'a> {
    pub colocation_pod: &'a str,
    pub sensors: &'a [String],
    pub resampler: Resampler,
    pub k_folds: usize,

    /// If set, add an elapsed-time feature relative to this time.
    pub elapsed_reference: Option<NaiveDateTime>,
}

/// Harmonize every pod in `pod_data` (other than the colocation pod) against
/// the colocation pod, sensor by sensor.
pub fn harmonize_pods(
    pod_data: &IndexMap<String, PodTimeseries>,
    config: &HarmonizationConfig,
    progress: &ProgressBar,
) -> Result<HarmonizationResults, HarmonizeError> {
    let colocation = pod_data
        .get(config.colocation_pod)
        .ok_or_else(|| HarmonizeError::ColocationPodMissing(config.colocation_pod.to_string()))?;
    let pods: Vec<&str> = pod_data
        .keys()
        .map(|k| k.as_str())
        .filter(|&p| p != config.colocation_pod)
        .collect();
    if pods.is_empty() {
        return Err(HarmonizeError::NoPodsToHarmonize(
            config.colocation_pod.to_string(),
        ));
    }

    let mut models = HarmonizationModels::new(config.colocation_pod.to_string());
    let mut stats = HarmonizationStats::new(config.k_folds);
    let mut preprocessed = IndexMap::with_capacity(pods.len());
    let mut fitted = IndexMap::with_capacity(pods.len());
    let mut colocation_targets = IndexMap::with_capacity(pods.len());

    for (i_pod, &pod) in pods.iter().enumerate() {
        info!("Harmonizing pod {i_pod} ({pod}) to the colocation pod {}", config.colocation_pod);
        progress.set_message(pod.to_string());

        let mut pod_preprocessed = PodTimeseries::default();
        let mut pod_fitted = PodTimeseries::default();
        let mut pod_targets = PodTimeseries::default();
        for sensor in config.sensors {
            debug!("Harmonizing pod {pod} sensor {sensor}");
            let pair = build_aligned_pair(
                colocation,
                &pod_data[pod],
                sensor,
                &config.resampler,
                config.elapsed_reference,
            )?;
            if pair.is_empty() {
                return Err(HarmonizeError::EmptyPair {
                    sensor: format!("{sensor} of pod {pod}"),
                });
            }
            let trained = train(&pair, config.k_folds)?;

            let timestamps = pair.timestamps().to_vec();
            let as_table = |values: ArrayView1<f64>| {
                PodTimeseries::new(
                    timestamps.clone(),
                    [(sensor.clone(), values.to_vec())].into_iter().collect(),
                )
            };
            pod_preprocessed = pod_preprocessed.outer_join(&as_table(pair.sensor_readings())?)?;
            pod_fitted = pod_fitted.outer_join(&as_table(trained.fitted.view())?)?;
            pod_targets = pod_targets.outer_join(&as_table(pair.target())?)?;

            stats.push(pod, sensor, trained.folds);
            models.insert(pod, sensor, trained.model)?;
        }

        preprocessed.insert(pod.to_string(), pod_preprocessed);
        fitted.insert(pod.to_string(), pod_fitted);
        colocation_targets.insert(pod.to_string(), pod_targets);
        progress.inc(1);
    }
    progress.finish_with_message("Harmonized");

    Ok(HarmonizationResults {
        models,
        stats,
        preprocessed,
        fitted,
        colocation_targets,
    })
}
