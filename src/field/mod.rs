// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Applying stored harmonization models to field data.

mod error;

pub use error::FieldError;

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use log::{debug, trace};
use ndarray::prelude::*;

use crate::{
    constants::TIME_ELAPSED_COLUMN,
    models::HarmonizationModels,
    timeseries::{elapsed_days, PodTimeseries, Resampler},
};

/// Settings for harmonizing field pods.
#[derive(Debug, Clone)]
pub struct FieldHarmonizer<'a> {
    pub models: &'a HarmonizationModels,
    pub sensors: &'a [String],
    pub resampler: Resampler,

    /// If given, only data within this window (inclusive) is used.
    pub crop: Option<(NaiveDateTime, NaiveDateTime)>,

    /// The harmonization session's earliest start time. Required by models
    /// that use elapsed time.
    pub elapsed_reference: Option<NaiveDateTime>,
}

impl FieldHarmonizer<'_> {
    /// Split field pods into those with harmonization models and the names of
    /// those without.
    pub fn partition_pods(
        &self,
        pods: IndexMap<String, PodTimeseries>,
    ) -> (IndexMap<String, PodTimeseries>, Vec<String>) {
        let mut with_models = IndexMap::with_capacity(pods.len());
        let mut without = vec![];
        for (pod, data) in pods {
            if self.models.contains_pod(&pod) {
                with_models.insert(pod, data);
            } else {
                without.push(pod);
            }
        }
        (with_models, without)
    }

    /// Harmonize one field pod: crop, resample, drop incomplete rows and apply
    /// each sensor's model. Returns `None` if no data are left to harmonize.
    pub fn harmonize_pod(
        &self,
        pod: &str,
        data: &PodTimeseries,
    ) -> Result<Option<PodTimeseries>, FieldError> {
        let data = match self.crop {
            Some((start, end)) => data.crop(start, end),
            None => data.clone(),
        };
        if data.is_empty() {
            debug!("Pod {pod} has no field data after cropping");
            return Ok(None);
        }

        let resampled = self.resampler.resample(&data.select(self.sensors)?).drop_missing();
        if resampled.is_empty() {
            debug!("Pod {pod} has no complete rows after resampling");
            return Ok(None);
        }
        trace!("Pod {pod} has {} resampled field rows", resampled.len());

        let elapsed = self
            .elapsed_reference
            .map(|reference| elapsed_days(resampled.timestamps(), reference));
        let mut harmonized = PodTimeseries::new(resampled.timestamps().to_vec(), IndexMap::new())?;
        for sensor in self.sensors {
            let model = self
                .models
                .get(pod, sensor)
                .ok_or_else(|| FieldError::MissingSensorModel {
                    pod: pod.to_string(),
                    sensor: sensor.clone(),
                })?;

            let mut x = Array2::<f64>::zeros((resampled.len(), model.features.len()));
            for (mut column, feature) in x.axis_iter_mut(Axis(1)).zip(model.features.iter()) {
                let values: &[f64] = if feature == TIME_ELAPSED_COLUMN {
                    elapsed
                        .as_deref()
                        .ok_or_else(|| FieldError::MissingElapsedReference {
                            pod: pod.to_string(),
                            sensor: sensor.clone(),
                        })?
                } else {
                    resampled
                        .column(feature)
                        .ok_or_else(|| FieldError::MissingFeature {
                            pod: pod.to_string(),
                            feature: feature.clone(),
                        })?
                };
                column.assign(&ArrayView1::from(values));
            }

            let y = model.predict(x.view())?;
            harmonized.push_column(sensor.clone(), y.to_vec())?;
        }

        Ok(Some(harmonized))
    }
}
