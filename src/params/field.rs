// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Estimate pollutant concentrations from field data with harmonization
//! models and the colocation model.

use std::path::Path;

use indexmap::IndexMap;
use itertools::Itertools;
use log::{debug, info};

use super::{pod_progress_bar, RunContext, RunFolderError};
use crate::{
    cli::Warn,
    colocation::{predict, ColocationError, EstimatorArtifact, StandardScaler},
    constants::RUN_SETTINGS_FILENAME,
    deployment::{DeploymentLog, DeploymentType},
    features::FeatureError,
    field::{FieldError, FieldHarmonizer},
    io::{
        read_pod_data, write_location_workbook, write_melted, write_workbook, DataReadError,
        LocationEstimate, MeltedRow, ReportWriteError, Stage, StageCache, StageCacheError,
    },
    models::HarmonizationModels,
    settings::{Settings, SettingsError},
    timeseries::PodTimeseries,
};

/// Used when a pod's location can't be found in the deployment log.
const UNKNOWN_LOCATION: &str = "unknown";

/// The scaler and estimator fit by the colocation stage.
pub(crate) struct ColocationModel {
    pub(crate) scaler: StandardScaler,
    pub(crate) estimator: EstimatorArtifact,
}

impl ColocationModel {
    /// Get the colocation stage's scaler out of the settings and its best
    /// estimator out of its output folder.
    pub(crate) fn read(
        upstream_dir: &Path,
        settings: &Settings,
    ) -> Result<ColocationModel, FieldRunError> {
        let scaler = settings
            .scaler
            .clone()
            .ok_or(SettingsError::MissingKey("scaler"))?;
        let estimator = EstimatorArtifact::read(upstream_dir, &settings.best_model)?;
        debug!(
            "Using the '{}' colocation estimator with {} scaled features",
            estimator.name(),
            scaler.mean.len()
        );
        Ok(ColocationModel { scaler, estimator })
    }

    /// Harmonize, engineer and estimate all field pods that have
    /// harmonization models, writing the field reports into the run folder.
    pub(crate) fn estimate(
        &self,
        context: &RunContext,
        models: &HarmonizationModels,
    ) -> Result<FieldEstimates, FieldRunError> {
        let RunContext {
            paths,
            deployment_log,
            settings,
            run_settings: _,
        } = context;

        let cache = StageCache::new(&paths.upstream_dir);
        let field_data = cache.load_or_else(Stage::Field, || {
            info!("Reading field pod data");
            read_pod_data(
                &paths.data_dir,
                deployment_log,
                DeploymentType::Field,
                &settings.sensors,
            )
            .map_err(FieldRunError::from)
        })?;

        let harmonizer = FieldHarmonizer {
            models,
            sensors: &settings.sensors,
            resampler: settings.resampler,
            crop: settings.crop,
            elapsed_reference: settings.earliest_harmon_time,
        };
        let (field_data, skipped) = harmonizer.partition_pods(field_data);
        if !skipped.is_empty() {
            format!(
                "No harmonization models for the field pods {}; they are not estimated",
                skipped.join(", ")
            )
            .warn();
        }

        let progress = pod_progress_bar(field_data.len(), "Estimating");
        let mut estimates = FieldEstimates::default();
        for (pod, data) in &field_data {
            progress.set_message(pod.clone());
            let harmonized = match harmonizer.harmonize_pod(pod, data)? {
                Some(h) => h,
                None => {
                    debug!("Pod {pod} has no field data to estimate");
                    progress.inc(1);
                    continue;
                }
            };

            let features = settings
                .transforms
                .apply(&harmonized, settings.earliest_time)?;
            let prediction = predict(
                &features,
                &self.scaler,
                &self.estimator,
                &settings.pollutant,
            )?;
            debug!("Estimated {} rows of pod {pod}", prediction.estimates.len());

            estimates.features.insert(pod.clone(), features);
            estimates
                .standardized
                .insert(pod.clone(), prediction.standardized);
            estimates.by_pod.insert(pod.clone(), prediction.estimates);
            progress.inc(1);
        }
        progress.finish_with_message("Estimated");
        if estimates.by_pod.is_empty() {
            return Err(FieldRunError::NoFieldEstimates);
        }

        info!("Writing field outputs");
        estimates.write(&paths.run_dir, deployment_log, &settings.pollutant)?;
        Ok(estimates)
    }
}

/// The results of the field stage. All maps are keyed by pod and only hold
/// pods that were estimated.
#[derive(Debug, Default)]
pub(crate) struct FieldEstimates {
    /// The engineered features given to the scaler.
    pub(crate) features: IndexMap<String, PodTimeseries>,

    pub(crate) standardized: IndexMap<String, PodTimeseries>,

    /// One column, named after the pollutant.
    pub(crate) by_pod: IndexMap<String, PodTimeseries>,
}

impl FieldEstimates {
    fn write(
        &self,
        run_dir: &Path,
        deployment_log: &DeploymentLog,
        pollutant: &str,
    ) -> Result<(), ReportWriteError> {
        let location_of = |pod: &str, t| {
            deployment_log
                .field_location(pod, t)
                .unwrap_or(UNKNOWN_LOCATION)
        };

        write_workbook(run_dir, "y_field_estimates_by_pod", &self.by_pod)?;

        let mut by_location: IndexMap<String, Vec<LocationEstimate>> = IndexMap::new();
        for (pod, table) in &self.by_pod {
            let Some(values) = table.column(pollutant) else {
                continue;
            };
            for (&timestamp, &estimate) in table.timestamps().iter().zip(values) {
                by_location
                    .entry(location_of(pod, timestamp).to_string())
                    .or_default()
                    .push(LocationEstimate {
                        timestamp,
                        estimate,
                        pod,
                    });
            }
        }
        by_location.sort_keys();
        write_location_workbook(run_dir, "y_field_estimates_by_loc", pollutant, &by_location)?;

        write_workbook(run_dir, "X_field", &self.features)?;
        write_workbook(run_dir, "X_field_standardized", &self.standardized)?;

        // Column by column, as a long table.
        let melted = self
            .features
            .iter()
            .flat_map(|(pod, table)| {
                table.columns().flat_map(move |(sensor, values)| {
                    table
                        .timestamps()
                        .iter()
                        .zip(values)
                        .map(move |(&timestamp, &reading)| MeltedRow {
                            timestamp,
                            pod,
                            location: location_of(pod, timestamp),
                            sensor,
                            reading,
                        })
                })
            })
            .collect_vec();
        write_melted(&run_dir.join("X_field_melted.csv"), &melted)?;
        Ok(())
    }
}

/// Apply the harmonization models of a previous run to field data.
pub(crate) struct FieldApplyParams {
    pub(crate) context: RunContext,
    pub(crate) colocation: ColocationModel,
    pub(crate) models: HarmonizationModels,
}

impl FieldApplyParams {
    pub(crate) fn run(&self) -> Result<FieldEstimates, FieldRunError> {
        let FieldApplyParams {
            context,
            colocation,
            models,
        } = self;

        context.paths.create_run_dir()?;
        context
            .run_settings
            .write(context.paths.run_dir.join(RUN_SETTINGS_FILENAME))?;
        colocation.estimate(context, models)
    }
}

#[derive(thiserror::Error, Debug)]
pub(crate) enum FieldRunError {
    #[error("None of the field pods had any data to estimate")]
    NoFieldEstimates,

    #[error(transparent)]
    RunFolder(#[from] RunFolderError),

    #[error(transparent)]
    DataRead(#[from] DataReadError),

    #[error(transparent)]
    StageCache(#[from] StageCacheError),

    #[error(transparent)]
    Field(#[from] FieldError),

    #[error(transparent)]
    Feature(#[from] FeatureError),

    #[error(transparent)]
    Colocation(#[from] ColocationError),

    #[error(transparent)]
    ReportWrite(#[from] ReportWriteError),

    #[error(transparent)]
    Settings(#[from] SettingsError),
}
