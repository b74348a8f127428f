// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Harmonize pods against the colocation pod, then (optionally) apply the
//! results to field data.

use log::{debug, info};

use super::{pod_progress_bar, ColocationModel, FieldRunError, RunContext, RunFolderError};
use crate::{
    constants::{HARMONIZATION_MODELS_STEM, RUN_SETTINGS_FILENAME},
    deployment::DeploymentType,
    harmonization::{harmonize_pods, HarmonizationConfig, HarmonizationResults, HarmonizeError},
    io::{
        read_pod_data, write_statistic_workbook, write_workbook, DataReadError, ReportWriteError,
        Stage, StageCache, StageCacheError,
    },
    models::{ModelStoreType, ModelStoreWriteError},
    settings::SettingsError,
};

pub(crate) struct HarmonizeParams {
    pub(crate) context: RunContext,

    /// Present if field data are to be estimated after harmonizing.
    pub(crate) field: Option<ColocationModel>,

    pub(crate) model_store_type: ModelStoreType,
}

impl HarmonizeParams {
    pub(crate) fn run(self) -> Result<HarmonizationResults, HarmonizeRunError> {
        let HarmonizeParams {
            mut context,
            field,
            model_store_type,
        } = self;
        let RunContext {
            paths,
            deployment_log,
            settings,
            run_settings,
        } = &mut context;

        paths.create_run_dir()?;

        let cache = StageCache::new(&paths.upstream_dir);
        let pod_data = cache.load_or_else(Stage::Harmonization, || {
            info!("Reading harmonization pod data");
            read_pod_data(
                &paths.data_dir,
                deployment_log,
                DeploymentType::Harmonization,
                &settings.sensors,
            )
            .map_err(HarmonizeRunError::from)
        })?;
        debug!("Harmonization data for {} pods", pod_data.len());

        // Elapsed time is measured from the start of the whole harmonization
        // session; the field stage needs the same reference.
        let elapsed_reference = if settings.elapsed_in_harmonization {
            let earliest = deployment_log
                .earliest_start(DeploymentType::Harmonization)
                .ok_or_else(|| DataReadError::NoDeployments {
                    deployment: DeploymentType::Harmonization.to_string(),
                })?;
            run_settings.set_earliest_harmon_time(earliest);
            settings.earliest_harmon_time = Some(earliest);
            Some(earliest)
        } else {
            None
        };

        let progress = pod_progress_bar(pod_data.len().saturating_sub(1), "Harmonizing");
        let results = harmonize_pods(
            &pod_data,
            &HarmonizationConfig {
                colocation_pod: &settings.colocation_pod,
                sensors: &settings.sensors,
                resampler: settings.resampler,
                k_folds: settings.k_folds,
                elapsed_reference,
            },
            &progress,
        )?;

        info!("Writing harmonization outputs");
        let run_dir = &paths.run_dir;
        write_workbook(run_dir, "X_preprocessed_unfitted", &results.preprocessed)?;
        write_workbook(run_dir, "X_harmonized", &results.fitted)?;
        write_workbook(run_dir, "colo_pod_harmon_data", &results.colocation_targets)?;
        for (stat, tables) in results.stats.tables() {
            write_statistic_workbook(run_dir, &format!("harmonization_{stat}_"), &tables)?;
        }
        let models_file = run_dir.join(format!("{HARMONIZATION_MODELS_STEM}.{model_store_type}"));
        results.models.write_to_ext(&models_file)?;
        info!("Harmonization models written to {}", models_file.display());
        run_settings.write(run_dir.join(RUN_SETTINGS_FILENAME))?;

        match field {
            Some(colocation) => {
                colocation.estimate(&context, &results.models)?;
            }
            None => info!("Not applying the harmonization to field data"),
        }

        Ok(results)
    }
}

#[derive(thiserror::Error, Debug)]
pub(crate) enum HarmonizeRunError {
    #[error(transparent)]
    RunFolder(#[from] RunFolderError),

    #[error(transparent)]
    DataRead(#[from] DataReadError),

    #[error(transparent)]
    StageCache(#[from] StageCacheError),

    #[error(transparent)]
    Harmonize(#[from] HarmonizeError),

    #[error(transparent)]
    ReportWrite(#[from] ReportWriteError),

    #[error(transparent)]
    ModelStoreWrite(#[from] ModelStoreWriteError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Field(#[from] FieldRunError),
}
