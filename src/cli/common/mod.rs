// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Common arguments for command-line interfaces. Both the `harmonize` and
//! `field-apply` subcommands read an upstream colocation folder, pod data and
//! a deployment log, so those arguments are shared between them.

mod printers;

pub(super) use printers::InfoPrinter;
#[cfg(test)]
pub(crate) use printers::take_warnings;
pub(crate) use printers::{display_warnings, Warn};

use std::path::{Path, PathBuf};

use clap::Parser;
use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use super::PodcalError;
use crate::{
    constants::{
        DEFAULT_DATA_DIR, DEFAULT_DEPLOYMENT_LOG_FILENAME, DEFAULT_K_FOLDS, DEFAULT_OUTPUTS_DIR,
    },
    deployment::{DeploymentLog, DeploymentType},
    params::{new_run_dir, RunContext, RunPaths},
    settings::RunSettings,
};

lazy_static::lazy_static! {
    pub(super) static ref ARG_FILE_TYPES_COMMA_SEPARATED: String = ArgFileTypes::iter().join(", ");

    pub(super) static ref ARG_FILE_HELP: String =
        format!("All arguments may be specified in a file. Any CLI arguments override arguments set in the file. Supported formats: {}", *ARG_FILE_TYPES_COMMA_SEPARATED);

    static ref OUTPUTS_DIR_HELP: String =
        format!("The directory holding the colocation output folders. Default: {DEFAULT_OUTPUTS_DIR}");

    static ref DATA_DIR_HELP: String =
        format!("The directory holding the pod data, in '{}' and '{}' sub-directories. Default: {DEFAULT_DATA_DIR}",
                crate::constants::HARMONIZATION_DATA_SUBDIR, crate::constants::FIELD_DATA_SUBDIR);

    static ref DEPLOYMENT_LOG_HELP: String =
        format!("The deployment log CSV. Default: <DATA_DIR>/{DEFAULT_DEPLOYMENT_LOG_FILENAME}");

    static ref K_FOLDS_HELP: String =
        format!("The number of cross-validation folds used to score the harmonization. Default: {DEFAULT_K_FOLDS}");
}

#[derive(Debug, Display, EnumIter, EnumString)]
pub(super) enum ArgFileTypes {
    #[strum(serialize = "toml")]
    Toml,
    #[strum(serialize = "json")]
    Json,
}

macro_rules! unpack_arg_file {
    ($arg_file:expr) => ({
        use std::{fs::File, io::Read, str::FromStr};

        use crate::cli::common::{ArgFileTypes, ARG_FILE_TYPES_COMMA_SEPARATED};

        debug!("Attempting to parse argument file {}", $arg_file.display());

        let mut contents = String::new();
        let arg_file_type = $arg_file
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .and_then(|e| ArgFileTypes::from_str(&e).ok());

        match arg_file_type {
            Some(ArgFileTypes::Toml) => {
                debug!("Parsing toml file...");
                let mut fh = File::open(&$arg_file)?;
                fh.read_to_string(&mut contents)?;
                match toml::from_str(&contents) {
                    Ok(p) => p,
                    Err(err) => {
                        return Err(PodcalError::ArgFile(format!(
                            "Couldn't decode toml structure from {}:\n{err}",
                            $arg_file.display()
                        )))
                    }
                }
            }
            Some(ArgFileTypes::Json) => {
                debug!("Parsing json file...");
                let mut fh = File::open(&$arg_file)?;
                fh.read_to_string(&mut contents)?;
                match serde_json::from_str(&contents) {
                    Ok(p) => p,
                    Err(err) => {
                        return Err(PodcalError::ArgFile(format!(
                            "Couldn't decode json structure from {}:\n{err}",
                            $arg_file.display()
                        )))
                    }
                }
            }

            _ => {
                return Err(PodcalError::ArgFile(format!(
                    "Argument file '{}' doesn't have a recognised file extension! Valid extensions are: {}",
                    $arg_file.display(),
                    *ARG_FILE_TYPES_COMMA_SEPARATED
                )))
            }
        }
    });
}

/// Arguments shared by every subcommand that runs (part of) the pipeline.
/// Anything set here overrides the upstream run settings.
#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct RunArgs {
    #[clap(long, help = OUTPUTS_DIR_HELP.as_str(), help_heading = "INPUT FILES")]
    pub(super) outputs_dir: Option<PathBuf>,

    /// The name of the colocation output folder inside the outputs directory.
    /// Its run_settings.json supplies the pollutant, sensors, resampling and
    /// the colocation model. Required.
    #[clap(short, long, help_heading = "INPUT FILES")]
    pub(super) colo_output_folder: Option<String>,

    #[clap(short, long, help = DATA_DIR_HELP.as_str(), help_heading = "INPUT FILES")]
    pub(super) data_dir: Option<PathBuf>,

    #[clap(long, help = DEPLOYMENT_LOG_HELP.as_str(), help_heading = "INPUT FILES")]
    pub(super) deployment_log: Option<PathBuf>,

    /// The name of this run. Outputs are written to
    /// Output_<best_model>_<name> inside the colocation output folder. The
    /// default is to use the current local time as the name.
    #[clap(short = 'n', long, help_heading = "RUN")]
    pub(super) hf_run_name: Option<String>,

    /// The colocation estimator to use, e.g. lin_reg. Its artifact is read
    /// from <best_model>_model.json in the colocation output folder.
    #[clap(short, long, help_heading = "RUN")]
    pub(super) best_model: Option<String>,

    #[clap(short, long, help = K_FOLDS_HELP.as_str(), help_heading = "HARMONIZATION")]
    pub(super) k_folds: Option<usize>,

    /// Add the time elapsed since the start of the harmonization session as
    /// an input of every harmonization model.
    #[clap(long, help_heading = "HARMONIZATION")]
    #[serde(default)]
    pub(super) elapsed_in_harmonization: bool,

    /// Harmonization plots to record. Plots are not rendered by podcal.
    #[clap(long, multiple_values(true), help_heading = "HARMONIZATION")]
    pub(super) harmon_plots: Option<Vec<String>>,

    /// Only estimate field data between --field-start and --field-end
    /// (inclusive).
    #[clap(long, help_heading = "FIELD")]
    #[serde(default)]
    pub(super) crop_field_time: bool,

    /// The start of the field window, e.g. "2024-02-10 07:15:00".
    #[clap(long, help_heading = "FIELD")]
    pub(super) field_start: Option<String>,

    /// The end of the field window, e.g. "2024-02-11 07:14:00".
    #[clap(long, help_heading = "FIELD")]
    pub(super) field_end: Option<String>,

    /// Field plots to record. Plots are not rendered by podcal.
    #[clap(long, multiple_values(true), help_heading = "FIELD")]
    pub(super) field_plots: Option<Vec<String>>,
}

impl RunArgs {
    /// Prefer `self`'s values over `other`'s.
    pub(super) fn merge(self, other: Self) -> Self {
        Self {
            outputs_dir: self.outputs_dir.or(other.outputs_dir),
            colo_output_folder: self.colo_output_folder.or(other.colo_output_folder),
            data_dir: self.data_dir.or(other.data_dir),
            deployment_log: self.deployment_log.or(other.deployment_log),
            hf_run_name: self.hf_run_name.or(other.hf_run_name),
            best_model: self.best_model.or(other.best_model),
            k_folds: self.k_folds.or(other.k_folds),
            elapsed_in_harmonization: self.elapsed_in_harmonization
                || other.elapsed_in_harmonization,
            harmon_plots: self.harmon_plots.or(other.harmon_plots),
            crop_field_time: self.crop_field_time || other.crop_field_time,
            field_start: self.field_start.or(other.field_start),
            field_end: self.field_end.or(other.field_end),
            field_plots: self.field_plots.or(other.field_plots),
        }
    }

    /// The colocation output folder. It must already exist.
    pub(super) fn upstream_dir(&self) -> Result<PathBuf, RunArgsError> {
        let folder = self
            .colo_output_folder
            .as_deref()
            .ok_or(RunArgsError::NoColocationFolder)?;
        let upstream_dir = self
            .outputs_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUTS_DIR))
            .join(folder);
        if !upstream_dir.is_dir() {
            return Err(RunArgsError::MissingColocationFolder(upstream_dir));
        }
        Ok(upstream_dir)
    }

    /// The settings to lay over the upstream run settings. Booleans that
    /// weren't given are left to the upstream settings.
    fn run_settings(&self) -> RunSettings {
        RunSettings {
            hf_run_name: self.hf_run_name.clone(),
            best_model: self.best_model.clone(),
            k_folds: self.k_folds,
            elapsed_in_harmonization: self.elapsed_in_harmonization.then_some(true),
            harmon_plot_list: self.harmon_plots.clone(),
            crop_field_time: self.crop_field_time.then_some(true),
            field_start: self.field_start.clone(),
            field_end: self.field_end.clone(),
            field_plot_list: self.field_plots.clone(),
            ..Default::default()
        }
    }

    /// Merge `upstream` with these arguments and `overrides` (which win over
    /// everything), validate the result and set up the run's paths.
    pub(super) fn parse(
        self,
        title: &'static str,
        upstream_dir: PathBuf,
        upstream: RunSettings,
        overrides: RunSettings,
    ) -> Result<RunContext, PodcalError> {
        let run_settings = upstream.merge(self.run_settings()).merge(overrides);
        let settings = run_settings.validate()?;

        let run_dir = new_run_dir(
            &upstream_dir,
            &settings.best_model,
            settings.run_name.as_deref(),
        )?;
        let data_dir = self
            .data_dir
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        let log_file = self
            .deployment_log
            .unwrap_or_else(|| data_dir.join(DEFAULT_DEPLOYMENT_LOG_FILENAME));
        let deployment_log = DeploymentLog::read(&log_file)?;
        debug!("Read the deployment log {}", log_file.display());

        if !settings.harmon_plots.is_empty() || !settings.field_plots.is_empty() {
            format!(
                "Plots are recorded in the run settings but not rendered: {}",
                settings
                    .harmon_plots
                    .iter()
                    .map(|p| p.to_string())
                    .chain(settings.field_plots.iter().map(|p| p.to_string()))
                    .join(", ")
            )
            .warn();
        }

        let mut printer = InfoPrinter::new(title.into());
        printer.push_block(vec![
            format!("Colocation folder: {}", upstream_dir.display()).into(),
            format!("Run folder:        {}", run_dir.display()).into(),
        ]);
        printer.push_block(vec![
            format!("Data directory: {}", data_dir.display()).into(),
            format!(
                "Deployment log: {} ({} harmonization pods, {} field pods)",
                log_file.display(),
                deployment_log.pods(DeploymentType::Harmonization).len(),
                deployment_log.pods(DeploymentType::Field).len()
            )
            .into(),
        ]);
        printer.push_block(vec![
            format!("Pollutant:       {} {}", settings.pollutant, settings.unit).into(),
            format!("Sensors:         {}", settings.sensors.iter().join(", ")).into(),
            format!("Colocation pod:  {}", settings.colocation_pod).into(),
            format!(
                "Resampling:      {} of {} minute buckets",
                settings.resampler.mode(),
                settings.resampler.width().num_seconds() as f64 / 60.0
            )
            .into(),
            format!("Colocation model: {}", settings.best_model).into(),
            format!(
                "Timestamps:      {} (not converted)",
                settings.timezone.as_deref().unwrap_or("no timezone given")
            )
            .into(),
        ]);
        let mut feature_block = vec![format!("Feature chain: {}", settings.transforms).into()];
        if settings.elapsed_in_harmonization {
            feature_block.push("Harmonizing with time elapsed".into());
        }
        printer.push_block(feature_block);
        if let Some((start, end)) = settings.crop {
            printer.push_line(format!("Cropping field data to {start} - {end}").into());
        }
        printer.display();

        Ok(RunContext {
            paths: RunPaths {
                data_dir,
                upstream_dir,
                run_dir,
            },
            deployment_log,
            settings,
            run_settings,
        })
    }
}

/// The previous run folder's persisted harmonization models, JSON first.
pub(super) fn find_model_store(run_dir: &Path) -> Result<PathBuf, RunArgsError> {
    crate::models::ModelStoreType::iter()
        .map(|t| run_dir.join(format!("{}.{t}", crate::constants::HARMONIZATION_MODELS_STEM)))
        .find(|f| f.exists())
        .ok_or_else(|| RunArgsError::NoModelStore(run_dir.to_path_buf()))
}

#[derive(thiserror::Error, Debug)]
pub(crate) enum RunArgsError {
    #[error("No colocation output folder was supplied (--colo-output-folder)")]
    NoColocationFolder,

    #[error("The colocation output folder {0} doesn't exist")]
    MissingColocationFolder(PathBuf),

    #[error("No harmonization run folder was supplied (--harmonization-folder)")]
    NoHarmonizationFolder,

    #[error("The harmonization run folder {0} doesn't exist")]
    MissingHarmonizationFolder(PathBuf),

    #[error("No harmonization models were found in {0}")]
    NoModelStore(PathBuf),

    #[error("Unknown harmonization model store type '{0}'")]
    BadModelStoreType(String),
}
