// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Parameters that drive `podcal` runs.
//!
//! The code here is kind of "mirroring" the code within the `cli` module; the
//! idea is that `cli` is unparsed, user-facing code, whereas parameters have
//! been parsed and are ready to be used directly.

mod field;
mod harmonize;

pub(crate) use field::{ColocationModel, FieldApplyParams, FieldEstimates, FieldRunError};
pub(crate) use harmonize::{HarmonizeParams, HarmonizeRunError};

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::info;

use crate::{
    constants::RUN_TIMESTAMP_FORMAT,
    deployment::DeploymentLog,
    settings::{RunSettings, Settings},
    PROGRESS_BARS,
};

/// Where a run reads its inputs and writes its outputs.
#[derive(Debug, Clone)]
pub(crate) struct RunPaths {
    /// Holds the `Harmonization` and `Field` pod data directories.
    pub(crate) data_dir: PathBuf,

    /// The colocation stage's output folder. Cached pod data live here too.
    pub(crate) upstream_dir: PathBuf,

    /// This run's output folder, inside the upstream folder. It must not
    /// exist before the run.
    pub(crate) run_dir: PathBuf,
}

impl RunPaths {
    /// Make this run's output folder. Runs never share a folder.
    fn create_run_dir(&self) -> Result<(), RunFolderError> {
        if self.run_dir.exists() {
            return Err(RunFolderError::Exists(self.run_dir.clone()));
        }
        std::fs::create_dir(&self.run_dir)?;
        info!("Writing outputs to {}", self.run_dir.display());
        Ok(())
    }
}

/// Everything common to harmonize and field-apply runs.
pub(crate) struct RunContext {
    pub(crate) paths: RunPaths,
    pub(crate) deployment_log: DeploymentLog,
    pub(crate) settings: Settings,

    /// The merged settings, as they are persisted with this run's outputs.
    pub(crate) run_settings: RunSettings,
}

/// The name of a run's output folder. Without a run name, the folder is named
/// after `now`.
pub(crate) fn run_folder_name(
    best_model: &str,
    run_name: Option<&str>,
    now: NaiveDateTime,
) -> String {
    match run_name {
        Some(name) => format!("Output_{best_model}_{name}"),
        None => format!("Output_{best_model}_{}", now.format(RUN_TIMESTAMP_FORMAT)),
    }
}

/// Get the output folder of a new run inside `upstream_dir`, complaining if
/// it's already there.
pub(crate) fn new_run_dir(
    upstream_dir: &Path,
    best_model: &str,
    run_name: Option<&str>,
) -> Result<PathBuf, RunFolderError> {
    let now = chrono::Local::now().naive_local();
    let run_dir = upstream_dir.join(run_folder_name(best_model, run_name, now));
    if run_dir.exists() {
        return Err(RunFolderError::Exists(run_dir));
    }
    Ok(run_dir)
}

fn pod_progress_bar(num_pods: usize, message: &'static str) -> ProgressBar {
    ProgressBar::with_draw_target(
        Some(num_pods as _),
        if PROGRESS_BARS.load() {
            ProgressDrawTarget::stdout()
        } else {
            ProgressDrawTarget::hidden()
        },
    )
    .with_style(
        ProgressStyle::default_bar()
            .template("{msg:17}: [{wide_bar:.blue}] {pos:2}/{len:2} pods ({elapsed_precise}<{eta_precise})")
            .unwrap()
            .progress_chars("=> "),
    )
    .with_position(0)
    .with_message(message)
}

#[derive(thiserror::Error, Debug)]
pub(crate) enum RunFolderError {
    #[error("The run output folder {0} already exists; use a different run name or remove it")]
    Exists(PathBuf),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
