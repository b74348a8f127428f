// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Parse arguments for applying a previous harmonization to field data.

use std::path::PathBuf;

use clap::Parser;
use itertools::Itertools;
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

use super::common::{
    display_warnings, find_model_store, InfoPrinter, RunArgs, RunArgsError, ARG_FILE_HELP,
};
use crate::{
    constants::RUN_SETTINGS_FILENAME,
    models::HarmonizationModels,
    params::{ColocationModel, FieldApplyParams},
    settings::RunSettings,
    PodcalError,
};

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct FieldApplyArgs {
    #[clap(name = "ARGUMENTS_FILE", help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    args_file: Option<PathBuf>,

    #[clap(flatten)]
    #[serde(rename = "run")]
    #[serde(default)]
    run_args: RunArgs,

    /// The output folder of a previous harmonize run, inside the colocation
    /// output folder. Its harmonization models and run settings are reused.
    #[clap(short = 'm', long, help_heading = "INPUT FILES")]
    harmonization_folder: Option<String>,
}

impl FieldApplyArgs {
    pub(super) fn merge(self) -> Result<FieldApplyArgs, PodcalError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            let FieldApplyArgs {
                args_file: _,
                run_args,
                harmonization_folder,
            } = unpack_arg_file!(arg_file);

            Ok(FieldApplyArgs {
                args_file: None,
                run_args: cli_args.run_args.merge(run_args),
                harmonization_folder: cli_args.harmonization_folder.or(harmonization_folder),
            })
        } else {
            Ok(cli_args)
        }
    }

    fn parse(self) -> Result<FieldApplyParams, PodcalError> {
        let FieldApplyArgs {
            args_file: _,
            run_args,
            harmonization_folder,
        } = self;

        let upstream_dir = run_args.upstream_dir()?;
        let harmonization_dir = upstream_dir.join(
            harmonization_folder
                .as_deref()
                .ok_or(RunArgsError::NoHarmonizationFolder)?,
        );
        if !harmonization_dir.is_dir() {
            return Err(RunArgsError::MissingHarmonizationFolder(harmonization_dir).into());
        }

        // The harmonize run's settings already hold the upstream settings.
        // Its run name belongs to its own folder.
        let mut previous = RunSettings::read(harmonization_dir.join(RUN_SETTINGS_FILENAME))?;
        previous.hf_run_name = None;

        let models_file = find_model_store(&harmonization_dir)?;
        let models = HarmonizationModels::read_from_ext(&models_file)?;

        let context = run_args.parse(
            "Field application set up",
            upstream_dir,
            previous,
            RunSettings::default(),
        )?;
        let colocation = ColocationModel::read(&context.paths.upstream_dir, &context.settings)?;

        let mut printer = InfoPrinter::new("Field application inputs".into());
        printer.push_block(vec![
            format!("Harmonization models: {}", models_file.display()).into(),
            format!(
                "{} pods against {}: {}",
                models.len(),
                models.colocation_pod(),
                models.pods().join(", ")
            )
            .into(),
        ]);
        printer.push_line(
            format!(
                "Estimating {} with '{}'",
                context.settings.pollutant,
                colocation.estimator.name()
            )
            .into(),
        );
        printer.display();
        display_warnings();

        Ok(FieldApplyParams {
            context,
            colocation,
            models,
        })
    }

    pub(super) fn run(self, dry_run: bool) -> Result<(), PodcalError> {
        debug!("Converting arguments into parameters");
        trace!("{:#?}", self);
        let params = self.parse()?;

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        let estimates = params.run()?;
        info!("Estimated {} field pods", estimates.by_pod.len());
        display_warnings();

        Ok(())
    }
}
