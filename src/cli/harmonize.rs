// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Parse harmonization arguments into parameters.

use std::{path::PathBuf, str::FromStr};

use clap::Parser;
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

use super::common::{display_warnings, InfoPrinter, RunArgs, RunArgsError, ARG_FILE_HELP};
use crate::{
    constants::RUN_SETTINGS_FILENAME,
    models::{ModelStoreType, MODEL_STORE_EXTENSIONS},
    params::{ColocationModel, HarmonizeParams},
    settings::RunSettings,
    PodcalError,
};

lazy_static::lazy_static! {
    static ref MODEL_STORE_TYPE_HELP: String =
        format!("The format of the written harmonization models. Supported formats: {}. Default: {}", *MODEL_STORE_EXTENSIONS, ModelStoreType::Json);
}

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct HarmonizeArgs {
    #[clap(name = "ARGUMENTS_FILE", help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    args_file: Option<PathBuf>,

    #[clap(flatten)]
    #[serde(rename = "run")]
    #[serde(default)]
    run_args: RunArgs,

    /// Only train and score the harmonization models; don't apply them to
    /// field data.
    #[clap(long, help_heading = "RUN")]
    #[serde(default)]
    no_field: bool,

    #[clap(long, help = MODEL_STORE_TYPE_HELP.as_str(), help_heading = "OUTPUT FILES")]
    model_store_type: Option<String>,
}

impl HarmonizeArgs {
    /// Both command-line and file arguments overlap in terms of what is
    /// available; this function consolidates everything that was specified into
    /// a single struct. Where applicable, it will prefer CLI parameters over
    /// those in the file.
    pub(super) fn merge(self) -> Result<HarmonizeArgs, PodcalError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            // Ensure all of the file args are accounted for by pattern
            // matching.
            let HarmonizeArgs {
                args_file: _,
                run_args,
                no_field,
                model_store_type,
            } = unpack_arg_file!(arg_file);

            Ok(HarmonizeArgs {
                args_file: None,
                run_args: cli_args.run_args.merge(run_args),
                no_field: cli_args.no_field || no_field,
                model_store_type: cli_args.model_store_type.or(model_store_type),
            })
        } else {
            Ok(cli_args)
        }
    }

    fn parse(self) -> Result<HarmonizeParams, PodcalError> {
        let HarmonizeArgs {
            args_file: _,
            run_args,
            no_field,
            model_store_type,
        } = self;

        let model_store_type = match model_store_type {
            None => ModelStoreType::Json,
            Some(s) => ModelStoreType::from_str(&s.to_lowercase())
                .map_err(|_| RunArgsError::BadModelStoreType(s))?,
        };

        let upstream_dir = run_args.upstream_dir()?;
        let upstream = RunSettings::read(upstream_dir.join(RUN_SETTINGS_FILENAME))?;
        let overrides = RunSettings {
            run_field: no_field.then_some(false),
            ..Default::default()
        };
        let context = run_args.parse("Harmonization set up", upstream_dir, upstream, overrides)?;

        let mut printer = InfoPrinter::new("Harmonization outputs".into());
        printer.push_line(
            format!(
                "Scoring with {} cross-validation folds",
                context.settings.k_folds
            )
            .into(),
        );
        printer.push_line(format!("Writing harmonization models as {model_store_type}").into());

        // Only the field stage uses the colocation model.
        let field = if context.settings.run_field {
            let model = ColocationModel::read(&context.paths.upstream_dir, &context.settings)?;
            printer.push_line(
                format!(
                    "Estimating {} in the field with '{}'",
                    context.settings.pollutant,
                    model.estimator.name()
                )
                .into(),
            );
            Some(model)
        } else {
            printer.push_line("Not applying the harmonization to field data".into());
            None
        };
        printer.display();
        display_warnings();

        Ok(HarmonizeParams {
            context,
            field,
            model_store_type,
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

        let results = params.run()?;
        info!(
            "Harmonized {} pods against {}",
            results.models.len(),
            results.models.colocation_pod()
        );
        display_warnings();

        Ok(())
    }
}
