// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Convert harmonization models between file formats.

use std::path::PathBuf;

use clap::Parser;
use log::info;

use crate::{models::HarmonizationModels, PodcalError};

#[derive(Parser, Debug, Default)]
pub(super) struct ModelsConvertArgs {
    /// The path to the input harmonization models, e.g.
    /// harmonization_models.json.
    #[clap(name = "INPUT_MODELS_FILE", parse(from_os_str))]
    input: PathBuf,

    /// The path to the output harmonization models. The format is taken from
    /// the extension.
    #[clap(name = "OUTPUT_MODELS_FILE", parse(from_os_str))]
    output: PathBuf,
}

impl ModelsConvertArgs {
    pub(super) fn run(self) -> Result<(), PodcalError> {
        let models = HarmonizationModels::read_from_ext(&self.input)?;
        models.write_to_ext(&self.output)?;

        info!(
            "Converted {} ({} pods) to {}",
            self.input.display(),
            models.len(),
            self.output.display()
        );

        Ok(())
    }
}
