// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Code to read and write harmonization models as json.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use super::{error::*, HarmonizationModels};

pub(crate) fn read(file: &Path) -> Result<HarmonizationModels, ModelStoreReadError> {
    let reader = BufReader::new(File::open(file)?);
    let models: HarmonizationModels = serde_json::from_reader(reader)?;

    // Catch hand-edited files.
    let file_str = file.display().to_string();
    if models.contains_pod(models.colocation_pod()) {
        return Err(ModelStoreReadError::ColocationPodEntry {
            file: file_str,
            pod: models.colocation_pod().to_string(),
        });
    }
    for (pod, sensors) in models.iter() {
        for (sensor, model) in sensors {
            if model.features.len() != model.fit.num_features() {
                return Err(ModelStoreReadError::BadShape {
                    file: file_str,
                    pod: pod.to_string(),
                    sensor: sensor.clone(),
                    names: model.features.len(),
                    coefficients: model.fit.num_features(),
                });
            }
        }
    }

    Ok(models)
}

pub(crate) fn write(models: &HarmonizationModels, file: &Path) -> Result<(), ModelStoreWriteError> {
    let mut writer = BufWriter::new(File::create(file)?);
    serde_json::to_writer_pretty(&mut writer, models)?;
    writer.flush()?;
    Ok(())
}
