// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Code to read and write harmonization models in a little-endian binary
//! format.
//!
//! Layout:
//! - 7 bytes: ASCII "PODHARM"
//! - u8: format version
//! - string: the colocation pod name
//! - u32: number of pods, then for each pod:
//!   - string: pod name
//!   - u32: number of sensors, then for each sensor:
//!     - string: sensor name
//!     - u32: number of features, then that many strings (feature names)
//!     - that many f64 coefficients
//!     - f64 intercept
//!
//! Strings are a u32 byte length followed by UTF-8 bytes.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use super::{error::*, HarmonizationModel, HarmonizationModels};
use crate::math::LinearFit;

const MAGIC: &[u8; 7] = b"PODHARM";
const VERSION: u8 = 1;

pub(crate) fn read(file: &Path) -> Result<HarmonizationModels, ModelStoreReadError> {
    let file_str = file.display().to_string();
    let mut bin_file = BufReader::new(File::open(file)?);

    let mut magic = [0; 7];
    bin_file.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(ModelStoreReadError::BinaryMagic {
            file: file_str,
            got: String::from_utf8_lossy(&magic).to_string(),
        });
    }
    let version = bin_file.read_u8()?;
    if version != VERSION {
        return Err(ModelStoreReadError::BinaryVersion {
            file: file_str,
            expected: VERSION,
            got: version,
        });
    }

    let colocation_pod = read_string(&mut bin_file, &file_str)?;
    let mut models = HarmonizationModels::new(colocation_pod);
    let num_pods = bin_file.read_u32::<LittleEndian>()?;
    for _ in 0..num_pods {
        let pod = read_string(&mut bin_file, &file_str)?;
        let num_sensors = bin_file.read_u32::<LittleEndian>()?;
        for _ in 0..num_sensors {
            let sensor = read_string(&mut bin_file, &file_str)?;
            let num_features = bin_file.read_u32::<LittleEndian>()? as usize;
            let features = (0..num_features)
                .map(|_| read_string(&mut bin_file, &file_str))
                .collect::<Result<Vec<_>, _>>()?;
            let mut coefficients = vec![0.0; num_features];
            bin_file.read_f64_into::<LittleEndian>(&mut coefficients)?;
            let intercept = bin_file.read_f64::<LittleEndian>()?;

            let model = HarmonizationModel {
                features,
                fit: LinearFit {
                    coefficients,
                    intercept,
                },
            };
            models
                .insert(&pod, &sensor, model)
                .map_err(|_| ModelStoreReadError::ColocationPodEntry {
                    file: file_str.clone(),
                    pod: pod.clone(),
                })?;
        }
    }

    Ok(models)
}

fn read_string<R: Read>(reader: &mut R, file: &str) -> Result<String, ModelStoreReadError> {
    let len = reader.read_u32::<LittleEndian>()?;
    // The length isn't trusted; only as many bytes as the file has are read.
    let mut bytes = vec![];
    reader.by_ref().take(u64::from(len)).read_to_end(&mut bytes)?;
    if bytes.len() != len as usize {
        return Err(ModelStoreReadError::BinaryTruncated {
            file: file.to_string(),
            expected: len,
            got: bytes.len(),
        });
    }
    String::from_utf8(bytes).map_err(|_| ModelStoreReadError::BinaryUtf8 {
        file: file.to_string(),
    })
}

pub(crate) fn write(models: &HarmonizationModels, file: &Path) -> Result<(), ModelStoreWriteError> {
    let mut bin_file = BufWriter::new(File::create(file)?);
    bin_file.write_all(MAGIC)?;
    bin_file.write_u8(VERSION)?;
    write_string(&mut bin_file, models.colocation_pod())?;

    bin_file.write_u32::<LittleEndian>(models.len() as u32)?;
    for (pod, sensors) in models.iter() {
        write_string(&mut bin_file, pod)?;
        bin_file.write_u32::<LittleEndian>(sensors.len() as u32)?;
        for (sensor, model) in sensors {
            write_string(&mut bin_file, sensor)?;
            bin_file.write_u32::<LittleEndian>(model.features.len() as u32)?;
            for feature in &model.features {
                write_string(&mut bin_file, feature)?;
            }
            // Keep the feature names and coefficients the same length on disk.
            for i in 0..model.features.len() {
                let c = model.fit.coefficients.get(i).copied().unwrap_or(0.0);
                bin_file.write_f64::<LittleEndian>(c)?;
            }
            bin_file.write_f64::<LittleEndian>(model.fit.intercept)?;
        }
    }
    bin_file.flush()?;
    Ok(())
}

fn write_string<W: Write>(writer: &mut W, s: &str) -> Result<(), std::io::Error> {
    writer.write_u32::<LittleEndian>(s.len() as u32)?;
    writer.write_all(s.as_bytes())
}
