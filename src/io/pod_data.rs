// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Reading pod data CSV files.

use std::path::Path;

use indexmap::IndexMap;
use log::{debug, trace};

use super::{glob::find_data_files, DataReadError};
use crate::{
    constants::{DATETIME_COLUMN, FIELD_DATA_SUBDIR, HARMONIZATION_DATA_SUBDIR},
    deployment::{DeploymentLog, DeploymentRecord, DeploymentType},
    timeseries::PodTimeseries,
    unit_parsing::parse_timestamp,
};

/// Read all of the data of one deployment type, keyed by pod. Only the
/// `sensors` columns are kept and only rows within each file's deployment
/// window. Pods with more than one file have their rows combined and sorted by
/// time.
pub(crate) fn read_pod_data(
    data_dir: &Path,
    log: &DeploymentLog,
    ty: DeploymentType,
    sensors: &[String],
) -> Result<IndexMap<String, PodTimeseries>, DataReadError> {
    let dir = data_dir.join(match ty {
        DeploymentType::Harmonization => HARMONIZATION_DATA_SUBDIR,
        DeploymentType::Field => FIELD_DATA_SUBDIR,
    });
    if !dir.is_dir() {
        return Err(DataReadError::MissingDir(dir));
    }

    let mut pods: IndexMap<String, PodTimeseries> = IndexMap::new();
    let mut num_records = 0;
    for record in log.records(ty) {
        num_records += 1;
        for file in find_data_files(&dir, &record.file_name)? {
            debug!("Reading {} for pod {}", file.display(), record.pod);
            let data = read_pod_file(&file, record, sensors)?;
            let data = match pods.shift_remove(&record.pod) {
                Some(existing) => existing.append_rows(data)?,
                None => data,
            };
            pods.insert(record.pod.clone(), data);
        }
    }
    if num_records == 0 {
        return Err(DataReadError::NoDeployments {
            deployment: ty.to_string(),
        });
    }
    if pods.values().all(|p| p.is_empty()) {
        return Err(DataReadError::NoData {
            deployment: match ty {
                DeploymentType::Harmonization => "harmonization".to_string(),
                DeploymentType::Field => "field".to_string(),
            },
            dir,
        });
    }
    Ok(pods)
}

/// Read a single CSV file. Empty cells and "nan" are missing values.
fn read_pod_file(
    file: &Path,
    record: &DeploymentRecord,
    sensors: &[String],
) -> Result<PodTimeseries, DataReadError> {
    let csv_err = |err| DataReadError::Csv {
        file: file.to_path_buf(),
        err,
    };
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(file)
        .map_err(csv_err)?;
    let headers = reader.headers().map_err(csv_err)?.clone();
    let find = |name: &str| {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| DataReadError::MissingColumn {
                file: file.to_path_buf(),
                column: name.to_string(),
            })
    };
    let datetime_index = find(DATETIME_COLUMN)?;
    let sensor_indices = sensors
        .iter()
        .map(|s| find(s.as_str()))
        .collect::<Result<Vec<_>, _>>()?;

    let mut timestamps = vec![];
    let mut columns: Vec<Vec<f64>> = vec![vec![]; sensors.len()];
    for row in reader.records() {
        let row = row.map_err(csv_err)?;
        let line = row.position().map(|p| p.line()).unwrap_or_default();
        let raw_time = row.get(datetime_index).unwrap_or_default();
        let t = parse_timestamp(raw_time).map_err(|_| DataReadError::BadTimestamp {
            file: file.to_path_buf(),
            line,
            got: raw_time.to_string(),
        })?;
        if !record.contains(t) {
            continue;
        }

        timestamps.push(t);
        for ((column, &i), sensor) in columns.iter_mut().zip(&sensor_indices).zip(sensors) {
            let raw = row.get(i).unwrap_or_default();
            let value = if raw.is_empty() || raw.eq_ignore_ascii_case("nan") {
                f64::NAN
            } else {
                let bad_value = || DataReadError::BadValue {
                    file: file.to_path_buf(),
                    line,
                    column: sensor.clone(),
                    got: raw.to_string(),
                };
                // Infinite readings are rejected; they can't be cached.
                match raw.parse::<f64>() {
                    Ok(v) if v.is_finite() => v,
                    _ => return Err(bad_value()),
                }
            };
            column.push(value);
        }
    }
    trace!(
        "{}: {} rows within {} to {}",
        file.display(),
        timestamps.len(),
        record.start,
        record.end
    );

    // Keep rows in time order; a pod's other files are merged later.
    let table = PodTimeseries::new(
        timestamps,
        sensors.iter().cloned().zip(columns).collect(),
    )?;
    Ok(PodTimeseries::empty(sensors).append_rows(table)?)
}
