// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Writing tabular reports. A "workbook" is a directory with one CSV file per
//! sheet. Missing values are written as empty cells.

use std::fs::File;
use std::path::Path;

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use log::debug;

use super::ReportWriteError;
use crate::{
    constants::{DATETIME_COLUMN, DATETIME_FORMAT},
    harmonization::StatisticTable,
    timeseries::PodTimeseries,
};

fn format_value(v: f64) -> String {
    if v.is_nan() {
        String::new()
    } else {
        v.to_string()
    }
}

fn csv_writer(file: &Path) -> Result<csv::Writer<File>, ReportWriteError> {
    csv::Writer::from_path(file).map_err(|err| ReportWriteError::Csv {
        file: file.to_path_buf(),
        err,
    })
}

/// Write a table to a CSV file, with the timestamps as the first column.
fn write_table(file: &Path, table: &PodTimeseries) -> Result<(), ReportWriteError> {
    let mut writer = csv_writer(file)?;
    let csv_err = |err| ReportWriteError::Csv {
        file: file.to_path_buf(),
        err,
    };

    writer
        .write_record(std::iter::once(DATETIME_COLUMN).chain(table.column_names()))
        .map_err(csv_err)?;
    let columns: Vec<&[f64]> = table.columns().map(|(_, c)| c).collect();
    for (i_row, t) in table.timestamps().iter().enumerate() {
        let record = std::iter::once(t.format(DATETIME_FORMAT).to_string())
            .chain(columns.iter().map(|c| format_value(c[i_row])));
        writer.write_record(record).map_err(csv_err)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write one sheet per entry of `sheets` into the workbook directory
/// `<dir>/<name>/`.
pub(crate) fn write_workbook(
    dir: &Path,
    name: &str,
    sheets: &IndexMap<String, PodTimeseries>,
) -> Result<(), ReportWriteError> {
    let workbook = dir.join(name);
    std::fs::create_dir_all(&workbook)?;
    debug!("Writing {} sheets to {}", sheets.len(), workbook.display());
    for (sheet, table) in sheets {
        write_table(&workbook.join(format!("{sheet}.csv")), table)?;
    }
    Ok(())
}

/// Write statistic tables, one sheet per sensor. Rows are folds and columns
/// are pods; there is no index column.
pub(crate) fn write_statistic_workbook(
    dir: &Path,
    name: &str,
    tables: &IndexMap<String, StatisticTable>,
) -> Result<(), ReportWriteError> {
    let workbook = dir.join(name);
    std::fs::create_dir_all(&workbook)?;
    for (sensor, table) in tables {
        let file = workbook.join(format!("{sensor}.csv"));
        let csv_err = |err| ReportWriteError::Csv {
            file: file.clone(),
            err,
        };
        let mut writer = csv_writer(&file)?;
        writer.write_record(&table.pods).map_err(csv_err)?;
        for row in &table.rows {
            writer
                .write_record(row.iter().map(|&v| format_value(v)))
                .map_err(csv_err)?;
        }
        writer.flush()?;
    }
    Ok(())
}

/// One reading in long format.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MeltedRow<'a> {
    pub(crate) timestamp: NaiveDateTime,
    pub(crate) pod: &'a str,
    pub(crate) location: &'a str,
    pub(crate) sensor: &'a str,
    pub(crate) reading: f64,
}

pub(crate) fn write_melted(file: &Path, rows: &[MeltedRow]) -> Result<(), ReportWriteError> {
    let mut writer = csv_writer(file)?;
    let csv_err = |err| ReportWriteError::Csv {
        file: file.to_path_buf(),
        err,
    };
    writer
        .write_record([DATETIME_COLUMN, "pod", "location", "sensor", "reading"])
        .map_err(csv_err)?;
    for row in rows {
        writer
            .write_record([
                row.timestamp.format(DATETIME_FORMAT).to_string(),
                row.pod.to_string(),
                row.location.to_string(),
                row.sensor.to_string(),
                format_value(row.reading),
            ])
            .map_err(csv_err)?;
    }
    writer.flush()?;
    Ok(())
}

/// A pollutant estimate of one pod, for reports grouped by location.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LocationEstimate<'a> {
    pub(crate) timestamp: NaiveDateTime,
    pub(crate) estimate: f64,
    pub(crate) pod: &'a str,
}

/// Write one sheet per location, each with the columns datetime, the
/// pollutant and pod.
pub(crate) fn write_location_workbook(
    dir: &Path,
    name: &str,
    pollutant: &str,
    sheets: &IndexMap<String, Vec<LocationEstimate>>,
) -> Result<(), ReportWriteError> {
    let workbook = dir.join(name);
    std::fs::create_dir_all(&workbook)?;
    for (location, estimates) in sheets {
        let file = workbook.join(format!("{location}.csv"));
        let csv_err = |err| ReportWriteError::Csv {
            file: file.clone(),
            err,
        };
        let mut writer = csv_writer(&file)?;
        writer
            .write_record([DATETIME_COLUMN, pollutant, "pod"])
            .map_err(csv_err)?;
        for e in estimates {
            writer
                .write_record([
                    e.timestamp.format(DATETIME_FORMAT).to_string(),
                    format_value(e.estimate),
                    e.pod.to_string(),
                ])
                .map_err(csv_err)?;
        }
        writer.flush()?;
    }
    Ok(())
}
