// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The deployment log: which data file belongs to which pod, where it was and
//! when.

mod error;

pub use error::DeploymentLogError;

use std::path::Path;

use chrono::NaiveDateTime;
use indexmap::IndexSet;
use serde::Deserialize;
use strum_macros::{Display, EnumString};

use crate::unit_parsing::parse_timestamp;

/// Which stage a deployment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum DeploymentType {
    /// Colocated with the reference instrument; used for harmonization.
    #[strum(serialize = "H")]
    Harmonization,

    #[strum(serialize = "F")]
    Field,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentRecord {
    pub file_name: String,

    /// The prefix of the file name before the first underscore.
    pub pod: String,
    pub deployment: DeploymentType,
    pub location: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DeploymentRecord {
    pub fn contains(&self, t: NaiveDateTime) -> bool {
        t >= self.start && t <= self.end
    }
}

#[derive(Deserialize)]
struct RawRecord {
    file_name: String,
    deployment: String,
    location: String,
    start: String,
    end: String,
}

#[derive(Debug, Clone, Default)]
pub struct DeploymentLog {
    records: Vec<DeploymentRecord>,
}

impl DeploymentLog {
    pub fn new(records: Vec<DeploymentRecord>) -> DeploymentLog {
        DeploymentLog { records }
    }

    /// Read a deployment log CSV with the columns `file_name`, `deployment`,
    /// `location`, `start` and `end`. Extra columns are ignored.
    pub fn read<P: AsRef<Path>>(file: P) -> Result<DeploymentLog, DeploymentLogError> {
        let file = file.as_ref();
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(file)
            .map_err(|e| DeploymentLogError::Csv {
                file: file.display().to_string(),
                err: e.to_string(),
            })?;

        let mut records = vec![];
        for (i_row, raw) in reader.deserialize::<RawRecord>().enumerate() {
            // The header is line 1.
            let line = i_row + 2;
            let raw = raw.map_err(|e| DeploymentLogError::Csv {
                file: file.display().to_string(),
                err: e.to_string(),
            })?;
            let deployment = raw.deployment.parse().map_err(|_| DeploymentLogError::BadDeploymentType {
                line,
                got: raw.deployment.clone(),
            })?;
            let parse_time = |s: &str| {
                parse_timestamp(s).map_err(|_| DeploymentLogError::BadTimestamp {
                    line,
                    got: s.to_string(),
                })
            };
            let start = parse_time(&raw.start)?;
            let end = parse_time(&raw.end)?;
            if end < start {
                return Err(DeploymentLogError::EndBeforeStart { line });
            }
            let pod = pod_from_file_name(&raw.file_name);
            records.push(DeploymentRecord {
                file_name: raw.file_name,
                pod,
                deployment,
                location: raw.location,
                start,
                end,
            });
        }

        Ok(DeploymentLog { records })
    }

    pub fn records(&self, ty: DeploymentType) -> impl Iterator<Item = &DeploymentRecord> {
        self.records.iter().filter(move |r| r.deployment == ty)
    }

    /// The unique pods of a deployment type, in order of appearance.
    pub fn pods(&self, ty: DeploymentType) -> IndexSet<&str> {
        self.records(ty).map(|r| r.pod.as_str()).collect()
    }

    /// The earliest start time of all deployments of a type.
    pub fn earliest_start(&self, ty: DeploymentType) -> Option<NaiveDateTime> {
        self.records(ty).map(|r| r.start).min()
    }

    /// Where a pod was during a field deployment at time `t`, if known.
    pub fn location_of(&self, pod: &str, t: NaiveDateTime) -> Option<&str> {
        self.records(DeploymentType::Field)
            .find(|r| r.pod == pod && r.contains(t))
            .map(|r| r.location.as_str())
    }

    /// Like [`DeploymentLog::location_of`], but falling back to the pod's
    /// first field location. Resampled timestamps can precede the start of
    /// the deployment they came from.
    pub fn field_location(&self, pod: &str, t: NaiveDateTime) -> Option<&str> {
        self.location_of(pod, t).or_else(|| {
            self.records(DeploymentType::Field)
                .find(|r| r.pod == pod)
                .map(|r| r.location.as_str())
        })
    }
}

fn pod_from_file_name(file_name: &str) -> String {
    file_name
        .split('_')
        .next()
        .unwrap_or(file_name)
        .trim_end_matches(".csv")
        .to_string()
}
