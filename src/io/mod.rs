// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! File stuff (input/output, reading/writing, globs), for pod data, reports
//! and cached stage data.

mod cache;
mod error;
mod glob;
mod pod_data;
mod reports;
#[cfg(test)]
mod tests;

pub use cache::{Stage, StageCache};
pub use error::{DataReadError, ReportWriteError, StageCacheError};
pub(crate) use pod_data::read_pod_data;
pub(crate) use reports::{
    write_location_workbook, write_melted, write_statistic_workbook, write_workbook,
    LocationEstimate, MeltedRow,
};
pub use self::glob::GlobError;
