// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeploymentLogError {
    #[error("Couldn't read the deployment log '{file}': {err}")]
    Csv { file: String, err: String },

    #[error("Deployment log line {line}: deployment type must be 'H' or 'F', got '{got}'")]
    BadDeploymentType { line: usize, got: String },

    #[error("Deployment log line {line}: couldn't parse '{got}' as a date and time")]
    BadTimestamp { line: usize, got: String },

    #[error("Deployment log line {line}: the deployment ends before it starts")]
    EndBeforeStart { line: usize },
}
