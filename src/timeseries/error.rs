// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use chrono::NaiveDateTime;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TimeseriesError {
    #[error("Column '{column}' has {got} values, but the table has {expected} rows")]
    LengthMismatch {
        column: String,
        expected: usize,
        got: usize,
    },

    #[error("Column '{0}' is not in the table")]
    MissingColumn(String),

    #[error("Column '{0}' appears more than once")]
    DuplicateColumn(String),

    #[error("Tables have different columns ({ours:?} vs. {theirs:?}) and cannot be stacked")]
    ColumnsDiffer {
        ours: Vec<String>,
        theirs: Vec<String>,
    },

    #[error("The timestamp {0} appears more than once; tables can only be joined on unique timestamps")]
    DuplicateTimestamp(NaiveDateTime),

    #[error("The resampling interval must be positive")]
    ZeroWidth,
}
