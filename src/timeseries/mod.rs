// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Time-indexed tables of pod readings, and resampling them onto regular time
//! buckets.

mod error;

pub use error::TimeseriesError;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{Duration, NaiveDateTime};
use indexmap::IndexMap;
use ndarray::prelude::*;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::{
    constants::MILLISECONDS_PER_DAY,
    math::{mean, median},
};

/// A time-indexed table with one column per sensor channel. Missing values are
/// NaN. Timestamps are not required to be regular or unique, but resampled
/// tables are sorted with unique timestamps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PodTimeseries {
    timestamps: Vec<NaiveDateTime>,
    columns: IndexMap<String, Vec<f64>>,
}

impl PodTimeseries {
    pub fn new(
        timestamps: Vec<NaiveDateTime>,
        columns: IndexMap<String, Vec<f64>>,
    ) -> Result<PodTimeseries, TimeseriesError> {
        for (name, values) in &columns {
            if values.len() != timestamps.len() {
                return Err(TimeseriesError::LengthMismatch {
                    column: name.clone(),
                    expected: timestamps.len(),
                    got: values.len(),
                });
            }
        }
        Ok(PodTimeseries {
            timestamps,
            columns,
        })
    }

    /// A table with no rows but with the given columns.
    pub fn empty<S: AsRef<str>>(column_names: &[S]) -> PodTimeseries {
        PodTimeseries {
            timestamps: vec![],
            columns: column_names
                .iter()
                .map(|n| (n.as_ref().to_string(), vec![]))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(|v| v.as_slice())
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(|k| k.as_str())
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Find a column without regard to ASCII case. Exact matches win.
    pub(crate) fn find_column_ignore_case(&self, name: &str) -> Option<&str> {
        if self.columns.contains_key(name) {
            return Some(self.columns.get_key_value(name)?.0.as_str());
        }
        self.columns
            .keys()
            .find(|k| k.eq_ignore_ascii_case(name))
            .map(|k| k.as_str())
    }

    /// Append a column. The name must be new and the length must match.
    pub fn push_column(&mut self, name: String, values: Vec<f64>) -> Result<(), TimeseriesError> {
        if values.len() != self.timestamps.len() {
            return Err(TimeseriesError::LengthMismatch {
                column: name,
                expected: self.timestamps.len(),
                got: values.len(),
            });
        }
        if self.columns.contains_key(&name) {
            return Err(TimeseriesError::DuplicateColumn(name));
        }
        self.columns.insert(name, values);
        Ok(())
    }

    /// Keep only the named columns, in the given order.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<PodTimeseries, TimeseriesError> {
        let mut columns = IndexMap::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let values = self
                .columns
                .get(name)
                .ok_or_else(|| TimeseriesError::MissingColumn(name.to_string()))?;
            columns.insert(name.to_string(), values.clone());
        }
        Ok(PodTimeseries {
            timestamps: self.timestamps.clone(),
            columns,
        })
    }

    /// Append a suffix to every column name.
    pub fn with_suffix(self, suffix: &str) -> PodTimeseries {
        PodTimeseries {
            timestamps: self.timestamps,
            columns: self
                .columns
                .into_iter()
                .map(|(k, v)| (format!("{k}{suffix}"), v))
                .collect(),
        }
    }

    /// Keep rows whose timestamps are within `[start, end]` (inclusive at both
    /// ends).
    pub fn crop(&self, start: NaiveDateTime, end: NaiveDateTime) -> PodTimeseries {
        self.filter_rows(|i| {
            let t = self.timestamps[i];
            t >= start && t <= end
        })
    }

    /// Remove every row that contains a NaN in any column.
    pub fn drop_missing(&self) -> PodTimeseries {
        self.filter_rows(|i| self.columns.values().all(|c| !c[i].is_nan()))
    }

    fn filter_rows<F: Fn(usize) -> bool>(&self, keep: F) -> PodTimeseries {
        let indices: Vec<usize> = (0..self.len()).filter(|&i| keep(i)).collect();
        PodTimeseries {
            timestamps: indices.iter().map(|&i| self.timestamps[i]).collect(),
            columns: self
                .columns
                .iter()
                .map(|(k, v)| (k.clone(), indices.iter().map(|&i| v[i]).collect()))
                .collect(),
        }
    }

    /// Stack the rows of another table with identical columns below this one's
    /// rows and sort everything by time. The sort is stable.
    pub fn append_rows(self, other: PodTimeseries) -> Result<PodTimeseries, TimeseriesError> {
        if !self.columns.keys().eq(other.columns.keys()) {
            return Err(TimeseriesError::ColumnsDiffer {
                ours: self.columns.keys().cloned().collect(),
                theirs: other.columns.keys().cloned().collect(),
            });
        }

        let mut order: Vec<usize> = (0..self.len() + other.len()).collect();
        let timestamps: Vec<NaiveDateTime> = self
            .timestamps
            .into_iter()
            .chain(other.timestamps)
            .collect();
        order.sort_by_key(|&i| timestamps[i]);

        let mut other_columns = other.columns;
        let columns = self
            .columns
            .into_iter()
            .map(|(k, v)| {
                let theirs = other_columns.remove(&k).unwrap_or_default();
                let all: Vec<f64> = v.into_iter().chain(theirs).collect();
                let sorted = order.iter().map(|&i| all[i]).collect();
                (k, sorted)
            })
            .collect();
        Ok(PodTimeseries {
            timestamps: order.iter().map(|&i| timestamps[i]).collect(),
            columns,
        })
    }

    /// Join two tables on their timestamps. The result has the union of both
    /// tables' timestamps (sorted); values absent from a table are NaN. Both
    /// tables must have unique timestamps and distinct column names.
    pub fn outer_join(&self, other: &PodTimeseries) -> Result<PodTimeseries, TimeseriesError> {
        let ours = self.timestamp_lookup()?;
        let theirs = other.timestamp_lookup()?;
        let timestamps: Vec<NaiveDateTime> = self
            .timestamps
            .iter()
            .chain(other.timestamps.iter())
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut columns = IndexMap::with_capacity(self.num_columns() + other.num_columns());
        for (table, lookup) in [(self, &ours), (other, &theirs)] {
            for (name, values) in &table.columns {
                if columns.contains_key(name) {
                    return Err(TimeseriesError::DuplicateColumn(name.clone()));
                }
                let joined = timestamps
                    .iter()
                    .map(|t| lookup.get(t).map(|&i| values[i]).unwrap_or(f64::NAN))
                    .collect();
                columns.insert(name.clone(), joined);
            }
        }

        Ok(PodTimeseries {
            timestamps,
            columns,
        })
    }

    fn timestamp_lookup(&self) -> Result<HashMap<NaiveDateTime, usize>, TimeseriesError> {
        let mut lookup = HashMap::with_capacity(self.len());
        for (i, &t) in self.timestamps.iter().enumerate() {
            if lookup.insert(t, i).is_some() {
                return Err(TimeseriesError::DuplicateTimestamp(t));
            }
        }
        Ok(lookup)
    }

    /// The values of this table as a (rows, columns) array.
    pub fn to_array(&self) -> Array2<f64> {
        let mut array = Array2::zeros((self.len(), self.num_columns()));
        for (mut array_column, values) in array.axis_iter_mut(Axis(1)).zip(self.columns.values()) {
            array_column
                .iter_mut()
                .zip(values.iter())
                .for_each(|(a, &v)| *a = v);
        }
        array
    }

    /// Build a table from an array with the given column names.
    pub fn from_array(
        timestamps: Vec<NaiveDateTime>,
        names: Vec<String>,
        array: ArrayView2<f64>,
    ) -> Result<PodTimeseries, TimeseriesError> {
        if array.len_of(Axis(1)) != names.len() {
            return Err(TimeseriesError::LengthMismatch {
                column: "<column names>".to_string(),
                expected: array.len_of(Axis(1)),
                got: names.len(),
            });
        }
        let columns = names
            .into_iter()
            .zip(array.axis_iter(Axis(1)))
            .map(|(name, values)| (name, values.to_vec()))
            .collect();
        PodTimeseries::new(timestamps, columns)
    }
}

/// How readings falling into the same time bucket are combined. This is one
/// global choice for all sensors.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AggregationMode {
    #[strum(serialize = "mean")]
    Mean,

    #[strum(serialize = "median")]
    Median,
}

/// Resamples tables onto fixed-width time buckets. Buckets are anchored at the
/// Unix epoch, so bucket boundaries don't depend on the data; each bucket is
/// labelled by its start time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resampler {
    width: Duration,
    mode: AggregationMode,
}

impl Resampler {
    pub fn new(width: Duration, mode: AggregationMode) -> Result<Resampler, TimeseriesError> {
        if width.num_milliseconds() <= 0 {
            return Err(TimeseriesError::ZeroWidth);
        }
        Ok(Resampler { width, mode })
    }

    pub fn width(&self) -> Duration {
        self.width
    }

    pub fn mode(&self) -> AggregationMode {
        self.mode
    }

    /// The start of the bucket containing `t`.
    pub fn bucket_start(&self, t: NaiveDateTime) -> NaiveDateTime {
        let width = self.width.num_milliseconds();
        let offset = t.and_utc().timestamp_millis().rem_euclid(width);
        t - Duration::milliseconds(offset)
    }

    /// Aggregate every column into buckets, ignoring NaNs. The output has one
    /// row for every bucket that received at least one reading in any column;
    /// a column with no readings in a bucket is NaN there. Call
    /// [`PodTimeseries::drop_missing`] afterwards to keep only complete rows.
    pub fn resample(&self, table: &PodTimeseries) -> PodTimeseries {
        let buckets: Vec<NaiveDateTime> = table
            .timestamps
            .iter()
            .map(|&t| self.bucket_start(t))
            .collect();

        let mut per_column: Vec<BTreeMap<NaiveDateTime, Vec<f64>>> =
            Vec::with_capacity(table.num_columns());
        let mut all_buckets = BTreeSet::new();
        for values in table.columns.values() {
            let mut grouped: BTreeMap<NaiveDateTime, Vec<f64>> = BTreeMap::new();
            for (&bucket, &v) in buckets.iter().zip(values.iter()) {
                if v.is_nan() {
                    continue;
                }
                grouped.entry(bucket).or_default().push(v);
                all_buckets.insert(bucket);
            }
            per_column.push(grouped);
        }

        let timestamps: Vec<NaiveDateTime> = all_buckets.into_iter().collect();
        let columns = table
            .columns
            .keys()
            .zip(per_column)
            .map(|(name, mut grouped)| {
                let values = timestamps
                    .iter()
                    .map(|t| {
                        grouped
                            .get_mut(t)
                            .and_then(|v| self.aggregate(v))
                            .unwrap_or(f64::NAN)
                    })
                    .collect();
                (name.clone(), values)
            })
            .collect();

        PodTimeseries {
            timestamps,
            columns,
        }
    }

    fn aggregate(&self, values: &mut [f64]) -> Option<f64> {
        match self.mode {
            AggregationMode::Mean => mean(values),
            AggregationMode::Median => median(values),
        }
    }
}

/// Fractional days elapsed between `reference` and every timestamp.
pub fn elapsed_days(timestamps: &[NaiveDateTime], reference: NaiveDateTime) -> Vec<f64> {
    timestamps
        .iter()
        .map(|&t| (t - reference).num_milliseconds() as f64 / MILLISECONDS_PER_DAY)
        .collect()
}
