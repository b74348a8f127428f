// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Run settings. The colocation stage leaves its settings in its output
//! folder; harmonization runs add their own keys on top and persist the
//! merged result with their outputs.
//!
//! [`RunSettings`] is the loosely-typed, on-disk form. It is validated once
//! into [`Settings`] before anything is fit.

mod error;
#[cfg(test)]
mod tests;

pub use error::SettingsError;

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};
use vec1::Vec1;

use crate::{
    colocation::StandardScaler,
    constants::{DATETIME_FORMAT, DEFAULT_K_FOLDS},
    features::FeatureTransforms,
    timeseries::{AggregationMode, Resampler},
    unit_parsing::{parse_time_interval, parse_timestamp},
};

/// A resampling interval. Numbers are minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeInterval {
    Minutes(f64),
    Text(String),
}

/// The colocation stage may store the colocation pod as a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColocationPodName {
    Single(String),
    Many(Vec<String>),
}

/// Settings as they are stored on disk. Every key is optional here; what is
/// required is decided by [`RunSettings::validate`]. Keys not known to this
/// crate are kept and written back out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pollutant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensors_included: Option<Vec<String>>,
    /// The timezone of every timestamp (pod data, deployment log, crop
    /// bounds). Timestamps are naive wall-clock times in this zone and are
    /// never converted; the zone is only reported and persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_timezone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_interval: Option<TimeInterval>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retime_calc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colo_pod_name: Option<ColocationPodName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preprocess: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub earliest_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaler: Option<StandardScaler>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_names: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t_warmup: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hf_run_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_field: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k_folds: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_plot_list: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub harmon_plot_list: Option<Vec<String>>,
    #[serde(
        default,
        rename = "TElapsed_in_harmon",
        skip_serializing_if = "Option::is_none"
    )]
    pub elapsed_in_harmonization: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop_field_time: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_end: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub earliest_harmon_time: Option<String>,

    #[serde(flatten)]
    pub extra: IndexMap<String, serde_json::Value>,
}

impl RunSettings {
    pub fn read<P: AsRef<Path>>(file: P) -> Result<RunSettings, SettingsError> {
        let file = file.as_ref();
        if !file.exists() {
            return Err(SettingsError::MissingFile(file.display().to_string()));
        }
        let reader = BufReader::new(File::open(file)?);
        serde_json::from_reader(reader).map_err(|err| SettingsError::Decode {
            file: file.display().to_string(),
            err,
        })
    }

    pub fn write<P: AsRef<Path>>(&self, file: P) -> Result<(), SettingsError> {
        let mut writer = BufWriter::new(File::create(file)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// Layer `overrides` on top of these settings. Keys set in `overrides`
    /// win.
    pub fn merge(self, overrides: RunSettings) -> RunSettings {
        let mut extra = self.extra;
        extra.extend(overrides.extra);
        RunSettings {
            pollutant: overrides.pollutant.or(self.pollutant),
            unit: overrides.unit.or(self.unit),
            sensors_included: overrides.sensors_included.or(self.sensors_included),
            ref_timezone: overrides.ref_timezone.or(self.ref_timezone),
            time_interval: overrides.time_interval.or(self.time_interval),
            retime_calc: overrides.retime_calc.or(self.retime_calc),
            colo_pod_name: overrides.colo_pod_name.or(self.colo_pod_name),
            preprocess: overrides.preprocess.or(self.preprocess),
            earliest_time: overrides.earliest_time.or(self.earliest_time),
            scaler: overrides.scaler.or(self.scaler),
            column_names: overrides.column_names.or(self.column_names),
            t_warmup: overrides.t_warmup.or(self.t_warmup),
            hf_run_name: overrides.hf_run_name.or(self.hf_run_name),
            run_field: overrides.run_field.or(self.run_field),
            best_model: overrides.best_model.or(self.best_model),
            k_folds: overrides.k_folds.or(self.k_folds),
            field_plot_list: overrides.field_plot_list.or(self.field_plot_list),
            harmon_plot_list: overrides.harmon_plot_list.or(self.harmon_plot_list),
            elapsed_in_harmonization: overrides
                .elapsed_in_harmonization
                .or(self.elapsed_in_harmonization),
            crop_field_time: overrides.crop_field_time.or(self.crop_field_time),
            field_start: overrides.field_start.or(self.field_start),
            field_end: overrides.field_end.or(self.field_end),
            earliest_harmon_time: overrides.earliest_harmon_time.or(self.earliest_harmon_time),
            extra,
        }
    }

    /// Record the harmonization session's earliest start time.
    pub fn set_earliest_harmon_time(&mut self, t: NaiveDateTime) {
        self.earliest_harmon_time = Some(t.format(DATETIME_FORMAT).to_string());
    }

    /// Check and convert everything needed for a run.
    pub fn validate(&self) -> Result<Settings, SettingsError> {
        let pollutant = required(&self.pollutant, "pollutant")?.clone();
        let sensors = Vec1::try_from_vec(required(&self.sensors_included, "sensors_included")?.clone())
            .map_err(|_| SettingsError::NoSensors)?;

        let interval = match required(&self.time_interval, "time_interval")? {
            TimeInterval::Minutes(m) => parse_time_interval(&m.to_string()),
            TimeInterval::Text(s) => parse_time_interval(s),
        }
        .map_err(|e| SettingsError::BadValue {
            key: "time_interval",
            err: e.to_string(),
        })?;
        let mode_str = required(&self.retime_calc, "retime_calc")?;
        let mode: AggregationMode =
            mode_str
                .to_ascii_lowercase()
                .parse()
                .map_err(|_| SettingsError::BadValue {
                    key: "retime_calc",
                    err: format!("'{mode_str}' is neither 'mean' nor 'median'"),
                })?;
        let resampler = Resampler::new(interval, mode).map_err(|e| SettingsError::BadValue {
            key: "time_interval",
            err: e.to_string(),
        })?;

        let colocation_pod = match required(&self.colo_pod_name, "colo_pod_name")? {
            ColocationPodName::Single(s) => s.clone(),
            ColocationPodName::Many(names) => match names.as_slice() {
                [name] => name.clone(),
                [] => return Err(SettingsError::MissingKey("colo_pod_name")),
                _ => return Err(SettingsError::MultipleColocationPods(names.join(", "))),
            },
        };

        let transforms = FeatureTransforms::from_names(self.preprocess.as_deref().unwrap_or_default())?;
        let earliest_time = self
            .earliest_time
            .as_deref()
            .map(|s| parse_setting_time(s, "earliest_time"))
            .transpose()?;
        if transforms.add_time_elapsed && earliest_time.is_none() {
            return Err(SettingsError::MissingKey("earliest_time"));
        }

        let k_folds = self.k_folds.unwrap_or(DEFAULT_K_FOLDS);
        if k_folds < 2 {
            return Err(SettingsError::BadValue {
                key: "k_folds",
                err: format!("at least 2 folds are required, got {k_folds}"),
            });
        }

        let crop = if self.crop_field_time.unwrap_or(false) {
            let start = parse_setting_time(required(&self.field_start, "field_start")?, "field_start")?;
            let end = parse_setting_time(required(&self.field_end, "field_end")?, "field_end")?;
            if end < start {
                return Err(SettingsError::BadValue {
                    key: "field_end",
                    err: format!("{end} is before field_start {start}"),
                });
            }
            Some((start, end))
        } else {
            None
        };

        Ok(Settings {
            pollutant,
            unit: self.unit.clone().unwrap_or_default(),
            sensors,
            resampler,
            colocation_pod,
            transforms,
            timezone: self.ref_timezone.clone().filter(|tz| !tz.is_empty()),
            earliest_time,
            scaler: self.scaler.clone(),
            run_name: self.hf_run_name.clone().filter(|n| !n.is_empty()),
            run_field: self.run_field.unwrap_or(true),
            best_model: required(&self.best_model, "best_model")?.clone(),
            k_folds,
            harmon_plots: parse_plots(self.harmon_plot_list.as_deref(), "harmon_plot_list")?,
            field_plots: parse_plots(self.field_plot_list.as_deref(), "field_plot_list")?,
            elapsed_in_harmonization: self.elapsed_in_harmonization.unwrap_or(false),
            crop,
            earliest_harmon_time: self
                .earliest_harmon_time
                .as_deref()
                .map(|s| parse_setting_time(s, "earliest_harmon_time"))
                .transpose()?,
        })
    }
}

fn required<'a, T>(value: &'a Option<T>, key: &'static str) -> Result<&'a T, SettingsError> {
    value.as_ref().ok_or(SettingsError::MissingKey(key))
}

fn parse_setting_time(s: &str, key: &'static str) -> Result<NaiveDateTime, SettingsError> {
    parse_timestamp(s).map_err(|e| SettingsError::BadValue {
        key,
        err: e.to_string(),
    })
}

fn parse_plots<P>(names: Option<&[String]>, key: &'static str) -> Result<Vec<P>, SettingsError>
where
    P: std::str::FromStr + IntoEnumIterator + Into<&'static str>,
{
    names
        .unwrap_or_default()
        .iter()
        .map(|name| {
            name.parse().map_err(|_| SettingsError::BadValue {
                key,
                err: format!(
                    "unknown plot '{name}'; valid plots: {}",
                    P::iter().map(Into::<&'static str>::into).join(", ")
                ),
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString, IntoStaticStr)]
pub enum HarmonizationPlot {
    #[strum(serialize = "harmon_timeseries")]
    Timeseries,

    #[strum(serialize = "harmon_stats_plot")]
    Stats,

    #[strum(serialize = "harmon_scatter")]
    Scatter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString, IntoStaticStr)]
pub enum FieldPlot {
    #[strum(serialize = "field_boxplot")]
    Boxplot,

    #[strum(serialize = "field_timeseries")]
    Timeseries,

    #[strum(serialize = "field_histogram")]
    Histogram,

    /// Field data after harmonization, before the colocation model.
    #[strum(serialize = "harmonized_field_hist")]
    HarmonizedHistogram,
}

/// Validated settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub pollutant: String,
    pub unit: String,
    pub sensors: Vec1<String>,
    pub resampler: Resampler,
    pub colocation_pod: String,
    pub transforms: FeatureTransforms,

    /// A label only; see [`RunSettings::ref_timezone`].
    pub timezone: Option<String>,

    /// The reference time of the colocation model's elapsed-time feature.
    pub earliest_time: Option<NaiveDateTime>,
    pub scaler: Option<StandardScaler>,

    /// `None` means the run folder is named after the current time.
    pub run_name: Option<String>,
    pub run_field: bool,
    pub best_model: String,
    pub k_folds: usize,
    pub harmon_plots: Vec<HarmonizationPlot>,
    pub field_plots: Vec<FieldPlot>,
    pub elapsed_in_harmonization: bool,

    /// Inclusive field time window.
    pub crop: Option<(NaiveDateTime, NaiveDateTime)>,

    /// Only available after a harmonization that used elapsed time.
    pub earliest_harmon_time: Option<NaiveDateTime>,
}
