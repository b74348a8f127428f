// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Derived features computed from harmonized field data. The set of enabled
//! transforms must match what the colocation model was trained with.

mod error;

pub use error::FeatureError;

use chrono::NaiveDateTime;
use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::{
    constants::TIME_ELAPSED_COLUMN,
    timeseries::{elapsed_days, PodTimeseries},
};

lazy_static::lazy_static! {
    pub(crate) static ref FEATURE_TRANSFORM_NAMES: String = FeatureTransform::iter().join(", ");
}

/// The recognised transforms, in the order they are applied.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
pub enum FeatureTransform {
    #[strum(serialize = "interaction_terms")]
    #[serde(rename = "interaction_terms")]
    InteractionTerms,

    #[strum(serialize = "add_time_elapsed")]
    #[serde(rename = "add_time_elapsed")]
    AddTimeElapsed,

    #[strum(serialize = "fig2600_2602_ratio")]
    #[serde(rename = "fig2600_2602_ratio")]
    Fig2600Fig2602Ratio,

    #[strum(serialize = "fig2600_3_ratio")]
    #[serde(rename = "fig2600_3_ratio")]
    Fig2600Fig3Ratio,

    #[strum(serialize = "fig3_2602_ratio")]
    #[serde(rename = "fig3_2602_ratio")]
    Fig3Fig2602Ratio,

    #[strum(serialize = "fig4_2602_ratio")]
    #[serde(rename = "fig4_2602_ratio")]
    Fig4Fig2602Ratio,

    #[strum(serialize = "fig4_3_ratio")]
    #[serde(rename = "fig4_3_ratio")]
    Fig4Fig3Ratio,
}

impl FeatureTransform {
    /// The (numerator, denominator) channels of a ratio transform.
    fn ratio_channels(self) -> Option<(&'static str, &'static str)> {
        match self {
            FeatureTransform::Fig2600Fig2602Ratio => Some(("fig2600", "fig2602")),
            FeatureTransform::Fig2600Fig3Ratio => Some(("fig2600", "fig3")),
            FeatureTransform::Fig3Fig2602Ratio => Some(("fig3", "fig2602")),
            FeatureTransform::Fig4Fig2602Ratio => Some(("fig4", "fig2602")),
            FeatureTransform::Fig4Fig3Ratio => Some(("fig4", "fig3")),
            FeatureTransform::InteractionTerms | FeatureTransform::AddTimeElapsed => None,
        }
    }
}

/// Which transforms are enabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeatureTransforms {
    pub interaction_terms: bool,
    pub add_time_elapsed: bool,
    pub fig2600_2602_ratio: bool,
    pub fig2600_3_ratio: bool,
    pub fig3_2602_ratio: bool,
    pub fig4_2602_ratio: bool,
    pub fig4_3_ratio: bool,
}

impl FeatureTransforms {
    /// Parse the names of transforms. Names are matched without regard to
    /// case; unknown names are rejected.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<FeatureTransforms, FeatureError> {
        let mut transforms = FeatureTransforms::default();
        for name in names {
            let name = name.as_ref();
            let transform = FeatureTransform::iter()
                .find(|t| <&str>::from(*t).eq_ignore_ascii_case(name))
                .ok_or_else(|| FeatureError::UnknownTransform {
                    name: name.to_string(),
                    valid: FEATURE_TRANSFORM_NAMES.clone(),
                })?;
            transforms.enable(transform);
        }
        Ok(transforms)
    }

    fn enable(&mut self, transform: FeatureTransform) {
        match transform {
            FeatureTransform::InteractionTerms => self.interaction_terms = true,
            FeatureTransform::AddTimeElapsed => self.add_time_elapsed = true,
            FeatureTransform::Fig2600Fig2602Ratio => self.fig2600_2602_ratio = true,
            FeatureTransform::Fig2600Fig3Ratio => self.fig2600_3_ratio = true,
            FeatureTransform::Fig3Fig2602Ratio => self.fig3_2602_ratio = true,
            FeatureTransform::Fig4Fig2602Ratio => self.fig4_2602_ratio = true,
            FeatureTransform::Fig4Fig3Ratio => self.fig4_3_ratio = true,
        }
    }

    pub fn is_enabled(&self, transform: FeatureTransform) -> bool {
        match transform {
            FeatureTransform::InteractionTerms => self.interaction_terms,
            FeatureTransform::AddTimeElapsed => self.add_time_elapsed,
            FeatureTransform::Fig2600Fig2602Ratio => self.fig2600_2602_ratio,
            FeatureTransform::Fig2600Fig3Ratio => self.fig2600_3_ratio,
            FeatureTransform::Fig3Fig2602Ratio => self.fig3_2602_ratio,
            FeatureTransform::Fig4Fig2602Ratio => self.fig4_2602_ratio,
            FeatureTransform::Fig4Fig3Ratio => self.fig4_3_ratio,
        }
    }

    /// The enabled transforms, in application order.
    pub fn enabled(&self) -> impl Iterator<Item = FeatureTransform> + '_ {
        FeatureTransform::iter().filter(|t| self.is_enabled(*t))
    }

    /// Apply the enabled transforms to a harmonized table. Each transform
    /// appends columns; existing columns are untouched.
    ///
    /// `earliest_time` is the reference for the elapsed-time feature and is
    /// only required when that transform is enabled. The table's timestamps
    /// should already be resampled.
    pub fn apply(
        &self,
        table: &PodTimeseries,
        earliest_time: Option<NaiveDateTime>,
    ) -> Result<PodTimeseries, FeatureError> {
        let mut out = table.clone();
        for transform in self.enabled() {
            debug!("Applying feature transform {transform}");
            match transform {
                FeatureTransform::InteractionTerms => {
                    let columns: Vec<(&str, &[f64])> = table.columns().collect();
                    let products = columns
                        .into_iter()
                        .tuple_combinations()
                        .map(|((a_name, a), (b_name, b))| {
                            let product = a.iter().zip(b).map(|(x, y)| x * y).collect();
                            (format!("{a_name}*{b_name}"), product)
                        })
                        .collect::<Vec<(String, Vec<f64>)>>();
                    for (name, values) in products {
                        out.push_column(name, values)?;
                    }
                }

                FeatureTransform::AddTimeElapsed => {
                    let reference = earliest_time.ok_or(FeatureError::MissingEarliestTime)?;
                    let elapsed = elapsed_days(out.timestamps(), reference);
                    out.push_column(TIME_ELAPSED_COLUMN.to_string(), elapsed)?;
                }

                ratio => {
                    let Some((numerator, denominator)) = ratio.ratio_channels() else {
                        continue;
                    };
                    let top = find_channel(&out, numerator, ratio)?;
                    let bottom = find_channel(&out, denominator, ratio)?;
                    let values = top.iter().zip(bottom).map(|(t, b)| t / b).collect();
                    out.push_column(ratio.to_string(), values)?;
                }
            }
        }
        Ok(out)
    }
}

fn find_channel<'a>(
    table: &'a PodTimeseries,
    channel: &str,
    transform: FeatureTransform,
) -> Result<&'a [f64], FeatureError> {
    table
        .find_column_ignore_case(channel)
        .and_then(|name| table.column(name))
        .ok_or_else(|| FeatureError::MissingChannel {
            transform: transform.to_string(),
            channel: channel.to_string(),
            available: table.column_names().join(", "),
        })
}

impl std::fmt::Display for FeatureTransforms {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let enabled = self.enabled().join(", ");
        if enabled.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{enabled}")
        }
    }
}
