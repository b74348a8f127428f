// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Harmonization and field calibration of low-cost air-quality sensor pods.
//!
//! Each pod's sensors are harmonized against the same sensors of a colocation
//! pod; the harmonized field data then go through the feature chain, scaler
//! and estimator of a colocation model to estimate pollutant concentrations.

mod cli;
pub mod colocation;
pub mod constants;
pub mod deployment;
pub mod features;
pub mod field;
pub mod harmonization;
pub mod io;
pub mod math;
mod misc;
pub mod models;
mod params;
pub mod settings;
pub mod timeseries;
pub mod unit_parsing;

use crossbeam_utils::atomic::AtomicCell;

/// Should progress bars be drawn? Only the CLI turns them on.
pub(crate) static PROGRESS_BARS: AtomicCell<bool> = AtomicCell::new(false);

// Re-exports.
pub use cli::{Podcal, PodcalError};
pub use harmonization::{harmonize_pods, HarmonizationConfig, HarmonizationResults};
pub use models::{HarmonizationModel, HarmonizationModels, ModelStoreType};
pub use timeseries::{AggregationMode, PodTimeseries, Resampler};
