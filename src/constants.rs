// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Useful constants.
 */

/// The default number of folds used for k-fold cross validation of the
/// harmonization models.
pub const DEFAULT_K_FOLDS: usize = 5;

/// The directory containing all colocation output folders, if the user didn't
/// specify one.
pub const DEFAULT_OUTPUTS_DIR: &str = "Outputs";

/// The directory containing raw pod data, if the user didn't specify one.
pub const DEFAULT_DATA_DIR: &str = "Data";

/// The name of the deployment log inside the data directory.
pub const DEFAULT_DEPLOYMENT_LOG_FILENAME: &str = "deployment_log.csv";

/// Sub-directory of the data directory holding harmonization pod data.
pub const HARMONIZATION_DATA_SUBDIR: &str = "Harmonization";

/// Sub-directory of the data directory holding field pod data.
pub const FIELD_DATA_SUBDIR: &str = "Field";

/// The file holding the settings of a run (upstream or ours).
pub const RUN_SETTINGS_FILENAME: &str = "run_settings.json";

/// The stem of the persisted harmonization model store.
pub const HARMONIZATION_MODELS_STEM: &str = "harmonization_models";

/// The suffix given to colocation pod columns so they cannot collide with the
/// same-named columns of the pod being harmonized.
pub const COLOCATION_SUFFIX: &str = "_colo";

/// The name of the elapsed-time feature column.
pub const TIME_ELAPSED_COLUMN: &str = "time_elapsed";

/// The name of the timestamp column in all CSV inputs and reports.
pub const DATETIME_COLUMN: &str = "datetime";

/// The format used when writing timestamps.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The format of the timestamp used for output folders when no run name is
/// given.
pub const RUN_TIMESTAMP_FORMAT: &str = "%y%m%d%H%M%S";

/// Number of milliseconds in a day.
pub(crate) const MILLISECONDS_PER_DAY: f64 = 86_400_000.0;
