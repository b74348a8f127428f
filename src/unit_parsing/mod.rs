// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Code to parse strings into plain numbers, durations or timestamps.

mod error;
#[cfg(test)]
mod tests;

pub use error::*;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use strum::IntoEnumIterator;
use strum_macros::{EnumIter, EnumString, IntoStaticStr};

#[derive(Debug, Clone, Copy, PartialEq, EnumIter, EnumString, IntoStaticStr)]
pub(crate) enum TimeFormat {
    /// Seconds
    S,

    /// Minutes
    Min,

    /// Hours
    H,

    NoUnit,
}

/// Parse a string that may have a unit of time attached to it.
pub(crate) fn parse_time(s: &str) -> Result<(f64, TimeFormat), UnitParseError> {
    // Try to parse a naked number.
    let maybe_number: Option<f64> = s.trim().parse().ok();
    if let Some(number) = maybe_number {
        return Ok((number, TimeFormat::NoUnit));
    };

    // That didn't work; let's search over our supported formats.
    for time_format in TimeFormat::iter().filter(|&tf| tf != TimeFormat::NoUnit) {
        let time_format_str: &'static str = time_format.into();
        let suffix = s
            .trim()
            .trim_start_matches(|c| char::is_numeric(c) || c == '.')
            .trim();
        if suffix.to_uppercase() == time_format_str.to_uppercase() {
            let prefix = s.trim().trim_end_matches(char::is_alphabetic).trim();
            let number: f64 = match prefix.parse() {
                Ok(n) => n,
                Err(_) => return Err(UnitParseError::GotTimeUnitButCantParse(s.to_string())),
            };
            return Ok((number, time_format));
        }
    }

    // If we made it this far, we don't know how to parse the string.
    Err(UnitParseError::Unknown(s.to_string()))
}

/// Parse a resampling interval. Naked numbers are minutes.
pub(crate) fn parse_time_interval(s: &str) -> Result<Duration, UnitParseError> {
    let (number, format) = parse_time(s)?;
    let milliseconds = match format {
        TimeFormat::S => number * 1e3,
        TimeFormat::Min | TimeFormat::NoUnit => number * 60e3,
        TimeFormat::H => number * 3600e3,
    };
    if !milliseconds.is_finite() || milliseconds < 1.0 {
        return Err(UnitParseError::NonPositiveInterval(s.to_string()));
    }
    Ok(Duration::milliseconds(milliseconds.round() as i64))
}

/// Parse a timestamp. Dates may be given without zero padding and times may
/// omit seconds; a bare date is midnight.
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime, UnitParseError> {
    let s = s.trim();
    for format in [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
        "%m/%d/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M",
    ] {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(t);
        }
    }
    if let Some(t) = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(t);
    }

    Err(UnitParseError::Timestamp(s.to_string()))
}
