// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use super::*;

use approx::assert_abs_diff_eq;

#[test]
fn test_parse_time_str_without_units() {
    for s in ["1", "1.0", " 1.0 "] {
        let result = parse_time(s);
        assert!(result.is_ok(), "{:?}", result.unwrap_err());
        let pair = result.unwrap();
        assert_abs_diff_eq!(pair.0, 1.0);
        assert_eq!(pair.1, TimeFormat::NoUnit);
    }
}

#[test]
fn test_parse_time_str_with_units() {
    // Iterate over all possible units.
    for time_format in TimeFormat::iter().filter(|&tf| tf != TimeFormat::NoUnit) {
        let time_format_str: &'static str = time_format.into();
        for time_format_str in [
            time_format_str.to_lowercase(),
            time_format_str.to_uppercase(),
        ] {
            for s in [
                format!("1{time_format_str}"),
                format!("1.0{time_format_str}"),
                format!(" 1.0{time_format_str} "),
                format!(" 1.0 {time_format_str} "),
            ] {
                let result = parse_time(&s);
                assert!(result.is_ok(), "{:?}", result.unwrap_err());
                let pair = result.unwrap();
                assert_abs_diff_eq!(pair.0, 1.0);
                assert_eq!(pair.1, time_format);
            }
        }
    }
}

#[test]
fn test_parse_time_bad_input() {
    assert!(matches!(
        parse_time("1 fortnight"),
        Err(UnitParseError::Unknown(_))
    ));
    assert!(matches!(
        parse_time("1.2.3min"),
        Err(UnitParseError::GotTimeUnitButCantParse(_))
    ));
}

#[test]
fn test_parse_time_interval() {
    assert_eq!(parse_time_interval("15").unwrap(), Duration::minutes(15));
    assert_eq!(parse_time_interval("15min").unwrap(), Duration::minutes(15));
    assert_eq!(parse_time_interval("1h").unwrap(), Duration::hours(1));
    assert_eq!(parse_time_interval("30s").unwrap(), Duration::seconds(30));
    assert_eq!(parse_time_interval("0.5").unwrap(), Duration::seconds(30));
    assert!(matches!(
        parse_time_interval("0"),
        Err(UnitParseError::NonPositiveInterval(_))
    ));
    assert!(matches!(
        parse_time_interval("-5min"),
        Err(UnitParseError::NonPositiveInterval(_)) | Err(UnitParseError::Unknown(_))
    ));
}

#[test]
fn test_parse_timestamp() {
    let expected = NaiveDate::from_ymd_opt(2024, 2, 10)
        .unwrap()
        .and_hms_opt(7, 15, 0)
        .unwrap();
    for s in [
        "2024-02-10 07:15:00",
        "2024-2-10 07:15:00",
        "2024-02-10T07:15:00",
        "2024-02-10 07:15",
        " 2024-02-10 07:15:00.000 ",
        "02/10/2024 07:15:00",
    ] {
        let result = parse_timestamp(s);
        assert!(result.is_ok(), "{s}: {:?}", result.unwrap_err());
        assert_eq!(result.unwrap(), expected);
    }

    let midnight = parse_timestamp("2024-02-10").unwrap();
    assert_eq!(midnight, expected.date().and_hms_opt(0, 0, 0).unwrap());

    assert!(matches!(
        parse_timestamp("yesterday"),
        Err(UnitParseError::Timestamp(_))
    ));
}
