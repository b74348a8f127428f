// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use chrono::{Duration, NaiveDate};
use indoc::indoc;
use tempfile::tempdir;

use super::*;

const UPSTREAM: &str = indoc! {r#"
    {
        "pollutant": "CH4",
        "unit": "ppm",
        "sensors_included": ["Fig2600", "Fig2602"],
        "ref_timezone": "MST",
        "time_interval": 15,
        "retime_calc": "median",
        "colo_pod_name": ["YPODA2"],
        "preprocess": ["interaction_terms", "add_time_elapsed"],
        "earliest_time": "2024-01-05 00:00:00",
        "scaler": {"mean": [1.0, 2.0], "scale": [0.5, 0.0]},
        "model_list": ["lin_reg", "ridge"]
    }
"#};

fn upstream() -> RunSettings {
    serde_json::from_str(UPSTREAM).unwrap()
}

fn run() -> RunSettings {
    RunSettings {
        best_model: Some("lin_reg".to_string()),
        ..Default::default()
    }
}

#[test]
fn test_upstream_settings_decode() {
    let settings = upstream();
    assert_eq!(settings.time_interval, Some(TimeInterval::Minutes(15.0)));
    assert_eq!(
        settings.colo_pod_name,
        Some(ColocationPodName::Many(vec!["YPODA2".to_string()]))
    );
    // Keys we don't know about are kept.
    assert!(settings.extra.contains_key("model_list"));
}

#[test]
fn test_validate_merged_settings() {
    let settings = upstream().merge(run()).validate().unwrap();
    assert_eq!(settings.pollutant, "CH4");
    assert_eq!(settings.sensors.as_slice(), ["Fig2600", "Fig2602"]);
    assert_eq!(settings.colocation_pod, "YPODA2");
    assert_eq!(settings.resampler.width(), Duration::minutes(15));
    assert_eq!(settings.resampler.mode(), AggregationMode::Median);
    assert!(settings.transforms.interaction_terms);
    assert!(settings.transforms.add_time_elapsed);
    assert_eq!(
        settings.earliest_time,
        NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_opt(0, 0, 0)
    );
    assert_eq!(settings.k_folds, DEFAULT_K_FOLDS);
    assert!(settings.run_field);
    assert!(settings.crop.is_none());
    assert!(settings.run_name.is_none());
    assert!(settings.harmon_plots.is_empty());
}

#[test]
fn test_merge_overrides_win() {
    let overrides = RunSettings {
        pollutant: Some("CO2".to_string()),
        time_interval: Some(TimeInterval::Text("1h".to_string())),
        ..run()
    };
    let merged = upstream().merge(overrides);
    assert_eq!(merged.pollutant.as_deref(), Some("CO2"));
    assert_eq!(merged.unit.as_deref(), Some("ppm"));
    assert_eq!(merged.best_model.as_deref(), Some("lin_reg"));
    let settings = merged.validate().unwrap();
    assert_eq!(settings.resampler.width(), Duration::hours(1));
}

#[test]
fn test_missing_required_keys() {
    let result = upstream().validate();
    assert!(matches!(result, Err(SettingsError::MissingKey("best_model"))));

    let mut settings = upstream().merge(run());
    settings.pollutant = None;
    assert!(matches!(
        settings.validate(),
        Err(SettingsError::MissingKey("pollutant"))
    ));

    let mut settings = upstream().merge(run());
    settings.sensors_included = Some(vec![]);
    assert!(matches!(settings.validate(), Err(SettingsError::NoSensors)));

    // Elapsed time can't be computed without the reference.
    let mut settings = upstream().merge(run());
    settings.earliest_time = None;
    assert!(matches!(
        settings.validate(),
        Err(SettingsError::MissingKey("earliest_time"))
    ));
}

#[test]
fn test_multiple_colocation_pods_rejected() {
    let mut settings = upstream().merge(run());
    settings.colo_pod_name = Some(ColocationPodName::Many(vec![
        "YPODA2".to_string(),
        "YPODA7".to_string(),
    ]));
    assert!(matches!(
        settings.validate(),
        Err(SettingsError::MultipleColocationPods(_))
    ));

    settings.colo_pod_name = Some(ColocationPodName::Single("YPODA7".to_string()));
    assert_eq!(settings.validate().unwrap().colocation_pod, "YPODA7");
}

#[test]
fn test_bad_values() {
    let mut settings = upstream().merge(run());
    settings.retime_calc = Some("mode".to_string());
    assert!(matches!(
        settings.validate(),
        Err(SettingsError::BadValue { key: "retime_calc", .. })
    ));

    let mut settings = upstream().merge(run());
    settings.k_folds = Some(1);
    assert!(matches!(
        settings.validate(),
        Err(SettingsError::BadValue { key: "k_folds", .. })
    ));

    let mut settings = upstream().merge(run());
    settings.preprocess = Some(vec!["fig9_ratio".to_string()]);
    assert!(matches!(settings.validate(), Err(SettingsError::Feature(_))));

    let mut settings = upstream().merge(run());
    settings.harmon_plot_list = Some(vec!["harmon_scatter".to_string(), "pie".to_string()]);
    assert!(matches!(
        settings.validate(),
        Err(SettingsError::BadValue { key: "harmon_plot_list", .. })
    ));
}

#[test]
fn test_plots_parse() {
    let mut settings = upstream().merge(run());
    settings.harmon_plot_list = Some(vec!["harmon_timeseries".to_string()]);
    settings.field_plot_list = Some(vec![
        "field_boxplot".to_string(),
        "harmonized_field_hist".to_string(),
    ]);
    let settings = settings.validate().unwrap();
    assert_eq!(settings.harmon_plots, [HarmonizationPlot::Timeseries]);
    assert_eq!(
        settings.field_plots,
        [FieldPlot::Boxplot, FieldPlot::HarmonizedHistogram]
    );
}

#[test]
fn test_crop_window() {
    let mut settings = upstream().merge(run());
    settings.crop_field_time = Some(true);
    settings.field_start = Some("2024-02-10 07:15".to_string());
    assert!(matches!(
        settings.validate(),
        Err(SettingsError::MissingKey("field_end"))
    ));

    settings.field_end = Some("2024-02-11 07:14".to_string());
    let (start, end) = settings.validate().unwrap().crop.unwrap();
    assert_eq!(end - start, Duration::minutes(24 * 60 - 1));

    settings.field_end = Some("2024-02-09 07:14".to_string());
    assert!(matches!(
        settings.validate(),
        Err(SettingsError::BadValue { key: "field_end", .. })
    ));

    // Bounds are ignored when not cropping.
    settings.crop_field_time = Some(false);
    assert!(settings.validate().unwrap().crop.is_none());
}

#[test]
fn test_write_then_read() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("run_settings.json");
    let mut settings = upstream().merge(RunSettings {
        elapsed_in_harmonization: Some(true),
        ..run()
    });
    let t = NaiveDate::from_ymd_opt(2024, 2, 1)
        .unwrap()
        .and_hms_opt(6, 30, 0)
        .unwrap();
    settings.set_earliest_harmon_time(t);
    settings.write(&file).unwrap();

    let text = std::fs::read_to_string(&file).unwrap();
    assert!(text.contains("\"TElapsed_in_harmon\": true"));
    assert!(text.contains("\"earliest_harmon_time\": \"2024-02-01 06:30:00\""));
    assert!(!text.contains("field_start"));

    let read = RunSettings::read(&file).unwrap();
    assert_eq!(read, settings);
    assert_eq!(read.validate().unwrap().earliest_harmon_time, Some(t));
}

#[test]
fn test_timezone_is_carried_without_converting_times() {
    let settings = upstream()
        .merge(RunSettings {
            crop_field_time: Some(true),
            field_start: Some("2024-02-10 07:15:00".to_string()),
            field_end: Some("2024-02-11 07:14:00".to_string()),
            ..run()
        })
        .validate()
        .unwrap();
    assert_eq!(settings.timezone.as_deref(), Some("MST"));
    let day = |d| NaiveDate::from_ymd_opt(2024, 2, d).unwrap();
    assert_eq!(
        settings.crop,
        Some((
            day(10).and_hms_opt(7, 15, 0).unwrap(),
            day(11).and_hms_opt(7, 14, 0).unwrap()
        ))
    );
    assert_eq!(
        settings.earliest_time,
        Some(day(5).and_hms_opt(0, 0, 0).unwrap())
    );

    let no_zone = RunSettings {
        ref_timezone: Some(String::new()),
        ..upstream()
    };
    assert_eq!(no_zone.merge(run()).validate().unwrap().timezone, None);
}

#[test]
fn test_read_missing_file() {
    let dir = tempdir().unwrap();
    let result = RunSettings::read(dir.path().join("nope.json"));
    assert!(matches!(result, Err(SettingsError::MissingFile(_))));
}
