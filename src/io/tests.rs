// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::fs;

use chrono::{NaiveDate, NaiveDateTime};
use indexmap::indexmap;
use indoc::indoc;
use tempfile::tempdir;

use super::*;
use crate::{
    deployment::{DeploymentLog, DeploymentRecord, DeploymentType},
    harmonization::StatisticTable,
    timeseries::PodTimeseries,
};

fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 2, d)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

fn record(file_name: &str, ty: DeploymentType, start: NaiveDateTime, end: NaiveDateTime) -> DeploymentRecord {
    DeploymentRecord {
        file_name: file_name.to_string(),
        pod: file_name.split('_').next().unwrap().to_string(),
        deployment: ty,
        location: "Site".to_string(),
        start,
        end,
    }
}

#[test]
fn test_read_pod_data() {
    let dir = tempdir().unwrap();
    let harmon_dir = dir.path().join("Harmonization");
    fs::create_dir_all(&harmon_dir).unwrap();
    fs::write(
        harmon_dir.join("YPODD4_b.csv"),
        indoc! {"
            datetime,Fig2600,Fig2602,Temperature
            2024-02-02 00:01:00,5,6,20
            2024-02-02 00:02:00,,7,20
            2024-02-09 00:00:00,1,1,20
        "},
    )
    .unwrap();
    fs::write(
        harmon_dir.join("YPODD4_a.csv"),
        indoc! {"
            DateTime,fig2600,Fig2602
            2024-02-01 00:00:00,1,2
            2024-02-01 00:01:00,3,4
        "},
    )
    .unwrap();
    let log = DeploymentLog::new(vec![
        record("YPODD4_a", DeploymentType::Harmonization, at(1, 0, 0), at(8, 0, 0)),
        record("YPODD4_b", DeploymentType::Harmonization, at(1, 0, 0), at(8, 0, 0)),
    ]);
    let sensors = vec!["Fig2600".to_string(), "Fig2602".to_string()];

    let pods = read_pod_data(dir.path(), &log, DeploymentType::Harmonization, &sensors).unwrap();
    assert_eq!(pods.keys().collect::<Vec<_>>(), ["YPODD4"]);
    let data = &pods["YPODD4"];
    // The row outside the deployment window is gone.
    assert_eq!(
        data.timestamps(),
        &[at(1, 0, 0), at(1, 0, 1), at(2, 0, 1), at(2, 0, 2)]
    );
    assert_eq!(data.column_names().collect::<Vec<_>>(), ["Fig2600", "Fig2602"]);
    let fig2600 = data.column("Fig2600").unwrap();
    assert_eq!(&fig2600[..3], &[1.0, 3.0, 5.0]);
    assert!(fig2600[3].is_nan());

    // No field data.
    let result = read_pod_data(dir.path(), &log, DeploymentType::Field, &sensors);
    assert!(matches!(result, Err(DataReadError::MissingDir(_))));
}

#[test]
fn test_read_pod_data_missing_sensor() {
    let dir = tempdir().unwrap();
    let field_dir = dir.path().join("Field");
    fs::create_dir_all(&field_dir).unwrap();
    fs::write(field_dir.join("YPODL1.csv"), "datetime,Fig2600\n2024-02-10 00:00:00,1\n").unwrap();
    let log = DeploymentLog::new(vec![record(
        "YPODL1",
        DeploymentType::Field,
        at(9, 0, 0),
        at(12, 0, 0),
    )]);
    let sensors = vec!["Fig2600".to_string(), "Fig3".to_string()];
    let result = read_pod_data(dir.path(), &log, DeploymentType::Field, &sensors);
    assert!(matches!(
        result,
        Err(DataReadError::MissingColumn { ref column, .. }) if column == "Fig3"
    ));
}

#[test]
fn test_read_pod_data_rejects_infinite_readings() {
    let dir = tempdir().unwrap();
    let field_dir = dir.path().join("Field");
    fs::create_dir_all(&field_dir).unwrap();
    let log = DeploymentLog::new(vec![record(
        "YPODL1",
        DeploymentType::Field,
        at(9, 0, 0),
        at(12, 0, 0),
    )]);
    let sensors = vec!["Fig2600".to_string()];
    for reading in ["inf", "-inf", "1e400"] {
        fs::write(
            field_dir.join("YPODL1.csv"),
            format!("datetime,Fig2600\n2024-02-10 00:00:00,1\n2024-02-10 00:01:00,{reading}\n"),
        )
        .unwrap();
        let result = read_pod_data(dir.path(), &log, DeploymentType::Field, &sensors);
        assert!(
            matches!(
                result,
                Err(DataReadError::BadValue { line: 3, ref got, .. }) if got == reading
            ),
            "{reading} was accepted"
        );
    }
}

#[test]
fn test_read_pod_data_no_rows() {
    let dir = tempdir().unwrap();
    let field_dir = dir.path().join("Field");
    fs::create_dir_all(&field_dir).unwrap();
    fs::write(field_dir.join("YPODL1.csv"), "datetime,Fig2600\n2024-03-10 00:00:00,1\n").unwrap();
    let log = DeploymentLog::new(vec![record(
        "YPODL1",
        DeploymentType::Field,
        at(9, 0, 0),
        at(12, 0, 0),
    )]);
    let sensors = vec!["Fig2600".to_string()];
    let result = read_pod_data(dir.path(), &log, DeploymentType::Field, &sensors);
    assert!(matches!(result, Err(DataReadError::NoData { .. })));
}

#[test]
fn test_write_table_and_workbook() {
    let dir = tempdir().unwrap();
    let table = PodTimeseries::new(
        vec![at(10, 7, 15), at(10, 7, 16)],
        indexmap! {
            "CH4".to_string() => vec![1.5, f64::NAN],
        },
    )
    .unwrap();
    let sheets = indexmap! {
        "YPODD4".to_string() => table.clone(),
        "YPODL1".to_string() => table,
    };
    write_workbook(dir.path(), "y_field_estimates_by_pod", &sheets).unwrap();

    let contents =
        fs::read_to_string(dir.path().join("y_field_estimates_by_pod").join("YPODL1.csv")).unwrap();
    assert_eq!(
        contents,
        "datetime,CH4\n2024-02-10 07:15:00,1.5\n2024-02-10 07:16:00,\n"
    );
    assert!(dir
        .path()
        .join("y_field_estimates_by_pod")
        .join("YPODD4.csv")
        .exists());
}

#[test]
fn test_write_statistic_workbook() {
    let dir = tempdir().unwrap();
    let tables = indexmap! {
        "Fig2600".to_string() => StatisticTable {
            pods: vec!["YPODD4".to_string(), "YPODL1".to_string()],
            rows: vec![vec![0.5, 0.25], vec![1.0, -2.0]],
        },
    };
    write_statistic_workbook(dir.path(), "harmonization_Testing_R2_", &tables).unwrap();
    let contents = fs::read_to_string(
        dir.path()
            .join("harmonization_Testing_R2_")
            .join("Fig2600.csv"),
    )
    .unwrap();
    assert_eq!(contents, "YPODD4,YPODL1\n0.5,0.25\n1,-2\n");
}

#[test]
fn test_write_melted() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("X_field_melted.csv");
    let rows = [MeltedRow {
        timestamp: at(10, 8, 0),
        pod: "YPODD4",
        location: "School",
        sensor: "Fig2600",
        reading: 12.25,
    }];
    write_melted(&file, &rows).unwrap();
    assert_eq!(
        fs::read_to_string(file).unwrap(),
        "datetime,pod,location,sensor,reading\n2024-02-10 08:00:00,YPODD4,School,Fig2600,12.25\n"
    );
}

#[test]
fn test_stage_cache() {
    let dir = tempdir().unwrap();
    let cache = StageCache::new(dir.path());
    assert_eq!(
        cache.path(Stage::Field),
        dir.path().join("pod_field_data.json")
    );
    assert!(cache.load(Stage::Harmonization).unwrap().is_none());

    let pods = indexmap! {
        "YPODD4".to_string() => PodTimeseries::new(
            vec![at(1, 0, 0), at(1, 0, 1)],
            indexmap! { "Fig2600".to_string() => vec![0.1 + 0.2, f64::NAN] },
        ).unwrap(),
    };
    let mut calls = 0;
    let first: Result<_, StageCacheError> = cache.load_or_else(Stage::Harmonization, || {
        calls += 1;
        Ok(pods.clone())
    });
    first.unwrap();
    let second: Result<_, StageCacheError> = cache.load_or_else(Stage::Harmonization, || {
        calls += 1;
        Ok(pods.clone())
    });
    let second = second.unwrap();
    assert_eq!(calls, 1);

    let column = second["YPODD4"].column("Fig2600").unwrap();
    assert_eq!(column[0], 0.1 + 0.2);
    assert!(column[1].is_nan());
    assert_eq!(second["YPODD4"].timestamps(), pods["YPODD4"].timestamps());
}

#[test]
fn test_write_location_workbook() {
    let dir = tempdir().unwrap();
    let sheets = indexmap! {
        "School".to_string() => vec![
            LocationEstimate { timestamp: at(10, 8, 0), estimate: 2.5, pod: "YPODD4" },
            LocationEstimate { timestamp: at(10, 8, 0), estimate: 1.75, pod: "YPODL1" },
        ],
    };
    write_location_workbook(dir.path(), "y_field_estimates_by_loc", "CH4", &sheets).unwrap();
    let contents = fs::read_to_string(
        dir.path().join("y_field_estimates_by_loc").join("School.csv"),
    )
    .unwrap();
    assert_eq!(
        contents,
        "datetime,CH4,pod\n2024-02-10 08:00:00,2.5,YPODD4\n2024-02-10 08:00:00,1.75,YPODL1\n"
    );
}
