// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Integration tests.
//!
//! Some help for laying out these tests was taken from:
//! https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html

mod field_apply;
mod harmonize;
mod models_convert;

use std::{
    fmt::Write as _,
    fs,
    path::{Path, PathBuf},
    process::Output,
    str::from_utf8,
};

use assert_cmd::{output::OutputError, Command};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use indoc::indoc;
use tempfile::{tempdir, TempDir};

fn podcal() -> Command {
    Command::cargo_bin("podcal").unwrap()
}

fn get_cmd_output(result: Result<Output, OutputError>) -> (String, String) {
    let output = match result {
        Ok(o) => o,
        Err(o) => o.as_output().unwrap().clone(),
    };
    (
        from_utf8(&output.stdout).unwrap().to_string(),
        from_utf8(&output.stderr).unwrap().to_string(),
    )
}

/// Settings of the colocation stage. The scaler expects the two sensors and
/// their interaction term.
const RUN_SETTINGS: &str = indoc! {r#"
    {
        "pollutant": "CH4",
        "unit": "ppm",
        "sensors_included": ["Fig2600", "Fig2602"],
        "ref_timezone": "MST",
        "time_interval": 5,
        "retime_calc": "median",
        "colo_pod_name": ["YPODA2"],
        "preprocess": ["interaction_terms"],
        "scaler": {
            "mean": [0.0, 0.0, 0.0],
            "scale": [1.0, 1.0, 1.0],
            "feature_names": ["Fig2600", "Fig2602", "Fig2600*Fig2602"]
        },
        "best_model": "lin_reg",
        "model_list": ["lin_reg"]
    }
"#};

/// Estimates are the harmonized Fig2600 readings.
const ESTIMATOR: &str = r#"{"model": "lin_reg", "coefficients": [1.0, 0.0, 0.0], "intercept": 0.0}"#;

const DEPLOYMENT_LOG: &str = indoc! {"
    file_name,deployment,location,start,end
    YPODA2_h,H,Lab,2024-02-01 00:00:00,2024-02-01 02:00:00
    YPODD4_h,H,Lab,2024-02-01 00:00:00,2024-02-01 02:00:00
    YPODL1_h,H,Lab,2024-02-01 00:00:00,2024-02-01 02:00:00
    YPODD4_f,F,School,2024-02-10 00:00:00,2024-02-10 01:00:00
    YPODX9_f,F,Park,2024-02-10 00:00:00,2024-02-10 01:00:00
"};

fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 2, d)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

fn write_pod_csv(
    file: &Path,
    start: NaiveDateTime,
    num_minutes: i64,
    readings: impl Fn(i64) -> (f64, f64),
) {
    let mut contents = "datetime,Fig2600,Fig2602\n".to_string();
    for i in 0..num_minutes {
        let (fig2600, fig2602) = readings(i);
        let t = start + Duration::minutes(i);
        writeln!(
            contents,
            "{},{fig2600},{fig2602}",
            t.format("%Y-%m-%d %H:%M:%S")
        )
        .unwrap();
    }
    fs::write(file, contents).unwrap();
}

/// A project directory: `Data` with harmonization and field pods plus a
/// deployment log, and `Outputs/colo` from the colocation stage. YPODX9 is
/// only deployed in the field, so it never gets harmonization models.
struct Project {
    dir: TempDir,
}

impl Project {
    fn new() -> Project {
        let dir = tempdir().unwrap();
        let data_dir = dir.path().join("Data");
        let harmon_dir = data_dir.join("Harmonization");
        let field_dir = data_dir.join("Field");
        fs::create_dir_all(&harmon_dir).unwrap();
        fs::create_dir_all(&field_dir).unwrap();
        fs::write(data_dir.join("deployment_log.csv"), DEPLOYMENT_LOG).unwrap();

        let pod = |i: i64| 100.0 + 0.5 * i as f64 + ((i * 7) % 11) as f64;
        let h_start = at(1, 0, 0);
        write_pod_csv(&harmon_dir.join("YPODA2_h.csv"), h_start, 120, |i| {
            (2.0 * pod(i) + 1.0, 0.5 * pod(i) + 3.0)
        });
        write_pod_csv(&harmon_dir.join("YPODD4_h.csv"), h_start, 120, |i| {
            (pod(i), pod(i))
        });
        write_pod_csv(&harmon_dir.join("YPODL1_h.csv"), h_start, 120, |i| {
            (pod(i) - 10.0, 2.0 * pod(i))
        });
        let f_start = at(10, 0, 0);
        write_pod_csv(&field_dir.join("YPODD4_f.csv"), f_start, 60, |i| {
            (50.0 + i as f64, 20.0)
        });
        write_pod_csv(&field_dir.join("YPODX9_f.csv"), f_start, 60, |_| (1.0, 1.0));

        let upstream_dir = dir.path().join("Outputs").join("colo");
        fs::create_dir_all(&upstream_dir).unwrap();
        fs::write(upstream_dir.join("run_settings.json"), RUN_SETTINGS).unwrap();
        fs::write(upstream_dir.join("lin_reg_model.json"), ESTIMATOR).unwrap();

        Project { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn upstream_dir(&self) -> PathBuf {
        self.path().join("Outputs").join("colo")
    }

    /// `podcal <subcommand>` with the project's directories filled in.
    fn cmd(&self, subcommand: &str) -> Command {
        let mut cmd = podcal();
        cmd.current_dir(self.path()).args([
            subcommand,
            "--colo-output-folder",
            "colo",
            "--no-progress-bars",
        ]);
        cmd
    }
}

#[test]
fn test_help_is_available() {
    let cmd = podcal().arg("--help").ok();
    assert!(cmd.is_ok());
    let (stdout, _) = get_cmd_output(cmd);
    assert!(stdout.contains("harmonize"));
    assert!(stdout.contains("field-apply"));
    assert!(stdout.contains("models-convert"));

    for subcommand in ["harmonize", "field-apply", "models-convert"] {
        let cmd = podcal().args([subcommand, "--help"]).ok();
        assert!(cmd.is_ok(), "{subcommand} --help failed");
    }
}

#[test]
fn test_no_subcommand_is_an_error() {
    let cmd = podcal().ok();
    assert!(cmd.is_err());
}
