// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::fs;

use crate::{get_cmd_output, Project};

#[test]
fn test_field_apply_reuses_harmonization() {
    let project = Project::new();
    let cmd = project
        .cmd("harmonize")
        .args(["-n", "harmon", "--no-field"])
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    let harmon_dir = project.upstream_dir().join("Output_lin_reg_harmon");
    assert!(!harmon_dir.join("y_field_estimates_by_pod").exists());

    let cmd = project
        .cmd("field-apply")
        .args(["--harmonization-folder", "Output_lin_reg_harmon", "-n", "field"])
        .ok();
    let (stdout, stderr) = get_cmd_output(cmd);
    assert!(stderr.is_empty(), "stderr wasn't empty: {stderr}");
    assert!(stdout.contains("Estimated 1 field pods"), "{stdout}");

    let field_dir = project.upstream_dir().join("Output_lin_reg_field");
    assert!(field_dir.join("run_settings.json").exists());
    // The models stay with the harmonize run.
    assert!(!field_dir.join("harmonization_models.json").exists());

    let by_loc = fs::read_to_string(field_dir.join("y_field_estimates_by_loc/School.csv")).unwrap();
    let mut lines = by_loc.lines();
    assert_eq!(lines.next(), Some("datetime,CH4,pod"));
    // 60 minutes in 5 minute buckets.
    assert_eq!(lines.count(), 12);
}

#[test]
fn test_field_apply_cropped() {
    let project = Project::new();
    let cmd = project
        .cmd("harmonize")
        .args(["-n", "harmon", "--no-field"])
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));

    let cmd = project
        .cmd("field-apply")
        .args([
            "-m",
            "Output_lin_reg_harmon",
            "-n",
            "cropped",
            "--crop-field-time",
            "--field-start",
            "2024-02-10 00:10:00",
            "--field-end",
            "2024-02-10 00:29:00",
        ])
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));

    let by_pod = fs::read_to_string(
        project
            .upstream_dir()
            .join("Output_lin_reg_cropped/y_field_estimates_by_pod/YPODD4.csv"),
    )
    .unwrap();
    let timestamps = by_pod
        .lines()
        .skip(1)
        .map(|l| l.split(',').next().unwrap().to_string())
        .collect::<Vec<_>>();
    assert_eq!(
        timestamps,
        [
            "2024-02-10 00:10:00",
            "2024-02-10 00:15:00",
            "2024-02-10 00:20:00",
            "2024-02-10 00:25:00"
        ]
    );
}

#[test]
fn test_field_apply_needs_a_harmonization_folder() {
    let project = Project::new();
    let cmd = project.cmd("field-apply").args(["-n", "field"]).ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("--harmonization-folder"), "{stderr}");

    let cmd = project
        .cmd("field-apply")
        .args(["-m", "Output_lin_reg_missing"])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("Output_lin_reg_missing"), "{stderr}");
}
