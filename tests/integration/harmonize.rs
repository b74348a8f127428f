// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::fs;

use indoc::indoc;

use crate::{get_cmd_output, Project};

#[test]
fn test_harmonize_and_estimate_field() {
    let project = Project::new();
    let cmd = project.cmd("harmonize").args(["-n", "first"]).ok();
    let (stdout, stderr) = get_cmd_output(cmd);
    assert!(stderr.is_empty(), "stderr wasn't empty: {stderr}");

    let run_dir = project.upstream_dir().join("Output_lin_reg_first");
    for output in [
        "harmonization_models.json",
        "run_settings.json",
        "X_preprocessed_unfitted/YPODD4.csv",
        "X_harmonized/YPODL1.csv",
        "colo_pod_harmon_data/YPODL1.csv",
        "harmonization_Testing_RMSE_/Fig2602.csv",
        "y_field_estimates_by_pod/YPODD4.csv",
        "y_field_estimates_by_loc/School.csv",
        "X_field/YPODD4.csv",
        "X_field_standardized/YPODD4.csv",
        "X_field_melted.csv",
    ] {
        assert!(run_dir.join(output).exists(), "{output} is missing");
    }
    assert!(!run_dir.join("y_field_estimates_by_pod/YPODX9.csv").exists());

    // The pod without models is reported once.
    assert_eq!(stdout.matches("YPODX9").count(), 1, "{stdout}");

    // The persisted settings are the upstream settings plus this run's.
    let settings = fs::read_to_string(run_dir.join("run_settings.json")).unwrap();
    assert!(settings.contains(r#""hf_run_name": "first""#));
    assert!(settings.contains(r#""model_list""#));

    // Pod data were cached in the colocation folder.
    assert!(project
        .upstream_dir()
        .join("pod_harmonization_data.json")
        .exists());
}

#[test]
fn test_harmonize_dry_run_writes_nothing() {
    let project = Project::new();
    let cmd = project
        .cmd("harmonize")
        .args(["-n", "dry", "--dry-run"])
        .ok();
    let (stdout, stderr) = get_cmd_output(cmd);
    assert!(stderr.is_empty(), "stderr wasn't empty: {stderr}");
    assert!(stdout.contains("Dry run"));
    assert!(!project.upstream_dir().join("Output_lin_reg_dry").exists());
}

#[test]
fn test_harmonize_from_args_file() {
    let project = Project::new();
    let args_file = project.path().join("args.toml");
    fs::write(
        &args_file,
        indoc! {r#"
            no_field = true
            model_store_type = "bin"

            [run]
            colo_output_folder = "colo"
            hf_run_name = "from_file"
            k_folds = 3
            elapsed_in_harmonization = true
        "#},
    )
    .unwrap();

    let cmd = crate::podcal()
        .current_dir(project.path())
        .args(["harmonize", "args.toml", "--no-progress-bars"])
        .ok();
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.is_empty(), "stderr wasn't empty: {stderr}");

    let run_dir = project.upstream_dir().join("Output_lin_reg_from_file");
    assert!(run_dir.join("harmonization_models.bin").exists());
    assert!(!run_dir.join("y_field_estimates_by_pod").exists());
    let settings = fs::read_to_string(run_dir.join("run_settings.json")).unwrap();
    assert!(settings.contains(r#""run_field": false"#));
    assert!(settings.contains(r#""TElapsed_in_harmon": true"#));
    assert!(settings.contains(r#""earliest_harmon_time": "2024-02-01 00:00:00""#));
    // One row per fold.
    let r2 = fs::read_to_string(run_dir.join("harmonization_Testing_R2_/Fig2600.csv")).unwrap();
    assert_eq!(r2.lines().count(), 1 + 3);
}

#[test]
fn test_save_toml() {
    let project = Project::new();
    let cmd = project
        .cmd("harmonize")
        .args(["-n", "saved", "--dry-run", "--save-toml", "saved.toml"])
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));

    let saved = fs::read_to_string(project.path().join("saved.toml")).unwrap();
    assert!(saved.contains("hf_run_name = \"saved\""));
    assert!(saved.contains("colo_output_folder = \"colo\""));
}

#[test]
fn test_existing_run_folder_is_an_error() {
    let project = Project::new();
    fs::create_dir(project.upstream_dir().join("Output_lin_reg_taken")).unwrap();
    let cmd = project.cmd("harmonize").args(["-n", "taken"]).ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("Output_lin_reg_taken"), "{stderr}");
}

#[test]
fn test_missing_colocation_folder_is_an_error() {
    let project = Project::new();
    let cmd = crate::podcal()
        .current_dir(project.path())
        .args(["harmonize", "--colo-output-folder", "nope"])
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.starts_with("Error: "), "{stderr}");
    assert!(stderr.contains("nope"));
}

#[test]
fn test_missing_estimator_is_an_error() {
    let project = Project::new();
    fs::remove_file(project.upstream_dir().join("lin_reg_model.json")).unwrap();
    let cmd = project.cmd("harmonize").args(["-n", "no_model"]).ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("lin_reg_model.json"), "{stderr}");
    // Nothing ran.
    assert!(!project
        .upstream_dir()
        .join("Output_lin_reg_no_model")
        .exists());
}
