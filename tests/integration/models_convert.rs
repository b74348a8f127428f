// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use podcal::HarmonizationModels;

use crate::{get_cmd_output, podcal, Project};

#[test]
fn test_models_convert() {
    let project = Project::new();
    let cmd = project
        .cmd("harmonize")
        .args(["-n", "models", "--no-field"])
        .ok();
    assert!(cmd.is_ok(), "{:?}", get_cmd_output(cmd));
    let json = project
        .upstream_dir()
        .join("Output_lin_reg_models/harmonization_models.json");
    let bin = project.path().join("models.bin");

    let cmd = podcal()
        .args(["models-convert", "--no-progress-bars"])
        .arg(&json)
        .arg(&bin)
        .ok();
    let (stdout, stderr) = get_cmd_output(cmd);
    assert!(stderr.is_empty(), "stderr wasn't empty: {stderr}");
    assert!(stdout.contains("Converted"));

    let from_json = HarmonizationModels::read_from_ext(&json).unwrap();
    let from_bin = HarmonizationModels::read_from_ext(&bin).unwrap();
    assert_eq!(from_json, from_bin);
    assert_eq!(from_bin.pods().collect::<Vec<_>>(), ["YPODD4", "YPODL1"]);
}

#[test]
fn test_models_convert_unknown_extension() {
    let project = Project::new();
    let input = project.path().join("models.txt");
    std::fs::write(&input, "{}").unwrap();
    let cmd = podcal()
        .arg("models-convert")
        .arg(&input)
        .arg(project.path().join("models.json"))
        .ok();
    assert!(cmd.is_err());
    let (_, stderr) = get_cmd_output(cmd);
    assert!(stderr.contains("txt"), "{stderr}");
}
