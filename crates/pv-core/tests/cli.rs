//! End-to-end tests of the paad-viewer binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const EFFECTS: &str = "\
cell_type,signature,bmi_group,effect_size,ci_low,ci_high,r_hat,ess
Macrophage,Glycolysis,Normal,0.1,0.0,0.2,1.001,850
Macrophage,Glycolysis,Overweight,0.3,0.2,0.4,1.002,800
Macrophage,Glycolysis,Obese,0.6,0.5,0.7,1.000,910
T cell,Exhaustion,Obese,-0.4,-0.5,-0.3,1.004,700
";

fn viewer() -> Command {
    let mut cmd = Command::cargo_bin("paad-viewer").unwrap();
    cmd.env_remove("PAAD_DATA_DIR")
        .env_remove("PAAD_VIEWER_CONFIG")
        .env_remove("PAAD_VIEWER_CONFIG_DIR")
        .env_remove("PAAD_LOG")
        .env_remove("PAAD_LOG_FORMAT")
        .env_remove("RUST_LOG");
    cmd
}

/// A results directory with one compartment and a viewer.json pointing at it.
fn workspace(effects: Option<&str>) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("results");
    fs::create_dir_all(data.join("immune_fine")).unwrap();
    if let Some(effects) = effects {
        fs::write(data.join("immune_fine/effects.csv"), effects).unwrap();
    }
    let config = serde_json::json!({
        "data_dir": data,
        "compartments": [{ "key": "immune_fine", "label": "Immune Fine" }],
    });
    fs::write(dir.path().join("viewer.json"), config.to_string()).unwrap();
    dir
}

fn config_arg(dir: &TempDir) -> String {
    dir.path().join("viewer.json").display().to_string()
}

#[test]
fn version_prints_name_and_schema() {
    viewer()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("paad-viewer"))
        .stdout(predicate::str::contains("schema"));
}

#[test]
fn schema_prints_effect_row_fields() {
    viewer()
        .args(["schema", "effects"])
        .assert()
        .success()
        .stdout(predicate::str::contains("effect_size"))
        .stdout(predicate::str::contains("r_hat"));
}

#[test]
fn schema_rejects_unknown_artifact() {
    viewer().args(["schema", "nonsense"]).assert().code(10);
}

#[test]
fn config_default_is_json() {
    let output = viewer().args(["config", "--default"]).output().unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["data_dir"], "results");
    assert_eq!(value["compartments"].as_array().unwrap().len(), 3);
}

#[test]
fn missing_explicit_config_is_a_config_error() {
    viewer()
        .args(["--config", "/nonexistent/viewer.json", "check"])
        .assert()
        .code(11)
        .stderr(predicate::str::contains("configuration error"));
}

#[test]
fn check_passes_with_effects_only() {
    let dir = workspace(Some(EFFECTS));
    let output = viewer()
        .args(["--config", &config_arg(&dir), "check"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["status"], "ok");
    assert!(value["run_id"].as_str().unwrap().starts_with("run-"));
}

#[test]
fn check_reports_missing_required_data() {
    let dir = workspace(None);
    viewer()
        .args(["--config", &config_arg(&dir), "check"])
        .assert()
        .code(12)
        .stdout(predicate::str::contains("\"status\": \"error\""));
}

#[test]
fn check_reports_invalid_data() {
    let bad = "cell_type,signature,bmi_group,effect_size,ci_low,ci_high,r_hat,ess\n\
               Macrophage,Glycolysis,Normal,0.1,0.3,0.2,1.001,850\n";
    let dir = workspace(Some(bad));
    viewer()
        .args(["--config", &config_arg(&dir), "check"])
        .assert()
        .code(13);
}

#[test]
fn render_refuses_to_start_without_effects() {
    let dir = workspace(None);
    viewer()
        .args(["--config", &config_arg(&dir), "render"])
        .assert()
        .code(12)
        .stderr(predicate::str::contains("hint:"));
}

#[test]
fn render_writes_page_for_selection() {
    let dir = workspace(Some(EFFECTS));
    let out = dir.path().join("page.html");
    viewer()
        .args([
            "--config",
            &config_arg(&dir),
            "render",
            "--cell-type",
            "T cell",
            "--plot",
            "forest",
            "--out",
        ])
        .arg(&out)
        .assert()
        .success();

    let html = fs::read_to_string(&out).unwrap();
    assert!(html.contains("<!DOCTYPE html>"));
    assert!(html.contains("Exhaustion"));
    assert!(html.contains("Data unavailable"));
}

#[test]
fn data_dir_flag_overrides_config() {
    let dir = workspace(None);
    let other = tempfile::tempdir().unwrap();
    fs::create_dir_all(other.path().join("immune_fine")).unwrap();
    fs::write(other.path().join("immune_fine/effects.csv"), EFFECTS).unwrap();

    viewer()
        .args(["--config", &config_arg(&dir), "--data-dir"])
        .arg(other.path())
        .arg("render")
        .assert()
        .success()
        .stdout(predicate::str::contains("Glycolysis"));
}
