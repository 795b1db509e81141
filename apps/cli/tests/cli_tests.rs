//! CLI 端到端测试（不需要硬件）

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn cli() -> Command {
    Command::cargo_bin("piservo-cli").unwrap()
}

fn write_config(dir: &tempfile::TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("piservo.toml");
    fs::write(&path, body).unwrap();
    path
}

#[test]
fn test_json_converts_compact_commands() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, "pins = [17, 27, 22, 25]\nangle_factor = [1, 1, 1, 1]\n");

    cli()
        .arg("--config")
        .arg(&config)
        .args(["json", "mv:30,.,c,x sl:0.5 bogus mv:0,0,0,0"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""cmd":"set_angles""#))
        .stdout(predicate::str::contains(r#""cmd":"sleep""#))
        .stdout(predicate::str::contains(r#"{"err":"bogus"}"#))
        .stdout(predicate::str::contains("0.0,0.0").not());
}

#[test]
fn test_json_reads_stdin() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, "pins = [1, 2]\n");

    cli()
        .arg("--config")
        .arg(&config)
        .arg("json")
        .write_stdin("ca\nst:0\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""cmd":"cancel""#))
        .stdout(predicate::str::contains(r#"{"err":"st:0"}"#));
}

#[test]
fn test_config_prints_resolved_values() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, "pins = [5, 6]\nstep_n = 10\n");
    let out = dir.path().join("saved.toml");

    cli()
        .arg("--config")
        .arg(&config)
        .arg("config")
        .arg("--write")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("step_n = 10"))
        .stdout(predicate::str::contains("angle_unit = 35.0"));
    assert!(fs::read_to_string(&out).unwrap().contains("step_n = 10"));
}

#[test]
fn test_invalid_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, "step_n = 0\n");

    cli().arg("--config").arg(&config).arg("config").assert().failure();
}

#[test]
fn test_pose_with_mock_driver() {
    let dir = tempfile::tempdir().unwrap();
    let calib = dir.path().join("servo.json");
    let config = write_config(
        &dir,
        &format!(
            "pins = [17, 27, 22, 25]\ncalibration_file = {:?}\nmove_sec = 0.0\nstep_n = 2\n",
            calib.display().to_string()
        ),
    );

    cli()
        .arg("--config")
        .arg(&config)
        .args(["--mock", "pose", "--seq", "fccc 0 cccc", "--threaded"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""executed":3"#));

    // 新轴的默认校准会被保存
    let saved = fs::read_to_string(&calib).unwrap();
    assert!(saved.contains("\"pin\": 17"));
    assert!(saved.contains("\"pin\": 25"));
}

#[test]
fn test_servo_rejects_out_of_range_pulse() {
    cli().args(["--mock", "servo", "17", "3000"]).assert().failure();
}
