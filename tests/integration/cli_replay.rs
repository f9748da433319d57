//! Integration tests for the sequencer binary.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn demo_script() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("demos")
        .join("resume_and_finish.toml")
}

fn sequencer(workspace: &Path, args: &[&str]) -> Output {
    let bin = env!("CARGO_BIN_EXE_sequencer");
    Command::new(bin)
        .env("XDG_CONFIG_HOME", workspace.join("xdg"))
        .env_remove("SEQUENCER_LOG")
        .arg("--workspace")
        .arg(workspace)
        .args(args)
        .output()
        .unwrap()
}

#[test]
fn test_replay_demo_as_json() {
    let temp_dir = TempDir::new().unwrap();
    let script = demo_script();
    let output = sequencer(
        temp_dir.path(),
        &["replay", script.to_str().unwrap(), "--format", "json"],
    );
    assert!(
        output.status.success(),
        "replay should succeed: stderr={:?}",
        String::from_utf8_lossy(&output.stderr)
    );

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["final"]["navigation"], "finished");
    assert_eq!(report["steps"].as_array().unwrap().len(), 7);
    assert!(report["outbound"]
        .as_array()
        .unwrap()
        .iter()
        .any(|e| e["type"] == "session_finished"));
}

#[test]
fn test_failed_expectation_exits_nonzero() {
    let temp_dir = TempDir::new().unwrap();
    let script = temp_dir.path().join("bad.toml");
    std::fs::write(
        &script,
        r#"
[args]
course = "c"
lesson = "l1"

[content.lessons.l1]
id = "l1"
course_id = "c"

[[content.activities.l1]]
type = "question"
course_id = "c"
id = "q1"

[[steps]]
step = "expect"
navigation = "finished"
"#,
    )
    .unwrap();

    let output = sequencer(temp_dir.path(), &["replay", script.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("step 0"));
}

#[test]
fn test_validate_config_rejects_bad_workspace_config() {
    let temp_dir = TempDir::new().unwrap();
    let config_dir = temp_dir.path().join("config");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("config.toml"), "[fyd]\npackage_size = 0\n").unwrap();

    let output = sequencer(temp_dir.path(), &["validate-config"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("package_size"));
}
