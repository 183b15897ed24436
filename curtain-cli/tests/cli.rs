//! End-to-end runs of the `curtain` binary.
//!
//! Every config here sets `"hotkeys": []` so the binary never touches the
//! desktop session and can run on headless hosts.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn write_config(dir: &Path, body: &str) {
    std::fs::write(dir.join("commands.json"), body).expect("write commands.json");
}

#[test]
fn missing_config_exits_one() {
    let dir = TempDir::new().unwrap();

    Command::cargo_bin("curtain")
        .unwrap()
        .arg(dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("commands.json"));
}

#[test]
fn malformed_config_exits_one() {
    let dir = TempDir::new().unwrap();
    write_config(dir.path(), r#"{"startup": [ {"command": "#);

    Command::cargo_bin("curtain")
        .unwrap()
        .arg(dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to parse config"));
}

#[test]
fn config_dir_defaults_to_current_directory() {
    let dir = TempDir::new().unwrap();

    Command::cargo_bin("curtain")
        .unwrap()
        .current_dir(dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            dir.path()
                .file_name()
                .expect("tempdir name")
                .to_string_lossy()
                .into_owned(),
        ));
}

#[test]
fn help_mentions_the_directory_argument() {
    Command::cargo_bin("curtain")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("commands.json"));
}

#[cfg(unix)]
#[test]
fn startup_failure_runs_cleanup_and_exits_one() {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("log");
    let log = log.display();
    write_config(
        dir.path(),
        &format!(
            r#"{{
  "startup": [
    {{"command": "sh", "args": ["-c", "echo A >> '{log}'"]}},
    {{"command": "curtain-test-no-such-binary"}},
    {{"command": "sh", "args": ["-c", "echo C >> '{log}'"]}}
  ],
  "cleanup": [
    {{"command": "curtain-test-no-such-binary"}},
    {{"command": "sh", "args": ["-c", "echo cleanup >> '{log}'"]}}
  ],
  "hotkeys": []
}}"#
        ),
    );

    Command::cargo_bin("curtain")
        .unwrap()
        .arg(dir.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("RUN CLEANUP COMMANDS"));

    let contents = std::fs::read_to_string(dir.path().join("log")).expect("log");
    assert_eq!(contents, "A\ncleanup\n");
}

#[cfg(unix)]
#[test]
fn startup_output_is_echoed_unless_suppressed() {
    let dir = TempDir::new().unwrap();
    write_config(
        dir.path(),
        r#"{
  "startup": [
    {"command": "printf", "args": ["%s%s\\n", "visible", "-output"]},
    {"command": "printf", "args": ["%s%s\\n", "hidden", "-output"], "null_stdout": true},
    {"command": "!WAIT_NOTHING"}
  ],
  "hotkeys": []
}"#,
    );

    Command::cargo_bin("curtain")
        .unwrap()
        .arg(dir.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("visible-output"))
        .stdout(predicate::str::contains("hidden-output").not())
        .stdout(predicate::str::contains("unknown macro !WAIT_NOTHING"));
}

#[cfg(unix)]
#[test]
fn sigint_after_startup_runs_cleanup_and_exits_zero() {
    use std::time::{Duration, Instant};

    let dir = TempDir::new().unwrap();
    let ready = dir.path().join("ready");
    let cleaned = dir.path().join("cleaned");
    write_config(
        dir.path(),
        &format!(
            r#"{{
  "startup": [{{"command": "touch", "args": ["{}"]}}],
  "cleanup": [{{"command": "touch", "args": ["{}"]}}],
  "hotkeys": []
}}"#,
            ready.display(),
            cleaned.display()
        ),
    );

    let bin = assert_cmd::cargo::cargo_bin("curtain");
    let mut child = std::process::Command::new(bin)
        .arg(dir.path())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .expect("spawn curtain");

    let deadline = Instant::now() + Duration::from_secs(10);
    while !ready.exists() {
        assert!(Instant::now() < deadline, "startup never completed");
        std::thread::sleep(Duration::from_millis(20));
    }
    std::thread::sleep(Duration::from_millis(300));

    let killed = std::process::Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .expect("kill");
    assert!(killed.success());

    let status = child.wait().expect("wait");
    assert_eq!(status.code(), Some(0));
    assert!(cleaned.exists(), "cleanup must run before exit");
}
