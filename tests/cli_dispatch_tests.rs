mod common;

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use common::scratch_dir;

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_covidproject")
}

fn fixture_url() -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("remote_sample.csv");
    format!("file://{}", path.display())
}

fn run(dir: &Path, source_url: &str, args: &[&str]) -> Output {
    Command::new(bin())
        .args(args)
        .current_dir(dir)
        .env("COVIDPROJECT_SOURCE_URL", source_url)
        .env("COVIDPROJECT_STORE_PATH", dir.join("data").join("data.csv"))
        .env("COVIDPROJECT_LOG_PATH", dir.join("covidproject-log.log"))
        .env("COVIDPROJECT_AS_OF", "2021-06-30")
        .env("COVIDPROJECT_HISTORY_START", "2020-12-31")
        .env_remove("COVIDPROJECT_LOG")
        .output()
        .expect("covidproject should run")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).expect("command should emit json")
}

#[test]
fn no_arguments_performs_full_load_then_no_op() {
    let dir = scratch_dir("update");

    let first = run(&dir, &fixture_url(), &[]);
    assert_eq!(first.status.code(), Some(0));
    let payload = stdout_json(&first);
    assert_eq!(payload["result"]["outcome"], "full_load");
    assert_eq!(payload["rows_written"], 181);
    assert_eq!(payload["latest_date"], "2021-06-30");

    let second = run(&dir, &fixture_url(), &["update"]);
    assert_eq!(second.status.code(), Some(0));
    let payload = stdout_json(&second);
    assert_eq!(payload["result"]["outcome"], "up_to_date");
    assert_eq!(payload["total_rows"], 181);

    let log = fs::read_to_string(dir.join("covidproject-log.log")).expect("log file");
    assert!(log.contains("performing full load"));
    assert!(log.contains("no new data to be downloaded"));

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn recent_command_prints_trailing_window_table() {
    let dir = scratch_dir("recent");
    assert_eq!(run(&dir, &fixture_url(), &[]).status.code(), Some(0));

    let output = run(&dir, &fixture_url(), &["recent", "7", "--table"]);
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "datum\tprirustkovy_pocet_nakazenych");
    assert_eq!(lines.len(), 9);
    assert!(lines[1].starts_with("2021-06-23\t"));
    assert!(lines[8].starts_with("2021-06-30\t"));

    let json = run(&dir, &fixture_url(), &["recent"]);
    assert_eq!(json.status.code(), Some(0));
    let payload = stdout_json(&json);
    assert_eq!(payload["days"], 31);
    assert_eq!(payload["points"].as_array().map(Vec::len), Some(32));

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn reload_overwrites_store_with_requested_range() {
    let dir = scratch_dir("reload");
    assert_eq!(run(&dir, &fixture_url(), &[]).status.code(), Some(0));

    let output = run(&dir, &fixture_url(), &["reload", "2021-06-20", "2021-06-25"]);
    assert_eq!(output.status.code(), Some(0));
    let payload = stdout_json(&output);
    assert_eq!(payload["result"]["outcome"], "full_load");
    assert_eq!(payload["rows_written"], 5);

    let store = fs::read_to_string(dir.join("data").join("data.csv")).expect("store");
    assert_eq!(store.lines().count(), 6);

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn reload_rejects_invalid_dates() {
    let dir = scratch_dir("reload-invalid");
    let output = run(&dir, &fixture_url(), &["reload", "someday"]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("usage: covidproject reload"));
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn reload_rejects_reversed_range_and_keeps_store() {
    let dir = scratch_dir("reload-reversed");
    assert_eq!(run(&dir, &fixture_url(), &[]).status.code(), Some(0));
    let store_path = dir.join("data").join("data.csv");
    let before = fs::read(&store_path).expect("store");

    for range in [["2021-06-30", "2021-01-01"], ["2021-03-01", "2021-03-01"]] {
        let output = run(&dir, &fixture_url(), &["reload", range[0], range[1]]);
        assert_eq!(output.status.code(), Some(2));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("usage: covidproject reload"));
        assert!(output.stdout.is_empty());
        assert_eq!(fs::read(&store_path).expect("store"), before);
    }

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn unknown_command_returns_usage() {
    let dir = scratch_dir("unknown");
    let output = run(&dir, &fixture_url(), &["plot"]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("usage: covidproject"));
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn unreachable_source_fails_the_run() {
    let dir = scratch_dir("unreachable");
    let output = run(&dir, "file:///nonexistent/covidproject/remote.csv", &[]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("update failed"));
    assert!(!dir.join("data").join("data.csv").exists());

    let log = fs::read_to_string(dir.join("covidproject-log.log")).expect("log file");
    assert!(log.contains("ERROR"));
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn recent_without_store_fails() {
    let dir = scratch_dir("recent-empty");
    let output = run(&dir, &fixture_url(), &["recent"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("recent failed"));
    let _ = fs::remove_dir_all(dir);
}
