use clap::Parser;
use dff::cli::Cli;
use dff::error::ExitCode;
use std::fs;
use tempfile::tempdir;

fn run(args: &[&str]) -> anyhow::Result<ExitCode> {
    let mut argv = vec!["dff", "--no-progress", "-q"];
    argv.extend_from_slice(args);
    dff::run_app(Cli::try_parse_from(argv).unwrap())
}

#[test]
fn test_run_app_writes_json_report() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data");
    fs::create_dir(&data).unwrap();
    fs::write(data.join("a.txt"), b"hello").unwrap();
    fs::write(data.join("b.txt"), b"hello").unwrap();
    fs::write(data.join("c.txt"), b"world").unwrap();
    let report_path = dir.path().join("report.json");

    let code = run(&[
        data.to_str().unwrap(),
        "--output-file",
        report_path.to_str().unwrap(),
    ])
    .unwrap();

    assert_eq!(code, ExitCode::Success);
    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
    let duplicates = value["duplicates"].as_array().unwrap();
    assert_eq!(duplicates.len(), 1);
    assert_eq!(duplicates[0]["digest"], "5d41402abc4b2a76b9719d911017c592");
    assert_eq!(duplicates[0]["algorithm"], "md5");
    assert_eq!(duplicates[0]["files"].as_array().unwrap().len(), 2);
    assert_eq!(value["summary"]["status"], "completed");
    assert_eq!(value["summary"]["exit_code"], 0);
}

#[test]
fn test_run_app_list_output_and_fail_on_duplicate() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data");
    fs::create_dir(&data).unwrap();
    fs::write(data.join("x"), b"twins").unwrap();
    fs::write(data.join("y"), b"twins").unwrap();
    let report_path = dir.path().join("report.txt");

    let code = run(&[
        data.to_str().unwrap(),
        "-o",
        "list",
        "-f",
        "--output-file",
        report_path.to_str().unwrap(),
    ])
    .unwrap();

    assert_eq!(code, ExitCode::DuplicatesFound);
    let text = fs::read_to_string(&report_path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert!(lines[0].contains("5 B each"));
    assert!(lines[1].starts_with("    ") && lines[1].ends_with("x"));
    assert!(lines[2].starts_with("    ") && lines[2].ends_with("y"));
    assert!(text.contains("1 duplicate groups"));
}

#[test]
fn test_run_app_without_duplicates_succeeds_with_fail_flag() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("only"), b"alone").unwrap();
    let report_path = dir.path().join("out.json");

    let code = run(&[
        dir.path().join("only").to_str().unwrap(),
        "-f",
        "--output-file",
        report_path.to_str().unwrap(),
    ])
    .unwrap();

    assert_eq!(code, ExitCode::Success);
}

#[test]
fn test_run_app_warnings_give_partial_success() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"data").unwrap();
    let report_path = dir.path().join("out.json");

    let code = run(&[
        dir.path().to_str().unwrap(),
        dir.path().join("missing").to_str().unwrap(),
        "--output-file",
        report_path.to_str().unwrap(),
    ])
    .unwrap();

    assert_eq!(code, ExitCode::PartialSuccess);
    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(value["summary"]["warnings"].as_array().unwrap().len(), 1);
}

#[test]
fn test_run_app_rejects_invalid_settings() {
    let dir = tempdir().unwrap();
    let result = run(&[dir.path().to_str().unwrap(), "--io-threads", "0"]);
    assert!(result.is_err());
}

#[test]
fn test_run_app_fails_without_accessible_roots() {
    let dir = tempdir().unwrap();
    let result = run(&[dir.path().join("nope").to_str().unwrap()]);
    let err = result.unwrap_err();
    assert!(format!("{err:#}").contains("None of the given paths could be accessed"));
}

#[test]
fn test_run_app_missing_config_file_fails() {
    let dir = tempdir().unwrap();
    let result = run(&[
        dir.path().to_str().unwrap(),
        "--config",
        dir.path().join("absent.toml").to_str().unwrap(),
    ]);
    assert!(result.is_err());
}
