use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn ordersync() -> Command {
    let mut cmd = Command::cargo_bin("ordersync").unwrap();
    cmd.env_remove("GOOGLE_SPREADSHEET_ID")
        .env_remove("GOOGLE_SHEET_NAME")
        .env_remove("ORDERSYNC_TIMEOUT_SECS")
        .env_remove("GOOGLE_ACCESS_TOKEN")
        .env("RUST_LOG", "off");
    cmd
}

#[test]
fn test_help_lists_commands() {
    ordersync()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("upload"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("health"));
}

#[test]
fn test_health() {
    ordersync()
        .arg("health")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""status":"healthy""#))
        .stdout(predicate::str::contains(r#""service":"ordersync""#));
}

#[test]
fn test_missing_spreadsheet_id_is_a_config_error() {
    let tmp = TempDir::new().unwrap();
    ordersync()
        .current_dir(tmp.path())
        .args(["run", "--file", "orders.xlsx"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("GOOGLE_SPREADSHEET_ID"));
}

#[test]
fn test_bad_timeout_is_a_config_error() {
    ordersync()
        .env("ORDERSYNC_TIMEOUT_SECS", "soon")
        .arg("status")
        .assert()
        .code(2);
}

#[test]
fn test_unreadable_input_fails_the_run() {
    let tmp = TempDir::new().unwrap();
    ordersync()
        .current_dir(tmp.path())
        .env("GOOGLE_SPREADSHEET_ID", "sheet-under-test")
        .args(["run", "--file", "missing.xlsx"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to read input"));
}

#[test]
fn test_no_input_in_directory() {
    let tmp = TempDir::new().unwrap();
    ordersync()
        .env("GOOGLE_SPREADSHEET_ID", "sheet-under-test")
        .arg("run")
        .arg("--dir")
        .arg(tmp.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no input file found"));
}

#[test]
fn test_upload_rejects_unsupported_extension() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("orders.csv");
    std::fs::write(&path, "a,b\n1,2\n").unwrap();

    ordersync()
        .env("GOOGLE_SPREADSHEET_ID", "sheet-under-test")
        .arg("upload")
        .arg(&path)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("upload rejected"));
}

#[test]
fn test_unknown_format_is_a_usage_error() {
    ordersync()
        .args(["run", "--format", "html"])
        .assert()
        .code(2);
}
