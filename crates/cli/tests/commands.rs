use assert_cmd::prelude::*;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::process::Command;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

const ROUTES: &str = "id,location,state,zip,type,length,pay_rate\n\
    R-1,Austin,TX,78701,City,15.3,$22/hr\n\
    R-2,Boston,MA,02108,City,8,$24/hr\n\
    R-3,Amarillo,TX,79101,Rural,40,$20/hr\n";

fn write_with_mtime(dir: &Path, name: &str, body: &str, secs: u64) {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    let file = fs::OpenOptions::new().write(true).open(&path).unwrap();
    file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
        .unwrap();
}

fn pocket() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("pocket"));
    cmd.env_remove("POCKET_BASE_URL")
        .env_remove("POCKET_DATA_DIR")
        .env_remove("PORT");
    cmd
}

fn data_dir() -> TempDir {
    let temp = TempDir::new().unwrap();
    write_with_mtime(temp.path(), "Routes_2024-05.csv", "id\nOLD\n", 1_000);
    write_with_mtime(temp.path(), "Routes_2024-06.csv", ROUTES, 2_000);
    temp
}

#[test]
fn latest_prints_newest_snapshot_name() {
    let temp = data_dir();
    pocket()
        .args(["latest", "routes", "--data-dir"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout("Routes_2024-06.csv\n");
}

#[test]
fn latest_reads_data_dir_from_env() {
    let temp = data_dir();
    pocket()
        .env("POCKET_DATA_DIR", temp.path())
        .args(["latest", "any"])
        .assert()
        .success()
        .stdout("Routes_2024-06.csv\n");
}

#[test]
fn latest_without_matching_snapshot_fails() {
    let temp = data_dir();
    pocket()
        .args(["latest", "solicitations", "--data-dir"])
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Solicitations_"));
}

#[test]
fn view_filters_and_sorts_local_snapshot() {
    let temp = data_dir();
    let output = pocket()
        .args(["view", "routes", "--state", "TX", "--sort", "length", "--desc", "--json"])
        .arg("--data-dir")
        .arg(temp.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let view: Value = serde_json::from_slice(&output.stdout).unwrap();
    let ids: Vec<&str> = view["pageItems"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["R-3", "R-1"]);
    assert_eq!(view["totalPages"], 1);
    assert_eq!(view["totalCount"], 2);
}

#[test]
fn view_renders_table_with_page_footer() {
    let temp = data_dir();
    pocket()
        .args(["view", "routes", "--page-size", "2", "--data-dir"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Boston")
                .and(predicate::str::contains("02108"))
                .and(predicate::str::contains("Page 1 of 2 (3 routes)")),
        );
}

#[test]
fn view_without_matches_shows_empty_state() {
    let temp = data_dir();
    pocket()
        .args(["view", "routes", "--search", "Seattle", "--data-dir"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout("No routes match the current filters.\n");
}

#[test]
fn view_failure_renders_failed_state() {
    let temp = data_dir();
    pocket()
        .args(["view", "solicitations", "--data-dir"])
        .arg(temp.path())
        .assert()
        .code(1)
        .stdout(
            predicate::str::contains("Solicitations data failed to load.")
                .and(predicate::str::contains("Retry:")),
        );
}

#[test]
fn view_against_unreachable_server_fails_cleanly() {
    pocket()
        .args(["view", "routes", "--base-url", "http://127.0.0.1:9"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Routes data failed to load."));
}

#[test]
fn bid_is_accepted_by_simulated_service() {
    pocket()
        .args([
            "bid",
            "--route",
            "R-1",
            "--name",
            "Dana Reyes",
            "--email",
            "dana@example.com",
            "--phone",
            "512-555-0147",
            "--amount",
            "19.50",
            "--delay-ms",
            "0",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Submitted bid bid-000001 for R-1"));
}

#[test]
fn invalid_application_lists_field_errors() {
    pocket()
        .args([
            "apply",
            "--solicitation",
            "S-1",
            "--name",
            "D",
            "--email",
            "dana@example.com",
            "--phone",
            "5125550147",
            "--license",
            "TX123456",
            "--vehicle",
            "Sedan",
            "--delay-ms",
            "0",
        ])
        .assert()
        .failure()
        .stderr(
            predicate::str::contains("name: Name must be at least 2 characters")
                .and(predicate::str::contains("terms:")),
        );
}
