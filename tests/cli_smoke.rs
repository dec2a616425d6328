//! Binary smoke tests.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_subcommands() {
    Command::cargo_bin("mender")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("scan"))
        .stdout(predicate::str::contains("analyze"))
        .stdout(predicate::str::contains("apply"));
}

#[test]
fn version_prints() {
    Command::cargo_bin("mender")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mender"));
}

#[test]
fn analyze_with_invalid_scan_id_fails() {
    Command::cargo_bin("mender")
        .unwrap()
        .args(["analyze", "not a valid id"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid scan id"));
}
