use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

const GOOD_FORM: &str = r#"
name: contact
sections:
  - title: Main
    order: 1
    fields:
      - name: email
        fieldType: EMAIL
        order: 1
        validations:
          - type: REQUIRED
"#;

const BAD_FORM: &str = r#"
name: broken
sections:
  - order: 1
    fields:
      - name: a
        fieldType: TEXT
      - name: a
        fieldType: TEXT
"#;

fn cmd() -> Command {
    Command::cargo_bin("formgate").expect("binary built")
}

#[test]
fn check_accepts_a_well_formed_definition() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("contact.yaml");
    fs::write(&path, GOOD_FORM).unwrap();

    cmd()
        .arg("check")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("OK: contact"));
}

#[test]
fn check_reports_preflight_errors_and_fails() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.yaml");
    fs::write(&path, BAD_FORM).unwrap();

    cmd()
        .arg("check")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("DuplicateFieldName"));
}

#[test]
fn validate_prints_the_error_map() {
    let dir = tempdir().unwrap();
    let form = dir.path().join("contact.yaml");
    let submission = dir.path().join("submission.json");
    fs::write(&form, GOOD_FORM).unwrap();
    fs::write(&submission, "{}").unwrap();

    cmd()
        .arg("validate")
        .arg(&form)
        .arg(&submission)
        .assert()
        .failure()
        .stdout(predicate::str::contains("This field is required"));
}

#[test]
fn validate_succeeds_on_a_valid_submission() {
    let dir = tempdir().unwrap();
    let form = dir.path().join("contact.yaml");
    let submission = dir.path().join("submission.json");
    fs::write(&form, GOOD_FORM).unwrap();
    fs::write(&submission, r#"{ "email": "a@b.com" }"#).unwrap();

    cmd()
        .arg("validate")
        .arg(&form)
        .arg(&submission)
        .assert()
        .success()
        .stdout(predicate::str::contains("{}"));
}

#[test]
fn check_fails_cleanly_on_missing_file() {
    cmd()
        .arg("check")
        .arg("does-not-exist.yaml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read"));
}
