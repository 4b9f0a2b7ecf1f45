//! CLI argument tests.

use super::unitrun;
use predicates::prelude::*;

#[test]
fn test_arg_help() {
    unitrun()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--output"))
        .stdout(predicate::str::contains("--tally-limit"))
        .stdout(predicate::str::contains("all tests pass").not());
}

#[test]
fn test_arg_help_short() {
    unitrun()
        .arg("-h")
        .assert()
        .success()
        .stdout(predicate::str::contains("--uncolored"));
}

#[test]
fn test_arg_unknown_suggests_near_miss() {
    unitrun()
        .arg("--terce")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--terse"))
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_arg_invalid_output() {
    unitrun()
        .args(["--output", "html"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("html"));
}

#[test]
fn test_arg_integer_option_rejects_text() {
    unitrun()
        .args(["--tally-limit", "many"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("many"));
}

#[test]
fn test_arg_flag_accepts_explicit_value() {
    unitrun()
        .args(["--uncolored=true", "--terse=false"])
        .assert()
        .success()
        .stdout(predicate::str::contains("✓"));
}
