//! Demo plugin tests.

use super::unitrun;
use predicates::prelude::*;

#[test]
fn test_tally_reports_counted_tests() {
    unitrun()
        .args(["-u", "--tally"])
        .assert()
        .success()
        .stderr(predicate::str::contains("tally: 3 tests counted"));
}

#[test]
fn test_tally_is_silent_without_flag() {
    unitrun()
        .arg("-u")
        .assert()
        .success()
        .stderr(predicate::str::contains("tally").not());
}

#[test]
fn test_tally_limit_exceeded_sets_exit_code() {
    unitrun().args(["-u", "--tally-limit", "2"]).assert().code(10);
}

#[test]
fn test_tally_limit_met() {
    unitrun().args(["-u", "--tally-limit=3"]).assert().success();
}

#[test]
fn test_tally_limit_wins_over_failure_count() {
    unitrun()
        .args(["-u", "--broken", "--tally-limit", "0"])
        .assert()
        .code(10)
        .stdout(predicate::str::contains("fail: 3 tests"));
}

#[test]
fn test_broken_failures_are_reported() {
    unitrun()
        .args(["-u", "--broken"])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("  ✗ sum of squares [1 fail, 0 pass]\n"))
        .stdout(predicate::str::contains("expected"))
        .stdout(predicate::str::contains("  ✗ config lookup\n    ERROR: lookup table unavailable\n"))
        .stdout(predicate::str::contains("pass: 12 tests"))
        .stdout(predicate::str::contains("fail: 3 tests, 2 assertions\n"));
}
