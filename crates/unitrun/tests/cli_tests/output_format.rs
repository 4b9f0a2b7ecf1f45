//! Report format tests.

use super::unitrun;
use predicates::prelude::*;

#[test]
fn test_terminal_lists_every_suite() {
    unitrun()
        .arg("-u")
        .assert()
        .success()
        .stdout(predicate::str::contains("arithmetic\n"))
        .stdout(predicate::str::contains("arithmetic > rounding\n"))
        .stdout(predicate::str::contains("error checks\n"))
        .stdout(predicate::str::contains("  ✓ addition (2 pass)\n"))
        .stdout(predicate::str::contains("  ✓ no assertions yet (no assertions)\n"))
        .stdout(predicate::str::ends_with("all tests pass: 15 tests\n"));
}

#[test]
fn test_uncolored_output_has_no_escapes() {
    unitrun()
        .args(["--uncolored", "--broken"])
        .assert()
        .stdout(predicate::str::contains("\u{1b}[").not());
}

#[test]
fn test_terse_only_prints_summary_when_green() {
    unitrun()
        .args(["-u", "-t"])
        .assert()
        .success()
        .stdout("all tests pass: 15 tests\n");
}

#[test]
fn test_terse_shows_failing_suites_only() {
    unitrun()
        .args(["-u", "-t", "--broken"])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("arithmetic\n"))
        .stdout(predicate::str::contains("text\n").not())
        .stdout(predicate::str::contains("tally\n").not())
        .stdout(predicate::str::contains("fail: 3 tests, 2 assertions\n"));
}

#[test]
fn test_junit_document() {
    unitrun()
        .args(["--output", "junit"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<testsuites tests=\"15\" failures=\"0\" errors=\"0\"",
        ))
        .stdout(predicate::str::contains("<testsuite name=\"arithmetic &gt; rounding\"").or(
            predicate::str::contains("<testsuite name=\"arithmetic > rounding\""),
        ))
        .stdout(predicate::str::contains("<property name=\"target.os\""))
        .stdout(predicate::str::contains("time=\"").not())
        .stdout(predicate::str::ends_with("</testsuites>\n"));
}

#[test]
fn test_junit_times() {
    unitrun()
        .args(["--output=junit", "--times"])
        .assert()
        .success()
        .stdout(predicate::str::contains(" time=\""))
        .stdout(predicate::str::contains(" timestamp=\""));
}

#[test]
fn test_junit_reports_failures_and_errors() {
    unitrun()
        .args(["--output", "junit", "--broken"])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("failures=\"2\" errors=\"1\""))
        .stdout(predicate::str::contains("type=\"assertion\""))
        .stdout(predicate::str::contains(
            "<error message=\"lookup table unavailable\" type=\"error\">",
        ));
}
