//! Interactive terminal report.

use super::{Renderer, TestReport, Totals};
use crate::protect::ErrorRecord;
use crate::style::{Palette, Role};
use crate::suite::SuitePath;
use regex::Regex;
use std::io::{self, Write};
use std::sync::OnceLock;

const PASS_MARK: &str = "✓";
const FAIL_MARK: &str = "✗";
const ROOT_LABEL: &str = "default suite";

/// `path:line:rest`, as produced for panics and most located errors. The path
/// stays on the first line; the rest may span several.
fn located_pattern() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([^\n]+?):(\d+):\s?(?s:(.*))$").ok())
        .as_ref()
}

/// Split a located error message into file, line and the rest.
fn split_location(message: &str) -> Option<(&str, &str, &str)> {
    let caps = located_pattern()?.captures(message)?;
    Some((
        caps.get(1)?.as_str(),
        caps.get(2)?.as_str(),
        caps.get(3)?.as_str(),
    ))
}

/// Terminal renderer.
///
/// Passing tests are listed back to back; a failing test is always framed by
/// blank lines. In terse mode passing tests print nothing and a suite header
/// is only written once the suite has its first failure.
pub struct TerminalReporter<W: Write> {
    out: W,
    palette: Palette,
    terse: bool,
    /// Something other than a blank line was written last.
    gap_pending: bool,
    /// Terse mode: header of the current suite, not yet written.
    pending_header: Option<String>,
}

impl<W: Write> TerminalReporter<W> {
    /// Create a reporter writing to `out` with the given palette and mode.
    pub const fn new(out: W, palette: Palette, terse: bool) -> Self {
        Self {
            out,
            palette,
            terse,
            gap_pending: false,
            pending_header: None,
        }
    }

    /// Return the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn blank_if_pending(&mut self) -> io::Result<()> {
        if self.gap_pending {
            writeln!(self.out)?;
            self.gap_pending = false;
        }
        Ok(())
    }

    fn write_header(&mut self, header: &str) -> io::Result<()> {
        self.blank_if_pending()?;
        writeln!(self.out, "{header}")?;
        self.gap_pending = true;
        Ok(())
    }

    fn write_indented(&mut self, indent: &str, text: &str) -> io::Result<()> {
        for line in text.lines() {
            writeln!(self.out, "{indent}{line}")?;
        }
        Ok(())
    }

    fn write_error(&mut self, error: &ErrorRecord) -> io::Result<()> {
        let p = self.palette;
        let heading = p.paint(Role::Fail, "ERROR");
        match split_location(&error.message) {
            Some((file, line, rest)) => {
                let text = format!(
                    "{heading} in {} line {}: {}",
                    p.paint(Role::File, file),
                    p.paint(Role::Line, line),
                    p.paint(Role::Msg, rest)
                );
                self.write_indented("    ", &text)?;
            }
            None => {
                let text = format!("{heading}: {}", p.paint(Role::Msg, &error.message));
                self.write_indented("    ", &text)?;
            }
        }
        for line in &error.trace {
            writeln!(self.out, "      {line}")?;
        }
        Ok(())
    }
}

impl<W: Write> Renderer for TerminalReporter<W> {
    fn suite_begin(&mut self, path: &SuitePath) -> io::Result<()> {
        let label = path.breadcrumb().unwrap_or_else(|| ROOT_LABEL.to_string());
        let header = self.palette.paint(Role::Suite, &label);
        if self.terse {
            self.pending_header = Some(header);
            return Ok(());
        }
        self.write_header(&header)
    }

    fn test_result(&mut self, report: &TestReport<'_>) -> io::Result<()> {
        let p = self.palette;
        if report.passed() {
            if self.terse {
                return Ok(());
            }
            let count = if report.successes == 0 {
                p.paint(Role::Warn, "(no assertions)")
            } else {
                format!("({} pass)", report.successes)
            };
            writeln!(
                self.out,
                "  {} {} {count}",
                p.paint(Role::Pass, PASS_MARK),
                report.name
            )?;
            self.gap_pending = true;
            return Ok(());
        }

        if let Some(header) = self.pending_header.take() {
            self.write_header(&header)?;
        }
        self.blank_if_pending()?;
        match report.error {
            Some(error) => {
                writeln!(self.out, "  {} {}", p.paint(Role::Fail, FAIL_MARK), report.name)?;
                self.write_error(error)?;
            }
            None => {
                writeln!(
                    self.out,
                    "  {} {} [{} fail, {} pass]",
                    p.paint(Role::Fail, FAIL_MARK),
                    report.name,
                    report.failures.len(),
                    report.successes
                )?;
                for failure in report.failures {
                    self.write_indented("    ", failure)?;
                }
            }
        }
        writeln!(self.out)?;
        Ok(())
    }

    fn summary(&mut self, totals: &Totals) -> io::Result<()> {
        self.blank_if_pending()?;
        let p = self.palette;
        if totals.tests_failed == 0 {
            writeln!(
                self.out,
                "{}",
                p.paint(
                    Role::Pass,
                    &format!("all tests pass: {} tests", totals.tests_passed)
                )
            )?;
        } else {
            writeln!(
                self.out,
                "{}",
                p.paint(
                    Role::Pass,
                    &format!(
                        "pass: {} tests, {} assertions",
                        totals.tests_passed, totals.assertions_passed
                    )
                )
            )?;
            writeln!(
                self.out,
                "{}",
                p.paint(
                    Role::Fail,
                    &format!(
                        "fail: {} tests, {} assertions",
                        totals.tests_failed, totals.assertions_failed
                    )
                )
            )?;
        }
        self.out.flush()
    }
}
