//! Report renderers.
//!
//! The runner emits suite-begin, test-result, suite-end and summary events to
//! a [`Renderer`]; each implementation turns them into one output format.

pub mod junit;
pub mod terminal;

pub use junit::JunitReporter;
pub use terminal::TerminalReporter;

use crate::protect::ErrorRecord;
use crate::suite::SuitePath;
use std::io;
use std::time::Duration;

/// Aggregate counts for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub tests_passed: usize,
    pub tests_failed: usize,
    pub assertions_passed: usize,
    pub assertions_failed: usize,
    /// Wall time spent in test bodies.
    pub elapsed: Duration,
}

impl Totals {
    /// Tests run, passed or not.
    #[must_use]
    pub const fn tests(&self) -> usize {
        self.tests_passed + self.tests_failed
    }

    #[must_use]
    pub const fn assertions(&self) -> usize {
        self.assertions_passed + self.assertions_failed
    }
}

/// One test's result as seen by a renderer.
#[derive(Debug, Clone, Copy)]
pub struct TestReport<'a> {
    pub name: &'a str,
    pub successes: usize,
    pub failures: &'a [String],
    pub error: Option<&'a ErrorRecord>,
    pub duration: Duration,
}

impl TestReport<'_> {
    /// Whether the test neither raised nor failed an assertion.
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.error.is_none() && self.failures.is_empty()
    }
}

/// Consumer of runner events.
pub trait Renderer {
    /// # Errors
    /// Returns an error if writing the report fails.
    fn suite_begin(&mut self, path: &SuitePath) -> io::Result<()>;

    /// # Errors
    /// Returns an error if writing the report fails.
    fn test_result(&mut self, report: &TestReport<'_>) -> io::Result<()>;

    /// # Errors
    /// Returns an error if writing the report fails.
    fn suite_end(&mut self, _path: &SuitePath) -> io::Result<()> {
        Ok(())
    }

    /// # Errors
    /// Returns an error if writing the report fails.
    fn summary(&mut self, totals: &Totals) -> io::Result<()>;
}
