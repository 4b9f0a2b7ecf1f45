//! Test session: registration, suite nesting and the run loop.

use crate::context::TestContext;
use crate::error::HarnessError;
use crate::options::{OptionTable, OutputFormat, RunOptions};
use crate::plugin::{HookContext, PluginConfig, PluginRegistry, SummaryHook};
use crate::protect::{self, Outcome};
use crate::registry::{TestRecord, TestRegistry};
use crate::reporter::{JunitReporter, Renderer, TerminalReporter, TestReport, Totals};
use crate::suite::{SuiteId, SuiteStack};
use std::any::Any;
use std::io::{self, Write};
use std::rc::Rc;
use std::time::Instant;

/// A unit of test definitions for [`Session::grouped`].
pub type TestUnit = Box<dyn FnOnce(&mut Session) -> Result<(), HarnessError>>;

/// Result of [`Session::run`] and friends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub totals: Totals,
    /// First non-zero summary hook code, otherwise the number of failed tests.
    pub status: i32,
    /// The run was suppressed because it was requested inside a grouped unit.
    pub deferred: bool,
}

impl RunSummary {
    const fn deferred() -> Self {
        Self {
            totals: Totals {
                tests_passed: 0,
                tests_failed: 0,
                assertions_passed: 0,
                assertions_failed: 0,
                elapsed: std::time::Duration::ZERO,
            },
            status: 0,
            deferred: true,
        }
    }

    #[must_use]
    pub const fn success(&self) -> bool {
        self.status == 0
    }
}

/// Everything registered between two runs.
///
/// A session owns the suite stack, the test registry and the plugin registry.
/// Every run consumes all three and leaves the session as new.
#[derive(Default)]
pub struct Session {
    suites: SuiteStack,
    registry: TestRegistry,
    plugins: PluginRegistry,
    deferred: bool,
}

impl Session {
    /// Create an empty session with only the core options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a nested suite; tests added until the matching pop belong to it.
    pub fn push_suite(&mut self, label: impl Into<String>) -> SuiteId {
        self.suites.push(label)
    }

    /// Close the innermost suite.
    ///
    /// # Errors
    /// Returns `HarnessError::UnmatchedSuite` when no suite is open.
    pub fn pop_suite(&mut self) -> Result<(), HarnessError> {
        self.suites.pop().map(|_| ())
    }

    /// Run `define` inside a suite named `label`. The suite is closed even if
    /// `define` fails.
    ///
    /// # Errors
    /// Returns the error from `define`, or from closing the suite.
    pub fn with_suite<F>(&mut self, label: impl Into<String>, define: F) -> Result<(), HarnessError>
    where
        F: FnOnce(&mut Self) -> Result<(), HarnessError>,
    {
        self.push_suite(label);
        let result = define(self);
        let closed = self.pop_suite();
        result.and(closed)
    }

    /// Register a test in the current suite. The active plugin data is
    /// captured now, not when the test runs.
    pub fn add<F>(&mut self, name: impl Into<String>, body: F)
    where
        F: FnOnce(&mut TestContext) -> anyhow::Result<()> + 'static,
    {
        self.registry.push(TestRecord::new(
            name,
            Box::new(body),
            self.suites.current(),
            self.plugins.custom_data(),
        ));
    }

    /// Configure a plugin; see [`PluginRegistry::configure`].
    ///
    /// # Errors
    /// Returns `HarnessError::MissingPluginName` if the plugin has no name.
    pub fn configure_plugin(&mut self, config: PluginConfig) -> Result<(), HarnessError> {
        self.plugins.configure(config)
    }

    /// Register a summary hook. Registering the same name twice keeps the first.
    pub fn summary_hook(&mut self, name: impl Into<String>, hook: SummaryHook) {
        self.plugins.summary(name, hook);
    }

    /// Use `table` (e.g. an option file) as defaults under run arguments.
    /// Apply after every plugin is configured.
    ///
    /// # Errors
    /// Returns a configuration error if the table does not verify.
    pub fn apply_defaults(&mut self, table: &OptionTable) -> Result<(), HarnessError> {
        self.plugins.apply_defaults(table)
    }

    /// Data of the most recently configured plugin.
    #[must_use]
    pub fn custom_data(&self) -> Option<Rc<dyn Any>> {
        self.plugins.custom_data()
    }

    /// Plugins configured since the last run.
    #[must_use]
    pub const fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    /// Tests waiting for the next run.
    #[must_use]
    pub const fn tests(&self) -> &TestRegistry {
        &self.registry
    }

    /// Suite paths defined so far, with the currently open ones.
    #[must_use]
    pub const fn suites(&self) -> &SuiteStack {
        &self.suites
    }

    /// Whether runs are currently collected by [`Session::grouped`].
    #[must_use]
    pub const fn is_deferred(&self) -> bool {
        self.deferred
    }

    /// Run each unit in order with runs deferred, so that their tests are
    /// collected for a single run afterward. A failing unit stops the group
    /// and discards everything registered so far.
    ///
    /// # Errors
    /// Returns the first error a unit returns.
    pub fn grouped<I>(&mut self, units: I) -> Result<(), HarnessError>
    where
        I: IntoIterator<Item = TestUnit>,
    {
        let outer = std::mem::replace(&mut self.deferred, true);
        let mut result = Ok(());
        for unit in units {
            result = unit(self);
            if result.is_err() {
                break;
            }
        }
        self.deferred = outer;
        if result.is_err() {
            self.reset();
        }
        result
    }

    /// Discard every registered test, suite, plugin and hook.
    pub fn reset(&mut self) {
        self.suites = SuiteStack::new();
        self.registry = TestRegistry::new();
        self.plugins = PluginRegistry::new();
    }

    /// Verify `args` and run with the selected report written to stdout.
    ///
    /// # Errors
    /// Returns a configuration error for bad arguments, `HelpRequested` when
    /// help was asked for, or an I/O error from the report.
    pub fn run<I, S>(&mut self, args: I) -> Result<RunSummary, HarnessError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.run_to(args, io::stdout().lock())
    }

    /// Same as [`Session::run`], writing the report to `out`.
    ///
    /// # Errors
    /// See [`Session::run`].
    pub fn run_to<I, S, W>(&mut self, args: I, out: W) -> Result<RunSummary, HarnessError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        W: Write,
    {
        if self.deferred {
            return Ok(self.defer());
        }
        match self.plugins.options().verify_args(args) {
            Ok(table) => self.run_verified(table, out),
            Err(e @ HarnessError::HelpRequested(_)) => Err(e),
            Err(e) => {
                self.reset();
                Err(e)
            }
        }
    }

    /// Run with options given as a table, e.g. loaded from an option file.
    ///
    /// # Errors
    /// Returns a configuration error if the table does not verify, or an I/O
    /// error from the report.
    pub fn run_table_to<W: Write>(
        &mut self,
        table: &OptionTable,
        out: W,
    ) -> Result<RunSummary, HarnessError> {
        if self.deferred {
            return Ok(self.defer());
        }
        match self.plugins.options().verify_table(table) {
            Ok(table) => self.run_verified(table, out),
            Err(e @ HarnessError::HelpRequested(_)) => Err(e),
            Err(e) => {
                self.reset();
                Err(e)
            }
        }
    }

    fn run_verified<W: Write>(
        &mut self,
        table: OptionTable,
        out: W,
    ) -> Result<RunSummary, HarnessError> {
        let options = match RunOptions::from_table(&table) {
            Ok(options) => options,
            Err(e) => {
                self.reset();
                return Err(e);
            }
        };
        match options.output {
            OutputFormat::Terminal => {
                let mut reporter = TerminalReporter::new(out, options.palette(), options.terse);
                self.run_with(&mut reporter, &table)
            }
            OutputFormat::Junit => {
                let mut reporter = JunitReporter::new(out, options.times);
                self.run_with(&mut reporter, &table)
            }
        }
    }

    /// Execute every registered test against `renderer`. `options` must
    /// already be verified against the merged option set.
    ///
    /// The session is reset afterward whatever the outcome.
    ///
    /// # Errors
    /// Returns `HarnessError::UnclosedSuites` if suites are still open, a
    /// configuration error for unusable core options, or the renderer's I/O
    /// error.
    pub fn run_with(
        &mut self,
        renderer: &mut dyn Renderer,
        options: &OptionTable,
    ) -> Result<RunSummary, HarnessError> {
        if self.deferred {
            return Ok(self.defer());
        }
        let result = self.execute(renderer, options);
        self.reset();
        result
    }

    fn defer(&mut self) -> RunSummary {
        tracing::debug!(
            open = self.suites.depth(),
            registered = self.registry.len(),
            "run deferred inside grouped unit"
        );
        self.suites.close_all();
        RunSummary::deferred()
    }

    fn execute(
        &mut self,
        renderer: &mut dyn Renderer,
        options: &OptionTable,
    ) -> Result<RunSummary, HarnessError> {
        let open = self.suites.depth();
        if open > 0 {
            return Err(HarnessError::UnclosedSuites(open));
        }
        let palette = RunOptions::from_table(options)?.palette();
        let shared = Rc::new(options.clone());
        let records = self.registry.take();
        tracing::debug!(tests = records.len(), colored = palette.is_colored(), "starting run");

        let mut totals = Totals::default();
        let mut current: Option<SuiteId> = None;

        for record in records {
            let (name, body, suite, plugin_data) = record.into_parts();
            let mut ctx = TestContext::new(Rc::clone(&shared), plugin_data, palette);
            let started = Instant::now();
            let error = protect::call(body, &mut ctx).err();
            let duration = started.elapsed();
            let ledger = ctx.into_ledger();

            if current != Some(suite) {
                let path = self.suites.path(suite);
                if let Some(previous) = current.map(|id| self.suites.path(id)) {
                    if !previous.is_root() && path.depth() <= previous.depth() {
                        renderer.suite_end(previous)?;
                    }
                }
                renderer.suite_begin(path)?;
                current = Some(suite);
            }

            match Outcome::classify(&ledger, error.as_ref()) {
                Outcome::Passed => totals.tests_passed += 1,
                Outcome::Failed(_) | Outcome::Errored(_) => totals.tests_failed += 1,
            }
            totals.assertions_passed += ledger.successes();
            totals.assertions_failed += ledger.failures().len();
            totals.elapsed += duration;
            tracing::debug!(
                test = %name,
                successes = ledger.successes(),
                failures = ledger.failures().len(),
                errored = error.is_some(),
                "test finished"
            );

            renderer.test_result(&TestReport {
                name: &name,
                successes: ledger.successes(),
                failures: ledger.failures(),
                error: error.as_ref(),
                duration,
            })?;
        }

        renderer.summary(&totals)?;
        let status = self
            .plugins
            .run_summaries(&HookContext { options, totals })
            .unwrap_or_else(|| i32::try_from(totals.tests_failed).unwrap_or(i32::MAX));
        tracing::debug!(
            passed = totals.tests_passed,
            failed = totals.tests_failed,
            status,
            "run finished"
        );
        Ok(RunSummary {
            totals,
            status,
            deferred: false,
        })
    }
}
