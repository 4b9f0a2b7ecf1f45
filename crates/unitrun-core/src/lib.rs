//! Core library for the unitrun test harness.
//!
//! This crate provides:
//! - Test registration inside nested suites
//! - Assertions recorded in a per-test ledger, with caller locations
//! - Failure isolation for test bodies that return errors or panic
//! - Plugins that add options, attach data to tests and hook into the summary
//! - Option verification from the command line or a YAML option file
//! - Terminal and JUnit XML reports

pub mod assertion;
pub mod context;
pub mod error;
pub mod ledger;
pub mod options;
pub mod plugin;
pub mod protect;
pub mod registry;
pub mod reporter;
pub mod runner;
pub mod stringify;
pub mod style;
pub mod suite;

pub use assertion::{Assertion, AssertionSite};
pub use context::TestContext;
pub use error::HarnessError;
pub use ledger::Ledger;
pub use options::{
    OptionKind, OptionSet, OptionSpec, OptionTable, OptionValue, OutputFormat, RunOptions,
    load_table,
};
pub use plugin::{HookContext, PluginConfig, PluginRegistry, SummaryHook};
pub use protect::{ErrorRecord, Outcome, TestBody};
pub use reporter::{JunitReporter, Renderer, TerminalReporter, TestReport, Totals};
pub use runner::{RunSummary, Session, TestUnit};
pub use style::{Palette, Role};
pub use suite::{SuiteId, SuitePath, SuiteStack};
