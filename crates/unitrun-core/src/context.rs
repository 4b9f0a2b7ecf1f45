//! The handle a test body receives.

use crate::assertion::{self, Assertion};
use crate::ledger::Ledger;
use crate::options::{OptionTable, OptionValue};
use crate::protect;
use crate::style::Palette;
use serde_json::Value;
use std::any::Any;
use std::rc::Rc;

/// State visible to one executing test body: its ledger, the verified options,
/// and the plugin data that was active when the test was defined.
pub struct TestContext {
    ledger: Ledger,
    options: Rc<OptionTable>,
    custom_data: Option<Rc<dyn Any>>,
    palette: Palette,
}

impl TestContext {
    /// Create a context with a fresh ledger.
    #[must_use]
    pub fn new(
        options: Rc<OptionTable>,
        custom_data: Option<Rc<dyn Any>>,
        palette: Palette,
    ) -> Self {
        Self {
            ledger: Ledger::new(),
            options,
            custom_data,
            palette,
        }
    }

    /// A context outside of any run, for exercising assertions directly.
    #[must_use]
    pub fn detached() -> Self {
        Self::new(Rc::new(OptionTable::new()), None, Palette::plain())
    }

    #[must_use]
    pub const fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub const fn ledger_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }

    pub(crate) fn into_ledger(self) -> Ledger {
        self.ledger
    }

    #[must_use]
    pub const fn palette(&self) -> Palette {
        self.palette
    }

    /// A verified option value by name.
    #[must_use]
    pub fn option(&self, name: &str) -> Option<&OptionValue> {
        self.options.get(name)
    }

    /// Whether a flag option is set.
    #[must_use]
    pub fn flag(&self, name: &str) -> bool {
        self.option(name).and_then(OptionValue::as_bool) == Some(true)
    }

    /// Plugin data captured when this test was registered, if it has type `T`.
    #[must_use]
    pub fn custom_data<T: Any>(&self) -> Option<Rc<T>> {
        self.custom_data.clone()?.downcast::<T>().ok()
    }

    /// Check any assertion, built-in or plugin-made.
    #[track_caller]
    pub fn check(&mut self, assertion: &Assertion, args: &[Value]) -> bool {
        assertion.check(self, args)
    }

    #[track_caller]
    pub fn assert_eq(&mut self, actual: impl Into<Value>, expected: impl Into<Value>) -> bool {
        assertion::equals().check(self, &[actual.into(), expected.into()])
    }

    #[track_caller]
    pub fn assert_ne(&mut self, actual: impl Into<Value>, unexpected: impl Into<Value>) -> bool {
        assertion::not_equals().check(self, &[actual.into(), unexpected.into()])
    }

    #[track_caller]
    pub fn assert_true(&mut self, value: impl Into<Value>) -> bool {
        assertion::truthy().check(self, &[value.into()])
    }

    #[track_caller]
    pub fn assert_false(&mut self, value: impl Into<Value>) -> bool {
        assertion::falsy().check(self, &[value.into()])
    }

    #[track_caller]
    pub fn assert_near(&mut self, actual: f64, expected: f64, tolerance: f64) -> bool {
        assertion::near().check(
            self,
            &[actual.into(), expected.into(), tolerance.into()],
        )
    }

    #[track_caller]
    pub fn assert_contains(
        &mut self,
        haystack: impl Into<Value>,
        needle: impl Into<Value>,
    ) -> bool {
        assertion::contains().check(self, &[haystack.into(), needle.into()])
    }

    /// Passes if `f` fails with a message containing `needle`. A panic in `f`
    /// counts as failing with the panic message.
    #[track_caller]
    pub fn assert_errors<T, F>(&mut self, f: F, needle: &str) -> bool
    where
        F: FnOnce() -> anyhow::Result<T>,
    {
        let raised = match protect::catch_panic(f) {
            Ok(Ok(_)) => Value::Null,
            Ok(Err(e)) => Value::String(format!("{e:#}")),
            Err(site) => Value::String(protect::panic_message(site)),
        };
        assertion::errors_with().check(self, &[raised, needle.into()])
    }
}
