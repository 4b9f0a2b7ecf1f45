//! Registered tests, in registration order.

use crate::protect::TestBody;
use crate::suite::SuiteId;
use std::any::Any;
use std::rc::Rc;

/// One registered test. Never modified after registration.
pub struct TestRecord {
    name: String,
    body: TestBody,
    suite: SuiteId,
    plugin_data: Option<Rc<dyn Any>>,
}

impl TestRecord {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        body: TestBody,
        suite: SuiteId,
        plugin_data: Option<Rc<dyn Any>>,
    ) -> Self {
        Self {
            name: name.into(),
            body,
            suite,
            plugin_data,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn suite(&self) -> SuiteId {
        self.suite
    }

    #[must_use]
    pub const fn plugin_data(&self) -> Option<&Rc<dyn Any>> {
        self.plugin_data.as_ref()
    }

    pub(crate) fn into_parts(self) -> (String, TestBody, SuiteId, Option<Rc<dyn Any>>) {
        (self.name, self.body, self.suite, self.plugin_data)
    }
}

/// Append-only list of records.
#[derive(Default)]
pub struct TestRegistry {
    records: Vec<TestRecord>,
}

impl TestRegistry {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    pub fn push(&mut self, record: TestRecord) {
        self.records.push(record);
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TestRecord> {
        self.records.iter()
    }

    /// Hand every record over for execution, leaving the registry empty.
    pub fn take(&mut self) -> Vec<TestRecord> {
        std::mem::take(&mut self.records)
    }
}
