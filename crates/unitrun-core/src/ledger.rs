//! Per-test assertion bookkeeping.

/// Successes and failure messages collected while one test body runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    successes: usize,
    failures: Vec<String>,
}

impl Ledger {
    /// Create an empty ledger.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            successes: 0,
            failures: Vec::new(),
        }
    }

    /// Count one passed assertion.
    pub const fn record_success(&mut self) {
        self.successes += 1;
    }

    /// Keep the message of one failed assertion.
    pub fn record_failure(&mut self, message: String) {
        self.failures.push(message);
    }

    /// Number of passed assertions.
    #[must_use]
    pub const fn successes(&self) -> usize {
        self.successes
    }

    /// Failure messages in the order they were recorded.
    #[must_use]
    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    /// Whether any assertion failed.
    #[must_use]
    pub const fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}
