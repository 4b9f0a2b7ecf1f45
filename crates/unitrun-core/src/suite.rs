//! Suite nesting.
//!
//! Every push allocates a new [`SuitePath`] in an arena and never mutates an
//! existing one, so records can hold a [`SuiteId`] and compare paths by
//! identity rather than by label equality.

use crate::error::HarnessError;

/// Identity of a suite path inside a [`SuiteStack`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SuiteId(usize);

impl SuiteId {
    /// The root path: "not inside a named suite".
    pub const ROOT: Self = Self(0);

    /// Whether this is [`SuiteId::ROOT`].
    #[must_use]
    pub const fn is_root(self) -> bool {
        self.0 == 0
    }
}

/// An immutable label path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuitePath {
    id: SuiteId,
    labels: Vec<String>,
}

impl SuitePath {
    /// Arena identity of this path.
    #[must_use]
    pub const fn id(&self) -> SuiteId {
        self.id
    }

    /// Labels from the outermost suite inward; empty for the root.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Number of labels.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.labels.len()
    }

    /// Whether this is the path outside every named suite.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.id.is_root()
    }

    /// Labels joined with `" > "`, or `None` for the root path.
    #[must_use]
    pub fn breadcrumb(&self) -> Option<String> {
        if self.is_root() {
            None
        } else {
            Some(self.labels.join(" > "))
        }
    }
}

/// The live suite stack plus the arena of every path it has produced.
#[derive(Debug, Clone)]
pub struct SuiteStack {
    arena: Vec<SuitePath>,
    open: Vec<SuiteId>,
}

impl Default for SuiteStack {
    fn default() -> Self {
        Self {
            arena: vec![SuitePath {
                id: SuiteId::ROOT,
                labels: Vec::new(),
            }],
            open: Vec::new(),
        }
    }
}

impl SuiteStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The path in effect right now.
    #[must_use]
    pub fn current(&self) -> SuiteId {
        self.open.last().copied().unwrap_or(SuiteId::ROOT)
    }

    /// Number of suites currently open.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.open.len()
    }

    /// Enter a suite, making a freshly allocated path current.
    pub fn push(&mut self, label: impl Into<String>) -> SuiteId {
        let mut labels = self.path(self.current()).labels.clone();
        labels.push(label.into());
        let id = SuiteId(self.arena.len());
        self.arena.push(SuitePath { id, labels });
        self.open.push(id);
        id
    }

    /// Leave the innermost suite, restoring the enclosing path.
    ///
    /// # Errors
    /// Returns `HarnessError::UnmatchedSuite` if no suite is open.
    pub fn pop(&mut self) -> Result<SuiteId, HarnessError> {
        self.open.pop().ok_or(HarnessError::UnmatchedSuite)?;
        Ok(self.current())
    }

    /// Look up a path by identity.
    ///
    /// Ids only come from this stack, so an unknown id can only mean the
    /// stack was reset in between; it resolves to the root path.
    #[must_use]
    pub fn path(&self, id: SuiteId) -> &SuitePath {
        self.arena.get(id.0).unwrap_or(&self.arena[0])
    }

    /// Forget open suites but keep the arena, so already registered records
    /// keep resolving.
    pub fn close_all(&mut self) {
        self.open.clear();
    }
}
