//! Failure isolation for test bodies.
//!
//! A body can fail by returning `Err` or by panicking. Both are turned into an
//! [`ErrorRecord`] here so the runner only ever sees a tagged [`Outcome`].
//!
//! Panic locations come from a process-wide hook installed once. The hook only
//! captures (and silences the default report) while the current thread is
//! inside [`call`] or [`catch_panic`]; everywhere else it defers to the hook it
//! replaced.

use crate::context::TestContext;
use crate::ledger::Ledger;
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

/// An error raised by a test body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    pub message: String,
    /// Normalized trace lines, outermost first.
    pub trace: Vec<String>,
}

/// Result of running one test body, borrowed from its ledger and error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome<'a> {
    Passed,
    Failed(&'a [String]),
    Errored(&'a ErrorRecord),
}

impl<'a> Outcome<'a> {
    /// Classify a finished body: an error wins over assertion failures.
    #[must_use]
    pub fn classify(ledger: &'a Ledger, error: Option<&'a ErrorRecord>) -> Self {
        match error {
            Some(record) => Self::Errored(record),
            None if ledger.has_failures() => Self::Failed(ledger.failures()),
            None => Self::Passed,
        }
    }

    /// Whether the body neither failed an assertion nor raised.
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

/// A test body.
pub type TestBody = Box<dyn FnOnce(&mut TestContext) -> anyhow::Result<()>>;

pub(crate) struct PanicSite {
    file: String,
    line: u32,
    column: u32,
    message: String,
}

thread_local! {
    static CAPTURING: Cell<bool> = const { Cell::new(false) };
    static LAST_PANIC: RefCell<Option<PanicSite>> = const { RefCell::new(None) };
}

static HOOK: Once = Once::new();

fn install_hook() {
    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !CAPTURING.with(Cell::get) {
                previous(info);
                return;
            }
            let payload = info.payload();
            let message = payload
                .downcast_ref::<&str>()
                .map(ToString::to_string)
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            let site = info.location().map_or_else(
                || PanicSite {
                    file: String::new(),
                    line: 0,
                    column: 0,
                    message: message.clone(),
                },
                |loc| PanicSite {
                    file: loc.file().to_string(),
                    line: loc.line(),
                    column: loc.column(),
                    message: message.clone(),
                },
            );
            LAST_PANIC.with(|slot| *slot.borrow_mut() = Some(site));
        }));
    });
}

fn error_record(error: &anyhow::Error) -> ErrorRecord {
    ErrorRecord {
        message: error.to_string(),
        trace: error
            .chain()
            .skip(1)
            .map(|cause| format!("caused by: {cause}"))
            .collect(),
    }
}

fn panic_record(site: Option<PanicSite>) -> ErrorRecord {
    match site {
        Some(site) if !site.file.is_empty() => ErrorRecord {
            message: format!("{}:{}: {}", site.file, site.line, site.message),
            trace: vec![format!(
                "panicked at {}:{}:{}",
                site.file, site.line, site.column
            )],
        },
        Some(site) => ErrorRecord {
            message: site.message,
            trace: vec!["panicked".to_string()],
        },
        None => ErrorRecord {
            message: "test body panicked".to_string(),
            trace: vec!["panicked".to_string()],
        },
    }
}

/// Run `f`, turning a panic into the site the hook recorded for it.
///
/// Nests: the capture flag of an enclosing call is restored afterwards.
pub(crate) fn catch_panic<R>(f: impl FnOnce() -> R) -> Result<R, Option<PanicSite>> {
    install_hook();
    let outer = CAPTURING.with(|c| c.replace(true));
    let result = panic::catch_unwind(AssertUnwindSafe(f));
    CAPTURING.with(|c| c.set(outer));
    result.map_err(|_| LAST_PANIC.with(|slot| slot.borrow_mut().take()))
}

/// The panic message alone, without its location.
pub(crate) fn panic_message(site: Option<PanicSite>) -> String {
    site.map_or_else(|| "panicked".to_string(), |site| site.message)
}

/// Run `body` without letting its failure escape.
///
/// Assertions made before an error or panic stay in `ctx`'s ledger.
pub fn call(body: TestBody, ctx: &mut TestContext) -> Result<(), ErrorRecord> {
    match catch_panic(|| body(ctx)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(error)) => Err(error_record(&error)),
        Err(site) => Err(panic_record(site)),
    }
}
