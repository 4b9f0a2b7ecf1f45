//! Assertion factory and the built-in assertion family.
//!
//! An [`Assertion`] pairs a predicate with a failure-message builder. Checking
//! it writes into the ledger of the running test: a success bumps the count, a
//! failure appends the built message, prefixed by the caller's location.
//! Built-ins and plugin assertions are made the same way.

use crate::context::TestContext;
use crate::stringify::{stringify, stringify_all};
use crate::style::{Palette, Role};
use serde_json::Value;
use std::panic::Location;
use std::rc::Rc;

/// Predicate over the assertion's arguments.
pub type Predicate = dyn Fn(&[Value]) -> bool;

/// Builds the failure message from the call site and the same arguments.
pub type MessageBuilder = dyn Fn(&AssertionSite, &[Value]) -> String;

/// Where a failing assertion was called from.
#[derive(Debug, Clone, Copy)]
pub struct AssertionSite {
    pub location: &'static Location<'static>,
    pub palette: Palette,
}

impl AssertionSite {
    /// `file:line:` painted with the file and line roles.
    #[must_use]
    pub fn prefix(&self) -> String {
        format!(
            "{}:{}:",
            self.palette.paint(Role::File, self.location.file()),
            self.palette.paint(Role::Line, &self.location.line().to_string())
        )
    }

    #[must_use]
    pub fn value(&self, value: &Value) -> String {
        self.palette.paint(Role::Value, &stringify(value))
    }

    #[must_use]
    pub fn msg(&self, text: &str) -> String {
        self.palette.paint(Role::Msg, text)
    }
}

/// A reusable assertion.
#[derive(Clone)]
pub struct Assertion {
    predicate: Rc<Predicate>,
    message: Rc<MessageBuilder>,
}

impl Assertion {
    pub fn new<P, M>(predicate: P, message: M) -> Self
    where
        P: Fn(&[Value]) -> bool + 'static,
        M: Fn(&AssertionSite, &[Value]) -> String + 'static,
    {
        Self {
            predicate: Rc::new(predicate),
            message: Rc::new(message),
        }
    }

    /// An assertion with the generic failure message.
    pub fn from_predicate<P>(predicate: P) -> Self
    where
        P: Fn(&[Value]) -> bool + 'static,
    {
        Self::new(predicate, default_message)
    }

    /// Evaluate against `args`, recording the result in the running test.
    #[track_caller]
    pub fn check(&self, ctx: &mut TestContext, args: &[Value]) -> bool {
        if (self.predicate)(args) {
            ctx.ledger_mut().record_success();
            return true;
        }
        let site = AssertionSite {
            location: Location::caller(),
            palette: ctx.palette(),
        };
        let message = (self.message)(&site, args);
        ctx.ledger_mut().record_failure(message);
        false
    }
}

fn default_message(site: &AssertionSite, args: &[Value]) -> String {
    format!(
        "{} {} {}",
        site.prefix(),
        site.msg("assertion failed with arguments:"),
        site.palette.paint(Role::Value, &stringify_all(args))
    )
}

fn arg(args: &[Value], index: usize) -> &Value {
    args.get(index).unwrap_or(&Value::Null)
}

/// Structural equality where an integer and a float of the same value are
/// equal, at any depth. Two integers or two floats compare exactly.
#[allow(clippy::float_cmp)]
fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) if x.is_f64() != y.is_f64() => {
            matches!((x.as_f64(), y.as_f64()), (Some(p), Some(q)) if p == q)
        }
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| same_value(x, y))
        }
        (Value::Object(xm), Value::Object(ym)) => {
            xm.len() == ym.len()
                && xm
                    .iter()
                    .all(|(key, x)| ym.get(key).is_some_and(|y| same_value(x, y)))
        }
        _ => a == b,
    }
}

const fn is_truthy(value: &Value) -> bool {
    !matches!(value, Value::Null | Value::Bool(false))
}

/// `args[0] == args[1]`; `3` equals `3.0`.
#[must_use]
pub fn equals() -> Assertion {
    Assertion::new(
        |args| same_value(arg(args, 0), arg(args, 1)),
        |site, args| {
            format!(
                "{} {} {}\n{} {}",
                site.prefix(),
                site.msg("expected"),
                site.value(arg(args, 1)),
                site.msg("got"),
                site.value(arg(args, 0))
            )
        },
    )
}

/// `args[0] != args[1]`.
#[must_use]
pub fn not_equals() -> Assertion {
    Assertion::new(
        |args| !same_value(arg(args, 0), arg(args, 1)),
        |site, args| {
            format!(
                "{} {} {}",
                site.prefix(),
                site.msg("expected a value different from"),
                site.value(arg(args, 1))
            )
        },
    )
}

/// `args[0]` is neither `null` nor `false`.
#[must_use]
pub fn truthy() -> Assertion {
    Assertion::new(
        |args| is_truthy(arg(args, 0)),
        |site, args| {
            format!(
                "{} {} {}",
                site.prefix(),
                site.msg("expected a truthy value, got"),
                site.value(arg(args, 0))
            )
        },
    )
}

/// `args[0]` is `null` or `false`.
#[must_use]
pub fn falsy() -> Assertion {
    Assertion::new(
        |args| !is_truthy(arg(args, 0)),
        |site, args| {
            format!(
                "{} {} {}",
                site.prefix(),
                site.msg("expected a falsy value, got"),
                site.value(arg(args, 0))
            )
        },
    )
}

/// `|args[0] - args[1]| <= args[2]`; non-numbers never match.
#[must_use]
pub fn near() -> Assertion {
    Assertion::new(
        |args| {
            match (
                arg(args, 0).as_f64(),
                arg(args, 1).as_f64(),
                arg(args, 2).as_f64(),
            ) {
                (Some(actual), Some(expected), Some(tolerance)) => {
                    (actual - expected).abs() <= tolerance
                }
                _ => false,
            }
        },
        |site, args| {
            format!(
                "{} {} {} {} {}\n{} {}",
                site.prefix(),
                site.msg("expected"),
                site.value(arg(args, 1)),
                site.msg("within"),
                site.value(arg(args, 2)),
                site.msg("got"),
                site.value(arg(args, 0))
            )
        },
    )
}

/// Substring of a string, element of an array, or key of an object.
#[must_use]
pub fn contains() -> Assertion {
    Assertion::new(
        |args| match (arg(args, 0), arg(args, 1)) {
            (Value::String(haystack), Value::String(needle)) => haystack.contains(needle.as_str()),
            (Value::Array(items), needle) => items.iter().any(|item| same_value(item, needle)),
            (Value::Object(map), Value::String(key)) => map.contains_key(key),
            _ => false,
        },
        |site, args| {
            format!(
                "{} {} {}\n{} {}",
                site.prefix(),
                site.msg("expected to find"),
                site.value(arg(args, 1)),
                site.msg("in"),
                site.value(arg(args, 0))
            )
        },
    )
}

/// `args[0]` is an error message (a string) containing `args[1]`.
/// `null` in `args[0]` means no error was raised.
#[must_use]
pub fn errors_with() -> Assertion {
    Assertion::new(
        |args| match (arg(args, 0), arg(args, 1)) {
            (Value::String(message), Value::String(needle)) => message.contains(needle.as_str()),
            _ => false,
        },
        |site, args| match arg(args, 0) {
            Value::Null => format!(
                "{} {} {} {}",
                site.prefix(),
                site.msg("expected an error containing"),
                site.value(arg(args, 1)),
                site.msg("but no error was raised")
            ),
            raised => format!(
                "{} {} {}\n{} {}",
                site.prefix(),
                site.msg("expected an error containing"),
                site.value(arg(args, 1)),
                site.msg("got"),
                site.value(raised)
            ),
        },
    )
}
