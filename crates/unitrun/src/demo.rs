//! Demo suites and the `tally` plugin.
//!
//! Everything passes by default. `--broken` flips three tests into failures
//! (two assertion mismatches and one error) so the failure report can be seen.

use std::cell::Cell;
use std::rc::Rc;
use unitrun_core::{HarnessError, OptionSpec, PluginConfig, Session, TestContext, TestUnit};

/// Status the tally hook returns when more tests were counted than allowed.
pub const TALLY_LIMIT_EXCEEDED: i32 = 10;

/// Plugin data shared by every test registered while the plugin is active.
#[derive(Debug, Default)]
pub struct Tally {
    counted: Cell<usize>,
}

impl Tally {
    fn bump(&self) -> usize {
        let next = self.counted.get() + 1;
        self.counted.set(next);
        next
    }

    /// Current count, leaving zero behind.
    fn drain(&self) -> usize {
        self.counted.replace(0)
    }
}

/// Register every demo suite as one group.
///
/// # Errors
/// Returns an error if a suite or plugin is declared inconsistently.
pub fn register(session: &mut Session) -> Result<(), HarnessError> {
    let units: Vec<TestUnit> = vec![
        Box::new(arithmetic),
        Box::new(text),
        Box::new(error_checks),
        Box::new(tallied),
    ];
    session.grouped(units)
}

fn broken(ctx: &TestContext) -> bool {
    ctx.flag("broken")
}

fn arithmetic(session: &mut Session) -> Result<(), HarnessError> {
    session.with_suite("arithmetic", |s| {
        s.add("addition", |ctx| {
            ctx.assert_eq(2 + 2, 4);
            ctx.assert_eq(-3 + 3, 0);
            Ok(())
        });
        s.add("integer division truncates", |ctx| {
            ctx.assert_eq(7 / 2, 3);
            ctx.assert_eq(-7 / 2, -3);
            ctx.assert_eq(7 % 2, 1);
            Ok(())
        });
        s.add("sum of squares", |ctx| {
            let expected = if broken(ctx) { 26 } else { 25 };
            ctx.assert_eq(3 * 3 + 4 * 4, expected);
            Ok(())
        });
        s.with_suite("rounding", |s| {
            s.add("round half away from zero", |ctx| {
                ctx.assert_eq(2.5_f64.round(), 3.0);
                ctx.assert_eq((-2.5_f64).round(), -3.0);
                Ok(())
            });
            s.add("floor and ceil", |ctx| {
                ctx.assert_eq(1.7_f64.floor(), 1.0);
                ctx.assert_eq(1.2_f64.ceil(), 2.0);
                Ok(())
            });
            s.add("close enough", |ctx| {
                let tolerance = if broken(ctx) { 1e-9 } else { 1e-3 };
                ctx.assert_near(1.0 / 3.0, 0.333, tolerance);
                Ok(())
            });
            Ok(())
        })?;
        s.add("no assertions yet", |_| Ok(()));
        Ok(())
    })
}

fn text(session: &mut Session) -> Result<(), HarnessError> {
    session.with_suite("text", |s| {
        s.add("concatenation", |ctx| {
            let joined = ["unit", "run"].concat();
            ctx.assert_eq(joined.as_str(), "unitrun");
            ctx.assert_ne(joined.as_str(), "unit run");
            Ok(())
        });
        s.add("search", |ctx| {
            ctx.assert_contains("a small test harness", "harness");
            ctx.assert_contains(vec!["red", "green"], "green");
            Ok(())
        });
        s.add("split", |ctx| {
            let parts: Vec<&str> = "a,b,,c".split(',').collect();
            ctx.assert_false(parts.contains(&"d"));
            ctx.assert_eq(parts, vec!["a", "b", "", "c"]);
            Ok(())
        });
        Ok(())
    })
}

fn error_checks(session: &mut Session) -> Result<(), HarnessError> {
    session.with_suite("error checks", |s| {
        s.add("parse failure is reported", |ctx| {
            ctx.assert_errors(|| Ok("12a".parse::<i32>()?), "invalid digit");
            ctx.assert_errors(|| Ok("".parse::<u8>()?), "empty string");
            Ok(())
        });
        s.add("config lookup", |ctx| {
            let table: [(&str, i32); 2] = [("retries", 3), ("timeout", 30)];
            let lookup = |key: &str| table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v);
            if broken(ctx) {
                anyhow::bail!("lookup table unavailable");
            }
            ctx.assert_eq(lookup("retries"), Some(3));
            ctx.assert_eq(lookup("missing"), None::<i32>);
            Ok(())
        });
        Ok(())
    })
}

fn tallied(session: &mut Session) -> Result<(), HarnessError> {
    let tally = Rc::new(Tally::default());
    session.configure_plugin(
        PluginConfig::new("tally")
            .with_option("tally", OptionSpec::flag("Print how many tallied tests ran"))
            .with_option(
                "tally-limit",
                OptionSpec::integer("Fail the run when more tallied tests ran than this"),
            )
            .with_option("broken", OptionSpec::flag("Make some demo tests fail"))
            .with_shared_data(Rc::clone(&tally) as Rc<dyn std::any::Any>),
    )?;

    let hook_tally = Rc::clone(&tally);
    session.summary_hook(
        "tally",
        Box::new(move |hook| {
            let counted = hook_tally.drain();
            if hook.options.get("tally").and_then(|v| v.as_bool()) == Some(true) {
                eprintln!("tally: {counted} tests counted");
            }
            let limit = hook.options.get("tally-limit").and_then(|v| v.as_i64())?;
            (i64::try_from(counted).unwrap_or(i64::MAX) > limit).then_some(TALLY_LIMIT_EXCEEDED)
        }),
    );

    session.with_suite("tally", |s| {
        for name in ["first", "second", "third"] {
            s.add(name, |ctx| {
                let Some(tally) = ctx.custom_data::<Tally>() else {
                    anyhow::bail!("tally plugin data missing");
                };
                let count = tally.bump();
                ctx.assert_true(count > 0);
                Ok(())
            });
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn run_demo(args: &[&str]) -> Result<(unitrun_core::RunSummary, String), Box<dyn std::error::Error>> {
        let mut session = Session::new();
        register(&mut session)?;
        let mut out = Vec::new();
        let summary = session.run_to(args.iter().copied(), &mut out)?;
        Ok((summary, String::from_utf8(out)?))
    }

    #[test]
    fn test_demo_passes_by_default() -> TestResult {
        let (summary, out) = run_demo(&["-u"])?;
        assert!(summary.success(), "{out}");
        assert_eq!(summary.totals.tests_failed, 0);
        assert!(out.contains("arithmetic > rounding\n"), "{out}");
        assert!(out.contains("  ✓ no assertions yet (no assertions)"), "{out}");
        Ok(())
    }

    #[test]
    fn test_broken_fails_three_tests() -> TestResult {
        let (summary, out) = run_demo(&["-u", "--broken"])?;
        assert_eq!(summary.totals.tests_failed, 3, "{out}");
        assert_eq!(summary.status, 3);
        assert!(out.contains("ERROR: lookup table unavailable"), "{out}");
        Ok(())
    }

    #[test]
    fn test_tally_limit_sets_status() -> TestResult {
        let (summary, _) = run_demo(&["-u", "--tally-limit", "2"])?;
        assert_eq!(summary.status, TALLY_LIMIT_EXCEEDED);
        let (summary, _) = run_demo(&["-u", "--tally-limit", "3"])?;
        assert_eq!(summary.status, 0);
        Ok(())
    }

    #[test]
    fn test_tally_drains_between_runs() {
        let tally = Tally::default();
        tally.bump();
        tally.bump();
        assert_eq!(tally.drain(), 2);
        assert_eq!(tally.drain(), 0);
    }
}
