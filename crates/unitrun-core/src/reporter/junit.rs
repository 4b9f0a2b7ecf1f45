//! JUnit XML report.
//!
//! Results are buffered per suite (by path identity, in first-encounter order)
//! and the whole document is written on `summary`.

use super::{Renderer, TestReport, Totals};
use crate::protect::ErrorRecord;
use crate::suite::{SuiteId, SuitePath};
use std::fmt::Write as _;
use std::io::{self, Write};
use std::time::Duration;
use time::OffsetDateTime;
use time::macros::format_description;

const ROOT_NAME: &str = "default";

struct CaseRecord {
    name: String,
    successes: usize,
    failures: Vec<String>,
    error: Option<ErrorRecord>,
    duration: Duration,
}

impl CaseRecord {
    const fn assertions(&self) -> usize {
        self.successes + self.failures.len()
    }
}

struct SuiteBucket {
    id: SuiteId,
    name: String,
    cases: Vec<CaseRecord>,
}

impl SuiteBucket {
    fn errors(&self) -> usize {
        self.cases.iter().filter(|c| c.error.is_some()).count()
    }

    fn failures(&self) -> usize {
        self.cases
            .iter()
            .filter(|c| c.error.is_none() && !c.failures.is_empty())
            .count()
    }

    fn duration(&self) -> Duration {
        self.cases.iter().map(|c| c.duration).sum()
    }
}

/// Escape text for use inside an attribute value.
fn escape_attr(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            '\n' => escaped.push_str("&#10;"),
            '\r' => escaped.push_str("&#13;"),
            '\t' => escaped.push_str("&#9;"),
            c if c < ' ' => {}
            c => escaped.push(c),
        }
    }
    escaped
}

/// Wrap text in CDATA, splitting any embedded terminator.
fn cdata(text: &str) -> String {
    format!("<![CDATA[{}]]>", text.replace("]]>", "]]]]><![CDATA[>"))
}

fn seconds(duration: Duration) -> String {
    format!("{:.3}", duration.as_secs_f64())
}

fn timestamp() -> String {
    OffsetDateTime::now_utc()
        .format(&format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second]"
        ))
        .unwrap_or_default()
}

/// JUnit XML renderer.
pub struct JunitReporter<W: Write> {
    out: W,
    times: bool,
    timestamp: Option<String>,
    buckets: Vec<SuiteBucket>,
    current: Option<usize>,
}

impl<W: Write> JunitReporter<W> {
    /// With `times`, `time` attributes and a suite `timestamp` are written.
    pub fn new(out: W, times: bool) -> Self {
        Self {
            out,
            times,
            timestamp: times.then(timestamp),
            buckets: Vec::new(),
            current: None,
        }
    }

    /// Return the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn bucket_for(&mut self, id: SuiteId, name: impl FnOnce() -> String) -> usize {
        if let Some(index) = self.buckets.iter().position(|b| b.id == id) {
            return index;
        }
        self.buckets.push(SuiteBucket {
            id,
            name: name(),
            cases: Vec::new(),
        });
        self.buckets.len() - 1
    }

    fn render(&self, totals: &Totals) -> String {
        let mut xml = String::new();
        let errors: usize = self.buckets.iter().map(SuiteBucket::errors).sum();
        let failures: usize = self.buckets.iter().map(SuiteBucket::failures).sum();

        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        let _ = write!(
            xml,
            "<testsuites tests=\"{}\" failures=\"{failures}\" errors=\"{errors}\" assertions=\"{}\" skipped=\"0\"",
            totals.tests(),
            totals.assertions()
        );
        if self.times {
            let _ = write!(xml, " time=\"{}\"", seconds(totals.elapsed));
        }
        xml.push_str(">\n");

        for bucket in self.buckets.iter().filter(|b| !b.cases.is_empty()) {
            self.render_suite(&mut xml, bucket);
        }
        xml.push_str("</testsuites>\n");
        xml
    }

    fn render_suite(&self, xml: &mut String, bucket: &SuiteBucket) {
        let name = escape_attr(&bucket.name);
        let _ = write!(
            xml,
            "  <testsuite name=\"{name}\" tests=\"{}\" failures=\"{}\" errors=\"{}\" skipped=\"0\"",
            bucket.cases.len(),
            bucket.failures(),
            bucket.errors()
        );
        if self.times {
            let _ = write!(xml, " time=\"{}\"", seconds(bucket.duration()));
        }
        if let Some(stamp) = &self.timestamp {
            let _ = write!(xml, " timestamp=\"{stamp}\"");
        }
        xml.push_str(">\n");

        xml.push_str("    <properties>\n");
        for (key, value) in [
            ("harness.version", env!("CARGO_PKG_VERSION")),
            ("target.os", std::env::consts::OS),
            ("target.arch", std::env::consts::ARCH),
        ] {
            let _ = writeln!(
                xml,
                "      <property name=\"{key}\" value=\"{}\"/>",
                escape_attr(value)
            );
        }
        xml.push_str("    </properties>\n");

        for case in &bucket.cases {
            let _ = write!(
                xml,
                "    <testcase name=\"{}\" classname=\"{name}\" assertions=\"{}\"",
                escape_attr(&case.name),
                case.assertions()
            );
            if self.times {
                let _ = write!(xml, " time=\"{}\"", seconds(case.duration));
            }
            if let Some(error) = &case.error {
                let body = if error.trace.is_empty() {
                    error.message.clone()
                } else {
                    error.trace.join("\n")
                };
                let _ = writeln!(
                    xml,
                    ">\n      <error message=\"{}\" type=\"error\">{}</error>\n    </testcase>",
                    escape_attr(&error.message),
                    cdata(&body)
                );
            } else if case.failures.is_empty() {
                xml.push_str("/>\n");
            } else {
                xml.push_str(">\n");
                for failure in &case.failures {
                    let _ = writeln!(
                        xml,
                        "      <failure message=\"{}\" type=\"assertion\"/>",
                        escape_attr(failure)
                    );
                }
                xml.push_str("    </testcase>\n");
            }
        }
        xml.push_str("  </testsuite>\n");
    }
}

impl<W: Write> Renderer for JunitReporter<W> {
    fn suite_begin(&mut self, path: &SuitePath) -> io::Result<()> {
        let index = self.bucket_for(path.id(), || {
            path.breadcrumb().unwrap_or_else(|| ROOT_NAME.to_string())
        });
        self.current = Some(index);
        Ok(())
    }

    fn test_result(&mut self, report: &TestReport<'_>) -> io::Result<()> {
        let index = match self.current {
            Some(index) => index,
            None => self.bucket_for(SuiteId::ROOT, || ROOT_NAME.to_string()),
        };
        self.buckets[index].cases.push(CaseRecord {
            name: report.name.to_string(),
            successes: report.successes,
            failures: report.failures.to_vec(),
            error: report.error.cloned(),
            duration: report.duration,
        });
        Ok(())
    }

    fn summary(&mut self, totals: &Totals) -> io::Result<()> {
        let xml = self.render(totals);
        self.out.write_all(xml.as_bytes())?;
        self.out.flush()
    }
}
