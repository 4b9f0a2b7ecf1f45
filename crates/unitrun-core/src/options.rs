//! Option specs and verification.
//!
//! Plugins contribute options at runtime, so the command line is described by
//! an [`OptionSet`] and turned into a `clap::Command` on demand instead of a
//! derive struct. A plain table goes through the same parser, so both entry
//! points report errors (and "did you mean" tips) identically.

use crate::error::HarnessError;
use crate::style::Palette;
use clap::builder::PossibleValuesParser;
use clap::{Arg, ArgAction, ColorChoice, Command};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// A validated option table.
pub type OptionTable = BTreeMap<String, OptionValue>;

/// What values an option accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionKind {
    /// One of a fixed set of strings.
    Choice(Vec<String>),
    /// `--name` or `--name=true|false`.
    Flag,
    Text,
    Integer,
    Number,
}

/// A single option value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Integer(i64),
    Number(f64),
    Text(String),
}

impl OptionValue {
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Definition of one option.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionSpec {
    pub kind: OptionKind,
    pub default: Option<OptionValue>,
    pub required: bool,
    /// Single-character short form (`-t`).
    pub abbreviation: Option<char>,
    pub help: String,
}

impl OptionSpec {
    const fn new(kind: OptionKind, default: Option<OptionValue>, help: String) -> Self {
        Self {
            kind,
            default,
            required: false,
            abbreviation: None,
            help,
        }
    }

    /// A boolean flag, `false` unless given.
    #[must_use]
    pub fn flag(help: impl Into<String>) -> Self {
        Self::new(
            OptionKind::Flag,
            Some(OptionValue::Bool(false)),
            help.into(),
        )
    }

    /// One value out of `values`, no default.
    #[must_use]
    pub fn choice(values: &[&str], help: impl Into<String>) -> Self {
        Self::new(
            OptionKind::Choice(values.iter().map(ToString::to_string).collect()),
            None,
            help.into(),
        )
    }

    /// Free text, no default.
    #[must_use]
    pub fn text(help: impl Into<String>) -> Self {
        Self::new(OptionKind::Text, None, help.into())
    }

    /// A signed integer, no default.
    #[must_use]
    pub fn integer(help: impl Into<String>) -> Self {
        Self::new(OptionKind::Integer, None, help.into())
    }

    /// A floating-point number, no default.
    #[must_use]
    pub fn number(help: impl Into<String>) -> Self {
        Self::new(OptionKind::Number, None, help.into())
    }

    #[must_use]
    pub fn with_default(mut self, value: impl Into<OptionValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    #[must_use]
    pub const fn with_abbreviation(mut self, short: char) -> Self {
        self.abbreviation = Some(short);
        self
    }

    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn to_arg(&self, name: &str, help_id: Option<&str>) -> Arg {
        let mut arg = Arg::new(name.to_string())
            .long(name.to_string())
            .help(self.help.clone());
        if let Some(short) = self.abbreviation {
            arg = arg.short(short);
        }
        arg = match &self.kind {
            OptionKind::Flag => arg
                .action(ArgAction::Set)
                .num_args(0..=1)
                .require_equals(true)
                .default_missing_value("true")
                .value_parser(clap::value_parser!(bool)),
            OptionKind::Choice(values) => arg
                .action(ArgAction::Set)
                .value_parser(PossibleValuesParser::new(values.clone())),
            OptionKind::Text => arg.action(ArgAction::Set),
            OptionKind::Integer => arg
                .action(ArgAction::Set)
                .allow_negative_numbers(true)
                .value_parser(clap::value_parser!(i64)),
            OptionKind::Number => arg
                .action(ArgAction::Set)
                .allow_negative_numbers(true)
                .value_parser(clap::value_parser!(f64)),
        };
        if let Some(default) = &self.default {
            arg = arg.default_value(default.to_string());
        }
        if self.required {
            arg = match help_id {
                Some(help) => arg.required_unless_present(help.to_string()),
                None => arg.required(true),
            };
        }
        arg
    }
}

/// An ordered collection of option specs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionSet {
    specs: Vec<(String, OptionSpec)>,
}

impl OptionSet {
    #[must_use]
    pub const fn new() -> Self {
        Self { specs: Vec::new() }
    }

    /// The options every run understands.
    #[must_use]
    pub fn core() -> Self {
        let mut set = Self::new();
        set.insert(
            "output",
            OptionSpec::choice(&["terminal", "junit"], "Report format").with_default("terminal"),
        );
        set.insert(
            "uncolored",
            OptionSpec::flag("Disable colored terminal output").with_abbreviation('u'),
        );
        set.insert(
            "terse",
            OptionSpec::flag("Only report suites that contain failures").with_abbreviation('t'),
        );
        set.insert(
            "times",
            OptionSpec::flag("Record timing attributes (junit only)"),
        );
        set.insert(
            "help",
            OptionSpec::flag("Print help").with_abbreviation('h'),
        );
        set
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&OptionSpec> {
        self.specs.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Which option already claims this abbreviation.
    #[must_use]
    pub fn abbreviation_owner(&self, short: char) -> Option<&str> {
        self.specs
            .iter()
            .find(|(_, s)| s.abbreviation == Some(short))
            .map(|(n, _)| n.as_str())
    }

    /// Add or replace a spec. Merging rules live in the plugin registry.
    pub fn insert(&mut self, name: impl Into<String>, spec: OptionSpec) {
        let name = name.into();
        if let Some(slot) = self.specs.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = spec;
        } else {
            self.specs.push((name, spec));
        }
    }

    /// Options in definition order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionSpec)> {
        self.specs.iter().map(|(n, s)| (n.as_str(), s))
    }

    /// Number of defined options.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.specs.len()
    }

    /// Whether no option is defined.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Replace defaults with values from a table (typically a config file).
    ///
    /// # Errors
    /// Returns an error if the table does not verify against this set.
    pub fn with_defaults(mut self, table: &OptionTable) -> Result<Self, HarnessError> {
        self.verify_table(table)?;
        for (name, value) in table {
            if let Some((_, spec)) = self.specs.iter_mut().find(|(n, _)| n == name) {
                spec.default = Some(value.clone());
            }
        }
        Ok(self)
    }

    /// Build the clap command describing this set.
    #[must_use]
    pub fn command(&self) -> Command {
        let help_id = self.contains("help").then_some("help");
        self.iter().fold(
            Command::new("unitrun")
                .about("Run registered tests and report the results")
                .disable_help_flag(true)
                .disable_version_flag(true)
                .color(ColorChoice::Never),
            |command, (name, spec)| command.arg(spec.to_arg(name, help_id)),
        )
    }

    /// Verify a raw argument list (without the program name).
    ///
    /// # Errors
    /// Returns `HarnessError::Options` for unknown options, malformed values or
    /// values outside a choice set, and `HarnessError::HelpRequested` when the
    /// `help` option is set.
    pub fn verify_args<I, S>(&self, args: I) -> Result<OptionTable, HarnessError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let argv = std::iter::once("unitrun".to_string()).chain(args.into_iter().map(Into::into));
        let matches = self
            .command()
            .try_get_matches_from(argv)
            .map_err(|e| HarnessError::Options(e.render().to_string().trim_end().to_string()))?;

        let mut table = OptionTable::new();
        for (name, spec) in self.iter() {
            let value = match spec.kind {
                OptionKind::Flag => matches
                    .try_get_one::<bool>(name)
                    .ok()
                    .flatten()
                    .map(|b| OptionValue::Bool(*b)),
                OptionKind::Integer => matches
                    .try_get_one::<i64>(name)
                    .ok()
                    .flatten()
                    .map(|n| OptionValue::Integer(*n)),
                OptionKind::Number => matches
                    .try_get_one::<f64>(name)
                    .ok()
                    .flatten()
                    .map(|n| OptionValue::Number(*n)),
                OptionKind::Choice(_) | OptionKind::Text => matches
                    .try_get_one::<String>(name)
                    .ok()
                    .flatten()
                    .map(|s| OptionValue::Text(s.clone())),
            };
            if let Some(value) = value {
                table.insert(name.to_string(), value);
            }
        }

        if table.get("help").and_then(OptionValue::as_bool) == Some(true) {
            let help = self.command().render_help().to_string();
            return Err(HarnessError::HelpRequested(help));
        }
        Ok(table)
    }

    /// Verify a plain table; each entry is checked as `--name=value`.
    ///
    /// # Errors
    /// Same as [`OptionSet::verify_args`].
    pub fn verify_table(&self, table: &OptionTable) -> Result<OptionTable, HarnessError> {
        self.verify_args(
            table
                .iter()
                .map(|(name, value)| format!("--{name}={value}")),
        )
    }
}

/// Load an option table from a YAML mapping.
///
/// An empty file is an empty table.
///
/// # Errors
/// Returns `HarnessError::Config` if the file cannot be read or parsed.
pub fn load_table(path: &Path) -> Result<OptionTable, HarnessError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| HarnessError::Config(format!("{}: {e}", path.display())))?;
    if content.trim().is_empty() {
        return Ok(OptionTable::new());
    }
    serde_yml::from_str(&content)
        .map_err(|e| HarnessError::Config(format!("{}: {e}", path.display())))
}

/// Report format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Terminal,
    Junit,
}

impl std::str::FromStr for OutputFormat {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "terminal" => Ok(Self::Terminal),
            "junit" => Ok(Self::Junit),
            _ => Err(HarnessError::Options(format!(
                "unknown output: {s}. Valid outputs: terminal, junit"
            ))),
        }
    }
}

/// Typed view of the core options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunOptions {
    pub output: OutputFormat,
    pub uncolored: bool,
    pub terse: bool,
    pub times: bool,
}

impl RunOptions {
    /// Read the core options out of a verified table.
    ///
    /// # Errors
    /// Returns `HarnessError::Options` for an unknown output format.
    pub fn from_table(table: &OptionTable) -> Result<Self, HarnessError> {
        let flag = |name: &str| table.get(name).and_then(OptionValue::as_bool) == Some(true);
        let output = match table.get("output").and_then(OptionValue::as_str) {
            Some(s) => s.parse()?,
            None => OutputFormat::default(),
        };
        Ok(Self {
            output,
            uncolored: flag("uncolored"),
            terse: flag("terse"),
            times: flag("times"),
        })
    }

    /// Palette for report text and failure messages. JUnit is never colored.
    #[must_use]
    pub const fn palette(&self) -> Palette {
        match self.output {
            OutputFormat::Terminal if !self.uncolored => Palette::colored(),
            _ => Palette::plain(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn test_defaults_are_filled_in() -> TestResult {
        let table = OptionSet::core().verify_args(Vec::<String>::new())?;
        assert_eq!(table.get("output"), Some(&OptionValue::Text("terminal".into())));
        assert_eq!(table.get("terse"), Some(&OptionValue::Bool(false)));
        let options = RunOptions::from_table(&table)?;
        assert_eq!(options, RunOptions::default());
        assert!(options.palette().is_colored());
        Ok(())
    }

    #[test]
    fn test_long_short_and_equals_forms() -> TestResult {
        let table = OptionSet::core().verify_args(["--output=junit", "-t", "--uncolored"])?;
        let options = RunOptions::from_table(&table)?;
        assert_eq!(options.output, OutputFormat::Junit);
        assert!(options.terse);
        assert!(options.uncolored);
        assert!(!options.times);
        assert!(!options.palette().is_colored());
        Ok(())
    }

    #[test]
    fn test_flag_accepts_explicit_false() -> TestResult {
        let table = OptionSet::core().verify_args(["--terse=false"])?;
        assert_eq!(table.get("terse"), Some(&OptionValue::Bool(false)));
        Ok(())
    }

    #[test]
    fn test_value_outside_choice_is_rejected() {
        let result = OptionSet::core().verify_args(["--output=xml"]);
        match result {
            Err(HarnessError::Options(message)) => assert!(message.contains("xml"), "{message}"),
            other => unreachable!("expected options error, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_option_suggests_near_miss() {
        let result = OptionSet::core().verify_args(["--ters"]);
        match result {
            Err(HarnessError::Options(message)) => {
                assert!(message.contains("--terse"), "{message}");
            }
            other => unreachable!("expected options error, got {other:?}"),
        }
    }

    #[test]
    fn test_core_set_lists_options_in_order() {
        assert!(OptionSet::new().is_empty());
        let set = OptionSet::core();
        assert_eq!(set.len(), 5);
        let names: Vec<&str> = set.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["output", "uncolored", "terse", "times", "help"]);
    }

    #[test]
    fn test_number_option() -> TestResult {
        let mut set = OptionSet::core();
        set.insert("ratio", OptionSpec::number("Ratio").with_default(0.5));
        let table = set.verify_args(Vec::<String>::new())?;
        assert_eq!(table.get("ratio"), Some(&OptionValue::Number(0.5)));
        let table = set.verify_args(["--ratio", "-1.25"])?;
        assert_eq!(table.get("ratio"), Some(&OptionValue::Number(-1.25)));
        let table = set.verify_args(["--ratio=3"])?;
        assert_eq!(table.get("ratio"), Some(&OptionValue::Number(3.0)));
        assert!(matches!(
            set.verify_args(["--ratio=half"]),
            Err(HarnessError::Options(_))
        ));
        Ok(())
    }

    #[test]
    fn test_wrong_type_is_rejected() {
        let mut set = OptionSet::core();
        set.insert("limit", OptionSpec::integer("Limit"));
        assert!(matches!(
            set.verify_args(["--limit=many"]),
            Err(HarnessError::Options(_))
        ));
    }

    #[test]
    fn test_required_option() -> TestResult {
        let mut set = OptionSet::core();
        set.insert("name", OptionSpec::text("Name").required());
        assert!(matches!(
            set.verify_args(Vec::<String>::new()),
            Err(HarnessError::Options(_))
        ));
        let table = set.verify_args(["--name", "x"])?;
        assert_eq!(table.get("name").and_then(OptionValue::as_str), Some("x"));
        assert!(matches!(
            set.verify_args(["--help"]),
            Err(HarnessError::HelpRequested(_))
        ));
        Ok(())
    }

    #[test]
    fn test_help_is_reported_with_option_list() {
        match OptionSet::core().verify_args(["-h"]) {
            Err(HarnessError::HelpRequested(help)) => {
                assert!(help.contains("--output"), "{help}");
                assert!(help.contains("--terse"), "{help}");
            }
            other => unreachable!("expected help, got {other:?}"),
        }
    }

    #[test]
    fn test_verify_table() -> TestResult {
        let mut input = OptionTable::new();
        input.insert("output".into(), "junit".into());
        input.insert("times".into(), true.into());
        let table = OptionSet::core().verify_table(&input)?;
        let options = RunOptions::from_table(&table)?;
        assert_eq!(options.output, OutputFormat::Junit);
        assert!(options.times);

        let mut bad = OptionTable::new();
        bad.insert("outptu".into(), "junit".into());
        assert!(OptionSet::core().verify_table(&bad).is_err());
        Ok(())
    }

    #[test]
    fn test_table_defaults_are_overridden_by_args() -> TestResult {
        let mut file_table = OptionTable::new();
        file_table.insert("output".into(), "junit".into());
        let set = OptionSet::core().with_defaults(&file_table)?;

        let table = set.verify_args(Vec::<String>::new())?;
        assert_eq!(RunOptions::from_table(&table)?.output, OutputFormat::Junit);

        let table = set.verify_args(["--output", "terminal"])?;
        assert_eq!(RunOptions::from_table(&table)?.output, OutputFormat::Terminal);
        Ok(())
    }

    #[test]
    fn test_load_table_from_yaml() -> TestResult {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "output: junit\nterse: true\nlimit: 3\nratio: 0.5")?;
        let table = load_table(file.path())?;
        assert_eq!(table.get("output"), Some(&OptionValue::Text("junit".into())));
        assert_eq!(table.get("terse"), Some(&OptionValue::Bool(true)));
        assert_eq!(table.get("limit"), Some(&OptionValue::Integer(3)));
        assert_eq!(table.get("ratio"), Some(&OptionValue::Number(0.5)));
        Ok(())
    }

    #[test]
    fn test_load_table_empty_and_invalid() -> TestResult {
        let empty = NamedTempFile::new()?;
        assert!(load_table(empty.path())?.is_empty());

        let mut invalid = NamedTempFile::new()?;
        writeln!(invalid, "- not\n- a mapping")?;
        assert!(matches!(
            load_table(invalid.path()),
            Err(HarnessError::Config(_))
        ));
        Ok(())
    }

    #[test]
    fn test_output_format_from_str() -> TestResult {
        assert_eq!("terminal".parse::<OutputFormat>()?, OutputFormat::Terminal);
        assert_eq!("JUNIT".parse::<OutputFormat>()?, OutputFormat::Junit);
        assert!("xml".parse::<OutputFormat>().is_err());
        Ok(())
    }
}
