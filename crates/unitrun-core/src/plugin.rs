//! Plugin registry.
//!
//! Plugins add options to the command line, attach opaque data to the tests
//! registered while they are active, and hook into the end of a run.

use crate::error::HarnessError;
use crate::options::{OptionSet, OptionSpec, OptionTable};
use crate::reporter::Totals;
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// What a plugin hands to [`PluginRegistry::configure`].
#[derive(Clone, Default)]
pub struct PluginConfig {
    pub name: String,
    pub options: Vec<(String, OptionSpec)>,
    pub custom_data: Option<Rc<dyn Any>>,
}

impl PluginConfig {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_option(mut self, name: impl Into<String>, spec: OptionSpec) -> Self {
        self.options.push((name.into(), spec));
        self
    }

    #[must_use]
    pub fn with_custom_data<T: Any>(mut self, data: T) -> Self {
        self.custom_data = Some(Rc::new(data));
        self
    }

    /// Attach data the plugin keeps a handle to.
    #[must_use]
    pub fn with_shared_data(mut self, data: Rc<dyn Any>) -> Self {
        self.custom_data = Some(data);
        self
    }
}

/// What a summary hook sees after the report is written.
#[derive(Debug, Clone, Copy)]
pub struct HookContext<'a> {
    pub options: &'a OptionTable,
    pub totals: Totals,
}

/// Runs after the report summary. `Some(code)` with a non-zero code ends the
/// hook sequence and becomes the run status. Hooks should reset any counters
/// they own before returning.
pub type SummaryHook = Box<dyn FnMut(&HookContext<'_>) -> Option<i32>>;

/// Merged plugin state for one session.
pub struct PluginRegistry {
    options: OptionSet,
    configured: HashSet<String>,
    active_data: Option<Rc<dyn Any>>,
    hook_order: Vec<String>,
    hooks: HashMap<String, SummaryHook>,
    warnings: Vec<String>,
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginRegistry {
    /// A registry seeded with the core options.
    #[must_use]
    pub fn new() -> Self {
        Self {
            options: OptionSet::core(),
            configured: HashSet::new(),
            active_data: None,
            hook_order: Vec::new(),
            hooks: HashMap::new(),
            warnings: Vec::new(),
        }
    }

    /// Activate a plugin for subsequently registered tests.
    ///
    /// Re-configuring a known plugin only swaps the active data.
    ///
    /// # Errors
    /// Returns `HarnessError::MissingPluginName` if the name is empty.
    pub fn configure(&mut self, config: PluginConfig) -> Result<(), HarnessError> {
        if config.name.is_empty() {
            return Err(HarnessError::MissingPluginName);
        }
        self.active_data = config.custom_data;
        if !self.configured.insert(config.name.clone()) {
            return Ok(());
        }

        for (name, mut spec) in config.options {
            if self.options.contains(&name) {
                self.warn(format!(
                    "plugin '{}': option '--{name}' is already defined; ignoring the new definition",
                    config.name
                ));
                continue;
            }
            if let Some(short) = spec.abbreviation {
                if let Some(owner) = self.options.abbreviation_owner(short).map(str::to_string) {
                    self.warn(format!(
                        "plugin '{}': abbreviation '-{short}' for '--{name}' is already used by '--{owner}'",
                        config.name
                    ));
                    spec.abbreviation = None;
                }
            }
            self.options.insert(name, spec);
        }
        tracing::debug!(plugin = %config.name, options = self.options.len(), "configured plugin");
        Ok(())
    }

    fn warn(&mut self, message: String) {
        tracing::warn!("{message}");
        self.warnings.push(message);
    }

    /// Data of the most recently configured plugin.
    #[must_use]
    pub fn custom_data(&self) -> Option<Rc<dyn Any>> {
        self.active_data.clone()
    }

    /// Register a summary hook; a name that is already registered is ignored.
    pub fn summary(&mut self, name: impl Into<String>, hook: SummaryHook) {
        let name = name.into();
        if self.hooks.contains_key(&name) {
            return;
        }
        self.hook_order.push(name.clone());
        self.hooks.insert(name, hook);
    }

    /// Merged option set: core options plus every plugin's.
    #[must_use]
    pub const fn options(&self) -> &OptionSet {
        &self.options
    }

    /// Layer `table` under command-line arguments as option defaults.
    ///
    /// # Errors
    /// Returns a configuration error if the table does not verify against the
    /// merged option set.
    pub fn apply_defaults(&mut self, table: &OptionTable) -> Result<(), HarnessError> {
        self.options = self.options.clone().with_defaults(table)?;
        tracing::debug!(entries = table.len(), "applied option defaults");
        Ok(())
    }

    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    #[must_use]
    pub fn is_configured(&self, name: &str) -> bool {
        self.configured.contains(name)
    }

    /// Run hooks in registration order until one returns a non-zero code.
    pub fn run_summaries(&mut self, ctx: &HookContext<'_>) -> Option<i32> {
        for name in &self.hook_order {
            let Some(hook) = self.hooks.get_mut(name) else {
                continue;
            };
            match hook(ctx) {
                Some(code) if code != 0 => {
                    tracing::debug!(hook = %name, code, "summary hook set the run status");
                    return Some(code);
                }
                _ => {}
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn hook_ctx(options: &OptionTable) -> HookContext<'_> {
        HookContext {
            options,
            totals: Totals::default(),
        }
    }

    #[test]
    fn test_name_is_required() {
        let mut registry = PluginRegistry::new();
        assert!(matches!(
            registry.configure(PluginConfig::new("")),
            Err(HarnessError::MissingPluginName)
        ));
    }

    #[test]
    fn test_options_are_merged() -> TestResult {
        let mut registry = PluginRegistry::new();
        registry.configure(
            PluginConfig::new("snap")
                .with_option("update", OptionSpec::flag("Update snapshots").with_abbreviation('U')),
        )?;
        assert!(registry.options().contains("update"));
        assert!(registry.options().contains("output"));
        let table = registry.options().verify_args(["-U"])?;
        assert_eq!(table.get("update").and_then(|v| v.as_bool()), Some(true));
        Ok(())
    }

    #[test]
    fn test_colliding_option_name_keeps_first_definition() -> TestResult {
        let mut registry = PluginRegistry::new();
        registry.configure(PluginConfig::new("a").with_option("limit", OptionSpec::integer("A")))?;
        registry.configure(PluginConfig::new("b").with_option("limit", OptionSpec::text("B")))?;
        registry.configure(PluginConfig::new("c").with_option("terse", OptionSpec::text("C")))?;
        assert_eq!(registry.options().get("limit").map(|s| s.help.as_str()), Some("A"));
        assert_eq!(
            registry.options().get("terse").map(|s| s.kind.clone()),
            Some(crate::options::OptionKind::Flag)
        );
        assert_eq!(registry.warnings().len(), 2);
        Ok(())
    }

    #[test]
    fn test_colliding_abbreviation_keeps_first_claimant() -> TestResult {
        let mut registry = PluginRegistry::new();
        registry.configure(
            PluginConfig::new("x").with_option("trace", OptionSpec::flag("T").with_abbreviation('t')),
        )?;
        let spec = registry.options().get("trace").cloned();
        assert_eq!(spec.and_then(|s| s.abbreviation), None);
        assert_eq!(registry.options().abbreviation_owner('t'), Some("terse"));
        assert_eq!(registry.warnings().len(), 1);
        assert!(registry.warnings()[0].contains("-t"));
        Ok(())
    }

    #[test]
    fn test_reconfigure_is_idempotent_but_swaps_data() -> TestResult {
        let mut registry = PluginRegistry::new();
        registry.configure(
            PluginConfig::new("p")
                .with_option("flagged", OptionSpec::flag("F"))
                .with_custom_data(1_u8),
        )?;
        registry.configure(
            PluginConfig::new("p")
                .with_option("flagged", OptionSpec::flag("F"))
                .with_custom_data(2_u8),
        )?;
        assert!(registry.warnings().is_empty());
        let data = registry.custom_data().and_then(|d| d.downcast::<u8>().ok());
        assert_eq!(data.as_deref(), Some(&2));
        assert!(registry.is_configured("p"));
        Ok(())
    }

    #[test]
    fn test_defaults_cover_plugin_options() -> TestResult {
        let mut registry = PluginRegistry::new();
        registry.configure(PluginConfig::new("p").with_option("depth", OptionSpec::integer("D")))?;
        let mut defaults = OptionTable::new();
        defaults.insert("depth".into(), 4_i64.into());
        defaults.insert("terse".into(), true.into());
        registry.apply_defaults(&defaults)?;
        let table = registry.options().verify_args(["--depth", "9"])?;
        assert_eq!(table.get("depth").and_then(|v| v.as_i64()), Some(9));
        assert_eq!(table.get("terse").and_then(|v| v.as_bool()), Some(true));

        defaults.insert("nope".into(), 1_i64.into());
        assert!(registry.apply_defaults(&defaults).is_err());
        Ok(())
    }

    #[test]
    fn test_duplicate_summary_name_runs_once() {
        let calls = Rc::new(Cell::new(0));
        let mut registry = PluginRegistry::new();
        for _ in 0..2 {
            let calls = Rc::clone(&calls);
            registry.summary(
                "count",
                Box::new(move |_| {
                    calls.set(calls.get() + 1);
                    None
                }),
            );
        }
        let options = OptionTable::new();
        assert_eq!(registry.run_summaries(&hook_ctx(&options)), None);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_first_nonzero_hook_short_circuits() {
        let later = Rc::new(Cell::new(false));
        let mut registry = PluginRegistry::new();
        registry.summary("zero", Box::new(|_| Some(0)));
        registry.summary("none", Box::new(|_| None));
        registry.summary("seven", Box::new(|_| Some(7)));
        let flag = Rc::clone(&later);
        registry.summary(
            "later",
            Box::new(move |_| {
                flag.set(true);
                Some(9)
            }),
        );
        let options = OptionTable::new();
        assert_eq!(registry.run_summaries(&hook_ctx(&options)), Some(7));
        assert!(!later.get());
    }
}
