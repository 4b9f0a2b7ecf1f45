//! Errors surfaced by the harness itself.
//!
//! Failures inside test bodies are never reported through this type; they are
//! recorded per test by the runner. Everything here aborts the whole run.

use thiserror::Error;

/// Fatal harness errors.
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("unmatched suite boundaries: pop without a matching push")]
    UnmatchedSuite,
    #[error("unmatched suite boundaries: {0} suite(s) still open at run time")]
    UnclosedSuites(usize),
    #[error("plugin configuration requires a plugin name")]
    MissingPluginName,
    #[error("{0}")]
    Options(String),
    #[error("config error: {0}")]
    Config(String),
    /// Help was requested; carries the rendered help text.
    #[error("{0}")]
    HelpRequested(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarnessError {
    /// Whether this error is a configuration problem (as opposed to I/O or help).
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnmatchedSuite
                | Self::UnclosedSuites(_)
                | Self::MissingPluginName
                | Self::Options(_)
                | Self::Config(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmatched_suite_message() {
        let err = HarnessError::UnmatchedSuite;
        assert!(err.to_string().contains("unmatched suite boundaries"));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_help_is_not_configuration() {
        let err = HarnessError::HelpRequested("usage".into());
        assert!(!err.is_configuration());
        assert_eq!(err.to_string(), "usage");
    }
}
