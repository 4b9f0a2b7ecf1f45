//! Colorization by semantic role.

use colored::Colorize;

/// Semantic role of a piece of report text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Fail,
    Pass,
    File,
    Line,
    Suite,
    Msg,
    Warn,
    Value,
}

/// Pure `&str -> String` decorators keyed by [`Role`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Palette {
    color: bool,
}

impl Palette {
    /// ANSI colors through `colored`.
    #[must_use]
    pub const fn colored() -> Self {
        Self { color: true }
    }

    /// Identity decorators.
    #[must_use]
    pub const fn plain() -> Self {
        Self { color: false }
    }

    /// Whether [`Palette::paint`] adds escape codes.
    #[must_use]
    pub const fn is_colored(self) -> bool {
        self.color
    }

    /// Decorate `text` for its role.
    #[must_use]
    pub fn paint(self, role: Role, text: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        match role {
            Role::Fail => text.red().bold().to_string(),
            Role::Pass => text.green().to_string(),
            Role::File => text.cyan().to_string(),
            Role::Line => text.yellow().to_string(),
            Role::Suite => text.blue().bold().to_string(),
            Role::Msg => text.white().to_string(),
            Role::Warn => text.yellow().to_string(),
            Role::Value => text.magenta().to_string(),
        }
    }
}
