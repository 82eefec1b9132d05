//! Terminal color support detection and formatting.
//!
//! Respects the NO_COLOR environment variable and only colors output when
//! both stdout and stderr are terminals.

use std::env;
use std::io::{self, IsTerminal};

/// Color support detection and formatting
pub struct ColorSupport {
    enabled: bool,
}

impl ColorSupport {
    /// Detect color support automatically
    pub fn detect() -> Self {
        let enabled = env::var_os("NO_COLOR").is_none()
            && io::stderr().is_terminal()
            && io::stdout().is_terminal();
        Self { enabled }
    }

    pub fn disabled() -> Self {
        Self { enabled: false }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.enabled {
            format!("\x1b[{}m{}\x1b[0m", code, text)
        } else {
            text.to_string()
        }
    }

    pub fn green(&self, text: &str) -> String {
        self.paint("32", text)
    }

    pub fn yellow(&self, text: &str) -> String {
        self.paint("33", text)
    }

    pub fn red(&self, text: &str) -> String {
        self.paint("31", text)
    }

    /// Dim/gray text
    pub fn dim(&self, text: &str) -> String {
        self.paint("2", text)
    }
}
