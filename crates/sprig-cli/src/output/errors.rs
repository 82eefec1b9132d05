//! Error message formatting with actionable suggestions.

use std::error::Error;

use sprig_core::error::SprigError;

use super::colors::ColorSupport;

/// Error formatter with suggestions
pub struct ErrorFormatter {
    colors: ColorSupport,
}

impl ErrorFormatter {
    pub fn new() -> Self {
        Self {
            colors: ColorSupport::detect(),
        }
    }

    pub fn plain() -> Self {
        Self {
            colors: ColorSupport::disabled(),
        }
    }

    /// Format an error with its suggestion and source chain
    pub fn format_error(&self, error: &SprigError) -> String {
        let mut output = String::new();

        output.push_str(&self.colors.red("error"));
        output.push_str(": ");
        output.push_str(&error.to_string());
        output.push('\n');

        if let Some(suggestion) = error.suggestion() {
            output.push('\n');
            output.push_str(&self.colors.dim("help"));
            output.push_str(": ");
            output.push_str(suggestion);
            output.push('\n');
        }

        let mut source = error.source();
        while let Some(err) = source {
            output.push('\n');
            output.push_str(&self.colors.dim("caused by"));
            output.push_str(": ");
            output.push_str(&err.to_string());
            source = err.source();
        }

        if error.is_internal() {
            output.push('\n');
            output.push_str(&self.colors.yellow("note"));
            output.push_str(": this is a bug in Sprig");
        }

        output
    }
}

impl Default for ErrorFormatter {
    fn default() -> Self {
        Self::new()
    }
}
