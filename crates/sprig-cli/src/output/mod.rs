//! Terminal output formatting.
//!
//! Consistent message styles for all commands, with color support and
//! error formatting.

pub mod colors;
pub mod errors;

/// Output handler for consistent terminal formatting
pub struct OutputHandler {
    colors: colors::ColorSupport,
}

impl OutputHandler {
    pub fn new() -> Self {
        Self {
            colors: colors::ColorSupport::detect(),
        }
    }

    /// Handler that never emits color codes
    pub fn plain() -> Self {
        Self {
            colors: colors::ColorSupport::disabled(),
        }
    }

    /// Print a plain line
    pub fn line(&self, message: &str) {
        println!("{}", message);
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        println!("{}", self.colors.dim(message));
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        println!("{} {}", self.colors.green("✓"), message);
    }

    /// Print a warning message
    pub fn warn(&self, message: &str) {
        println!("{} {}", self.colors.yellow("⚠"), message);
    }

    /// Print a rejection
    pub fn rejected(&self, message: &str) {
        println!("{} {}", self.colors.red("✗"), message);
    }
}

impl Default for OutputHandler {
    fn default() -> Self {
        Self::new()
    }
}
