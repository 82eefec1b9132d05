//! Error types and result aliases for Sprig operations.
//!
//! Provides a unified error type that covers every failure the variant
//! selection core can report, with actionable messages.

use thiserror::Error;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Unified error type for all Sprig operations
#[derive(Error, Debug)]
pub enum SprigError {
    // Configuration input errors
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Invalid pattern '{pattern}'")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: BoxedSource,
    },

    #[error("Invalid version selector '{selector}': {reason}")]
    InvalidVersionSelector { selector: String, reason: String },

    // Lifecycle errors
    #[error("Cannot mutate content repository descriptor '{repository}' after repository has been used")]
    DescriptorLocked { repository: String },

    #[error("Cannot mutate attributes schema '{schema}' after it has been used for matching")]
    SchemaLocked { schema: String },

    // Rule execution errors
    #[error(
        "Could not determine whether value {producer} is compatible with value {consumer} using {rule} for attribute '{attribute}'"
    )]
    CompatibilityRuleFailed {
        attribute: String,
        rule: String,
        consumer: String,
        producer: String,
        #[source]
        source: BoxedSource,
    },

    #[error(
        "Could not select value from candidates [{candidates}] using {rule} for attribute '{attribute}' (requested: {requested})"
    )]
    DisambiguationRuleFailed {
        attribute: String,
        rule: String,
        requested: String,
        candidates: String,
        #[source]
        source: BoxedSource,
    },

    // Artifact selection errors
    #[error("No artifact selector produced a result for component {component}")]
    SelectorChainExhausted { component: String },

    #[error("Artifact not found: {artifact}")]
    ArtifactNotFound { artifact: String },

    // Config errors
    #[error("Failed to parse sprig.toml: {message} at line {line}, column {column}")]
    TomlParse {
        message: String,
        line: usize,
        column: usize,
    },

    #[error("Configuration field '{field}' is invalid: {reason}")]
    ConfigValidation { field: String, reason: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for Sprig operations
pub type SprigResult<T> = Result<T, SprigError>;

impl SprigError {
    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create an invalid pattern error from any error type
    pub fn invalid_pattern<E>(pattern: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::InvalidPattern {
            pattern: pattern.into(),
            source: Box::new(source),
        }
    }

    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io { message, source }
    }

    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SprigError::Io { .. } | SprigError::ArtifactNotFound { .. }
        )
    }

    /// Check if this error reports a programming or wiring mistake
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            SprigError::SelectorChainExhausted { .. }
                | SprigError::DescriptorLocked { .. }
                | SprigError::SchemaLocked { .. }
        )
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            SprigError::InvalidPattern { .. } => {
                Some("Check the regular expression syntax; patterns must match the whole value")
            },
            SprigError::DescriptorLocked { .. } | SprigError::SchemaLocked { .. } => {
                Some("Finish configuring repositories and schemas before resolving dependencies")
            },
            SprigError::CompatibilityRuleFailed { .. }
            | SprigError::DisambiguationRuleFailed { .. } => {
                Some("Fix the failing attribute rule or remove it from the schema")
            },
            SprigError::SelectorChainExhausted { .. } => {
                Some("Artifact selector chains must end with a catch-all selector")
            },
            SprigError::TomlParse { .. } | SprigError::ConfigValidation { .. } => {
                Some("Check sprig.toml against the documented sections")
            },
            _ => None,
        }
    }
}
