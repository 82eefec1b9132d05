//! Attribute matching engine for Sprig
//!
//! This crate decides which variants of a component are compatible with a
//! request and narrows several compatible variants down to the best match.
//! Consumer and producer schemas each contribute compatibility and
//! disambiguation rules; the matcher reconciles both without either side
//! knowing about the other.

pub mod attribute;
pub mod container;
pub mod factory;
pub mod matcher;
pub mod rules;
pub mod schema;
pub mod value;

// Re-export main types
pub use attribute::{Attribute, AttributeType, Value};
pub use container::{AttributesBuilder, HasAttributes, ImmutableAttributes};
pub use factory::AttributesFactory;
pub use matcher::AttributeMatcher;
pub use rules::{
    CompatibilityCheckResult, CompatibilityRule, CompatibilityRuleChain, DisambiguationRule,
    DisambiguationRuleChain, MultipleCandidatesResult, ValueOrdering,
};
pub use schema::{AttributeMatchingStrategy, AttributesSchema, FrozenSchema, MergedSchema};
pub use value::AttributeValue;

use sprig_core::error::SprigError;

/// Result type for attribute operations
pub type AttributeResult<T> = Result<T, SprigError>;
