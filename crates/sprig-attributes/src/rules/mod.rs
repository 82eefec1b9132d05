//! Compatibility and disambiguation rules.
//!
//! A compatibility rule looks at one (consumer, producer) value pair and may
//! declare it compatible or incompatible. A disambiguation rule looks at a
//! set of candidate values and may pick the closest matches. Rules that
//! express no opinion leave the decision to the next rule in the chain.

mod chain;
mod ordered;

pub use chain::{CompatibilityRuleChain, DisambiguationRuleChain};
pub use ordered::{OrderedCompatibilityRule, OrderedDisambiguationRule, ValueOrdering};

use indexmap::IndexSet;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use thiserror::Error;

use crate::attribute::Value;

/// Details handed to a compatibility rule
#[derive(Debug)]
pub struct CompatibilityCheckResult<'a> {
    consumer: &'a Value,
    producer: &'a Value,
    outcome: Option<bool>,
}

impl<'a> CompatibilityCheckResult<'a> {
    pub fn new(consumer: &'a Value, producer: &'a Value) -> Self {
        Self {
            consumer,
            producer,
            outcome: None,
        }
    }

    /// Requested value
    pub fn consumer_value(&self) -> &'a Value {
        self.consumer
    }

    /// Candidate value
    pub fn producer_value(&self) -> &'a Value {
        self.producer
    }

    pub fn compatible(&mut self) {
        self.outcome = Some(true);
    }

    pub fn incompatible(&mut self) {
        self.outcome = Some(false);
    }

    pub fn has_result(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn is_compatible(&self) -> bool {
        self.outcome == Some(true)
    }
}

/// Details handed to a disambiguation rule
#[derive(Debug)]
pub struct MultipleCandidatesResult<'a> {
    consumer: Option<&'a Value>,
    candidates: &'a IndexSet<Value>,
    matches: IndexSet<Value>,
}

impl<'a> MultipleCandidatesResult<'a> {
    pub fn new(consumer: Option<&'a Value>, candidates: &'a IndexSet<Value>) -> Self {
        Self {
            consumer,
            candidates,
            matches: IndexSet::new(),
        }
    }

    /// Requested value; `None` for attributes the consumer did not ask for
    pub fn consumer_value(&self) -> Option<&'a Value> {
        self.consumer
    }

    pub fn candidate_values(&self) -> &'a IndexSet<Value> {
        self.candidates
    }

    /// Mark a candidate value as one of the closest matches
    pub fn closest_match(&mut self, value: Value) {
        self.matches.insert(value);
    }

    pub fn has_result(&self) -> bool {
        !self.matches.is_empty()
    }

    pub fn matches(&self) -> &IndexSet<Value> {
        &self.matches
    }

    pub(crate) fn into_matches(self) -> IndexSet<Value> {
        self.matches
    }
}

/// Decides whether a producer value satisfies a consumer value
pub trait CompatibilityRule: Send + Sync {
    fn execute(&self, details: &mut CompatibilityCheckResult<'_>) -> anyhow::Result<()>;

    /// Name used when reporting a failure
    fn describe(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }
}

/// Picks the closest values among several compatible candidates
pub trait DisambiguationRule: Send + Sync {
    fn execute(&self, details: &mut MultipleCandidatesResult<'_>) -> anyhow::Result<()>;

    fn describe(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }
}

/// Compatibility rule backed by a closure
pub struct FnCompatibilityRule<F> {
    name: String,
    rule: F,
}

/// Disambiguation rule backed by a closure
pub struct FnDisambiguationRule<F> {
    name: String,
    rule: F,
}

impl<F> FnCompatibilityRule<F>
where
    F: Fn(&mut CompatibilityCheckResult<'_>) -> anyhow::Result<()> + Send + Sync,
{
    pub fn new(name: impl Into<String>, rule: F) -> Self {
        Self {
            name: name.into(),
            rule,
        }
    }
}

impl<F> CompatibilityRule for FnCompatibilityRule<F>
where
    F: Fn(&mut CompatibilityCheckResult<'_>) -> anyhow::Result<()> + Send + Sync,
{
    fn execute(&self, details: &mut CompatibilityCheckResult<'_>) -> anyhow::Result<()> {
        (self.rule)(details)
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}

impl<F> FnDisambiguationRule<F>
where
    F: Fn(&mut MultipleCandidatesResult<'_>) -> anyhow::Result<()> + Send + Sync,
{
    pub fn new(name: impl Into<String>, rule: F) -> Self {
        Self {
            name: name.into(),
            rule,
        }
    }
}

impl<F> DisambiguationRule for FnDisambiguationRule<F>
where
    F: Fn(&mut MultipleCandidatesResult<'_>) -> anyhow::Result<()> + Send + Sync,
{
    fn execute(&self, details: &mut MultipleCandidatesResult<'_>) -> anyhow::Result<()> {
        (self.rule)(details)
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}

/// A rule panicked instead of returning an error
#[derive(Debug, Error)]
#[error("rule panicked: {message}")]
pub struct RulePanicked {
    pub message: String,
}

/// Run a rule body, turning both errors and panics into one error type
pub(crate) fn guarded<F>(body: F) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    F: FnOnce() -> anyhow::Result<()>,
{
    match catch_unwind(AssertUnwindSafe(body)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(error)) => Err(error.into()),
        Err(payload) => Err(Box::new(RulePanicked {
            message: panic_message(payload.as_ref()),
        })),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
