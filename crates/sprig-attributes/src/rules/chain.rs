use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::trace;

use sprig_core::error::{SprigError, SprigResult};

use super::{
    guarded, CompatibilityCheckResult, CompatibilityRule, DisambiguationRule,
    FnCompatibilityRule, FnDisambiguationRule, MultipleCandidatesResult,
    OrderedCompatibilityRule, OrderedDisambiguationRule, ValueOrdering,
};
use crate::attribute::Attribute;

/// Ordered compatibility rules for one attribute
///
/// Rules run in registration order; the first rule that reaches a verdict
/// ends the chain.
#[derive(Clone, Default)]
pub struct CompatibilityRuleChain {
    rules: Vec<Arc<dyn CompatibilityRule>>,
}

/// Ordered disambiguation rules for one attribute
#[derive(Clone, Default)]
pub struct DisambiguationRuleChain {
    rules: Vec<Arc<dyn DisambiguationRule>>,
}

type BoxedError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
#[error("selected value {value} is not one of the candidate values")]
struct NotACandidate {
    value: String,
}

impl CompatibilityRuleChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<R: CompatibilityRule + 'static>(&mut self, rule: R) -> &mut Self {
        self.rules.push(Arc::new(rule));
        self
    }

    /// Add a closure rule reported under `name`
    pub fn add_fn<F>(&mut self, name: impl Into<String>, rule: F) -> &mut Self
    where
        F: Fn(&mut CompatibilityCheckResult<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.add(FnCompatibilityRule::new(name, rule))
    }

    /// Producer values at or below the consumer value are compatible
    pub fn ordered(&mut self, ordering: ValueOrdering) -> &mut Self {
        self.add(OrderedCompatibilityRule::new(ordering, false))
    }

    /// Producer values at or above the consumer value are compatible
    pub fn reverse_ordered(&mut self, ordering: ValueOrdering) -> &mut Self {
        self.add(OrderedCompatibilityRule::new(ordering, true))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub(crate) fn execute(
        &self,
        attribute: &Attribute,
        details: &mut CompatibilityCheckResult<'_>,
    ) -> SprigResult<()> {
        for rule in &self.rules {
            guarded(|| rule.execute(details)).map_err(|source| {
                SprigError::CompatibilityRuleFailed {
                    attribute: attribute.name().to_string(),
                    rule: rule.describe(),
                    consumer: details.consumer_value().to_string(),
                    producer: details.producer_value().to_string(),
                    source,
                }
            })?;
            if details.has_result() {
                trace!(
                    "{} decided {} vs {} for '{}': compatible={}",
                    rule.describe(),
                    details.consumer_value(),
                    details.producer_value(),
                    attribute,
                    details.is_compatible()
                );
                return Ok(());
            }
        }
        Ok(())
    }
}

impl DisambiguationRuleChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<R: DisambiguationRule + 'static>(&mut self, rule: R) -> &mut Self {
        self.rules.push(Arc::new(rule));
        self
    }

    /// Add a closure rule reported under `name`
    pub fn add_fn<F>(&mut self, name: impl Into<String>, rule: F) -> &mut Self
    where
        F: Fn(&mut MultipleCandidatesResult<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.add(FnDisambiguationRule::new(name, rule))
    }

    /// Prefer the lowest candidate at or above the requested value
    pub fn pick_first(&mut self, ordering: ValueOrdering) -> &mut Self {
        self.add(OrderedDisambiguationRule::new(ordering, false))
    }

    /// Prefer the highest candidate at or below the requested value
    pub fn pick_last(&mut self, ordering: ValueOrdering) -> &mut Self {
        self.add(OrderedDisambiguationRule::new(ordering, true))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub(crate) fn execute(
        &self,
        attribute: &Attribute,
        details: &mut MultipleCandidatesResult<'_>,
    ) -> SprigResult<()> {
        let requested = details.consumer_value();
        let candidates = details.candidate_values();

        for rule in &self.rules {
            let failed = |source: BoxedError| SprigError::DisambiguationRuleFailed {
                attribute: attribute.name().to_string(),
                rule: rule.describe(),
                requested: requested
                    .map(|value| value.to_string())
                    .unwrap_or_else(|| "none".to_string()),
                candidates: candidates
                    .iter()
                    .map(|value| value.to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
                source,
            };

            guarded(|| rule.execute(details)).map_err(&failed)?;

            if let Some(stray) = details
                .matches()
                .iter()
                .find(|value| !candidates.contains(*value))
            {
                let source: BoxedError = Box::new(NotACandidate {
                    value: stray.to_string(),
                });
                return Err(failed(source));
            }

            if details.has_result() {
                trace!(
                    "{} narrowed '{}' to {} value(s)",
                    rule.describe(),
                    attribute,
                    details.matches().len()
                );
                return Ok(());
            }
        }
        Ok(())
    }
}

impl fmt::Debug for CompatibilityRuleChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.rules.iter().map(|rule| rule.describe()))
            .finish()
    }
}

impl fmt::Debug for DisambiguationRuleChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.rules.iter().map(|rule| rule.describe()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::Value;
    use indexmap::IndexSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_first_verdict_ends_chain() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let mut chain = CompatibilityRuleChain::new();
        chain
            .add_fn("no-opinion", |_| Ok(()))
            .add_fn("always", |details| {
                details.compatible();
                Ok(())
            })
            .add_fn("counting", move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });

        let consumer = Value::from("a");
        let producer = Value::from("b");
        let mut details = CompatibilityCheckResult::new(&consumer, &producer);
        chain
            .execute(&Attribute::string("letter"), &mut details)
            .unwrap();

        assert!(details.is_compatible());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_failing_rule_is_wrapped() {
        let mut chain = CompatibilityRuleChain::new();
        chain.add_fn("BrokenRule", |_| Err(anyhow::anyhow!("cannot compare")));

        let consumer = Value::from("blue");
        let producer = Value::from("green");
        let mut details = CompatibilityCheckResult::new(&consumer, &producer);
        let error = chain
            .execute(&Attribute::string("color"), &mut details)
            .unwrap_err();

        match &error {
            SprigError::CompatibilityRuleFailed {
                attribute,
                rule,
                consumer,
                producer,
                ..
            } => {
                assert_eq!(attribute, "color");
                assert_eq!(rule, "BrokenRule");
                assert_eq!(consumer, "'blue'");
                assert_eq!(producer, "'green'");
            },
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(
            std::error::Error::source(&error).map(|e| e.to_string()),
            Some("cannot compare".to_string())
        );
    }

    #[test]
    fn test_stray_closest_match_is_rejected() {
        let mut chain = DisambiguationRuleChain::new();
        chain.add_fn("Stray", |details| {
            details.closest_match(Value::from("purple"));
            Ok(())
        });

        let candidates: IndexSet<Value> = ["red", "blue"].into_iter().map(Value::from).collect();
        let mut details = MultipleCandidatesResult::new(None, &candidates);
        let error = chain
            .execute(&Attribute::string("color"), &mut details)
            .unwrap_err();

        assert!(matches!(
            error,
            SprigError::DisambiguationRuleFailed { ref requested, .. } if requested == "none"
        ));
    }

    #[test]
    fn test_debug_lists_rule_names() {
        let mut chain = DisambiguationRuleChain::new();
        chain.add_fn("PreferRed", |_| Ok(()));
        assert_eq!(format!("{:?}", chain), "[\"PreferRed\"]");
    }
}
