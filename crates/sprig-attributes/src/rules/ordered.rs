use std::cmp::Ordering;

use super::{CompatibilityCheckResult, CompatibilityRule, DisambiguationRule, MultipleCandidatesResult};
use crate::attribute::Value;

/// How values of an ordered attribute compare
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueOrdering {
    /// Booleans false < true, text compared like versions (`8` < `11`)
    Natural,
    /// Position in the list; unlisted values are not comparable
    Ranked(Vec<Value>),
}

impl ValueOrdering {
    pub fn compare(&self, a: &Value, b: &Value) -> Option<Ordering> {
        match self {
            ValueOrdering::Natural => a.natural_cmp(b),
            ValueOrdering::Ranked(ranks) => {
                let a = ranks.iter().position(|v| v == a)?;
                let b = ranks.iter().position(|v| v == b)?;
                Some(a.cmp(&b))
            },
        }
    }
}

/// Compatibility by ordering: a producer value is compatible when it does not
/// exceed the consumer value (or is not below it when reversed)
#[derive(Debug, Clone)]
pub struct OrderedCompatibilityRule {
    ordering: ValueOrdering,
    reverse: bool,
}

impl OrderedCompatibilityRule {
    pub fn new(ordering: ValueOrdering, reverse: bool) -> Self {
        Self { ordering, reverse }
    }
}

impl CompatibilityRule for OrderedCompatibilityRule {
    fn execute(&self, details: &mut CompatibilityCheckResult<'_>) -> anyhow::Result<()> {
        let Some(order) = self
            .ordering
            .compare(details.producer_value(), details.consumer_value())
        else {
            return Ok(());
        };
        let compatible = if self.reverse {
            order != Ordering::Less
        } else {
            order != Ordering::Greater
        };
        if compatible {
            details.compatible();
        } else {
            details.incompatible();
        }
        Ok(())
    }

    fn describe(&self) -> String {
        if self.reverse {
            "reverse ordered compatibility".to_string()
        } else {
            "ordered compatibility".to_string()
        }
    }
}

/// Disambiguation by ordering
///
/// Picking first selects the lowest candidate at or above the requested
/// value; picking last selects the highest candidate at or below it. When no
/// candidate lies on that side, or nothing was requested, the overall
/// lowest (highest) comparable candidate wins.
#[derive(Debug, Clone)]
pub struct OrderedDisambiguationRule {
    ordering: ValueOrdering,
    pick_last: bool,
}

impl OrderedDisambiguationRule {
    pub fn new(ordering: ValueOrdering, pick_last: bool) -> Self {
        Self { ordering, pick_last }
    }

    fn best<'v>(&self, values: impl Iterator<Item = &'v Value>) -> Option<&'v Value> {
        values.fold(None, |best, value| match best {
            None => Some(value),
            Some(current) => {
                let better = match self.ordering.compare(value, current) {
                    Some(Ordering::Less) => !self.pick_last,
                    Some(Ordering::Greater) => self.pick_last,
                    _ => false,
                };
                Some(if better { value } else { current })
            },
        })
    }
}

impl DisambiguationRule for OrderedDisambiguationRule {
    fn execute(&self, details: &mut MultipleCandidatesResult<'_>) -> anyhow::Result<()> {
        let candidates = details.candidate_values();
        let comparable: Vec<&Value> = match details.consumer_value() {
            Some(requested) => candidates
                .iter()
                .filter(|value| self.ordering.compare(value, requested).is_some())
                .collect(),
            None => candidates
                .iter()
                .filter(|value| self.ordering.compare(value, value).is_some())
                .collect(),
        };

        let on_side = details.consumer_value().and_then(|requested| {
            self.best(comparable.iter().copied().filter(|value| {
                match self.ordering.compare(value, requested) {
                    Some(Ordering::Less) => self.pick_last,
                    Some(Ordering::Greater) => !self.pick_last,
                    Some(Ordering::Equal) => true,
                    None => false,
                }
            }))
        });

        if let Some(choice) = on_side.or_else(|| self.best(comparable.iter().copied())) {
            details.closest_match(choice.clone());
        }
        Ok(())
    }

    fn describe(&self) -> String {
        if self.pick_last {
            "ordered disambiguation (pick last)".to_string()
        } else {
            "ordered disambiguation (pick first)".to_string()
        }
    }
}
