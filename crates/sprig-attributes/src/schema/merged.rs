use indexmap::IndexSet;
use std::sync::Arc;
use tracing::trace;

use sprig_core::error::SprigResult;

use super::FrozenSchema;
use crate::attribute::{Attribute, Value};
use crate::container::ImmutableAttributes;
use crate::rules::{CompatibilityCheckResult, MultipleCandidatesResult};
use crate::value::AttributeValue;

/// Consumer and producer schemas viewed as one
///
/// Consumer rules always run before producer rules.
#[derive(Debug, Clone)]
pub struct MergedSchema {
    consumer: Arc<FrozenSchema>,
    producer: Arc<FrozenSchema>,
}

/// Who settled a disambiguation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisambiguationSource {
    ConsumerRule,
    ProducerRule,
    RequestedValue,
    /// Nobody expressed a preference; every candidate value is kept
    NoPreference,
}

/// Values retained by a disambiguation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disambiguation {
    pub values: IndexSet<Value>,
    pub source: DisambiguationSource,
}

impl Disambiguation {
    /// Check if a rule (rather than the fallbacks) made the choice
    pub fn decided_by_rule(&self) -> bool {
        matches!(
            self.source,
            DisambiguationSource::ConsumerRule | DisambiguationSource::ProducerRule
        )
    }
}

/// Requested attributes split by precedence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrecedenceResult {
    /// Indices of attributes with a declared precedence, in precedence order
    pub sorted: Vec<usize>,
    /// Remaining indices, in request order
    pub unsorted: Vec<usize>,
}

impl MergedSchema {
    pub fn new(consumer: Arc<FrozenSchema>, producer: Arc<FrozenSchema>) -> Self {
        Self { consumer, producer }
    }

    pub fn consumer(&self) -> &FrozenSchema {
        &self.consumer
    }

    pub fn producer(&self) -> &FrozenSchema {
        &self.producer
    }

    /// Check if either schema declares an attribute with this name
    pub fn declares(&self, name: &str) -> bool {
        self.consumer.attribute_by_name(name).is_some()
            || self.producer.attribute_by_name(name).is_some()
    }

    /// Schema-level attribute for a name, consumer first
    pub fn attribute_by_name(&self, name: &str) -> Option<&Attribute> {
        self.consumer
            .attribute_by_name(name)
            .or_else(|| self.producer.attribute_by_name(name))
    }

    /// Look up an attribute in a container through the schema
    pub fn value_of(
        &self,
        attribute: &Attribute,
        attributes: &ImmutableAttributes,
    ) -> AttributeValue<Value> {
        if !self.declares(attribute.name()) {
            return AttributeValue::Unknown;
        }
        attributes.find_entry(attribute)
    }

    /// Check whether a candidate value satisfies a requested value
    ///
    /// Equal values always match. Otherwise consumer rules, then producer
    /// rules, get a chance to decide; with no verdict the values are
    /// incompatible.
    pub fn match_value(
        &self,
        attribute: &Attribute,
        requested: &Value,
        candidate: &Value,
    ) -> SprigResult<bool> {
        if requested == candidate {
            return Ok(true);
        }

        let mut details = CompatibilityCheckResult::new(requested, candidate);
        for schema in [&self.consumer, &self.producer] {
            if let Some(strategy) = schema.strategy(attribute.name()) {
                strategy
                    .compatibility_rules()
                    .execute(attribute, &mut details)?;
                if details.has_result() {
                    return Ok(details.is_compatible());
                }
            }
        }
        Ok(false)
    }

    /// Narrow a set of candidate values for one attribute
    pub fn disambiguate(
        &self,
        attribute: &Attribute,
        requested: Option<&Value>,
        candidates: &IndexSet<Value>,
    ) -> SprigResult<Disambiguation> {
        let sources = [
            (&self.consumer, DisambiguationSource::ConsumerRule),
            (&self.producer, DisambiguationSource::ProducerRule),
        ];
        for (schema, source) in sources {
            let Some(strategy) = schema.strategy(attribute.name()) else {
                continue;
            };
            if strategy.disambiguation_rules().is_empty() {
                continue;
            }
            let mut details = MultipleCandidatesResult::new(requested, candidates);
            strategy
                .disambiguation_rules()
                .execute(attribute, &mut details)?;
            if details.has_result() {
                return Ok(Disambiguation {
                    values: details.into_matches(),
                    source,
                });
            }
        }

        if let Some(requested) = requested {
            if candidates.contains(requested) {
                return Ok(Disambiguation {
                    values: IndexSet::from([requested.clone()]),
                    source: DisambiguationSource::RequestedValue,
                });
            }
        }

        trace!("No preference for '{}' among {} value(s)", attribute, candidates.len());
        Ok(Disambiguation {
            values: candidates.clone(),
            source: DisambiguationSource::NoPreference,
        })
    }

    /// Order requested attributes by the declared precedence
    ///
    /// Consumer precedence comes first, then any producer precedence for
    /// attributes the consumer did not rank.
    pub fn order_by_precedence(&self, requested: &[Attribute]) -> PrecedenceResult {
        let mut result = PrecedenceResult::default();
        let mut placed = vec![false; requested.len()];

        let precedence = self
            .consumer
            .precedence()
            .iter()
            .chain(self.producer.precedence().iter());
        for ranked in precedence {
            if let Some(index) = requested
                .iter()
                .position(|attribute| attribute.name() == ranked.name())
            {
                if !placed[index] {
                    placed[index] = true;
                    result.sorted.push(index);
                }
            }
        }

        result.unsorted = (0..requested.len()).filter(|index| !placed[*index]).collect();
        result
    }

    /// Attributes present on candidates but absent from the request
    ///
    /// Each attribute appears once, typed by the schema when declared.
    pub fn collect_extra_attributes(
        &self,
        candidates: &[&ImmutableAttributes],
        requested: &ImmutableAttributes,
    ) -> Vec<Attribute> {
        let mut seen = IndexSet::new();
        let mut extra = Vec::new();
        for candidate in candidates {
            for attribute in candidate.keys() {
                if requested.contains(attribute.name()) || !seen.insert(attribute.name()) {
                    continue;
                }
                let attribute = self
                    .attribute_by_name(attribute.name())
                    .unwrap_or(attribute)
                    .clone();
                extra.push(attribute);
            }
        }
        extra
    }
}
