//! Attribute matcher.
//!
//! Answers three questions for a merged consumer/producer schema:
//! - is this candidate value compatible with the requested value?
//! - is this candidate container compatible with the requested container?
//! - which of these candidates best match the request?

mod multiple;

#[cfg(test)]
mod tests;

use std::sync::Arc;
use tracing::debug;

use sprig_core::error::SprigResult;

use crate::attribute::{Attribute, Value};
use crate::container::{HasAttributes, ImmutableAttributes};
use crate::schema::MergedSchema;
use multiple::MultipleCandidateMatcher;

/// Thread-safe matcher over a merged schema
#[derive(Debug, Clone)]
pub struct AttributeMatcher {
    schema: Arc<MergedSchema>,
}

impl AttributeMatcher {
    pub fn new(schema: MergedSchema) -> Self {
        Self {
            schema: Arc::new(schema),
        }
    }

    pub fn schema(&self) -> &MergedSchema {
        &self.schema
    }

    /// Check a single candidate value against a requested value
    pub fn is_matching_value(
        &self,
        attribute: &Attribute,
        requested: &Value,
        candidate: &Value,
    ) -> SprigResult<bool> {
        self.schema.match_value(attribute, requested, candidate)
    }

    /// Check every requested attribute the candidate carries
    ///
    /// Attributes the candidate does not carry are ignored.
    pub fn is_matching_candidate(
        &self,
        candidate: &ImmutableAttributes,
        requested: &ImmutableAttributes,
    ) -> SprigResult<bool> {
        for (attribute, requested_value) in requested.iter() {
            let Some(candidate_value) = candidate.find_entry(attribute).present() else {
                continue;
            };
            if !self
                .schema
                .match_value(attribute, requested_value, &candidate_value)?
            {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Select the best matching candidates, in candidate order
    ///
    /// With no compatible candidate the result is the fallback, or empty
    /// when none was supplied. The fallback is returned as is; it is not
    /// matched against `requested`. Several equally good candidates are all
    /// returned; picking one is left to the caller.
    pub fn matches<'c, T: HasAttributes>(
        &self,
        candidates: &'c [T],
        requested: &ImmutableAttributes,
        fallback: Option<&'c T>,
    ) -> SprigResult<Vec<&'c T>> {
        let selected = match candidates {
            [] => Vec::new(),
            [only] => {
                if self.is_matching_candidate(only.attributes(), requested)? {
                    vec![0]
                } else {
                    Vec::new()
                }
            },
            _ => {
                let containers = candidates.iter().map(|c| c.attributes()).collect();
                MultipleCandidateMatcher::new(&self.schema, containers, requested).get_matches()?
            },
        };

        if selected.is_empty() {
            debug!(
                "No compatible candidate among {} for {}{}",
                candidates.len(),
                requested,
                if fallback.is_some() { ", using fallback" } else { "" }
            );
            return Ok(fallback.into_iter().collect());
        }

        debug!(
            "Selected {} of {} candidate(s) for {}",
            selected.len(),
            candidates.len(),
            requested
        );
        Ok(selected.into_iter().map(|index| &candidates[index]).collect())
    }
}
