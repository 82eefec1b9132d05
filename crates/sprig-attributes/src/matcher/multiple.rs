use indexmap::IndexSet;
use tracing::debug;

use sprig_core::error::SprigResult;

use crate::attribute::{Attribute, Value};
use crate::container::ImmutableAttributes;
use crate::schema::{DisambiguationSource, MergedSchema};

/// Narrows several candidates against one request
///
/// Works on candidate indices. `compatible` marks candidates that survive
/// the compatibility pass, `remaining` the ones still in the running while
/// disambiguating.
pub(crate) struct MultipleCandidateMatcher<'a> {
    schema: &'a MergedSchema,
    candidates: Vec<&'a ImmutableAttributes>,
    requested: &'a ImmutableAttributes,
    requested_attributes: Vec<Attribute>,
    requested_values: Vec<Value>,
    /// Candidate values, `candidates.len() * requested_attributes.len()`
    candidate_values: Vec<Option<Value>>,
    compatible: Vec<bool>,
    remaining: Vec<bool>,
    candidate_with_longest_match: Option<usize>,
    length_of_longest_match: usize,
}

impl<'a> MultipleCandidateMatcher<'a> {
    pub(crate) fn new(
        schema: &'a MergedSchema,
        candidates: Vec<&'a ImmutableAttributes>,
        requested: &'a ImmutableAttributes,
    ) -> Self {
        let (requested_attributes, requested_values): (Vec<Attribute>, Vec<Value>) = requested
            .iter()
            .map(|(attribute, value)| (attribute.clone(), value.clone()))
            .unzip();

        let candidate_values = candidates
            .iter()
            .flat_map(|candidate| {
                requested_attributes
                    .iter()
                    .map(move |attribute| candidate.find_entry(attribute).present())
            })
            .collect();

        let count = candidates.len();
        Self {
            schema,
            candidates,
            requested,
            requested_attributes,
            requested_values,
            candidate_values,
            compatible: vec![true; count],
            remaining: vec![false; count],
            candidate_with_longest_match: None,
            length_of_longest_match: 0,
        }
    }

    /// Indices of the best matching candidates, in candidate order
    ///
    /// Empty when no candidate is compatible. Never empty otherwise: if
    /// disambiguation eliminates everything, all compatible candidates are
    /// returned.
    pub(crate) fn get_matches(mut self) -> SprigResult<Vec<usize>> {
        self.find_compatible_candidates()?;
        let compatible = indices(&self.compatible);
        if compatible.len() <= 1 {
            return Ok(compatible);
        }

        if let Some(best) = self.candidate_with_longest_match {
            if self.longest_match_is_superset_of_all_others(best) {
                debug!("Candidate {} matches a superset of all other candidates", best);
                return Ok(vec![best]);
            }
        }

        self.disambiguate()?;
        let remaining = indices(&self.remaining);
        if remaining.is_empty() {
            return Ok(compatible);
        }
        Ok(remaining)
    }

    fn value(&self, candidate: usize, attribute: usize) -> Option<&Value> {
        self.candidate_values[candidate * self.requested_attributes.len() + attribute].as_ref()
    }

    fn find_compatible_candidates(&mut self) -> SprigResult<()> {
        if self.requested_attributes.is_empty() {
            return Ok(());
        }

        for c in 0..self.candidates.len() {
            let mut match_length = 0;
            for a in 0..self.requested_attributes.len() {
                let Some(candidate_value) = self.value(c, a) else {
                    continue;
                };
                let compatible = self.schema.match_value(
                    &self.requested_attributes[a],
                    &self.requested_values[a],
                    candidate_value,
                )?;
                if !compatible {
                    self.compatible[c] = false;
                    break;
                }
                match_length += 1;
            }
            if self.compatible[c] && match_length > self.length_of_longest_match {
                self.length_of_longest_match = match_length;
                self.candidate_with_longest_match = Some(c);
            }
        }
        Ok(())
    }

    fn longest_match_is_superset_of_all_others(&self, best: usize) -> bool {
        for c in indices(&self.compatible) {
            if c == best {
                continue;
            }
            let mut length_of_other_match = 0;
            for a in 0..self.requested_attributes.len() {
                if self.value(c, a).is_none() {
                    continue;
                }
                length_of_other_match += 1;
                if self.value(best, a).is_none() {
                    return false;
                }
            }
            if length_of_other_match == self.length_of_longest_match {
                return false;
            }
        }
        true
    }

    fn remaining_count(&self) -> usize {
        self.remaining.iter().filter(|r| **r).count()
    }

    fn disambiguate(&mut self) -> SprigResult<()> {
        self.remaining = self.compatible.clone();

        self.disambiguate_with_requested_values()?;
        if self.remaining_count() <= 1 {
            return Ok(());
        }

        let extra = self
            .schema
            .collect_extra_attributes(&self.candidates, self.requested);
        self.disambiguate_with_extra_attributes(&extra)?;
        if self.remaining_count() > 1 {
            self.prefer_candidates_without_extra_attributes(&extra);
        }
        Ok(())
    }

    fn disambiguate_with_requested_values(&mut self) -> SprigResult<()> {
        let precedence = self.schema.order_by_precedence(&self.requested_attributes);
        for a in precedence.sorted {
            self.disambiguate_requested_attribute(a)?;
            if self.remaining_count() <= 1 {
                return Ok(());
            }
        }
        for a in precedence.unsorted {
            self.disambiguate_requested_attribute(a)?;
            if self.remaining_count() == 0 {
                return Ok(());
            }
        }
        Ok(())
    }

    fn disambiguate_requested_attribute(&mut self, a: usize) -> SprigResult<()> {
        let candidate_values: IndexSet<Value> = indices(&self.compatible)
            .into_iter()
            .filter_map(|c| self.value(c, a).cloned())
            .collect();
        if candidate_values.len() <= 1 {
            return Ok(());
        }

        let attribute = &self.requested_attributes[a];
        let result = self.schema.disambiguate(
            attribute,
            Some(&self.requested_values[a]),
            &candidate_values,
        )?;
        if result.source == DisambiguationSource::NoPreference
            || result.values.len() >= candidate_values.len()
        {
            return Ok(());
        }

        // A candidate without a value cannot satisfy the choice
        for c in indices(&self.remaining) {
            let keep = self
                .value(c, a)
                .map(|value| result.values.contains(value))
                .unwrap_or(false);
            if !keep {
                self.remaining[c] = false;
            }
        }
        debug!(
            "Disambiguated '{}': {} candidate(s) remain",
            attribute,
            self.remaining_count()
        );
        Ok(())
    }

    fn disambiguate_with_extra_attributes(&mut self, extra: &[Attribute]) -> SprigResult<()> {
        let precedence = self.schema.order_by_precedence(extra);
        for index in precedence.sorted {
            let candidates = indices(&self.remaining);
            self.disambiguate_extra_attribute(&extra[index], &candidates)?;
            if self.remaining_count() <= 1 {
                return Ok(());
            }
        }

        // Unranked attributes all see the same candidates, whatever their order
        let candidates = indices(&self.remaining);
        for index in precedence.unsorted {
            self.disambiguate_extra_attribute(&extra[index], &candidates)?;
            if self.remaining_count() == 0 {
                return Ok(());
            }
        }
        Ok(())
    }

    fn disambiguate_extra_attribute(
        &mut self,
        attribute: &Attribute,
        candidates: &[usize],
    ) -> SprigResult<()> {
        let candidate_values: IndexSet<Value> = candidates
            .iter()
            .filter_map(|c| self.candidates[*c].find_entry(attribute).present())
            .collect();
        if candidate_values.is_empty() {
            return Ok(());
        }

        let result = self.schema.disambiguate(attribute, None, &candidate_values)?;
        if !result.decided_by_rule() {
            return Ok(());
        }

        for c in indices(&self.remaining) {
            let keep = self.candidates[c]
                .find_entry(attribute)
                .present()
                .map(|value| result.values.contains(&value))
                .unwrap_or(false);
            if !keep {
                self.remaining[c] = false;
            }
        }
        debug!(
            "Disambiguated extra attribute '{}': {} candidate(s) remain",
            attribute,
            self.remaining_count()
        );
        Ok(())
    }

    /// Prefer candidates that do not carry attributes only some candidates have
    ///
    /// May leave nothing remaining, in which case every compatible candidate
    /// is a match.
    fn prefer_candidates_without_extra_attributes(&mut self, extra: &[Attribute]) {
        if self.requested_attributes.is_empty() {
            return;
        }
        let candidate_count = self.candidates.len();
        for attribute in extra {
            let carrying: Vec<usize> = (0..candidate_count)
                .filter(|c| self.candidates[*c].contains(attribute.name()))
                .collect();
            if carrying.is_empty() || carrying.len() == candidate_count {
                continue;
            }
            for c in carrying {
                self.remaining[c] = false;
            }
            if self.remaining_count() == 0 {
                break;
            }
        }
    }
}

fn indices(set: &[bool]) -> Vec<usize> {
    set.iter()
        .enumerate()
        .filter_map(|(index, member)| member.then_some(index))
        .collect()
}
