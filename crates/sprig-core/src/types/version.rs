//! Version strings with natural ordering.
//!
//! Versions in module repositories are free-form: `1.0`, `2.3.1-rc1`,
//! `1.0.0.Final`. A version is split into numeric and qualifier parts on
//! `.`, `-`, `_`, `+` and digit/letter boundaries, and compared part by part.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::SprigError;

/// A parsed version, keeping the original text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Version {
    source: String,
    parts: Vec<VersionPart>,
}

/// One component of a version
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VersionPart {
    Numeric(u64),
    Qualifier(String),
}

impl Version {
    /// Parse a version string, never failing on non-empty input
    pub fn parse(input: &str) -> Result<Self, SprigError> {
        let source = input.trim();
        if source.is_empty() {
            return Err(SprigError::invalid_argument("Version cannot be empty"));
        }
        Ok(Self {
            source: source.to_string(),
            parts: split_parts(source),
        })
    }

    /// Original version text
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Parsed components
    pub fn parts(&self) -> &[VersionPart] {
        &self.parts
    }

    /// Check if this version carries a qualifier (`-rc1`, `.Beta`, ...)
    pub fn is_qualified(&self) -> bool {
        self.parts
            .iter()
            .any(|part| matches!(part, VersionPart::Qualifier(_)))
    }

    /// Check if this version's parts begin with `prefix`'s parts
    pub fn starts_with(&self, prefix: &Version) -> bool {
        prefix.parts.len() <= self.parts.len()
            && prefix.parts.iter().zip(self.parts.iter()).all(|(a, b)| a == b)
    }
}

fn split_parts(source: &str) -> Vec<VersionPart> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_numeric = false;

    for ch in source.chars() {
        if matches!(ch, '.' | '-' | '_' | '+') {
            flush_part(&mut current, current_numeric, &mut parts);
            continue;
        }
        let numeric = ch.is_ascii_digit();
        if !current.is_empty() && numeric != current_numeric {
            flush_part(&mut current, current_numeric, &mut parts);
        }
        current_numeric = numeric;
        current.push(ch);
    }
    flush_part(&mut current, current_numeric, &mut parts);
    parts
}

fn flush_part(current: &mut String, numeric: bool, parts: &mut Vec<VersionPart>) {
    if current.is_empty() {
        return;
    }
    let part = match current.parse::<u64>() {
        Ok(n) if numeric => VersionPart::Numeric(n),
        _ => VersionPart::Qualifier(current.clone()),
    };
    parts.push(part);
    current.clear();
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl std::hash::Hash for Version {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.parts.hash(state);
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        for (a, b) in self.parts.iter().zip(other.parts.iter()) {
            let ordering = match (a, b) {
                (VersionPart::Numeric(x), VersionPart::Numeric(y)) => x.cmp(y),
                (VersionPart::Numeric(_), VersionPart::Qualifier(_)) => Ordering::Greater,
                (VersionPart::Qualifier(_), VersionPart::Numeric(_)) => Ordering::Less,
                (VersionPart::Qualifier(x), VersionPart::Qualifier(y)) => x.cmp(y),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }

        // 1.0.1 > 1.0, but 1.0 > 1.0-rc1
        match self.parts.len().cmp(&other.parts.len()) {
            Ordering::Equal => Ordering::Equal,
            Ordering::Greater => match &self.parts[other.parts.len()] {
                VersionPart::Numeric(_) => Ordering::Greater,
                VersionPart::Qualifier(_) => Ordering::Less,
            },
            Ordering::Less => match &other.parts[self.parts.len()] {
                VersionPart::Numeric(_) => Ordering::Less,
                VersionPart::Qualifier(_) => Ordering::Greater,
            },
        }
    }
}

impl FromStr for Version {
    type Err = SprigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
