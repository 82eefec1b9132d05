//! Version selectors and the scheme that parses them.
//!
//! Content filters only need "does this selector accept that version", so a
//! selector is a small trait object. The default scheme understands:
//! - exact versions: `1.0`
//! - prefixes: `1.2.+`, `+`
//! - latest status: `latest.release`, `latest.integration`
//! - ranges: `[1.0,2.0)`, `(,1.5]`, `[1.0,)`, `]1.0,2.0[`, `[1.0]`

use std::fmt;
use std::sync::Arc;

use crate::error::{SprigError, SprigResult};
use crate::types::Version;

/// Decides whether a candidate version is acceptable
pub trait VersionSelector: fmt::Debug + Send + Sync {
    /// Check if the candidate version string is accepted
    fn accept(&self, candidate: &str) -> bool;

    /// The selector text this was parsed from
    fn selector(&self) -> &str;

    /// Check if this selector can accept more than one version
    fn is_dynamic(&self) -> bool {
        true
    }
}

/// Parses selector strings into selectors
///
/// Implementations must be pure: the same input always produces an
/// equivalent selector, so parsed selectors may be memoized by text.
pub trait VersionSelectorScheme: fmt::Debug + Send + Sync {
    fn parse_selector(&self, selector: &str) -> SprigResult<Arc<dyn VersionSelector>>;
}

/// Scheme supporting exact, prefix, latest and range selectors
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultVersionSelectorScheme;

/// Accepts exactly one version (by natural ordering equality)
#[derive(Debug, Clone)]
pub struct ExactVersionSelector {
    selector: String,
    version: Version,
}

/// Accepts versions that start with the given parts (`1.2.+`)
#[derive(Debug, Clone)]
pub struct PrefixVersionSelector {
    selector: String,
    prefix: Option<Version>,
}

/// Accepts any version (`latest.release`)
#[derive(Debug, Clone)]
pub struct LatestVersionSelector {
    selector: String,
    status: String,
}

/// Accepts versions within bounds
#[derive(Debug, Clone)]
pub struct VersionRangeSelector {
    selector: String,
    lower: Option<(Version, bool)>,
    upper: Option<(Version, bool)>,
}

impl VersionSelectorScheme for DefaultVersionSelectorScheme {
    fn parse_selector(&self, selector: &str) -> SprigResult<Arc<dyn VersionSelector>> {
        let text = selector.trim();
        if text.is_empty() {
            return Err(SprigError::InvalidVersionSelector {
                selector: selector.to_string(),
                reason: "selector is empty".to_string(),
            });
        }

        if is_range(text) {
            return Ok(Arc::new(VersionRangeSelector::parse(text)?));
        }
        if let Some(status) = text.strip_prefix("latest.") {
            return Ok(Arc::new(LatestVersionSelector {
                selector: text.to_string(),
                status: status.to_string(),
            }));
        }
        if text == "+" {
            return Ok(Arc::new(PrefixVersionSelector {
                selector: text.to_string(),
                prefix: None,
            }));
        }
        if let Some(prefix) = text.strip_suffix('+') {
            let prefix = prefix.trim_end_matches(['.', '-', '_']);
            if prefix.is_empty() {
                return Err(SprigError::InvalidVersionSelector {
                    selector: text.to_string(),
                    reason: "prefix selector has no prefix".to_string(),
                });
            }
            return Ok(Arc::new(PrefixVersionSelector {
                selector: text.to_string(),
                prefix: Some(Version::parse(prefix)?),
            }));
        }

        Ok(Arc::new(ExactVersionSelector {
            selector: text.to_string(),
            version: Version::parse(text)?,
        }))
    }
}

fn is_range(text: &str) -> bool {
    let starts = text.starts_with('[') || text.starts_with('(') || text.starts_with(']');
    let ends = text.ends_with(']') || text.ends_with(')') || text.ends_with('[');
    starts && ends && text.len() >= 2
}

impl VersionRangeSelector {
    fn parse(text: &str) -> SprigResult<Self> {
        let invalid = |reason: &str| SprigError::InvalidVersionSelector {
            selector: text.to_string(),
            reason: reason.to_string(),
        };

        let lower_inclusive = text.starts_with('[');
        let upper_inclusive = text.ends_with(']');
        let inner = &text[1..text.len() - 1];

        let (lower, upper) = match inner.split_once(',') {
            Some((lower, upper)) => (lower.trim(), upper.trim()),
            None => {
                // [1.0] pins a single version
                if !(lower_inclusive && upper_inclusive) || inner.trim().is_empty() {
                    return Err(invalid("single-version range must use [version]"));
                }
                (inner.trim(), inner.trim())
            },
        };
        if upper.contains(',') {
            return Err(invalid("range has more than two bounds"));
        }
        if lower.is_empty() && upper.is_empty() {
            return Err(invalid("range has no bounds"));
        }

        let lower = if lower.is_empty() {
            None
        } else {
            Some((Version::parse(lower)?, lower_inclusive))
        };
        let upper = if upper.is_empty() {
            None
        } else {
            Some((Version::parse(upper)?, upper_inclusive))
        };

        if let (Some((low, _)), Some((high, _))) = (&lower, &upper) {
            if low > high {
                return Err(invalid("lower bound is greater than upper bound"));
            }
        }

        Ok(Self {
            selector: text.to_string(),
            lower,
            upper,
        })
    }
}

impl VersionSelector for ExactVersionSelector {
    fn accept(&self, candidate: &str) -> bool {
        Version::parse(candidate)
            .map(|candidate| candidate == self.version)
            .unwrap_or(false)
    }

    fn selector(&self) -> &str {
        &self.selector
    }

    fn is_dynamic(&self) -> bool {
        false
    }
}

impl VersionSelector for PrefixVersionSelector {
    fn accept(&self, candidate: &str) -> bool {
        match (&self.prefix, Version::parse(candidate)) {
            (None, Ok(_)) => true,
            (Some(prefix), Ok(candidate)) => candidate.starts_with(prefix),
            (_, Err(_)) => false,
        }
    }

    fn selector(&self) -> &str {
        &self.selector
    }
}

impl VersionSelector for LatestVersionSelector {
    fn accept(&self, candidate: &str) -> bool {
        // Status metadata is not available at filtering time.
        !candidate.trim().is_empty()
    }

    fn selector(&self) -> &str {
        &self.selector
    }
}

impl LatestVersionSelector {
    /// Requested status (`release`, `integration`, ...)
    pub fn status(&self) -> &str {
        &self.status
    }
}

impl VersionSelector for VersionRangeSelector {
    fn accept(&self, candidate: &str) -> bool {
        let Ok(candidate) = Version::parse(candidate) else {
            return false;
        };
        let lower_ok = match &self.lower {
            Some((bound, true)) => &candidate >= bound,
            Some((bound, false)) => &candidate > bound,
            None => true,
        };
        let upper_ok = match &self.upper {
            Some((bound, true)) => &candidate <= bound,
            Some((bound, false)) => &candidate < bound,
            None => true,
        };
        lower_ok && upper_ok
    }

    fn selector(&self) -> &str {
        &self.selector
    }

    fn is_dynamic(&self) -> bool {
        match (&self.lower, &self.upper) {
            (Some((low, true)), Some((high, true))) => low != high,
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(selector: &str) -> Arc<dyn VersionSelector> {
        DefaultVersionSelectorScheme.parse_selector(selector).unwrap()
    }

    #[test]
    fn test_exact_selector() {
        let selector = parse("1.0");
        assert!(selector.accept("1.0"));
        assert!(!selector.accept("1.0.0"));
        assert!(!selector.accept("1.1"));
        assert!(!selector.is_dynamic());
    }

    #[test]
    fn test_prefix_selector() {
        let selector = parse("1.2.+");
        assert!(selector.accept("1.2.0"));
        assert!(selector.accept("1.2.17"));
        assert!(!selector.accept("1.20.0"));
        assert!(!selector.accept("1.3"));

        assert!(parse("+").accept("42"));
    }

    #[test]
    fn test_latest_selector() {
        let selector = parse("latest.release");
        assert!(selector.accept("0.0.1"));
        assert!(selector.is_dynamic());
    }

    #[test]
    fn test_range_selector() {
        let selector = parse("[1.0,2.0)");
        assert!(selector.accept("1.0"));
        assert!(selector.accept("1.9.9"));
        assert!(!selector.accept("2.0"));
        assert!(!selector.accept("0.9"));

        let open_lower = parse("(,1.5]");
        assert!(open_lower.accept("0.1"));
        assert!(open_lower.accept("1.5"));
        assert!(!open_lower.accept("1.6"));

        let ivy_exclusive = parse("]1.0,2.0[");
        assert!(!ivy_exclusive.accept("1.0"));
        assert!(ivy_exclusive.accept("1.5"));
        assert!(!ivy_exclusive.accept("2.0"));

        let pinned = parse("[1.0]");
        assert!(pinned.accept("1.0"));
        assert!(!pinned.accept("1.0.1"));
        assert!(!pinned.is_dynamic());
    }

    #[test]
    fn test_invalid_selectors() {
        let scheme = DefaultVersionSelectorScheme;
        assert!(scheme.parse_selector("").is_err());
        assert!(scheme.parse_selector("[2.0,1.0]").is_err());
        assert!(scheme.parse_selector("[,]").is_err());
        assert!(scheme.parse_selector("(1.0)").is_err());
        assert!(scheme.parse_selector(".+").is_err());
    }

    #[test]
    fn test_selector_text_is_kept() {
        assert_eq!(parse(" [1.0,) ").selector(), "[1.0,)");
    }
}
