//! Tri-state attribute lookups.

/// Result of looking up an attribute for one side of a match
///
/// `Missing` means the schema knows the attribute but no value was given
/// (don't care). `Unknown` means the schema does not declare the attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeValue<T> {
    Present(T),
    Missing,
    Unknown,
}

impl<T> AttributeValue<T> {
    pub fn is_present(&self) -> bool {
        matches!(self, AttributeValue::Present(_))
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, AttributeValue::Missing)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, AttributeValue::Unknown)
    }

    /// Unwrap a present value
    ///
    /// # Panics
    ///
    /// Panics when the value is `Missing` or `Unknown`; callers must check
    /// [`AttributeValue::is_present`] first.
    #[track_caller]
    pub fn get(self) -> T {
        match self {
            AttributeValue::Present(value) => value,
            AttributeValue::Missing => panic!("No value provided for a missing attribute"),
            AttributeValue::Unknown => panic!("No value provided for an unknown attribute"),
        }
    }

    pub fn as_ref(&self) -> AttributeValue<&T> {
        match self {
            AttributeValue::Present(value) => AttributeValue::Present(value),
            AttributeValue::Missing => AttributeValue::Missing,
            AttributeValue::Unknown => AttributeValue::Unknown,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> AttributeValue<U> {
        match self {
            AttributeValue::Present(value) => AttributeValue::Present(f(value)),
            AttributeValue::Missing => AttributeValue::Missing,
            AttributeValue::Unknown => AttributeValue::Unknown,
        }
    }

    /// Present value as an option, collapsing `Missing` and `Unknown`
    pub fn present(self) -> Option<T> {
        match self {
            AttributeValue::Present(value) => Some(value),
            _ => None,
        }
    }
}
