//! Three-State Memo Cell
//!
//! Lazily resolved relationships need to remember not just a value but whether
//! a lookup has happened at all. `Memo` keeps those states apart so "resolved
//! to nothing" can be cached without a sentinel value.

/// Cache cell for a lazily resolved relationship
///
/// Distinguishes a lookup that has never run from one that ran and found
/// nothing. Accessors check `is_resolved` before querying and store either
/// outcome, so a repeated call never re-runs the lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Memo<T> {
    /// No lookup has run yet
    Unresolved,

    /// A lookup ran and found nothing
    Absent,

    /// A lookup ran and found a value
    Present(T),
}

// The derive would bound `T: Default`, which cached element types lack.
impl<T> Default for Memo<T> {
    fn default() -> Self {
        Memo::Unresolved
    }
}

impl<T> Memo<T> {
    /// Check whether a lookup outcome is already recorded
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Memo::Unresolved)
    }

    /// The cached value, if one was found
    pub fn value(&self) -> Option<&T> {
        match self {
            Memo::Present(value) => Some(value),
            _ => None,
        }
    }

    /// Record a lookup outcome
    pub fn set(&mut self, value: Option<T>) {
        *self = match value {
            Some(value) => Memo::Present(value),
            None => Memo::Absent,
        };
    }
}
