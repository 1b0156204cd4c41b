//! Revision - totally ordered commit identity for stored documents
//!
//! Every commit is assigned the next revision. Each document written by a
//! commit carries that revision until it is written again. Transactions
//! remember the revision they read and the store refuses the commit if any
//! of those revisions has moved.

use serde::{Deserialize, Serialize};

/// A totally ordered, opaque commit identity.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct Revision(u64);

impl Revision {
    /// Creates a revision with the given value.
    #[inline]
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the underlying value.
    #[inline]
    pub fn value(&self) -> u64 {
        self.0
    }

    /// The revision assigned to the commit after this one
    #[inline]
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "r{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revision_next_is_strictly_greater() {
        let r = Revision::new(41);
        assert_eq!(r.next(), Revision::new(42));
        assert!(r.next() > r);
    }

    #[test]
    fn test_revision_display() {
        assert_eq!(Revision::new(7).to_string(), "r7");
    }
}
