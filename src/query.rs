//! Gmail search query composition
//!
//! Every pass filters server-side: the query string is a conjunction of
//! location, star, and label predicates, and no filtering happens on the
//! results afterwards.

use std::fmt;

/// Builder for a conjunctive Gmail search query
///
/// Terms are joined with spaces, which Gmail interprets as AND. Negation is
/// expressed with a leading `-` on the term.
#[derive(Debug, Clone, Default)]
pub struct Query {
    terms: Vec<String>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to threads currently in the inbox
    pub fn in_inbox(mut self) -> Self {
        self.terms.push("in:inbox".to_string());
        self
    }

    /// Restrict to threads not in the inbox (archived or otherwise filed away)
    pub fn not_in_inbox(mut self) -> Self {
        self.terms.push("-in:inbox".to_string());
        self
    }

    /// Exclude starred threads
    pub fn not_starred(mut self) -> Self {
        self.terms.push("-is:starred".to_string());
        self
    }

    /// Require the named label to be present
    pub fn with_label(mut self, name: &str) -> Self {
        self.terms.push(format!("label:{}", name));
        self
    }

    /// Require the named label to be absent
    pub fn without_label(mut self, name: &str) -> Self {
        self.terms.push(format!("-label:{}", name));
        self
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.terms.join(" "))
    }
}
