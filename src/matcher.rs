//! Term matching
//!
//! A candidate matches when every term occurs in it, ignoring case. Term
//! order does not matter and an empty term list matches everything.

/// Case-insensitive AND substring match
pub fn matches<T: AsRef<str>>(terms: &[T], candidate: &str) -> bool {
    if terms.is_empty() {
        return true;
    }
    TermMatcher::new(terms).matches(candidate)
}

/// Terms lowered once, for matching against many candidates
#[derive(Debug, Clone, Default)]
pub struct TermMatcher {
    terms: Vec<String>,
}

impl TermMatcher {
    pub fn new<T: AsRef<str>>(terms: &[T]) -> Self {
        Self {
            terms: terms.iter().map(|t| t.as_ref().to_lowercase()).collect(),
        }
    }

    /// True when no filtering takes place
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn matches(&self, candidate: &str) -> bool {
        if self.terms.is_empty() {
            return true;
        }
        let candidate = candidate.to_lowercase();
        self.terms.iter().all(|term| candidate.contains(term.as_str()))
    }
}
