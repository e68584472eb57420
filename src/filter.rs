//! Hardcoded content filter.
//!
//! Runs on the raw query before anything else so the checker can never be
//! used to search the database for slurs. Matching is a case-insensitive
//! substring test; every matched term is reported.

use regex::{RegexSet, RegexSetBuilder};

use crate::error::Result;

/// Terms rejected outright. Shared by every entry point of the checker.
///
/// Matching is by substring, so stems that also occur inside ordinary words
/// (tycoon, spicy, skyscraper, fire retardant) are left out.
pub const DEFAULT_DENYLIST: &[&str] = &[
    "nigger",
    "nigga",
    "faggot",
    "fag",
    "gay",
    "dyke",
    "kike",
    "chink",
    "wetback",
    "beaner",
    "gook",
    "raghead",
    "towelhead",
    "kill yourself",
    "kill urself",
    "heil hitler",
    "sieg heil",
    "white power",
    "white pride",
    "gas the jews",
];

/// Compiled denylist.
pub struct TermSet {
    terms: Vec<String>,
    set: RegexSet,
}

impl TermSet {
    /// Compile a denylist. Blank terms are dropped.
    ///
    /// Returns an error if the combined set fails to compile.
    pub fn new<S: AsRef<str>>(terms: &[S]) -> Result<Self> {
        let terms: Vec<String> = terms
            .iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        let set = RegexSetBuilder::new(terms.iter().map(|t| regex::escape(t)))
            .case_insensitive(true)
            .build()?;
        Ok(Self { terms, set })
    }

    /// The built-in denylist.
    pub fn default_terms() -> Result<Self> {
        Self::new(DEFAULT_DENYLIST)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    fn matches(&self, content: &str) -> Vec<String> {
        self.set
            .matches(content)
            .into_iter()
            .map(|idx| self.terms[idx].clone())
            .collect()
    }
}

/// Content filter over a fixed denylist.
pub struct ContentFilter {
    terms: TermSet,
}

impl ContentFilter {
    pub fn new(terms: TermSet) -> Self {
        tracing::debug!(terms = terms.len(), "Content filter loaded");
        Self { terms }
    }

    /// Return every denylisted term found in the trimmed query.
    ///
    /// An empty vector means the query passed.
    pub fn filter_slurs(&self, raw: &str) -> Vec<String> {
        self.terms.matches(raw.trim())
    }
}
