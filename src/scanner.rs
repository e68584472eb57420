//! IP and Code of Conduct keyword scanners.
//!
//! Both run on the lower-cased processed input ahead of the blacklist
//! matcher. A bypass keyword present in the input suppresses every hit of
//! its own category and nothing else.

use serde::{Deserialize, Serialize};

use crate::models::{CheckResult, ContextualPattern};
use crate::normalize::NormalizedInput;

/// Suffix marking a COC keyword as pattern-only.
pub const PATTERN_MARKER_SUFFIX: char = ':';

/// Intellectual-property / TOS keyword rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpRules {
    #[serde(default)]
    pub violation_keywords: Vec<String>,
    #[serde(default)]
    pub bypass_keywords: Vec<String>,
}

/// Code of Conduct keyword rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CocRules {
    /// Direct keywords; entries ending in `:` are pattern markers and never match directly.
    #[serde(default)]
    pub violation_keywords: Vec<String>,
    #[serde(default)]
    pub bypass_keywords: Vec<String>,
    #[serde(default)]
    pub patterns: Vec<ContextualPattern>,
}

impl IpRules {
    /// Scan the input for IP violation keywords.
    pub fn check(&self, input: &NormalizedInput) -> CheckResult {
        let haystack = input.haystack();
        if let Some(bypass) = find_any(&haystack, &self.bypass_keywords) {
            tracing::debug!(bypass = %bypass, "IP bypass keyword present");
            return CheckResult::Clear;
        }

        let keywords = contained_keywords(&haystack, self.violation_keywords.iter());
        if keywords.is_empty() {
            CheckResult::Clear
        } else {
            CheckResult::IpViolation { keywords }
        }
    }
}

impl CocRules {
    /// Scan the input for COC keywords and contextual patterns.
    pub fn check(&self, input: &NormalizedInput) -> CheckResult {
        let haystack = input.haystack();
        if let Some(bypass) = find_any(&haystack, &self.bypass_keywords) {
            tracing::debug!(bypass = %bypass, "COC bypass keyword present");
            return CheckResult::Clear;
        }

        let direct = self
            .violation_keywords
            .iter()
            .filter(|k| !k.trim_end().ends_with(PATTERN_MARKER_SUFFIX));
        let mut keywords = contained_keywords(&haystack, direct);

        for pattern in &self.patterns {
            let context = pattern.context().trim().to_lowercase();
            let violation = pattern.violation().trim().to_lowercase();
            if context.is_empty() || violation.is_empty() {
                continue;
            }
            if haystack.contains(&context) && haystack.contains(&violation) {
                let label = ContextualPattern::new(context, violation).to_string();
                if !keywords.contains(&label) {
                    keywords.push(label);
                }
            }
        }

        if keywords.is_empty() {
            CheckResult::Clear
        } else {
            CheckResult::CocViolation { keywords }
        }
    }
}

/// Lower-cased keywords contained in `haystack`, de-duplicated, in list order.
fn contained_keywords<'a>(haystack: &str, keywords: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut hits: Vec<String> = Vec::new();
    for keyword in keywords {
        let keyword = keyword.trim().to_lowercase();
        if !keyword.is_empty() && haystack.contains(&keyword) && !hits.contains(&keyword) {
            hits.push(keyword);
        }
    }
    hits
}

fn find_any<'a>(haystack: &str, keywords: &'a [String]) -> Option<&'a str> {
    keywords
        .iter()
        .map(|k| k.trim())
        .find(|k| !k.is_empty() && haystack.contains(&k.to_lowercase()))
}
