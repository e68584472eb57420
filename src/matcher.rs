//! Blacklist matcher.
//!
//! Two passes over the entry list. The first entry that matches exactly
//! wins; only when no exact match exists does the partial pass run, and its
//! first hit (in list order) is reported as a possible false positive.

use serde::{Deserialize, Serialize};

use crate::models::{BlacklistEntry, CheckResult, EntryMatch};
use crate::normalize::{extract_discord_id, NormalizedInput};

/// Minimum search term length (in chars, exclusive) for partial matching.
const PARTIAL_MIN_TERM_LEN: usize = 2;

/// Matcher tuning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOptions {
    /// Require link equality in the exact pass.
    ///
    /// When unset, a link that contains the query (or is contained by it)
    /// counts as exact. When set, containment is demoted to the partial pass.
    #[serde(default)]
    pub strict_links: bool,
}

/// Match a normalized query against the blacklist.
pub fn match_blacklist(
    input: &NormalizedInput,
    entries: &[BlacklistEntry],
    options: MatchOptions,
) -> CheckResult {
    if let Some(entry) = entries.iter().find(|e| is_exact_match(input, e, options)) {
        tracing::debug!(entry = %entry.name, "Exact blacklist match");
        return CheckResult::Exact(EntryMatch::from_entry(
            entry,
            input.discord_server_id.as_deref(),
        ));
    }

    let first_partial = entries
        .iter()
        .find_map(|e| partial_match(input, e, options).map(|matched| (e, matched)));

    match first_partial {
        Some((entry, matched_keywords)) => {
            tracing::debug!(entry = %entry.name, "Partial blacklist match");
            CheckResult::Keyword {
                entry: EntryMatch::from_entry(entry, input.discord_server_id.as_deref()),
                matched_keywords,
            }
        }
        None => CheckResult::Clear,
    }
}

fn is_exact_match(input: &NormalizedInput, entry: &BlacklistEntry, options: MatchOptions) -> bool {
    let query_id = input.discord_server_id.as_deref().filter(|id| !id.is_empty());

    if let (Some(query_id), Some(entry_id)) = (query_id, entry.discord_server_id.as_deref()) {
        if query_id == entry_id.trim() {
            return true;
        }
    }

    let processed = input.haystack();
    for link in &entry.links {
        let link_lower = link.trim().to_lowercase();
        if link_lower.is_empty() {
            continue;
        }
        if !processed.is_empty() {
            if link_lower == processed {
                return true;
            }
            if !options.strict_links
                && (link_lower.contains(&processed) || processed.contains(&link_lower))
            {
                return true;
            }
        }
        if query_id.is_some() && extract_discord_id(link).as_deref() == query_id {
            return true;
        }
    }

    let identities = identities(entry);

    if let Some(domain) = input.domain.as_deref() {
        if identities.iter().any(|id| id == domain) {
            return true;
        }
    }

    if !input.is_discord_id() {
        if let Some(term) = input.search_term.as_deref().filter(|t| !t.is_empty()) {
            if identities.iter().any(|id| id == term) {
                return true;
            }
        }
    }

    false
}

/// Entry values that triggered a partial match, or `None`.
fn partial_match(
    input: &NormalizedInput,
    entry: &BlacklistEntry,
    options: MatchOptions,
) -> Option<Vec<String>> {
    let mut matched: Vec<String> = Vec::new();

    let needle = match input.domain.as_deref() {
        Some(domain) if !domain.is_empty() => Some(domain),
        Some(_) => None,
        None if !input.is_discord_id() => input
            .search_term
            .as_deref()
            .filter(|t| t.chars().count() > PARTIAL_MIN_TERM_LEN),
        None => None,
    };

    if let Some(needle) = needle {
        for id in identities(entry) {
            if (id.contains(needle) || needle.contains(id.as_str())) && !matched.contains(&id) {
                matched.push(id);
            }
        }
    }

    if options.strict_links {
        let processed = input.haystack();
        if !processed.is_empty() {
            for link in &entry.links {
                let link_lower = link.trim().to_lowercase();
                if !link_lower.is_empty()
                    && (link_lower.contains(&processed) || processed.contains(&link_lower))
                    && !matched.contains(&link_lower)
                {
                    matched.push(link_lower);
                }
            }
        }
    }

    if matched.is_empty() {
        None
    } else {
        Some(matched)
    }
}

/// Lower-cased, non-empty name and keyword.
fn identities(entry: &BlacklistEntry) -> Vec<String> {
    let mut ids: Vec<String> = Vec::with_capacity(2);
    for value in [&entry.name, &entry.keyword] {
        let value = value.trim().to_lowercase();
        if !value.is_empty() && !ids.contains(&value) {
            ids.push(value);
        }
    }
    ids
}
