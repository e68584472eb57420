//! Compliance check orchestration.
//!
//! Runs the full cascade: content filter, IP scan, COC scan, exact
//! blacklist match, partial blacklist match. Each stage short-circuits on a
//! hit. The six lists are fetched concurrently and each one that fails to
//! load is treated as empty, so the checker always answers.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use crate::error::{ErrorContext, Result};
use crate::filter::ContentFilter;
use crate::formatter;
use crate::matcher::{match_blacklist, MatchOptions};
use crate::models::{BlacklistEntry, CheckResult, ComplianceResult};
use crate::normalize::{normalize, NormalizedInput};
use crate::scanner::{CocRules, IpRules};
use crate::source::BlacklistSource;

/// Immutable view of every list a check needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub entries: Vec<BlacklistEntry>,
    pub ip: IpRules,
    pub coc: CocRules,
}

/// Entry point for compliance and blacklist checks.
pub struct ComplianceChecker {
    source: Arc<dyn BlacklistSource>,
    filter: ContentFilter,
    options: MatchOptions,
}

impl ComplianceChecker {
    pub fn new(source: Arc<dyn BlacklistSource>, filter: ContentFilter) -> Self {
        Self {
            source,
            filter,
            options: MatchOptions::default(),
        }
    }

    pub fn with_options(mut self, options: MatchOptions) -> Self {
        self.options = options;
        self
    }

    /// Fetch all six lists concurrently.
    pub async fn snapshot(&self) -> Snapshot {
        let started = Instant::now();
        let source = self.source.as_ref();

        let (entries, ip_violation, ip_bypass, coc_violation, coc_bypass, coc_patterns) = tokio::join!(
            fetch_or_empty("blacklist_entries", source.fetch_blacklist_entries()),
            fetch_or_empty("ip_violation_keywords", source.fetch_ip_violation_keywords()),
            fetch_or_empty("ip_bypass_keywords", source.fetch_ip_bypass_keywords()),
            fetch_or_empty("coc_violation_keywords", source.fetch_coc_violation_keywords()),
            fetch_or_empty("coc_bypass_keywords", source.fetch_coc_bypass_keywords()),
            fetch_or_empty("coc_contextual_patterns", source.fetch_coc_contextual_patterns()),
        );

        tracing::debug!(
            entries = entries.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Lists fetched"
        );

        Snapshot {
            entries,
            ip: IpRules {
                violation_keywords: ip_violation,
                bypass_keywords: ip_bypass,
            },
            coc: CocRules {
                violation_keywords: coc_violation,
                bypass_keywords: coc_bypass,
                patterns: coc_patterns,
            },
        }
    }

    /// Classify a query against the live lists.
    pub async fn check_creator(&self, query: &str) -> CheckResult {
        let started = Instant::now();

        // Nothing is fetched for a query the content filter rejects.
        let blocked = self.content_filter_hits(query);
        let result = if blocked.is_empty() {
            let snapshot = self.snapshot().await;
            self.cascade(query, &snapshot)
        } else {
            CheckResult::ContentFilter {
                matched_words: blocked,
            }
        };

        tracing::info!(
            match_type = ?result.match_type(),
            severity = %result.severity(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Compliance check finished"
        );
        result
    }

    /// Check a query and render the verdict for display.
    pub async fn check_resource_compliance(&self, query: &str) -> ComplianceResult {
        formatter::format(&self.check_creator(query).await)
    }

    /// Run the cascade against an already-fetched snapshot.
    ///
    /// Pure with respect to its inputs: identical arguments give identical results.
    pub fn evaluate(&self, query: &str, snapshot: &Snapshot) -> CheckResult {
        let blocked = self.content_filter_hits(query);
        if !blocked.is_empty() {
            return CheckResult::ContentFilter {
                matched_words: blocked,
            };
        }
        self.cascade(query, snapshot)
    }

    /// Everything after the content filter: normalize, IP, COC, blacklist.
    fn cascade(&self, query: &str, snapshot: &Snapshot) -> CheckResult {
        let input = normalize(query);
        tracing::debug!(query = %query, kind = ?input.kind, "Query normalized");

        let ip = snapshot.ip.check(&input);
        if ip.is_blacklisted() {
            return ip;
        }

        let coc = snapshot.coc.check(&input);
        if coc.is_blacklisted() {
            return coc;
        }

        match_blacklist(&input, &snapshot.entries, self.options)
    }

    /// Scan a normalized query for IP violations using the live lists.
    pub async fn check_ip_violations(&self, input: &NormalizedInput) -> CheckResult {
        let source = self.source.as_ref();
        let (violation_keywords, bypass_keywords) = tokio::join!(
            fetch_or_empty("ip_violation_keywords", source.fetch_ip_violation_keywords()),
            fetch_or_empty("ip_bypass_keywords", source.fetch_ip_bypass_keywords()),
        );
        IpRules {
            violation_keywords,
            bypass_keywords,
        }
        .check(input)
    }

    /// Scan a normalized query for COC violations using the live lists.
    pub async fn check_coc_violations(&self, input: &NormalizedInput) -> CheckResult {
        let source = self.source.as_ref();
        let (violation_keywords, bypass_keywords, patterns) = tokio::join!(
            fetch_or_empty("coc_violation_keywords", source.fetch_coc_violation_keywords()),
            fetch_or_empty("coc_bypass_keywords", source.fetch_coc_bypass_keywords()),
            fetch_or_empty("coc_contextual_patterns", source.fetch_coc_contextual_patterns()),
        );
        CocRules {
            violation_keywords,
            bypass_keywords,
            patterns,
        }
        .check(input)
    }

    fn content_filter_hits(&self, query: &str) -> Vec<String> {
        let hits = self.filter.filter_slurs(query);
        if !hits.is_empty() {
            tracing::info!(terms = hits.len(), "Query blocked by content filter");
        }
        hits
    }
}

/// Await a list fetch, degrading any failure to an empty list.
async fn fetch_or_empty<T, F>(list: &'static str, fetch: F) -> Vec<T>
where
    F: Future<Output = Result<Vec<T>>>,
{
    match fetch.await {
        Ok(items) => items,
        Err(e) => {
            e.log_with_context(&ErrorContext::new("fetch_list").with_list(list));
            Vec::new()
        }
    }
}


#[cfg(test)]
mod property_tests {
    use std::sync::Arc;

    use proptest::prelude::*;

    use crate::checker::{ComplianceChecker, Snapshot};
    use crate::filter::{ContentFilter, TermSet};
    use crate::models::{BlacklistEntry, MatchType};
    use crate::scanner::IpRules;
    use crate::source::{KeywordLists, MemorySource};

    fn checker() -> ComplianceChecker {
        ComplianceChecker::new(
            Arc::new(MemorySource::default()),
            ContentFilter::new(TermSet::new(&["badword"]).expect("terms")),
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// A query hitting the content filter, an IP keyword and a blacklist entry
        /// is always reported as a content-filter match.
        #[test]
        fn prop_content_filter_has_priority(
            name in "[a-z]{3,10}",
            prefix in "[a-z ]{0,10}",
        ) {
            let snapshot = Snapshot {
                entries: vec![BlacklistEntry::new(name.clone(), name.clone())],
                ip: IpRules {
                    violation_keywords: vec![name.clone()],
                    bypass_keywords: vec![],
                },
                ..Default::default()
            };
            let query = format!("{}{} badword", prefix, name);
            let result = checker().evaluate(&query, &snapshot);
            prop_assert_eq!(result.match_type(), MatchType::ContentFilter);
        }

        /// Two checks with identical inputs and lists give identical results.
        #[test]
        fn prop_check_is_idempotent(
            query in "[a-z0-9 .:/]{0,30}",
            names in prop::collection::vec("[a-z]{2,8}", 0..5),
        ) {
            let lists = KeywordLists {
                blacklist_entries: names
                    .iter()
                    .map(|n| BlacklistEntry::new(n.clone(), format!("{}-kw", n)))
                    .collect(),
                ip_violation_keywords: names.iter().take(1).cloned().collect(),
                ..Default::default()
            };
            let checker = ComplianceChecker::new(
                Arc::new(MemorySource::new(lists)),
                ContentFilter::new(TermSet::new(&["badword"]).expect("terms")),
            );

            let (first, second) = tokio_test::block_on(async {
                (checker.check_creator(&query).await, checker.check_creator(&query).await)
            });
            prop_assert_eq!(first, second);
        }
    }
}
