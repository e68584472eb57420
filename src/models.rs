//! Core data models for the compliance checker.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Where a flagged creator or resource operates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Discord,
    Tebex,
    #[default]
    Other,
}

impl Category {
    /// Lenient parse used for rows coming from the store.
    pub fn from_str_lossy(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "discord" => Category::Discord,
            "tebex" => Category::Tebex,
            _ => Category::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Discord => "discord",
            Category::Tebex => "tebex",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity attached to a flag.
///
/// Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
    Critical,
    Exponential,
}

impl Severity {
    /// Lenient parse used for rows coming from the store.
    ///
    /// Unknown values map to `Medium` so a typo in an admin form never
    /// downgrades an entry to `Low`.
    ///
    /// ```
    /// use fivemdb_compliance::models::Severity;
    ///
    /// assert_eq!(Severity::from_str_lossy("CRITICAL"), Severity::Critical);
    /// assert_eq!(Severity::from_str_lossy("severe"), Severity::Medium);
    /// ```
    pub fn from_str_lossy(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Severity::Low,
            "medium" => Severity::Medium,
            "high" => Severity::High,
            "critical" => Severity::Critical,
            "exponential" => Severity::Exponential,
            _ => Severity::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
            Severity::Exponential => "exponential",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A flagged creator, resource, server, or Discord community.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlacklistEntry {
    pub name: String,
    pub keyword: String,
    #[serde(default)]
    pub links: Vec<String>,
    /// Raw snowflake or an `invite:<code>` tag.
    #[serde(default)]
    pub discord_server_id: Option<String>,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub flagged_by: String,
    #[serde(default)]
    pub blacklisted_since: String,
}

impl BlacklistEntry {
    /// Create an entry with the given identity; name and keyword are lower-cased.
    pub fn new(name: impl Into<String>, keyword: impl Into<String>) -> Self {
        Self {
            name: name.into().trim().to_lowercase(),
            keyword: keyword.into().trim().to_lowercase(),
            links: Vec::new(),
            discord_server_id: None,
            reason: String::new(),
            category: Category::Other,
            severity: Severity::Medium,
            flagged_by: String::new(),
            blacklisted_since: String::new(),
        }
    }

    pub fn with_links<I, S>(mut self, links: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.links = links.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_discord_server_id(mut self, id: impl Into<String>) -> Self {
        self.discord_server_id = Some(id.into());
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_flagged_by(mut self, flagged_by: impl Into<String>) -> Self {
        self.flagged_by = flagged_by.into();
        self
    }

    pub fn with_blacklisted_since(mut self, since: impl Into<String>) -> Self {
        self.blacklisted_since = since.into();
        self
    }

    /// Parse `blacklisted_since` as a calendar date.
    ///
    /// Accepts plain `YYYY-MM-DD` and RFC 3339 timestamps as written by the store.
    pub fn blacklisted_since_date(&self) -> Option<NaiveDate> {
        let raw = self.blacklisted_since.trim();
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().or_else(|| {
            chrono::DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.date_naive())
        })
    }
}

/// A pair of words that must co-occur to count as a COC violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextualPattern(pub String, pub String);

impl ContextualPattern {
    pub fn new(context: impl Into<String>, violation: impl Into<String>) -> Self {
        Self(context.into(), violation.into())
    }

    pub fn context(&self) -> &str {
        &self.0
    }

    pub fn violation(&self) -> &str {
        &self.1
    }
}

impl fmt::Display for ContextualPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} + {}", self.0, self.1)
    }
}

/// Which rule produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Exact,
    Keyword,
    None,
    /// Kept for wire compatibility; Discord ID hits are reported as `Exact`.
    DiscordId,
    IpViolation,
    CocViolation,
    ContentFilter,
}

/// Blacklist entry fields carried by a database match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryMatch {
    pub name: String,
    pub reason: String,
    pub category: Category,
    pub severity: Severity,
    pub flagged_by: String,
    pub discord_server_id: Option<String>,
}

impl EntryMatch {
    /// Project an entry, preferring its own Discord server ID over the query's.
    pub fn from_entry(entry: &BlacklistEntry, query_discord_id: Option<&str>) -> Self {
        Self {
            name: entry.name.clone(),
            reason: entry.reason.clone(),
            category: entry.category,
            severity: entry.severity,
            flagged_by: entry.flagged_by.clone(),
            discord_server_id: entry
                .discord_server_id
                .clone()
                .filter(|id| !id.is_empty())
                .or_else(|| query_discord_id.map(str::to_string)),
        }
    }
}

pub const CONTENT_FILTER_CREATOR: &str = "Content Filter";
pub const IP_FILTER_CREATOR: &str = "IP Violation Filter";
pub const COC_FILTER_CREATOR: &str = "Code of Conduct Filter";
pub const AUTOMATED_FLAGGER: &str = "Automated System";

/// Outcome of a compliance check.
///
/// Each variant carries exactly the fields its rule guarantees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckResult {
    /// Nothing matched.
    Clear,
    /// The raw query hit the hardcoded denylist.
    ContentFilter { matched_words: Vec<String> },
    /// IP/TOS violation keywords present without a bypass keyword.
    IpViolation { keywords: Vec<String> },
    /// COC keywords or contextual patterns present without a bypass keyword.
    CocViolation { keywords: Vec<String> },
    /// Exact database match.
    Exact(EntryMatch),
    /// Partial database match; may be a false positive.
    Keyword {
        entry: EntryMatch,
        matched_keywords: Vec<String>,
    },
}

impl CheckResult {
    pub fn match_type(&self) -> MatchType {
        match self {
            CheckResult::Clear => MatchType::None,
            CheckResult::ContentFilter { .. } => MatchType::ContentFilter,
            CheckResult::IpViolation { .. } => MatchType::IpViolation,
            CheckResult::CocViolation { .. } => MatchType::CocViolation,
            CheckResult::Exact(_) => MatchType::Exact,
            CheckResult::Keyword { .. } => MatchType::Keyword,
        }
    }

    pub fn is_blacklisted(&self) -> bool {
        !matches!(self, CheckResult::Clear)
    }

    pub fn possible_false_positive(&self) -> bool {
        matches!(self, CheckResult::Keyword { .. })
    }

    pub fn severity(&self) -> Severity {
        match self {
            CheckResult::Clear => Severity::Low,
            CheckResult::ContentFilter { .. } | CheckResult::IpViolation { .. } => Severity::High,
            CheckResult::CocViolation { .. } => Severity::Critical,
            CheckResult::Exact(entry) | CheckResult::Keyword { entry, .. } => entry.severity,
        }
    }

    pub fn reason(&self) -> String {
        match self {
            CheckResult::Clear => "No matching records found".to_string(),
            CheckResult::ContentFilter { .. } => {
                "Query contains language blocked by the content filter".to_string()
            }
            CheckResult::IpViolation { keywords } => format!(
                "Potential intellectual property violation: {}",
                keywords.join(", ")
            ),
            CheckResult::CocViolation { keywords } => format!(
                "Potential Code of Conduct violation: {}",
                keywords.join(", ")
            ),
            CheckResult::Exact(entry) | CheckResult::Keyword { entry, .. } => entry.reason.clone(),
        }
    }

    pub fn matched_creator(&self) -> Option<&str> {
        match self {
            CheckResult::Clear => None,
            CheckResult::ContentFilter { .. } => Some(CONTENT_FILTER_CREATOR),
            CheckResult::IpViolation { .. } => Some(IP_FILTER_CREATOR),
            CheckResult::CocViolation { .. } => Some(COC_FILTER_CREATOR),
            CheckResult::Exact(entry) | CheckResult::Keyword { entry, .. } => Some(&entry.name),
        }
    }

    pub fn flagged_by(&self) -> Option<&str> {
        match self {
            CheckResult::Clear => None,
            CheckResult::ContentFilter { .. }
            | CheckResult::IpViolation { .. }
            | CheckResult::CocViolation { .. } => Some(AUTOMATED_FLAGGER),
            CheckResult::Exact(entry) | CheckResult::Keyword { entry, .. } => {
                Some(&entry.flagged_by)
            }
        }
    }

    pub fn category(&self) -> Option<Category> {
        match self {
            CheckResult::Exact(entry) | CheckResult::Keyword { entry, .. } => Some(entry.category),
            _ => None,
        }
    }

    pub fn discord_server_id(&self) -> Option<&str> {
        match self {
            CheckResult::Exact(entry) | CheckResult::Keyword { entry, .. } => {
                entry.discord_server_id.as_deref()
            }
            _ => None,
        }
    }

    pub fn matched_keywords(&self) -> &[String] {
        match self {
            CheckResult::ContentFilter { matched_words } => matched_words,
            CheckResult::IpViolation { keywords } | CheckResult::CocViolation { keywords } => {
                keywords
            }
            CheckResult::Keyword {
                matched_keywords, ..
            } => matched_keywords,
            CheckResult::Clear | CheckResult::Exact(_) => &[],
        }
    }

    /// Flatten into the wire shape consumed by presentation layers.
    pub fn summary(&self) -> CheckSummary {
        CheckSummary {
            is_blacklisted: self.is_blacklisted(),
            reason: self.reason(),
            matched_creator: self.matched_creator().map(str::to_string),
            discord_server_id: self.discord_server_id().map(str::to_string),
            category: self.category().map(|c| c.as_str().to_string()),
            flagged_by: self.flagged_by().map(str::to_string),
            severity: self.severity(),
            match_type: self.match_type(),
            matched_keywords: self.matched_keywords().to_vec(),
            possible_false_positive: self.possible_false_positive(),
        }
    }
}

/// Flat, serializable projection of a [`CheckResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckSummary {
    pub is_blacklisted: bool,
    pub reason: String,
    pub matched_creator: Option<String>,
    pub discord_server_id: Option<String>,
    pub category: Option<String>,
    pub flagged_by: Option<String>,
    pub severity: Severity,
    pub match_type: MatchType,
    pub matched_keywords: Vec<String>,
    pub possible_false_positive: bool,
}

/// Presentation-ready compliance verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceResult {
    pub is_compliant: bool,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flagged_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_creator: Option<String>,
}

#[cfg(test)]
mod tests {
    use crate::models::{
        BlacklistEntry, Category, CheckResult, EntryMatch, MatchType, Severity,
    };

    fn sample_match() -> EntryMatch {
        EntryMatch {
            name: "leakzone".to_string(),
            reason: "Reselling leaked scripts".to_string(),
            category: Category::Tebex,
            severity: Severity::High,
            flagged_by: "mod-team".to_string(),
            discord_server_id: None,
        }
    }

    #[test]
    fn entry_new_lowercases_identity() {
        let entry = BlacklistEntry::new("  LeakZone ", "LZ");
        assert_eq!(entry.name, "leakzone");
        assert_eq!(entry.keyword, "lz");
    }

    #[test]
    fn blacklisted_since_accepts_date_and_timestamp() {
        let entry = BlacklistEntry::new("a", "b").with_blacklisted_since("2024-03-01");
        assert_eq!(
            entry.blacklisted_since_date().map(|d| d.to_string()),
            Some("2024-03-01".to_string())
        );

        let entry =
            BlacklistEntry::new("a", "b").with_blacklisted_since("2024-03-01T10:00:00+00:00");
        assert_eq!(
            entry.blacklisted_since_date().map(|d| d.to_string()),
            Some("2024-03-01".to_string())
        );

        let entry = BlacklistEntry::new("a", "b").with_blacklisted_since("last week");
        assert!(entry.blacklisted_since_date().is_none());
    }

    #[test]
    fn entry_match_prefers_entry_discord_id() {
        let entry = BlacklistEntry::new("a", "b").with_discord_server_id("111111111111111111");
        let m = EntryMatch::from_entry(&entry, Some("invite:abc"));
        assert_eq!(m.discord_server_id.as_deref(), Some("111111111111111111"));

        let entry = BlacklistEntry::new("a", "b");
        let m = EntryMatch::from_entry(&entry, Some("invite:abc"));
        assert_eq!(m.discord_server_id.as_deref(), Some("invite:abc"));
    }

    #[test]
    fn clear_result_fields() {
        let result = CheckResult::Clear;
        assert!(!result.is_blacklisted());
        assert_eq!(result.match_type(), MatchType::None);
        assert_eq!(result.severity(), Severity::Low);
        assert!(result.matched_creator().is_none());
        assert!(!result.possible_false_positive());
    }

    #[test]
    fn only_keyword_matches_are_possible_false_positives() {
        let results = vec![
            CheckResult::Clear,
            CheckResult::ContentFilter {
                matched_words: vec!["x".to_string()],
            },
            CheckResult::IpViolation {
                keywords: vec!["nike".to_string()],
            },
            CheckResult::CocViolation {
                keywords: vec!["doxx".to_string()],
            },
            CheckResult::Exact(sample_match()),
        ];
        for result in results {
            assert!(!result.possible_false_positive(), "{:?}", result);
        }

        let keyword = CheckResult::Keyword {
            entry: sample_match(),
            matched_keywords: vec!["leakzone".to_string()],
        };
        assert!(keyword.possible_false_positive());
    }

    #[test]
    fn violation_severities_are_fixed() {
        let ip = CheckResult::IpViolation {
            keywords: vec!["nike".to_string()],
        };
        let coc = CheckResult::CocViolation {
            keywords: vec!["doxx".to_string()],
        };
        assert_eq!(ip.severity(), Severity::High);
        assert_eq!(coc.severity(), Severity::Critical);
        assert!(ip.reason().contains("nike"));
    }

    #[test]
    fn summary_serializes_camel_case() {
        let summary = CheckResult::Exact(sample_match()).summary();
        let json = serde_json::to_value(&summary).expect("serialize");

        assert_eq!(json["isBlacklisted"], true);
        assert_eq!(json["matchType"], "exact");
        assert_eq!(json["severity"], "high");
        assert_eq!(json["category"], "tebex");
        assert_eq!(json["possibleFalsePositive"], false);
        assert_eq!(json["matchedCreator"], "leakzone");
    }

    #[test]
    fn lossy_parsers() {
        assert_eq!(Category::from_str_lossy("Discord"), Category::Discord);
        assert_eq!(Category::from_str_lossy("patreon"), Category::Other);
        assert_eq!(Severity::from_str_lossy(" exponential "), Severity::Exponential);
    }

    #[test]
    fn entry_deserializes_with_defaults() {
        let json = r#"{"name":"shady","keyword":"shd","severity":"critical"}"#;
        let entry: BlacklistEntry = serde_json::from_str(json).expect("deserialize");
        assert_eq!(entry.severity, Severity::Critical);
        assert_eq!(entry.category, Category::Other);
        assert!(entry.links.is_empty());
        assert!(entry.discord_server_id.is_none());
    }
}
