//! Compliance verdict rendering.
//!
//! Turns a [`CheckResult`] into issue and recommendation lines for display.
//! Only text is assembled here; severity, creator and flagger are projected
//! unchanged.

use crate::models::{CheckResult, ComplianceResult, EntryMatch};

/// Render a check result as a compliance verdict.
pub fn format(result: &CheckResult) -> ComplianceResult {
    let (issues, recommendations) = match result {
        CheckResult::Clear => (Vec::new(), Vec::new()),
        CheckResult::ContentFilter { .. } => content_filter_lines(),
        CheckResult::IpViolation { .. } => ip_lines(result),
        CheckResult::CocViolation { .. } => coc_lines(result),
        CheckResult::Exact(entry) => entry_lines(entry, false),
        CheckResult::Keyword { entry, .. } => entry_lines(entry, true),
    };

    ComplianceResult {
        is_compliant: !result.is_blacklisted(),
        issues,
        recommendations,
        severity: result.severity(),
        flagged_by: result.flagged_by().map(str::to_string),
        matched_creator: result.matched_creator().map(str::to_string),
    }
}

fn content_filter_lines() -> (Vec<String>, Vec<String>) {
    (
        vec![
            "🚫 Search blocked by content filter".to_string(),
            "⚠️ Your query contains language that is not allowed".to_string(),
        ],
        vec!["Rephrase your search without offensive terms".to_string()],
    )
}

fn ip_lines(result: &CheckResult) -> (Vec<String>, Vec<String>) {
    let mut issues = vec![
        "⚖️ IP Violation Detected".to_string(),
        format!("📝 Reason: {}", result.reason()),
    ];
    if let Some(flagger) = result.flagged_by() {
        issues.push(format!("🚩 Flagged by: {}", flagger));
    }
    (
        issues,
        vec![
            "Only use assets you own or hold a valid license for".to_string(),
            "Review the platform Terms of Service before publishing".to_string(),
        ],
    )
}

fn coc_lines(result: &CheckResult) -> (Vec<String>, Vec<String>) {
    (
        vec![
            "🛑 Code of Conduct Violation".to_string(),
            format!("📝 Reason: {}", result.reason()),
        ],
        vec!["Remove the offending content before publishing".to_string()],
    )
}

fn entry_lines(entry: &EntryMatch, possible_false_positive: bool) -> (Vec<String>, Vec<String>) {
    let mut issues = vec![
        format!("❌ Matched blacklisted creator: {}", entry.name),
        format!("📝 Reason: {}", entry.reason),
        format!("🚩 Reported by: {}", entry.flagged_by),
        format!("🏷️ Category: {}", entry.category),
        format!("🔥 Severity: {}", entry.severity),
    ];
    if possible_false_positive {
        issues.push(
            "⚠️ Partial match only: verify manually before taking action".to_string(),
        );
    }
    if let Some(id) = &entry.discord_server_id {
        issues.push(format!("💬 Discord server: {}", id));
    }

    let mut recommendations = vec!["Avoid purchasing or using resources from this creator".to_string()];
    if possible_false_positive {
        recommendations.push("Confirm the creator identity before reporting".to_string());
    }
    (issues, recommendations)
}

#[cfg(test)]
mod tests {
    use crate::formatter::format;
    use crate::matcher::{match_blacklist, MatchOptions};
    use crate::models::{BlacklistEntry, Category, CheckResult, EntryMatch, Severity};
    use crate::normalize::normalize;

    fn entry() -> EntryMatch {
        EntryMatch {
            name: "leakzone".to_string(),
            reason: "Reselling leaked scripts".to_string(),
            category: Category::Tebex,
            severity: Severity::High,
            flagged_by: "mod-team".to_string(),
            discord_server_id: Some("invite:abc123".to_string()),
        }
    }

    #[test]
    fn clear_is_compliant() {
        let verdict = format(&CheckResult::Clear);
        assert!(verdict.is_compliant);
        assert!(verdict.issues.is_empty());
        assert!(verdict.recommendations.is_empty());
        assert_eq!(verdict.severity, Severity::Low);
        assert!(verdict.matched_creator.is_none());
    }

    #[test]
    fn exact_match_includes_reason_verbatim() {
        let verdict = format(&CheckResult::Exact(entry()));
        assert!(!verdict.is_compliant);
        assert!(verdict.issues.iter().any(|i| i.contains("Reselling leaked scripts")));
        assert!(verdict.issues.iter().any(|i| i.contains("invite:abc123")));
        assert!(!verdict.issues.iter().any(|i| i.contains("verify manually")));
        assert_eq!(verdict.severity, Severity::High);
        assert_eq!(verdict.flagged_by.as_deref(), Some("mod-team"));
        assert_eq!(verdict.matched_creator.as_deref(), Some("leakzone"));
    }

    #[test]
    fn keyword_match_warns_about_false_positive() {
        let verdict = format(&CheckResult::Keyword {
            entry: entry(),
            matched_keywords: vec!["leak".to_string()],
        });
        assert!(verdict.issues.iter().any(|i| i.contains("verify manually")));
        assert_eq!(verdict.recommendations.len(), 2);
    }

    #[test]
    fn ip_violation_lines() {
        let verdict = format(&CheckResult::IpViolation {
            keywords: vec!["nike".to_string()],
        });
        assert_eq!(verdict.issues[0], "⚖️ IP Violation Detected");
        assert!(verdict.issues.iter().any(|i| i.contains("nike")));
        assert!(verdict.issues.iter().any(|i| i.contains("Automated System")));
        assert!(verdict.recommendations.iter().any(|r| r.contains("Terms of Service")));
        assert_eq!(verdict.severity, Severity::High);
    }

    #[test]
    fn coc_violation_lines() {
        let verdict = format(&CheckResult::CocViolation {
            keywords: vec!["child + ped".to_string()],
        });
        assert_eq!(verdict.issues[0], "🛑 Code of Conduct Violation");
        assert!(verdict.recommendations[0].contains("Remove"));
        assert_eq!(verdict.severity, Severity::Critical);
    }

    #[test]
    fn content_filter_never_echoes_terms() {
        let verdict = format(&CheckResult::ContentFilter {
            matched_words: vec!["badword".to_string()],
        });
        assert!(!verdict.is_compliant);
        assert!(!verdict.issues.iter().any(|i| i.contains("badword")));
        assert_eq!(verdict.matched_creator.as_deref(), Some("Content Filter"));
    }

    #[test]
    fn matcher_output_renders_entry_fields() {
        let entries = vec![BlacklistEntry::new("leakzone", "lzn")
            .with_reason("Reselling leaked scripts (v2, v3)")
            .with_category(Category::Discord)
            .with_severity(Severity::Critical)
            .with_flagged_by("mod-team")];

        let verdict = format(&match_blacklist(
            &normalize("LeakZone"),
            &entries,
            MatchOptions::default(),
        ));
        assert!(!verdict.is_compliant);
        assert!(verdict
            .issues
            .contains(&"📝 Reason: Reselling leaked scripts (v2, v3)".to_string()));
        assert_eq!(verdict.severity, Severity::Critical);
        assert_eq!(verdict.matched_creator.as_deref(), Some("leakzone"));

        let verdict = format(&match_blacklist(
            &normalize("leakz"),
            &entries,
            MatchOptions::default(),
        ));
        assert!(verdict.issues.iter().any(|i| i.contains("verify manually")));
        assert!(verdict
            .issues
            .contains(&"📝 Reason: Reselling leaked scripts (v2, v3)".to_string()));
    }
}
