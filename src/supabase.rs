//! Hosted store client.
//!
//! Reads the blacklist and keyword tables through the PostgREST API that
//! Supabase exposes under `/rest/v1`.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{ComplianceError, Result};
use crate::models::{BlacklistEntry, Category, ContextualPattern, Severity};
use crate::source::BlacklistSource;

pub const BLACKLIST_TABLE: &str = "blacklist_entries";
pub const IP_VIOLATION_TABLE: &str = "ip_violation_keywords";
pub const IP_BYPASS_TABLE: &str = "ip_bypass_keywords";
pub const COC_VIOLATION_TABLE: &str = "coc_violation_keywords";
pub const COC_BYPASS_TABLE: &str = "coc_bypass_keywords";
pub const COC_PATTERN_TABLE: &str = "coc_contextual_patterns";

const ENTRY_COLUMNS: &str =
    "name,keyword,links,discord_server_id,reason,category,severity,flagged_by,blacklisted_since";

/// Longest upstream error body kept in an error.
const MAX_ERROR_BODY: usize = 512;

/// Raw blacklist row; every column is nullable in the store.
#[derive(Debug, Deserialize)]
struct EntryRow {
    name: Option<String>,
    keyword: Option<String>,
    links: Option<Vec<String>>,
    discord_server_id: Option<String>,
    reason: Option<String>,
    category: Option<String>,
    severity: Option<String>,
    flagged_by: Option<String>,
    blacklisted_since: Option<String>,
}

impl EntryRow {
    /// Convert to an entry; rows without a name are unusable.
    fn into_entry(self) -> Option<BlacklistEntry> {
        let name = self.name.filter(|n| !n.trim().is_empty())?;
        let keyword = self
            .keyword
            .filter(|k| !k.trim().is_empty())
            .unwrap_or_else(|| name.clone());

        let mut entry = BlacklistEntry::new(name, keyword)
            .with_links(self.links.unwrap_or_default())
            .with_reason(self.reason.unwrap_or_default())
            .with_category(Category::from_str_lossy(
                self.category.as_deref().unwrap_or_default(),
            ))
            .with_severity(Severity::from_str_lossy(
                self.severity.as_deref().unwrap_or_default(),
            ))
            .with_flagged_by(self.flagged_by.unwrap_or_default())
            .with_blacklisted_since(self.blacklisted_since.unwrap_or_default());
        if let Some(id) = self.discord_server_id.filter(|id| !id.trim().is_empty()) {
            entry = entry.with_discord_server_id(id.trim());
        }
        Some(entry)
    }
}

#[derive(Debug, Deserialize)]
struct KeywordRow {
    keyword: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PatternRow {
    context_word: Option<String>,
    violation_word: Option<String>,
}

/// PostgREST-backed [`BlacklistSource`].
pub struct SupabaseSource {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SupabaseSource {
    /// Create a client for the project at `base_url`.
    pub fn new(base_url: &str, api_key: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// Fetch all rows of `table`, oldest first.
    async fn select<T: DeserializeOwned>(&self, table: &str, columns: &str) -> Result<Vec<T>> {
        let response = self
            .client
            .get(self.table_url(table))
            .query(&[("select", columns), ("order", "id.asc")])
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ComplianceError::Upstream {
                status,
                body: truncate(body, MAX_ERROR_BODY),
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn select_keywords(&self, table: &str) -> Result<Vec<String>> {
        let rows: Vec<KeywordRow> = self.select(table, "keyword").await?;
        Ok(rows
            .into_iter()
            .filter_map(|r| r.keyword)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect())
    }
}

fn truncate(mut text: String, max: usize) -> String {
    if text.len() > max {
        let mut end = max;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text.truncate(end);
    }
    text
}

#[async_trait]
impl BlacklistSource for SupabaseSource {
    async fn fetch_blacklist_entries(&self) -> Result<Vec<BlacklistEntry>> {
        let rows: Vec<EntryRow> = self.select(BLACKLIST_TABLE, ENTRY_COLUMNS).await?;
        let total = rows.len();
        let entries: Vec<BlacklistEntry> = rows.into_iter().filter_map(EntryRow::into_entry).collect();
        if entries.len() < total {
            tracing::warn!(
                skipped = total - entries.len(),
                "Skipped blacklist rows without a name"
            );
        }
        Ok(entries)
    }

    async fn fetch_ip_violation_keywords(&self) -> Result<Vec<String>> {
        self.select_keywords(IP_VIOLATION_TABLE).await
    }

    async fn fetch_ip_bypass_keywords(&self) -> Result<Vec<String>> {
        self.select_keywords(IP_BYPASS_TABLE).await
    }

    async fn fetch_coc_violation_keywords(&self) -> Result<Vec<String>> {
        self.select_keywords(COC_VIOLATION_TABLE).await
    }

    async fn fetch_coc_bypass_keywords(&self) -> Result<Vec<String>> {
        self.select_keywords(COC_BYPASS_TABLE).await
    }

    async fn fetch_coc_contextual_patterns(&self) -> Result<Vec<ContextualPattern>> {
        let rows: Vec<PatternRow> = self
            .select(COC_PATTERN_TABLE, "context_word,violation_word")
            .await?;
        Ok(rows
            .into_iter()
            .filter_map(|r| match (r.context_word, r.violation_word) {
                (Some(c), Some(v)) if !c.trim().is_empty() && !v.trim().is_empty() => {
                    Some(ContextualPattern::new(c.trim(), v.trim()))
                }
                _ => None,
            })
            .collect())
    }
}
