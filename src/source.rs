//! Data-access boundary.
//!
//! The checker never reaches for a global client; it is handed a
//! [`BlacklistSource`] that reads the six collections it depends on.

use std::fs;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ComplianceError, Result};
use crate::models::{BlacklistEntry, ContextualPattern};

/// Read-only access to the blacklist and keyword collections.
#[async_trait]
pub trait BlacklistSource: Send + Sync {
    async fn fetch_blacklist_entries(&self) -> Result<Vec<BlacklistEntry>>;
    async fn fetch_ip_violation_keywords(&self) -> Result<Vec<String>>;
    async fn fetch_ip_bypass_keywords(&self) -> Result<Vec<String>>;
    /// Entries ending in `:` are pattern markers.
    async fn fetch_coc_violation_keywords(&self) -> Result<Vec<String>>;
    async fn fetch_coc_bypass_keywords(&self) -> Result<Vec<String>>;
    async fn fetch_coc_contextual_patterns(&self) -> Result<Vec<ContextualPattern>>;
}

/// All six collections in one document, as stored in a local JSON file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordLists {
    #[serde(default)]
    pub blacklist_entries: Vec<BlacklistEntry>,
    #[serde(default)]
    pub ip_violation_keywords: Vec<String>,
    #[serde(default)]
    pub ip_bypass_keywords: Vec<String>,
    #[serde(default)]
    pub coc_violation_keywords: Vec<String>,
    #[serde(default)]
    pub coc_bypass_keywords: Vec<String>,
    #[serde(default)]
    pub coc_contextual_patterns: Vec<ContextualPattern>,
}

impl KeywordLists {
    /// Load lists from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ComplianceError::Io(format!("Failed to read {}: {}", path.display(), e))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            ComplianceError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })
    }
}

/// Fixed in-memory collections.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    lists: KeywordLists,
}

impl MemorySource {
    pub fn new(lists: KeywordLists) -> Self {
        Self { lists }
    }
}

#[async_trait]
impl BlacklistSource for MemorySource {
    async fn fetch_blacklist_entries(&self) -> Result<Vec<BlacklistEntry>> {
        Ok(self.lists.blacklist_entries.clone())
    }

    async fn fetch_ip_violation_keywords(&self) -> Result<Vec<String>> {
        Ok(self.lists.ip_violation_keywords.clone())
    }

    async fn fetch_ip_bypass_keywords(&self) -> Result<Vec<String>> {
        Ok(self.lists.ip_bypass_keywords.clone())
    }

    async fn fetch_coc_violation_keywords(&self) -> Result<Vec<String>> {
        Ok(self.lists.coc_violation_keywords.clone())
    }

    async fn fetch_coc_bypass_keywords(&self) -> Result<Vec<String>> {
        Ok(self.lists.coc_bypass_keywords.clone())
    }

    async fn fetch_coc_contextual_patterns(&self) -> Result<Vec<ContextualPattern>> {
        Ok(self.lists.coc_contextual_patterns.clone())
    }
}
