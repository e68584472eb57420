//! Configuration loading from environment.
//!
//! Reads store credentials and tuning knobs from environment variables.
//! The content filter denylist can be overridden from the environment too.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::cache::DEFAULT_TTL_SECS;
use crate::error::{ComplianceError, Result};
use crate::filter::TermSet;
use crate::matcher::MatchOptions;

/// Default timeout for store requests.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Default HTTP listen port.
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Hosted store credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
}

/// Main configuration for the compliance service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckerConfig {
    /// Hosted store; `None` means lists come from a local file or nowhere.
    pub supabase: Option<SupabaseConfig>,
    /// JSON file with all six lists, used when no hosted store is set.
    pub keyword_lists_path: Option<PathBuf>,
    /// Denylist override; empty means the built-in terms.
    pub content_filter_terms: Vec<String>,
    /// Seconds to keep fetched lists; 0 disables caching.
    pub cache_ttl_secs: u64,
    pub request_timeout_secs: u64,
    /// Require true equality for link matches in the exact tier.
    pub strict_link_matching: bool,
    pub http_port: u16,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            supabase: None,
            keyword_lists_path: None,
            content_filter_terms: Vec::new(),
            cache_ttl_secs: DEFAULT_TTL_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            strict_link_matching: false,
            http_port: DEFAULT_HTTP_PORT,
        }
    }
}

impl CheckerConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `SUPABASE_URL` / `SUPABASE_ANON_KEY`: hosted store (both or neither)
    /// - `KEYWORD_LISTS_PATH`: local JSON lists file
    /// - `CONTENT_FILTER_TERMS`: comma-separated denylist override
    /// - `CACHE_TTL_SECS`: list cache lifetime (default: 300)
    /// - `REQUEST_TIMEOUT_SECS`: store request timeout (default: 10)
    /// - `STRICT_LINK_MATCHING`: `true` to demote link containment to partial
    /// - `HTTP_PORT`: listen port (default: 8080)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let supabase = match (non_empty("SUPABASE_URL"), non_empty("SUPABASE_ANON_KEY")) {
            (Some(url), Some(anon_key)) => Some(SupabaseConfig { url, anon_key }),
            (Some(_), None) => {
                return Err(ComplianceError::Config(
                    "SUPABASE_ANON_KEY not set".to_string(),
                ))
            }
            (None, Some(_)) => {
                return Err(ComplianceError::Config("SUPABASE_URL not set".to_string()))
            }
            (None, None) => None,
        };

        let content_filter_terms = non_empty("CONTENT_FILTER_TERMS")
            .map(|v| parse_term_list(&v))
            .unwrap_or_default();

        Ok(Self {
            supabase,
            keyword_lists_path: non_empty("KEYWORD_LISTS_PATH").map(PathBuf::from),
            content_filter_terms,
            cache_ttl_secs: non_empty("CACHE_TTL_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.cache_ttl_secs),
            request_timeout_secs: non_empty("REQUEST_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.request_timeout_secs),
            strict_link_matching: non_empty("STRICT_LINK_MATCHING")
                .map(|s| parse_flag(&s))
                .unwrap_or(defaults.strict_link_matching),
            http_port: non_empty("HTTP_PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.http_port),
        })
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn match_options(&self) -> MatchOptions {
        MatchOptions {
            strict_links: self.strict_link_matching,
        }
    }

    /// Build the content filter denylist.
    pub fn content_filter(&self) -> Result<TermSet> {
        if self.content_filter_terms.is_empty() {
            TermSet::default_terms()
        } else {
            TermSet::new(&self.content_filter_terms)
        }
    }
}

/// Parse a comma-separated list, dropping blank items.
fn parse_term_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
