//! Query normalization.
//!
//! Classifies a free-form lookup query as a Discord snowflake, a Discord
//! invite, a URL/domain, or a plain search term. Every matcher downstream
//! consumes the [`NormalizedInput`], never the raw string.

use serde::Serialize;
use url::Url;

/// Snowflake length bounds (inclusive).
const SNOWFLAKE_MIN_LEN: usize = 17;
const SNOWFLAKE_MAX_LEN: usize = 19;

/// Link prefixes that carry an invite code as their last path segment.
const INVITE_MARKERS: &[&str] = &["discord.gg/", "discord.com/invite/", "discordapp.com/invite/"];

/// What kind of query the user typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    DiscordId,
    DiscordInvite,
    Url,
    SearchTerm,
}

/// Canonical form of a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedInput {
    pub kind: InputKind,
    /// Snowflake or `invite:<code>` tag.
    pub discord_server_id: Option<String>,
    /// Lower-cased host without a leading `www.`.
    pub domain: Option<String>,
    /// Lower-cased, trimmed query; only set for plain search terms.
    pub search_term: Option<String>,
    /// Trimmed query, with `https://` prepended to scheme-less URLs.
    pub processed_input: String,
}

impl NormalizedInput {
    pub fn is_discord_id(&self) -> bool {
        self.kind == InputKind::DiscordId
    }

    /// Lower-cased processed input, the haystack for keyword scans.
    pub fn haystack(&self) -> String {
        self.processed_input.to_lowercase()
    }

    fn search_term(raw: &str, discord_server_id: Option<String>) -> Self {
        Self {
            kind: InputKind::SearchTerm,
            discord_server_id,
            domain: None,
            search_term: Some(raw.to_lowercase()),
            processed_input: raw.to_string(),
        }
    }
}

/// Check whether `value` is a bare Discord snowflake.
pub fn is_snowflake(value: &str) -> bool {
    (SNOWFLAKE_MIN_LEN..=SNOWFLAKE_MAX_LEN).contains(&value.len())
        && value.bytes().all(|b| b.is_ascii_digit())
}

/// Classify and canonicalize a raw query.
pub fn normalize(raw: &str) -> NormalizedInput {
    let trimmed = raw.trim();

    if is_snowflake(trimmed) {
        return NormalizedInput {
            kind: InputKind::DiscordId,
            discord_server_id: Some(trimmed.to_string()),
            domain: None,
            search_term: None,
            processed_input: trimmed.to_string(),
        };
    }

    let lower = trimmed.to_lowercase();
    if !(lower.contains("http") || lower.contains('.') || lower.contains("discord.gg")) {
        return NormalizedInput::search_term(trimmed, None);
    }

    let mut discord_server_id = if lower.contains("discord.gg/") {
        invite_code(trimmed).map(|code| format!("invite:{}", code))
    } else {
        None
    };

    let processed = if lower.starts_with("http://") || lower.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let domain = match Url::parse(&processed) {
        Ok(url) => url.host_str().map(|host| {
            let host = host.to_lowercase();
            host.strip_prefix("www.").map(str::to_string).unwrap_or(host)
        }),
        Err(e) => {
            tracing::debug!(error = %e, "Query looked like a URL but failed to parse");
            None
        }
    };

    let Some(domain) = domain.filter(|d| !d.is_empty()) else {
        return NormalizedInput::search_term(trimmed, discord_server_id);
    };

    if discord_server_id.is_none() {
        discord_server_id = extract_discord_id(&processed);
    }

    let kind = match &discord_server_id {
        Some(id) if id.starts_with("invite:") => InputKind::DiscordInvite,
        _ => InputKind::Url,
    };

    NormalizedInput {
        kind,
        discord_server_id,
        domain: Some(domain),
        search_term: None,
        processed_input: processed,
    }
}

/// Extract a Discord invite tag or server snowflake from a link.
///
/// Invite links yield `invite:<code>`; otherwise the first 17-19 digit run
/// in the link (e.g. the guild segment of a channel URL) is returned.
///
/// ```
/// use fivemdb_compliance::normalize::extract_discord_id;
///
/// assert_eq!(
///     extract_discord_id("https://discord.gg/abc123").as_deref(),
///     Some("invite:abc123")
/// );
/// assert_eq!(
///     extract_discord_id("https://discord.com/channels/123456789012345678/1").as_deref(),
///     Some("123456789012345678")
/// );
/// assert_eq!(extract_discord_id("https://tebex.io/store"), None);
/// ```
pub fn extract_discord_id(link: &str) -> Option<String> {
    let lower = link.to_lowercase();
    if INVITE_MARKERS.iter().any(|marker| lower.contains(marker)) {
        return invite_code(link).map(|code| format!("invite:{}", code));
    }

    link.split(|c: char| !c.is_ascii_digit())
        .find(|run| is_snowflake(run))
        .map(str::to_string)
}

/// Invite code: the last path segment, without query or fragment.
fn invite_code(link: &str) -> Option<&str> {
    let without_suffix = link
        .split(|c| c == '?' || c == '#')
        .next()
        .unwrap_or(link)
        .trim_end_matches('/');
    let code = without_suffix.rsplit('/').next()?;
    if code.is_empty() || code.contains('.') {
        None
    } else {
        Some(code)
    }
}

#[cfg(test)]
mod tests {
    use crate::normalize::{extract_discord_id, is_snowflake, normalize, InputKind};

    #[test]
    fn snowflake_is_discord_id() {
        let input = normalize("123456789012345678");
        assert_eq!(input.kind, InputKind::DiscordId);
        assert_eq!(input.discord_server_id.as_deref(), Some("123456789012345678"));
        assert!(input.domain.is_none());
        assert!(input.search_term.is_none());
    }

    #[test]
    fn snowflake_bounds() {
        assert!(!is_snowflake("1234567890123456"));
        assert!(is_snowflake("12345678901234567"));
        assert!(is_snowflake("1234567890123456789"));
        assert!(!is_snowflake("12345678901234567890"));
        assert!(!is_snowflake("12345678901234567a"));
    }

    #[test]
    fn discord_invite_extraction() {
        let input = normalize("https://discord.gg/abc123");
        assert_eq!(input.kind, InputKind::DiscordInvite);
        assert_eq!(input.discord_server_id.as_deref(), Some("invite:abc123"));
        assert_eq!(input.domain.as_deref(), Some("discord.gg"));
    }

    #[test]
    fn schemeless_invite_gets_https_prefix() {
        let input = normalize("discord.gg/AbC123");
        assert_eq!(input.processed_input, "https://discord.gg/AbC123");
        assert_eq!(input.discord_server_id.as_deref(), Some("invite:AbC123"));
    }

    #[test]
    fn url_strips_www_and_lowercases() {
        let input = normalize("https://WWW.Example-Store.tebex.io/package/1");
        assert_eq!(input.kind, InputKind::Url);
        assert_eq!(input.domain.as_deref(), Some("example-store.tebex.io"));
        assert!(input.search_term.is_none());
        assert!(input.discord_server_id.is_none());
    }

    #[test]
    fn bare_domain_is_url() {
        let input = normalize("leakzone.net");
        assert_eq!(input.kind, InputKind::Url);
        assert_eq!(input.domain.as_deref(), Some("leakzone.net"));
        assert_eq!(input.processed_input, "https://leakzone.net");
    }

    #[test]
    fn channel_url_yields_guild_snowflake() {
        let input = normalize("https://discord.com/channels/123456789012345678/987654321098765432");
        assert_eq!(input.discord_server_id.as_deref(), Some("123456789012345678"));
    }

    #[test]
    fn unparseable_url_falls_back_to_search_term() {
        let input = normalize("bad host.com");
        assert_eq!(input.kind, InputKind::SearchTerm);
        assert_eq!(input.search_term.as_deref(), Some("bad host.com"));
        assert!(input.domain.is_none());
    }

    #[test]
    fn plain_name_is_search_term() {
        let input = normalize("  Shady Scripts ");
        assert_eq!(input.kind, InputKind::SearchTerm);
        assert_eq!(input.search_term.as_deref(), Some("shady scripts"));
        assert_eq!(input.processed_input, "Shady Scripts");
    }

    #[test]
    fn empty_input_is_empty_search_term() {
        let input = normalize("   ");
        assert_eq!(input.kind, InputKind::SearchTerm);
        assert_eq!(input.search_term.as_deref(), Some(""));
        assert_eq!(input.processed_input, "");
    }

    #[test]
    fn invite_code_ignores_query_string() {
        assert_eq!(
            extract_discord_id("https://discord.gg/xyz?event=1").as_deref(),
            Some("invite:xyz")
        );
        assert_eq!(
            extract_discord_id("https://discord.com/invite/xyz/").as_deref(),
            Some("invite:xyz")
        );
    }
}
