use serde::{Deserialize, Serialize};

use chrono::{DateTime, Local, Utc};
use url::Url;
use uuid::Uuid;

/// Domain used when a tab's URL cannot be parsed
pub const UNKNOWN_DOMAIN: &str = "unknown";

/// A single saved browser page entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: String,
    pub title: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fav_icon_url: Option<String>,
    /// Hostname derived from `url` at save time. Not recomputed on edit.
    pub domain: String,
    pub saved_at: DateTime<Utc>,
    /// Set only when the tab has been edited
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Tab {
    /// Create a tab from a captured page at save time
    pub fn new(title: String, url: String, fav_icon_url: Option<String>) -> Self {
        let domain = extract_domain(&url);
        Self {
            id: generate_id(),
            title,
            url,
            fav_icon_url,
            domain,
            saved_at: Utc::now(),
            updated_at: None,
        }
    }
}

/// One save-snapshot event ("session") of tabs, belonging to a tag
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub tabs: Vec<Tab>,
    pub is_locked: bool,
}

impl Group {
    /// Create a session group named after the local save time.
    /// `tabs` must be non-empty; an empty save never produces a group.
    pub fn session(tabs: Vec<Tab>) -> Self {
        Self {
            id: generate_id(),
            name: format_session_name(Local::now()),
            created_at: Utc::now(),
            tabs,
            is_locked: false,
        }
    }
}

/// Top-level named partition of the collection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub groups: Vec<Group>,
    pub is_system: bool,
    pub is_locked: bool,
    pub is_collapsed: bool,
}

/// Aggregate totals across the collection
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Counts {
    pub tag_count: usize,
    pub group_count: usize,
    pub tab_count: usize,
}

/// Generate a unique entity ID
pub fn generate_id() -> String {
    // Use first 12 chars of UUID for shorter IDs
    Uuid::new_v4().to_string()[..12].to_string()
}

/// Extract the hostname from a URL, falling back to the sentinel value
pub fn extract_domain(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => parsed
            .host_str()
            .map(|h| h.to_string())
            .unwrap_or_else(|| UNKNOWN_DOMAIN.to_string()),
        Err(_) => UNKNOWN_DOMAIN.to_string(),
    }
}

/// Format a session group name from the local save time
pub fn format_session_name(date: DateTime<Local>) -> String {
    format!("Session {}", date.format("%Y-%m-%d %H:%M"))
}

/// Check whether a URL points at the browser's own UI pages.
/// These must never be persisted into the collection.
pub fn is_internal_url(url: &str) -> bool {
    url.starts_with("chrome://")
        || url.starts_with("chrome-extension://")
        || url.starts_with("about:")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_id() {
        let id = generate_id();
        assert_eq!(id.len(), 12);
        assert_ne!(id, generate_id());
    }

    #[test]
    fn test_extract_domain() {
        assert_eq!(extract_domain("https://example.com/page"), "example.com");
        assert_eq!(
            extract_domain("https://sub.example.com:8080/x?q=1"),
            "sub.example.com"
        );
        assert_eq!(extract_domain("not a url"), UNKNOWN_DOMAIN);
        // Parses but has no host
        assert_eq!(extract_domain("data:text/plain,hi"), UNKNOWN_DOMAIN);
    }

    #[test]
    fn test_is_internal_url() {
        assert!(is_internal_url("chrome://settings"));
        assert!(is_internal_url("chrome-extension://abc/options.html"));
        assert!(is_internal_url("about:blank"));
        assert!(!is_internal_url("https://example.com"));
    }

    #[test]
    fn test_format_session_name() {
        use chrono::TimeZone;
        let date = Local.with_ymd_and_hms(2024, 3, 7, 9, 5, 0).unwrap();
        assert_eq!(format_session_name(date), "Session 2024-03-07 09:05");
    }

    #[test]
    fn test_tab_new_derives_domain() {
        let tab = Tab::new(
            "Example".to_string(),
            "https://example.com/a".to_string(),
            None,
        );
        assert_eq!(tab.domain, "example.com");
        assert!(tab.updated_at.is_none());
    }

    #[test]
    fn test_wire_field_names() {
        let tab = Tab::new(
            "T".to_string(),
            "https://example.com".to_string(),
            Some("https://example.com/favicon.ico".to_string()),
        );
        let json = serde_json::to_value(&tab).unwrap();
        assert!(json.get("favIconUrl").is_some());
        assert!(json.get("savedAt").is_some());
        assert!(json.get("updatedAt").is_none());
    }
}
