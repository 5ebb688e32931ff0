mod item;
pub mod mutate;

pub use item::{
    extract_domain, format_session_name, generate_id, is_internal_url, Counts, Group, Tab, Tag,
    UNKNOWN_DOMAIN,
};

/// ID of the reserved, non-deletable default tag
pub const STAGING_TAG_ID: &str = "staging-area";

/// Build the system staging tag (the fallback collection value)
pub fn staging_tag() -> Tag {
    Tag {
        id: STAGING_TAG_ID.to_string(),
        name: "Staging Area".to_string(),
        created_at: chrono::Utc::now(),
        groups: Vec::new(),
        is_system: true,
        is_locked: false,
        is_collapsed: false,
    }
}
