//! Pure mutation cores over the tag collection.
//!
//! Each function transforms a collection in place and reports what it did;
//! the async read-modify-write round trips live in [`crate::engine`].

use std::collections::HashSet;

use chrono::Utc;

use super::{staging_tag, Group, Tag, STAGING_TAG_ID};

/// Prepend a session group to the target tag's groups (newest first).
///
/// Falls back to the staging tag when the target ID is missing; the staging
/// tag is re-created at the front of the collection if it is gone entirely.
/// Returns the ID of the tag that received the group.
pub fn prepend_group(tags: &mut Vec<Tag>, target_tag_id: Option<&str>, group: Group) -> String {
    let target = target_tag_id.unwrap_or(STAGING_TAG_ID);

    let index = tags
        .iter()
        .position(|t| t.id == target)
        .or_else(|| tags.iter().position(|t| t.id == STAGING_TAG_ID));

    match index {
        Some(i) => {
            tags[i].groups.insert(0, group);
            tags[i].id.clone()
        }
        None => {
            let mut tag = staging_tag();
            tag.groups.push(group);
            tags.insert(0, tag);
            STAGING_TAG_ID.to_string()
        }
    }
}

/// Remove the tab with the given ID wherever it occurs.
///
/// An emptied group is left in place; groups are not auto-pruned.
pub fn remove_tab(tags: &mut [Tag], id: &str) -> bool {
    let mut removed = false;
    for tag in tags.iter_mut() {
        for group in tag.groups.iter_mut() {
            let before = group.tabs.len();
            group.tabs.retain(|tab| tab.id != id);
            if group.tabs.len() != before {
                removed = true;
            }
        }
    }
    removed
}

/// Remove every tab whose ID is in the set, in one pass.
/// Returns the number of tabs removed.
pub fn remove_tabs(tags: &mut [Tag], ids: &HashSet<String>) -> usize {
    let mut removed = 0;
    for tag in tags.iter_mut() {
        for group in tag.groups.iter_mut() {
            let before = group.tabs.len();
            group.tabs.retain(|tab| !ids.contains(&tab.id));
            removed += before - group.tabs.len();
        }
    }
    removed
}

/// Replace a tab's title and URL in place, stamping `updatedAt`.
///
/// `domain` reflects the save-time classification and is NOT recomputed;
/// an edited URL may show a stale domain until the next re-save.
pub fn edit_tab(tags: &mut [Tag], id: &str, title: &str, url: &str) -> bool {
    for tag in tags.iter_mut() {
        for group in tag.groups.iter_mut() {
            for tab in group.tabs.iter_mut() {
                if tab.id == id {
                    tab.title = title.to_string();
                    tab.url = url.to_string();
                    tab.updated_at = Some(Utc::now());
                    return true;
                }
            }
        }
    }
    false
}

/// Flip `isCollapsed` on the matching tag. Unknown IDs are a no-op.
pub fn toggle_collapse(tags: &mut [Tag], tag_id: &str) -> bool {
    if let Some(tag) = tags.iter_mut().find(|t| t.id == tag_id) {
        tag.is_collapsed = !tag.is_collapsed;
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::Tab;

    fn sample_tags() -> Vec<Tag> {
        let mut tags = vec![staging_tag()];
        let tabs = vec![
            Tab::new("A".to_string(), "https://a.example.com".to_string(), None),
            Tab::new("B".to_string(), "https://b.example.com".to_string(), None),
        ];
        tags[0].groups.push(Group::session(tabs));
        tags
    }

    #[test]
    fn test_prepend_group_newest_first() {
        let mut tags = sample_tags();
        let first_id = tags[0].groups[0].id.clone();

        let group = Group::session(vec![Tab::new(
            "C".to_string(),
            "https://c.example.com".to_string(),
            None,
        )]);
        let new_id = group.id.clone();
        let target = prepend_group(&mut tags, Some(STAGING_TAG_ID), group);

        assert_eq!(target, STAGING_TAG_ID);
        assert_eq!(tags[0].groups[0].id, new_id);
        assert_eq!(tags[0].groups[1].id, first_id);
    }

    #[test]
    fn test_prepend_group_missing_target_falls_back_to_staging() {
        let mut tags = sample_tags();
        let group = Group::session(vec![Tab::new(
            "C".to_string(),
            "https://c.example.com".to_string(),
            None,
        )]);
        let target = prepend_group(&mut tags, Some("no-such-tag"), group);
        assert_eq!(target, STAGING_TAG_ID);
        assert_eq!(tags[0].groups.len(), 2);
    }

    #[test]
    fn test_prepend_group_recreates_staging() {
        let mut tags: Vec<Tag> = Vec::new();
        let group = Group::session(vec![Tab::new(
            "C".to_string(),
            "https://c.example.com".to_string(),
            None,
        )]);
        prepend_group(&mut tags, None, group);
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].id, STAGING_TAG_ID);
        assert!(tags[0].is_system);
        assert_eq!(tags[0].groups.len(), 1);
    }

    #[test]
    fn test_remove_tab_leaves_empty_group() {
        let mut tags = sample_tags();
        let id_a = tags[0].groups[0].tabs[0].id.clone();
        let id_b = tags[0].groups[0].tabs[1].id.clone();

        assert!(remove_tab(&mut tags, &id_a));
        assert!(remove_tab(&mut tags, &id_b));
        assert!(!remove_tab(&mut tags, &id_a));

        // Group stays, just empty
        assert_eq!(tags[0].groups.len(), 1);
        assert!(tags[0].groups[0].tabs.is_empty());
    }

    #[test]
    fn test_remove_tabs_bulk() {
        let mut tags = sample_tags();
        let ids: HashSet<String> = tags[0].groups[0]
            .tabs
            .iter()
            .map(|t| t.id.clone())
            .collect();

        assert_eq!(remove_tabs(&mut tags, &ids), 2);
        assert!(tags[0].groups[0].tabs.is_empty());
        assert_eq!(remove_tabs(&mut tags, &ids), 0);
    }

    #[test]
    fn test_edit_tab_keeps_stale_domain() {
        let mut tags = sample_tags();
        let id = tags[0].groups[0].tabs[0].id.clone();

        assert!(edit_tab(
            &mut tags,
            &id,
            "New title",
            "https://elsewhere.org/page"
        ));

        let tab = &tags[0].groups[0].tabs[0];
        assert_eq!(tab.title, "New title");
        assert_eq!(tab.url, "https://elsewhere.org/page");
        assert!(tab.updated_at.is_some());
        // Domain still reflects the save-time classification
        assert_eq!(tab.domain, "a.example.com");
    }

    #[test]
    fn test_edit_unknown_tab_is_noop() {
        let mut tags = sample_tags();
        assert!(!edit_tab(&mut tags, "missing", "t", "https://x.com"));
    }

    #[test]
    fn test_toggle_collapse() {
        let mut tags = sample_tags();
        assert!(!tags[0].is_collapsed);
        assert!(toggle_collapse(&mut tags, STAGING_TAG_ID));
        assert!(tags[0].is_collapsed);
        assert!(toggle_collapse(&mut tags, STAGING_TAG_ID));
        assert!(!tags[0].is_collapsed);
        assert!(!toggle_collapse(&mut tags, "missing"));
    }
}
