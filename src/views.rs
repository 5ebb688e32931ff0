//! Read-only projections derived from the tag collection.
//!
//! Every derivation is a pure function over the current collection: no
//! input mutation, recomputed per query, stable under repeated calls.
//! Aggregation maps preserve insertion order so count ties stay
//! deterministic.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::collection::{Counts, Tab, Tag};

/// One entry per distinct URL across the whole collection
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MostVisitedItem {
    pub url: String,
    pub title: String,
    pub domain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fav_icon_url: Option<String>,
    pub count: usize,
    pub last_saved_at: DateTime<Utc>,
}

/// One entry per distinct domain across the whole collection
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DomainGroup {
    pub domain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fav_icon_url: Option<String>,
    pub tabs: Vec<Tab>,
    pub total_count: usize,
}

/// Fixed band over the most-visited ranking, `[from, to)`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RankTier {
    pub id: &'static str,
    pub label: &'static str,
    pub from: usize,
    pub to: usize,
    pub count: usize,
}

/// One entry per session group, across all tags
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionEntry {
    pub tag_id: String,
    pub group_id: String,
    pub name: String,
    pub tab_count: usize,
    pub created_at: DateTime<Utc>,
}

fn all_tabs_iter(tags: &[Tag]) -> impl Iterator<Item = &Tab> {
    tags.iter()
        .flat_map(|tag| tag.groups.iter())
        .flat_map(|group| group.tabs.iter())
}

/// Rank every distinct URL by how often it was saved, most frequent first.
///
/// Title and favicon come from the occurrence with the strictly latest
/// `savedAt`; equal timestamps keep the first-seen value. Count ties keep
/// first-seen order.
pub fn most_visited(tags: &[Tag]) -> Vec<MostVisitedItem> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut items: Vec<MostVisitedItem> = Vec::new();

    for tab in all_tabs_iter(tags) {
        match index.get(&tab.url) {
            Some(&i) => {
                let existing = &mut items[i];
                existing.count += 1;
                if tab.saved_at > existing.last_saved_at {
                    existing.last_saved_at = tab.saved_at;
                    existing.title = tab.title.clone();
                    existing.fav_icon_url = tab.fav_icon_url.clone();
                }
            }
            None => {
                index.insert(tab.url.clone(), items.len());
                items.push(MostVisitedItem {
                    url: tab.url.clone(),
                    title: tab.title.clone(),
                    domain: tab.domain.clone(),
                    fav_icon_url: tab.fav_icon_url.clone(),
                    count: 1,
                    last_saved_at: tab.saved_at,
                });
            }
        }
    }

    items.sort_by(|a, b| b.count.cmp(&a.count));
    items
}

/// Partition every tab by its save-time domain, largest domain first
pub fn grouped_by_site(tags: &[Tag]) -> Vec<DomainGroup> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<DomainGroup> = Vec::new();

    for tab in all_tabs_iter(tags) {
        match index.get(&tab.domain) {
            Some(&i) => {
                let existing = &mut groups[i];
                existing.tabs.push(tab.clone());
                existing.total_count += 1;
            }
            None => {
                index.insert(tab.domain.clone(), groups.len());
                groups.push(DomainGroup {
                    domain: tab.domain.clone(),
                    fav_icon_url: tab.fav_icon_url.clone(),
                    tabs: vec![tab.clone()],
                    total_count: 1,
                });
            }
        }
    }

    groups.sort_by(|a, b| b.total_count.cmp(&a.total_count));
    groups
}

/// Bucket a most-visited ranking of length `len` into fixed bands.
/// Empty bands are omitted.
pub fn rank_tiers(len: usize) -> Vec<RankTier> {
    const BANDS: [(&str, &str, usize, usize); 3] = [
        ("top-10", "Top 10", 0, 10),
        ("top-11-25", "Top 11-25", 10, 25),
        ("top-26-50", "Top 26-50", 25, 50),
    ];

    let mut tiers = Vec::new();
    for (id, label, from, to) in BANDS {
        if len > from {
            tiers.push(RankTier {
                id,
                label,
                from,
                to,
                count: len.min(to) - from,
            });
        }
    }
    if len > 50 {
        tiers.push(RankTier {
            id: "rest",
            label: "Rest",
            from: 50,
            to: len,
            count: len - 50,
        });
    }
    tiers
}

/// List every session group across all tags, in collection order
pub fn session_entries(tags: &[Tag]) -> Vec<SessionEntry> {
    tags.iter()
        .flat_map(|tag| {
            tag.groups.iter().map(|group| SessionEntry {
                tag_id: tag.id.clone(),
                group_id: group.id.clone(),
                name: group.name.clone(),
                tab_count: group.tabs.len(),
                created_at: group.created_at,
            })
        })
        .collect()
}

/// Aggregate tag/group/tab totals
pub fn counts(tags: &[Tag]) -> Counts {
    Counts {
        tag_count: tags.len(),
        group_count: tags.iter().map(|t| t.groups.len()).sum(),
        tab_count: all_tabs_iter(tags).count(),
    }
}

/// Tabs of one session group. A missing ID yields an empty list.
pub fn tabs_in_group(tags: &[Tag], group_id: &str) -> Vec<Tab> {
    for tag in tags {
        if let Some(group) = tag.groups.iter().find(|g| g.id == group_id) {
            return group.tabs.clone();
        }
    }
    Vec::new()
}

/// Tabs of one tag, across its groups. A missing ID yields an empty list.
pub fn tabs_in_tag(tags: &[Tag], tag_id: &str) -> Vec<Tab> {
    tags.iter()
        .find(|t| t.id == tag_id)
        .map(|tag| {
            tag.groups
                .iter()
                .flat_map(|g| g.tabs.iter().cloned())
                .collect()
        })
        .unwrap_or_default()
}

/// Every tab in the collection, in collection order
pub fn all_tabs(tags: &[Tag]) -> Vec<Tab> {
    all_tabs_iter(tags).cloned().collect()
}
