//! Mutation engine.
//!
//! Every operation is one read-modify-write round trip against the
//! persisted documents: load the whole collection, apply the pure core
//! from [`crate::collection::mutate`], write the whole collection back.
//! Storage failures propagate; they are never absorbed here.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::browser::OpenTab;
use crate::collection::{is_internal_url, mutate, Counts, Group, Tab, Tag};
use crate::error::{Error, Result};
use crate::settings::Settings;
use crate::storage::Store;
use crate::views;

/// Result of a save-snapshot operation
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SaveOutcome {
    pub success: bool,
    pub saved_count: usize,
    /// Absent when nothing was eligible to save
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    /// Handles of the archived tabs, for the caller to optionally close
    pub tab_handles: Vec<u64>,
}

/// Versioned export snapshot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportData {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    pub tags: Vec<Tag>,
    pub settings: Settings,
}

pub struct Engine {
    store: Store,
}

impl Engine {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Snapshot the given open tabs into a new session group.
    ///
    /// Privileged/internal pages are filtered out first; when nothing
    /// eligible remains, no group is produced and nothing is written.
    /// The target falls back to the configured default tag, and from
    /// there to the staging tag if the target no longer exists.
    pub async fn save_snapshot(
        &self,
        open_tabs: &[OpenTab],
        target_tag_id: Option<&str>,
    ) -> Result<SaveOutcome> {
        let eligible: Vec<&OpenTab> = open_tabs
            .iter()
            .filter(|t| !is_internal_url(&t.url))
            .collect();

        if eligible.is_empty() {
            return Ok(SaveOutcome {
                success: true,
                saved_count: 0,
                group_id: None,
                tab_handles: Vec::new(),
            });
        }

        let tabs: Vec<Tab> = eligible
            .iter()
            .map(|t| {
                Tab::new(
                    t.title.clone().unwrap_or_else(|| "Untitled".to_string()),
                    t.url.clone(),
                    t.fav_icon_url.clone(),
                )
            })
            .collect();
        let tab_handles: Vec<u64> = eligible.iter().filter_map(|t| t.handle).collect();

        let group = Group::session(tabs);
        let group_id = group.id.clone();
        let saved_count = group.tabs.len();

        let target = match target_tag_id {
            Some(id) => id.to_string(),
            None => self.store.settings.get().await?.default_tag_id,
        };

        let mut tags = self.store.tags.get().await?;
        let landed = mutate::prepend_group(&mut tags, Some(&target), group);
        self.store.tags.set(&tags).await?;

        info!(count = saved_count, tag = %landed, "saved tab snapshot");
        Ok(SaveOutcome {
            success: true,
            saved_count,
            group_id: Some(group_id),
            tab_handles,
        })
    }

    /// Remove one tab wherever it occurs. Returns whether anything changed.
    pub async fn delete_tab(&self, id: &str) -> Result<bool> {
        let mut tags = self.store.tags.get().await?;
        let removed = mutate::remove_tab(&mut tags, id);
        if removed {
            self.store.tags.set(&tags).await?;
        }
        Ok(removed)
    }

    /// Remove every selected tab in one pass. Returns the removal count.
    pub async fn delete_selected(&self, ids: &HashSet<String>) -> Result<usize> {
        let mut tags = self.store.tags.get().await?;
        let removed = mutate::remove_tabs(&mut tags, ids);
        if removed > 0 {
            self.store.tags.set(&tags).await?;
        }
        Ok(removed)
    }

    /// Replace a tab's title and URL, stamping `updatedAt`
    pub async fn edit_tab(&self, id: &str, title: &str, url: &str) -> Result<bool> {
        let mut tags = self.store.tags.get().await?;
        let edited = mutate::edit_tab(&mut tags, id, title, url);
        if edited {
            self.store.tags.set(&tags).await?;
        }
        Ok(edited)
    }

    /// Flip a tag's collapsed flag
    pub async fn toggle_collapse(&self, tag_id: &str) -> Result<bool> {
        let mut tags = self.store.tags.get().await?;
        let toggled = mutate::toggle_collapse(&mut tags, tag_id);
        if toggled {
            self.store.tags.set(&tags).await?;
        }
        Ok(toggled)
    }

    /// Produce a versioned snapshot of the collection and settings
    pub async fn export(&self) -> Result<ExportData> {
        Ok(ExportData {
            version: 1,
            exported_at: Utc::now(),
            tags: self.store.tags.get().await?,
            settings: self.store.settings.get().await?,
        })
    }

    /// Replace the collection (and settings, if present) from an exported
    /// payload. Rejects without touching storage unless `version` is
    /// truthy and `tags` is an array; import is destructive, not a merge.
    pub async fn import(&self, payload: &str) -> Result<Counts> {
        let value: Value =
            serde_json::from_str(payload).map_err(|e| Error::import(format!("not JSON: {}", e)))?;

        if !is_truthy(value.get("version")) {
            return Err(Error::import("missing version"));
        }
        let Some(tags_value) = value.get("tags").filter(|t| t.is_array()) else {
            return Err(Error::import("tags must be an array"));
        };

        let tags: Vec<Tag> = serde_json::from_value(tags_value.clone())
            .map_err(|e| Error::import(format!("malformed tags: {}", e)))?;
        let settings: Option<Settings> = match value.get("settings") {
            Some(v) if !v.is_null() => Some(
                serde_json::from_value(v.clone())
                    .map_err(|e| Error::import(format!("malformed settings: {}", e)))?,
            ),
            _ => None,
        };

        let imported = views::counts(&tags);
        self.store.tags.set(&tags).await?;
        if let Some(settings) = settings {
            self.store.settings.set(&settings).await?;
        }

        info!(
            tags = imported.tag_count,
            tabs = imported.tab_count,
            "collection imported"
        );
        Ok(imported)
    }

    /// Aggregate tag/group/tab totals
    pub async fn counts(&self) -> Result<Counts> {
        let tags = self.store.tags.get().await?;
        Ok(views::counts(&tags))
    }
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
        Some(Value::Null) | None => false,
    }
}
