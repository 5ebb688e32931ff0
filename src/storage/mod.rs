//! Persisted document storage.
//!
//! Each document is one JSON file read and written as a whole; callers
//! read-modify-write the full structure, so every mutation is a single
//! atomic replacement at the storage boundary. Two writers racing on the
//! same document resolve as last-write-wins; there is no merge and no
//! optimistic locking.

use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::{watch, Mutex};
use tracing::debug;

use crate::collection::{staging_tag, Tag};
use crate::error::{Error, Result};
use crate::settings::Settings;

const MAX_BACKUP_GENERATIONS: usize = 3;

/// One persisted whole-document value
pub struct DocItem<T> {
    path: PathBuf,
    fallback: T,
    backups: bool,
    lock: Mutex<()>,
    tx: watch::Sender<T>,
}

impl<T> DocItem<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn new(path: PathBuf, fallback: T, backups: bool) -> Self {
        let (tx, _) = watch::channel(fallback.clone());
        Self {
            path,
            fallback,
            backups,
            lock: Mutex::new(()),
            tx,
        }
    }

    /// Load the current value, applying the fallback when nothing has been
    /// persisted yet
    pub async fn get(&self) -> Result<T> {
        let _lock = self.lock.lock().await;

        if !self.path.exists() {
            return Ok(self.fallback.clone());
        }

        let content = fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Replace the whole document and notify subscribers
    pub async fn set(&self, value: &T) -> Result<()> {
        let _lock = self.lock.lock().await;

        if self.backups {
            self.create_backup().await?;
        }

        let json = serde_json::to_string_pretty(value)?;

        // Atomic write: write to temp file, then rename
        let temp_path = self.path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(json.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &self.path).await?;
        debug!(path = %self.path.display(), "document written");

        self.tx.send_replace(value.clone());
        Ok(())
    }

    /// Subscribe to document changes; each `set` delivers the new value
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }

    /// Create rolling backups of the current document
    async fn create_backup(&self) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }

        // Roll backups: .bak.2 -> .bak.3, .bak.1 -> .bak.2, .bak -> .bak.1
        for i in (1..MAX_BACKUP_GENERATIONS).rev() {
            let from = if i == 1 {
                self.path.with_extension("bak")
            } else {
                self.path.with_extension(format!("bak.{}", i))
            };
            let to = self.path.with_extension(format!("bak.{}", i + 1));

            if from.exists() {
                // Remove target if exists (fs::rename doesn't overwrite on all platforms)
                if to.exists() {
                    let _ = fs::remove_file(&to).await;
                }
                fs::rename(&from, &to).await?;
            }
        }

        // Current file -> .bak
        let bak = self.path.with_extension("bak");
        if bak.exists() {
            let _ = fs::remove_file(&bak).await;
        }
        fs::copy(&self.path, &bak).await?;

        Ok(())
    }
}

/// The three persisted documents of a profile
pub struct Store {
    profile: String,
    dir: PathBuf,
    pub tags: DocItem<Vec<Tag>>,
    pub settings: DocItem<Settings>,
    /// Reserved for future soft-delete; no current mutation populates it
    pub recycle_bin: DocItem<Vec<Tag>>,
}

impl Store {
    /// Open (creating if needed) the store for a profile
    pub async fn new(profile: &str) -> Result<Self> {
        let base = Self::data_dir()?;
        let dir = base.join("profiles").join(profile);
        Self::open_dir(profile, dir).await
    }

    /// Open a store rooted at an explicit directory
    pub async fn open_dir(profile: &str, dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).await?;

        Ok(Self {
            profile: profile.to_string(),
            tags: DocItem::new(dir.join("tags.json"), vec![staging_tag()], true),
            settings: DocItem::new(dir.join("settings.json"), Settings::default(), false),
            recycle_bin: DocItem::new(dir.join("recycle_bin.json"), Vec::new(), false),
            dir,
        })
    }

    /// Base data directory (`TABCLUE_DATA_DIR` overrides the default)
    pub fn data_dir() -> Result<PathBuf> {
        if let Ok(dir) = std::env::var("TABCLUE_DATA_DIR") {
            return Ok(PathBuf::from(dir));
        }
        let home =
            dirs::home_dir().ok_or_else(|| Error::config("Cannot determine home directory"))?;
        Ok(home.join(".tabclue"))
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::{Group, Tab, STAGING_TAG_ID};
    use tempfile::tempdir;

    async fn test_store() -> (tempfile::TempDir, Store) {
        let dir = tempdir().unwrap();
        let store = Store::open_dir("test", dir.path().join("profiles/test"))
            .await
            .unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_tags_fallback_is_staging() {
        let (_dir, store) = test_store().await;
        let tags = store.tags.get().await.unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].id, STAGING_TAG_ID);
        assert!(tags[0].is_system);
        assert!(tags[0].groups.is_empty());
    }

    #[tokio::test]
    async fn test_settings_fallback_is_default() {
        let (_dir, store) = test_store().await;
        let settings = store.settings.get().await.unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[tokio::test]
    async fn test_recycle_bin_fallback_is_empty() {
        let (_dir, store) = test_store().await;
        assert!(store.recycle_bin.get().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let (_dir, store) = test_store().await;

        let mut tags = store.tags.get().await.unwrap();
        let tab = Tab::new("test".to_string(), "https://example.com".to_string(), None);
        tags[0].groups.push(Group::session(vec![tab]));
        store.tags.set(&tags).await.unwrap();

        let loaded = store.tags.get().await.unwrap();
        assert_eq!(loaded, tags);
    }

    #[tokio::test]
    async fn test_subscription_delivers_new_value() {
        let (_dir, store) = test_store().await;
        let mut rx = store.settings.subscribe();

        let mut settings = Settings::default();
        settings.show_favicons = true;
        store.settings.set(&settings).await.unwrap();

        rx.changed().await.unwrap();
        assert!(rx.borrow().show_favicons);
    }

    #[tokio::test]
    async fn test_rolling_backup_created() {
        let (_dir, store) = test_store().await;

        let tags = store.tags.get().await.unwrap();
        store.tags.set(&tags).await.unwrap();
        store.tags.set(&tags).await.unwrap();

        let bak = store.dir().join("tags.bak");
        assert!(bak.exists());
    }
}
