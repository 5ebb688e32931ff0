//! Browser collaborator interface.
//!
//! The engine never talks to a browser directly; it consumes this trait.
//! The CLI binary injects [`LocalBrowser`], which reads open tabs from a
//! JSON manifest and opens URLs through the desktop handler. A real
//! extension host would provide its own implementation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::fs;
use tracing::debug;

use crate::error::{Error, Result};

/// One currently open browser tab, as enumerated by the host
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OpenTab {
    /// Host-assigned numeric handle, used to close the tab after saving
    pub handle: Option<u64>,
    pub url: String,
    pub title: Option<String>,
    pub fav_icon_url: Option<String>,
}

#[async_trait]
pub trait Browser: Send + Sync {
    /// Enumerate currently open tabs
    async fn open_tabs(&self) -> Result<Vec<OpenTab>>;

    /// Close a set of tab handles
    async fn close_tabs(&self, handles: &[u64]) -> Result<()>;

    /// Open a URL in a new tab
    async fn open_url(&self, url: &str) -> Result<()>;

    /// Open the collection's main view at an optional sub-path, focusing
    /// an existing instance instead of spawning a duplicate
    async fn open_dashboard(&self, path: Option<&str>) -> Result<()>;
}

/// CLI-side browser: open tabs come from a manifest file, closing is a
/// recorded no-op, URLs open via the platform handler.
pub struct LocalBrowser {
    manifest: Option<PathBuf>,
}

impl LocalBrowser {
    pub fn new(manifest: Option<PathBuf>) -> Self {
        Self { manifest }
    }

    pub async fn read_manifest(path: &Path) -> Result<Vec<OpenTab>> {
        let content = fs::read_to_string(path).await?;
        serde_json::from_str(&content)
            .map_err(|e| Error::invalid_input(format!("Malformed tab manifest: {}", e)))
    }
}

#[async_trait]
impl Browser for LocalBrowser {
    async fn open_tabs(&self) -> Result<Vec<OpenTab>> {
        match &self.manifest {
            Some(path) => Self::read_manifest(path).await,
            None => Ok(Vec::new()),
        }
    }

    async fn close_tabs(&self, handles: &[u64]) -> Result<()> {
        // Nothing to close outside a real browser host
        debug!("skipping close of {} tab handle(s)", handles.len());
        Ok(())
    }

    async fn open_url(&self, url: &str) -> Result<()> {
        open::that(url).map_err(|e| Error::Other(format!("Failed to open {}: {}", url, e)))
    }

    async fn open_dashboard(&self, path: Option<&str>) -> Result<()> {
        // No dashboard outside a real browser host
        debug!("skipping dashboard open at {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_read_manifest() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"url": "https://example.com", "title": "Example", "handle": 7}},
                {{"url": "https://other.com", "favIconUrl": "https://other.com/f.ico"}}
            ]"#
        )
        .unwrap();

        let tabs = LocalBrowser::read_manifest(file.path()).await.unwrap();
        assert_eq!(tabs.len(), 2);
        assert_eq!(tabs[0].handle, Some(7));
        assert_eq!(tabs[0].title.as_deref(), Some("Example"));
        assert_eq!(tabs[1].fav_icon_url.as_deref(), Some("https://other.com/f.ico"));
        assert!(tabs[1].handle.is_none());
    }

    #[tokio::test]
    async fn test_malformed_manifest_is_invalid_input() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();

        let err = LocalBrowser::read_manifest(file.path()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
