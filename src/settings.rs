use serde::{Deserialize, Serialize};

use crate::collection::STAGING_TAG_ID;

/// Display-limit choices offered by the dashboard
pub const DISPLAY_LIMIT_OPTIONS: [u32; 5] = [25, 50, 100, 200, 500];

/// Default number of items a view renders per page
pub const DEFAULT_DISPLAY_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Es,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    System,
}

/// Flat user configuration record, persisted as a whole document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub language: Language,
    pub theme: Theme,
    pub close_tabs_after_save: bool,
    pub show_close_confirmation: bool,
    /// Save destination; must reference an existing tag or fall back to
    /// the staging tag
    pub default_tag_id: String,
    pub virtual_scroll_threshold: u32,
    pub show_favicons: bool,
    pub display_limit: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            language: Language::En,
            theme: Theme::System,
            close_tabs_after_save: true,
            show_close_confirmation: true,
            default_tag_id: STAGING_TAG_ID.to_string(),
            virtual_scroll_threshold: 100,
            show_favicons: false,
            display_limit: DEFAULT_DISPLAY_LIMIT,
        }
    }
}

impl Settings {
    /// Clamp the display limit to the enumerated option set
    pub fn normalized_display_limit(&self) -> u32 {
        if DISPLAY_LIMIT_OPTIONS.contains(&self.display_limit) {
            self.display_limit
        } else {
            DEFAULT_DISPLAY_LIMIT
        }
    }
}
