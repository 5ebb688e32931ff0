use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "tabclue")]
#[command(version, about = "Snapshot browser tabs into a persistent collection", long_about = None)]
pub struct Args {
    /// Profile to use
    #[arg(short, long, global = true, env = "TABCLUE_PROFILE")]
    pub profile: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Save a snapshot of open tabs from a manifest file
    Save {
        /// JSON manifest of open tabs ([{"url", "title", "favIconUrl", "handle"}])
        #[arg(short, long)]
        from: PathBuf,

        /// Target tag ID (default: configured default tag)
        #[arg(short, long)]
        tag: Option<String>,
    },

    /// List saved tabs
    List {
        /// Restrict to one tag
        #[arg(short, long)]
        tag: Option<String>,

        /// Restrict to one session group
        #[arg(short, long)]
        group: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove a saved tab
    Remove {
        /// Tab ID
        id: String,
    },

    /// Remove several saved tabs at once
    RemoveMany {
        /// Tab IDs
        ids: Vec<String>,
    },

    /// Edit a saved tab's title and URL
    Edit {
        /// Tab ID
        id: String,

        /// New title (unchanged if omitted)
        #[arg(short, long)]
        title: Option<String>,

        /// New URL (unchanged if omitted)
        #[arg(short, long)]
        url: Option<String>,
    },

    /// Open a saved tab in the default browser
    Open {
        /// Tab ID
        id: String,
    },

    /// Derived views over the collection
    Views {
        #[command(subcommand)]
        view: ViewAction,
    },

    /// Tag management
    Tag {
        #[command(subcommand)]
        action: TagAction,
    },

    /// Export the collection and settings to a file
    Export {
        /// Output path (default: tabclue-export-<date>.json)
        path: Option<PathBuf>,
    },

    /// Import a previously exported file, replacing the collection
    Import {
        /// Exported JSON file
        path: PathBuf,
    },

    /// Show or change settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Show version
    Version,
}

#[derive(Subcommand, Debug)]
pub enum ViewAction {
    /// Rank distinct URLs by save frequency
    MostVisited {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Group all tabs by domain
    BySite {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List session groups across all tags
    Sessions {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum TagAction {
    /// Toggle a tag's collapsed state
    Collapse {
        /// Tag ID
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum SettingsAction {
    /// Print the current settings
    Show,

    /// Set one setting (key in camelCase, e.g. displayLimit)
    Set { key: String, value: String },
}
