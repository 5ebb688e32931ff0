use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tokio::fs;

use crate::bookmarks::{BookmarkCache, NoopLookup};
use crate::browser::{Browser, LocalBrowser};
use crate::cli::{Args, Command, SettingsAction, TagAction, ViewAction};
use crate::collection::Tab;
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::selection::Selection;
use crate::settings::{Language, Settings, Theme, DISPLAY_LIMIT_OPTIONS};
use crate::storage::Store;
use crate::views;

/// Default profile name
pub const DEFAULT_PROFILE: &str = "default";

pub async fn run_cli(args: Args) -> Result<()> {
    let profile = args.profile.as_deref().unwrap_or(DEFAULT_PROFILE);
    let store = Store::new(profile).await?;
    let engine = Engine::new(store);

    match args.command {
        Command::Save { from, tag } => handle_save(&engine, from, tag.as_deref()).await,

        Command::List { tag, group, json } => {
            handle_list(&engine, tag.as_deref(), group.as_deref(), json).await
        }

        Command::Remove { id } => handle_remove(&engine, &id).await,

        Command::RemoveMany { ids } => handle_remove_many(&engine, ids).await,

        Command::Edit { id, title, url } => handle_edit(&engine, &id, title, url).await,

        Command::Open { id } => handle_open(&engine, &id).await,

        Command::Views { view } => handle_views(&engine, view).await,

        Command::Tag {
            action: TagAction::Collapse { id },
        } => handle_collapse(&engine, &id).await,

        Command::Export { path } => handle_export(&engine, path).await,

        Command::Import { path } => handle_import(&engine, &path).await,

        Command::Settings { action } => handle_settings(&engine, action).await,

        Command::Version => {
            println!("tabclue v{}", crate::VERSION);
            Ok(())
        }
    }
}

async fn handle_save(engine: &Engine, manifest: PathBuf, tag: Option<&str>) -> Result<()> {
    let browser = LocalBrowser::new(Some(manifest));
    let open_tabs = browser.open_tabs().await?;

    let outcome = engine.save_snapshot(&open_tabs, tag).await?;

    if outcome.saved_count == 0 {
        println!("Nothing to save (no eligible tabs)");
        return Ok(());
    }

    let settings = engine.store().settings.get().await?;
    if settings.close_tabs_after_save {
        browser.close_tabs(&outcome.tab_handles).await?;
    }

    println!(
        "Saved {} tab(s) into group {}",
        outcome.saved_count,
        outcome.group_id.as_deref().unwrap_or("-")
    );
    Ok(())
}

async fn handle_list(
    engine: &Engine,
    tag: Option<&str>,
    group: Option<&str>,
    json: bool,
) -> Result<()> {
    let tags = engine.store().tags.get().await?;
    let settings = engine.store().settings.get().await?;

    let tabs = match (group, tag) {
        (Some(group_id), _) => views::tabs_in_group(&tags, group_id),
        (None, Some(tag_id)) => views::tabs_in_tag(&tags, tag_id),
        (None, None) => views::all_tabs(&tags),
    };

    let limit = settings.normalized_display_limit() as usize;
    let visible: Vec<Tab> = tabs.into_iter().take(limit).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&visible)?);
        return Ok(());
    }

    // Bookmark lookup is bounded to the visible slice. Outside a browser
    // host the capability degrades to "not bookmarked" for every URL.
    let cache = BookmarkCache::new(Arc::new(NoopLookup));
    let urls: Vec<String> = visible.iter().map(|t| t.url.clone()).collect();
    let bookmarked = cache.statuses(&urls).await;

    if visible.is_empty() {
        println!("No saved tabs");
        return Ok(());
    }

    for tab in &visible {
        let marker = if bookmarked.get(&tab.url).copied().unwrap_or(false) {
            "*"
        } else {
            " "
        };
        println!("{} {}  {:24}  {}", marker, tab.id, tab.domain, tab.title);
    }

    let counts = views::counts(&tags);
    println!(
        "\n{} tab(s) shown, {} total in {} group(s)",
        visible.len(),
        counts.tab_count,
        counts.group_count
    );
    Ok(())
}

async fn handle_remove(engine: &Engine, id: &str) -> Result<()> {
    if engine.delete_tab(id).await? {
        println!("Removed {}", id);
        Ok(())
    } else {
        Err(Error::TabNotFound(id.to_string()))
    }
}

async fn handle_remove_many(engine: &Engine, ids: Vec<String>) -> Result<()> {
    let mut selection = Selection::new();
    selection.select_all(ids);

    let removed = engine.delete_selected(selection.ids()).await?;
    println!("Removed {} tab(s)", removed);
    Ok(())
}

async fn handle_edit(
    engine: &Engine,
    id: &str,
    title: Option<String>,
    url: Option<String>,
) -> Result<()> {
    let tags = engine.store().tags.get().await?;
    let current = views::all_tabs(&tags)
        .into_iter()
        .find(|t| t.id == id)
        .ok_or_else(|| Error::TabNotFound(id.to_string()))?;

    let title = title.unwrap_or(current.title);
    let url = url.unwrap_or(current.url);

    engine.edit_tab(id, &title, &url).await?;
    println!("Updated {}", id);
    Ok(())
}

async fn handle_open(engine: &Engine, id: &str) -> Result<()> {
    let tags = engine.store().tags.get().await?;
    let tab = views::all_tabs(&tags)
        .into_iter()
        .find(|t| t.id == id)
        .ok_or_else(|| Error::TabNotFound(id.to_string()))?;

    let browser = LocalBrowser::new(None);
    browser.open_url(&tab.url).await
}

async fn handle_views(engine: &Engine, view: ViewAction) -> Result<()> {
    let tags = engine.store().tags.get().await?;
    let settings = engine.store().settings.get().await?;
    let limit = settings.normalized_display_limit() as usize;

    match view {
        ViewAction::MostVisited { json } => {
            let ranked = views::most_visited(&tags);
            let tiers = views::rank_tiers(ranked.len());

            if json {
                let out = serde_json::json!({ "items": ranked, "tiers": tiers });
                println!("{}", serde_json::to_string_pretty(&out)?);
                return Ok(());
            }

            for tier in &tiers {
                println!("{}:", tier.label);
                for item in ranked.iter().skip(tier.from).take(tier.count).take(limit) {
                    println!("  {:4}x  {}  ({})", item.count, item.title, item.url);
                }
            }
            if ranked.is_empty() {
                println!("No saved tabs");
            }
        }

        ViewAction::BySite { json } => {
            let groups = views::grouped_by_site(&tags);

            if json {
                println!("{}", serde_json::to_string_pretty(&groups)?);
                return Ok(());
            }

            for group in groups.iter().take(limit) {
                println!("{}  ({} tabs)", group.domain, group.total_count);
                for tab in &group.tabs {
                    println!("  {}  {}", tab.id, tab.title);
                }
            }
        }

        ViewAction::Sessions { json } => {
            let entries = views::session_entries(&tags);

            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
                return Ok(());
            }

            for entry in &entries {
                println!(
                    "{}  {}  ({} tabs)",
                    entry.group_id, entry.name, entry.tab_count
                );
            }
        }
    }
    Ok(())
}

async fn handle_collapse(engine: &Engine, id: &str) -> Result<()> {
    if engine.toggle_collapse(id).await? {
        println!("Toggled {}", id);
    } else {
        println!("No such tag: {}", id);
    }
    Ok(())
}

async fn handle_export(engine: &Engine, path: Option<PathBuf>) -> Result<()> {
    let data = engine.export().await?;
    let path = path.unwrap_or_else(|| {
        PathBuf::from(format!("tabclue-export-{}.json", Utc::now().format("%Y-%m-%d")))
    });

    let json = serde_json::to_string_pretty(&data)?;
    fs::write(&path, json).await?;

    let counts = views::counts(&data.tags);
    println!("Exported {} tab(s) to {}", counts.tab_count, path.display());
    Ok(())
}

async fn handle_import(engine: &Engine, path: &PathBuf) -> Result<()> {
    let payload = fs::read_to_string(path).await?;
    let counts = engine.import(&payload).await?;
    println!(
        "Imported {} tag(s), {} group(s), {} tab(s)",
        counts.tag_count, counts.group_count, counts.tab_count
    );
    Ok(())
}

async fn handle_settings(engine: &Engine, action: SettingsAction) -> Result<()> {
    match action {
        SettingsAction::Show => {
            let settings = engine.store().settings.get().await?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }

        SettingsAction::Set { key, value } => {
            let mut settings = engine.store().settings.get().await?;
            apply_setting(&mut settings, &key, &value)?;
            engine.store().settings.set(&settings).await?;
            println!("Set {} = {}", key, value);
        }
    }
    Ok(())
}

fn apply_setting(settings: &mut Settings, key: &str, value: &str) -> Result<()> {
    match key {
        "language" => {
            settings.language = match value {
                "en" => Language::En,
                "es" => Language::Es,
                _ => return Err(Error::invalid_input(format!("Unknown language: {}", value))),
            }
        }
        "theme" => {
            settings.theme = match value {
                "light" => Theme::Light,
                "dark" => Theme::Dark,
                "system" => Theme::System,
                _ => return Err(Error::invalid_input(format!("Unknown theme: {}", value))),
            }
        }
        "closeTabsAfterSave" => settings.close_tabs_after_save = parse_bool(value)?,
        "showCloseConfirmation" => settings.show_close_confirmation = parse_bool(value)?,
        "defaultTagId" => settings.default_tag_id = value.to_string(),
        "virtualScrollThreshold" => {
            settings.virtual_scroll_threshold = value
                .parse()
                .map_err(|_| Error::invalid_input(format!("Not a number: {}", value)))?
        }
        "showFavicons" => settings.show_favicons = parse_bool(value)?,
        "displayLimit" => {
            let limit: u32 = value
                .parse()
                .map_err(|_| Error::invalid_input(format!("Not a number: {}", value)))?;
            if !DISPLAY_LIMIT_OPTIONS.contains(&limit) {
                return Err(Error::invalid_input(format!(
                    "displayLimit must be one of {:?}",
                    DISPLAY_LIMIT_OPTIONS
                )));
            }
            settings.display_limit = limit;
        }
        _ => return Err(Error::invalid_input(format!("Unknown setting: {}", key))),
    }
    Ok(())
}

fn parse_bool(value: &str) -> Result<bool> {
    match value {
        "true" | "on" | "yes" => Ok(true),
        "false" | "off" | "no" => Ok(false),
        _ => Err(Error::invalid_input(format!("Not a boolean: {}", value))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_setting() {
        let mut settings = Settings::default();

        apply_setting(&mut settings, "theme", "dark").unwrap();
        assert_eq!(settings.theme, Theme::Dark);

        apply_setting(&mut settings, "displayLimit", "200").unwrap();
        assert_eq!(settings.display_limit, 200);

        assert!(apply_setting(&mut settings, "displayLimit", "37").is_err());
        assert!(apply_setting(&mut settings, "nope", "x").is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true").unwrap());
        assert!(!parse_bool("off").unwrap());
        assert!(parse_bool("maybe").is_err());
    }
}
