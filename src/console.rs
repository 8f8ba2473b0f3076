//! Line based debug console on stdin.
//!
//! Stands in for the launcher grid: every command maps onto one call of the
//! catalog's presentation API.

use capy_catalog::{AppCatalog, AppCategory, CatalogEvent, SearchState, View};
use serde::Serialize;
use std::fmt::Write as _;

pub const HELP: &str = "\
commands:
  list [all|custom|search|categories|<category>]   show a view
  dump [view]                                      view as JSON
  search <text>                                    debounced search
  launch <key>                                     launch and count usage
  uninstall <key>                                  uninstall (optimistic)
  restore <key> [position]                         undo a pending uninstall
  icon <key> [size]                                resolve an icon
  info <key>                                       per app flags
  status                                           catalog summary
  help | quit";

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    List(View),
    Dump(View),
    Search(String),
    Launch(String),
    Uninstall(String),
    Restore(String, Option<usize>),
    Icon(String, u32),
    Info(String),
    Status,
    Help,
    Quit,
}

/// Parse one input line. Blank lines yield `Ok(None)`.
pub fn parse(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    let key = |what: &str| -> Result<String, String> {
        let key = rest.split_whitespace().next().unwrap_or_default();
        if key.is_empty() {
            Err(format!("usage: {what} <key>"))
        } else {
            Ok(key.to_string())
        }
    };

    let command = match word.to_lowercase().as_str() {
        "list" | "ls" => Command::List(parse_view(rest)?),
        "dump" => Command::Dump(parse_view(rest)?),
        "search" | "s" => Command::Search(rest.to_string()),
        "launch" | "run" => Command::Launch(key("launch")?),
        "uninstall" | "rm" => Command::Uninstall(key("uninstall")?),
        "restore" => {
            let position = match rest.split_whitespace().nth(1) {
                Some(p) => Some(p.parse().map_err(|_| format!("bad position '{p}'"))?),
                None => None,
            };
            Command::Restore(key("restore")?, position)
        }
        "icon" => {
            let size = match rest.split_whitespace().nth(1) {
                Some(s) => s.parse().map_err(|_| format!("bad size '{s}'"))?,
                None => 48,
            };
            Command::Icon(key("icon")?, size)
        }
        "info" => Command::Info(key("info")?),
        "status" => Command::Status,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(format!("unknown command '{other}', try 'help'")),
    };
    Ok(Some(command))
}

/// `all` when empty; categories by title or number.
pub fn parse_view(word: &str) -> Result<View, String> {
    let word = word.trim().to_lowercase();
    match word.as_str() {
        "" | "all" => return Ok(View::All),
        "custom" => return Ok(View::Custom),
        "search" => return Ok(View::Search),
        "categories" | "cats" => return Ok(View::CategoryList),
        "uncategorized" => return Ok(View::Category(AppCategory::Uncategorized)),
        _ => {}
    }

    if let Ok(id) = word.parse::<u32>() {
        return match AppCategory::from_id(id) {
            AppCategory::Uncategorized => Err(format!("no category {id}")),
            category => Ok(View::Category(category)),
        };
    }

    AppCategory::ALL
        .iter()
        .find(|c| c.title().to_lowercase() == word)
        .map(|c| View::Category(*c))
        .ok_or_else(|| format!("unknown view '{word}'"))
}

#[derive(Serialize)]
struct Status {
    total: usize,
    stashed: usize,
    categories: Vec<(String, usize)>,
    search: Option<usize>,
}

/// Execute a command. Returns the text to print.
pub fn run(catalog: &mut AppCatalog, command: Command) -> String {
    match command {
        Command::List(view) => render_view(catalog, view),
        Command::Dump(view) => serde_json::to_string_pretty(catalog.apps_info_list(view))
            .unwrap_or_else(|e| format!("cannot encode view: {e}")),
        Command::Search(query) => {
            catalog.search_app(&query);
            format!("searching for '{query}'")
        }
        Command::Launch(key) => {
            catalog.launch_app(&key);
            format!("launched {key}")
        }
        Command::Uninstall(key) => {
            catalog.uninstall_app(&key);
            format!("uninstall of {key} requested")
        }
        Command::Restore(key, position) => {
            if catalog.restore(&key, position) {
                format!("restored {key}")
            } else {
                format!("{key} is not pending uninstall")
            }
        }
        Command::Icon(key, size) => {
            let icon_key = catalog
                .store()
                .find(&key)
                .map(|item| item.icon_key.clone())
                .unwrap_or(key);
            let bitmap = catalog.app_icon(&icon_key, size);
            format!("{icon_key}: {}x{}", bitmap.width(), bitmap.height())
        }
        Command::Info(key) => render_info(catalog, &key),
        Command::Status => {
            let store = catalog.store();
            let status = Status {
                total: store.all_items().len(),
                stashed: store.stash().len(),
                categories: store
                    .index()
                    .categories()
                    .map(|c| (c.title().to_string(), store.index().get(c).len()))
                    .collect(),
                search: match catalog.search_state() {
                    SearchState::NotRun => None,
                    SearchState::Results(items) => Some(items.len()),
                },
            };
            serde_json::to_string_pretty(&status).unwrap_or_else(|e| format!("cannot encode status: {e}"))
        }
        Command::Help => HELP.to_string(),
        Command::Quit => String::new(),
    }
}

fn render_view(catalog: &AppCatalog, view: View) -> String {
    let items = catalog.apps_info_list(view);
    let mut out = format!("{view} ({})", items.len());
    for (i, item) in items.iter().enumerate() {
        let badge = if catalog.app_is_new_install(&item.key) { " [new]" } else { "" };
        let _ = write!(out, "\n{:>3}. {:<32} {:<12} {}{}", i + 1, item.key, item.category.title(), item.name, badge);
        if item.open_count > 0 {
            let _ = write!(out, " ({} opens)", item.open_count);
        }
    }
    out
}

fn render_info(catalog: &mut AppCatalog, key: &str) -> String {
    let Some(item) = catalog.store().find(key).cloned() else {
        return format!("unknown app '{key}'");
    };
    format!(
        "{} ({})\n  desktop: {}\n  category: {}\n  new: {}\n  autostart: {}\n  on desktop: {}\n  proxy: {}\n  scaling: {}",
        item.name,
        item.key,
        item.desktop.display(),
        item.category,
        catalog.app_is_new_install(key),
        catalog.app_is_autostart(&item.desktop_ref()),
        catalog.app_is_on_desktop(key),
        catalog.app_is_proxy(key),
        catalog.app_is_scaling_enabled(key),
    )
}

/// One line per catalog notification, for the console log.
pub fn describe(event: &CatalogEvent) -> String {
    match event {
        CatalogEvent::DataChanged(view) => format!("view {view} changed"),
        CatalogEvent::CategoryListChanged => "category list changed".to_string(),
        CatalogEvent::NewInstallListChanged => "new install list changed".to_string(),
        CatalogEvent::SearchTips { no_results: true } => "search: no results".to_string(),
        CatalogEvent::SearchTips { no_results: false } => "search: results ready".to_string(),
        CatalogEvent::BackendUnavailable(reason) => format!("backend unavailable: {reason}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse("   ").unwrap(), None);
        assert_eq!(parse("list").unwrap(), Some(Command::List(View::All)));
        assert_eq!(
            parse("ls Development").unwrap(),
            Some(Command::List(View::Category(AppCategory::Development)))
        );
        assert_eq!(parse("search  web browser ").unwrap(), Some(Command::Search("web browser".into())));
        assert_eq!(parse("launch firefox").unwrap(), Some(Command::Launch("firefox".into())));
        assert_eq!(parse("restore gimp 3").unwrap(), Some(Command::Restore("gimp".into(), Some(3))));
        assert_eq!(parse("icon gimp").unwrap(), Some(Command::Icon("gimp".into(), 48)));
        assert_eq!(parse("QUIT").unwrap(), Some(Command::Quit));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse("launch").is_err());
        assert!(parse("restore gimp first").is_err());
        assert!(parse("icon gimp huge").is_err());
        assert!(parse("frobnicate").is_err());
        assert!(parse("list nowhere").is_err());
    }

    #[test]
    fn test_parse_view() {
        assert_eq!(parse_view("").unwrap(), View::All);
        assert_eq!(parse_view("categories").unwrap(), View::CategoryList);
        assert_eq!(parse_view("0").unwrap(), View::Category(AppCategory::Internet));
        assert_eq!(parse_view("10").unwrap(), View::Category(AppCategory::Others));
        assert!(parse_view("11").is_err());
        assert_eq!(parse_view("MUSIC").unwrap(), View::Category(AppCategory::Music));
    }

    #[test]
    fn test_describe_events() {
        assert_eq!(describe(&CatalogEvent::DataChanged(View::Search)), "view Search changed");
        assert_eq!(describe(&CatalogEvent::SearchTips { no_results: true }), "search: no results");
    }
}
