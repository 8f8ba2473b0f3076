//! Desktop entry parsing.

use capy_catalog::{AppCategory, ItemInfo};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// An application entry read from a `.desktop` file.
#[derive(Clone, Debug, PartialEq)]
pub struct DesktopApp {
    /// File name, e.g. "firefox.desktop".
    pub id: String,
    pub name: String,
    pub exec: String,
    pub icon_name: Option<String>,
    pub categories: Vec<String>,
    pub keywords: Vec<String>,
    pub no_display: bool,
    pub hidden: bool,
    pub use_proxy: bool,
    pub disable_scaling: bool,
    pub desktop_file_path: PathBuf,
}

impl DesktopApp {
    /// Catalog key: the desktop id without its extension.
    pub fn key(&self) -> &str {
        desktop_id_to_key(&self.id)
    }

    /// Should the launcher list this entry at all.
    pub fn is_visible(&self) -> bool {
        !self.no_display && !self.hidden
    }

    pub fn category(&self) -> AppCategory {
        map_categories(&self.categories)
    }

    pub fn to_item(&self) -> ItemInfo {
        let mut info = ItemInfo::new(self.key(), self.name.clone(), self.category());
        info.desktop = self.desktop_file_path.clone();
        if let Some(icon) = &self.icon_name {
            info.icon_key = icon.clone();
        }
        info
    }

    /// Case-insensitive match on name, key and keywords.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return false;
        }
        self.name.to_lowercase().contains(&query)
            || self.key().to_lowercase().contains(&query)
            || self
                .keywords
                .iter()
                .any(|k| k.to_lowercase().contains(&query))
    }
}

pub fn desktop_id_to_key(id: &str) -> &str {
    id.strip_suffix(".desktop").unwrap_or(id)
}

/// Key/value pairs of the `[Desktop Entry]` group.
pub fn read_desktop_group(path: &Path) -> Option<HashMap<String, String>> {
    let content = fs::read_to_string(path).ok()?;
    let mut entries = HashMap::new();
    let mut in_desktop_entry = false;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            in_desktop_entry = line == "[Desktop Entry]";
            continue;
        }

        if in_desktop_entry {
            if let Some((key, value)) = line.split_once('=') {
                entries.insert(key.trim().to_string(), value.trim().to_string());
            }
        }
    }

    Some(entries)
}

/// Parse a .desktop file into a DesktopApp struct.
pub fn parse_desktop_file(path: &Path) -> Option<DesktopApp> {
    let entries = read_desktop_group(path)?;

    if entries.get("Type").map(|s| s.as_str()) != Some("Application") {
        return None;
    }

    let name = entries.get("Name")?.clone();
    let exec = entries.get("Exec").cloned().unwrap_or_default();
    let id = path.file_name()?.to_string_lossy().to_string();
    let flag = |key: &str| entries.get(key).map(|s| s == "true").unwrap_or(false);

    Some(DesktopApp {
        id,
        name,
        exec,
        icon_name: entries.get("Icon").cloned().filter(|s| !s.is_empty()),
        categories: split_list(entries.get("Categories")),
        keywords: split_list(entries.get("Keywords")),
        no_display: flag("NoDisplay"),
        hidden: flag("Hidden"),
        use_proxy: flag("X-Capy-UseProxy"),
        disable_scaling: flag("X-Capy-DisableScaling"),
        desktop_file_path: path.to_path_buf(),
    })
}

fn split_list(value: Option<&String>) -> Vec<String> {
    value
        .map(|s| {
            s.split(';')
                .filter(|part| !part.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

/// Map freedesktop categories to a launcher category. First match wins,
/// so specific categories are checked before broad main categories.
pub fn map_categories(categories: &[String]) -> AppCategory {
    const TABLE: &[(&str, AppCategory)] = &[
        ("InstantMessaging", AppCategory::Chat),
        ("Chat", AppCategory::Chat),
        ("IRCClient", AppCategory::Chat),
        ("VideoConference", AppCategory::Chat),
        ("WebBrowser", AppCategory::Internet),
        ("Email", AppCategory::Internet),
        ("Network", AppCategory::Internet),
        ("Player", AppCategory::Music),
        ("Music", AppCategory::Music),
        ("Audio", AppCategory::Music),
        ("Video", AppCategory::Video),
        ("AudioVideo", AppCategory::Video),
        ("Graphics", AppCategory::Graphics),
        ("Photography", AppCategory::Graphics),
        ("Game", AppCategory::Game),
        ("Viewer", AppCategory::Reading),
        ("Dictionary", AppCategory::Reading),
        ("Literature", AppCategory::Reading),
        ("Office", AppCategory::Office),
        ("Development", AppCategory::Development),
        ("IDE", AppCategory::Development),
        ("System", AppCategory::System),
        ("Settings", AppCategory::System),
        ("Utility", AppCategory::Others),
    ];

    for (name, category) in TABLE {
        if categories.iter().any(|c| c == name) {
            return *category;
        }
    }

    if categories.is_empty() {
        AppCategory::Uncategorized
    } else {
        AppCategory::Others
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_entry(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_parse_desktop_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_entry(
            dir.path(),
            "org.gnome.gedit.desktop",
            "[Desktop Entry]\nType=Application\nName=Text Editor\nExec=gedit %U\nIcon=gedit\n\
             Categories=GNOME;Utility;TextEditor;\nKeywords=text;plain;\nX-Capy-UseProxy=true\n\
             [Desktop Action new-window]\nName=New Window\n",
        );

        let app = parse_desktop_file(&path).unwrap();
        assert_eq!(app.key(), "org.gnome.gedit");
        assert_eq!(app.name, "Text Editor");
        assert_eq!(app.keywords, ["text", "plain"]);
        assert_eq!(app.category(), AppCategory::Others);
        assert!(app.use_proxy);
        assert!(!app.disable_scaling);
        assert!(app.is_visible());

        let item = app.to_item();
        assert_eq!(item.key, "org.gnome.gedit");
        assert_eq!(item.icon_key, "gedit");
        assert_eq!(item.desktop, path);
    }

    #[test]
    fn test_non_applications_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let link = write_entry(dir.path(), "site.desktop", "[Desktop Entry]\nType=Link\nName=Site\n");
        let nameless = write_entry(dir.path(), "x.desktop", "[Desktop Entry]\nType=Application\n");
        assert!(parse_desktop_file(&link).is_none());
        assert!(parse_desktop_file(&nameless).is_none());
    }

    #[test]
    fn test_hidden_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_entry(
            dir.path(),
            "helper.desktop",
            "[Desktop Entry]\nType=Application\nName=Helper\nNoDisplay=true\n",
        );
        assert!(!parse_desktop_file(&path).unwrap().is_visible());
    }

    #[test]
    fn test_category_mapping() {
        let cats = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(map_categories(&cats(&["Network", "WebBrowser"])), AppCategory::Internet);
        assert_eq!(map_categories(&cats(&["Network", "InstantMessaging"])), AppCategory::Chat);
        assert_eq!(map_categories(&cats(&["AudioVideo", "Audio", "Player"])), AppCategory::Music);
        assert_eq!(map_categories(&cats(&["Development", "IDE"])), AppCategory::Development);
        assert_eq!(map_categories(&cats(&["Education"])), AppCategory::Others);
        assert_eq!(map_categories(&[]), AppCategory::Uncategorized);
    }

    #[test]
    fn test_matches() {
        let app = DesktopApp {
            id: "org.mozilla.firefox.desktop".into(),
            name: "Firefox".into(),
            exec: "firefox %u".into(),
            icon_name: None,
            categories: Vec::new(),
            keywords: vec!["Internet".into(), "WWW".into()],
            no_display: false,
            hidden: false,
            use_proxy: false,
            disable_scaling: false,
            desktop_file_path: PathBuf::new(),
        };
        assert!(app.matches("fire"));
        assert!(app.matches("www"));
        assert!(app.matches("mozilla"));
        assert!(!app.matches("chrome"));
        assert!(!app.matches("  "));
    }
}
