//! Path helpers for XDG directories and config files.

use std::collections::{HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR_NAME: &str = "CapyLauncher";

fn home() -> String {
    std::env::var("HOME").unwrap_or_default()
}

fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(home()).join(".local/share"))
}

fn xdg_data_dirs() -> Vec<PathBuf> {
    std::env::var("XDG_DATA_DIRS")
        .unwrap_or_else(|_| "/usr/local/share:/usr/share".to_string())
        .split(':')
        .filter(|d| !d.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Icon directories owned by the user.
pub fn get_user_icon_directories() -> Vec<PathBuf> {
    vec![xdg_data_home().join("icons"), PathBuf::from(home()).join(".icons")]
}

/// Get base icon directories (XDG + Flatpak + Snap).
pub fn get_icon_base_directories() -> Vec<PathBuf> {
    let mut dirs = get_user_icon_directories();
    let home = home();

    // System icons
    for data_dir in xdg_data_dirs() {
        dirs.push(data_dir.join("icons"));
        dirs.push(data_dir.join("pixmaps"));
    }

    // Standard fallback
    dirs.push(PathBuf::from("/usr/share/pixmaps"));

    // App formats (flatpak, snap)
    dirs.push(PathBuf::from("/var/lib/flatpak/exports/share/icons"));
    dirs.push(PathBuf::from(&home).join(".local/share/flatpak/exports/share/icons"));
    dirs.push(PathBuf::from("/var/lib/snapd/desktop/icons"));

    dirs
}

/// Get all application .desktop file directories, highest priority first.
pub fn get_application_directories() -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    dirs.push(user_application_directory());

    for data_dir in xdg_data_dirs() {
        dirs.push(data_dir.join("applications"));
    }

    dirs.push(PathBuf::from("/var/lib/flatpak/exports/share/applications"));
    dirs.push(PathBuf::from(home()).join(".local/share/flatpak/exports/share/applications"));
    dirs.push(PathBuf::from("/var/lib/snapd/desktop/applications"));

    dirs
}

/// Desktop files here belong to the user and may be removed by the launcher.
pub fn user_application_directory() -> PathBuf {
    xdg_data_home().join("applications")
}

/// Autostart directories, user first. A user entry overrides a system one.
pub fn get_autostart_directories() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(config) = dirs::config_dir() {
        dirs.push(config.join("autostart"));
    }

    let config_dirs = std::env::var("XDG_CONFIG_DIRS").unwrap_or_else(|_| "/etc/xdg".to_string());
    for dir in config_dirs.split(':').filter(|d| !d.is_empty()) {
        dirs.push(PathBuf::from(dir).join("autostart"));
    }
    dirs
}

/// The user's desktop folder.
pub fn get_desktop_directory() -> PathBuf {
    dirs::desktop_dir().unwrap_or_else(|| PathBuf::from(home()).join("Desktop"))
}

/// Launcher config file, `~/.config/CapyLauncher/config.json`.
pub fn get_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(home()).join(".config"))
        .join(APP_DIR_NAME)
        .join("config.json")
}

/// Directory for persisted launcher state and the icon cache.
pub fn get_state_directory() -> PathBuf {
    let path = dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(home()).join(".cache"))
        .join(APP_DIR_NAME);
    fs::create_dir_all(&path).ok();
    path
}

/// Parsed index.theme content.
pub struct ParsedIconTheme {
    pub directories: Vec<String>,
    pub inherits: Vec<String>,
}

pub fn parse_icon_theme_index(theme_root: &Path) -> Option<ParsedIconTheme> {
    let content = fs::read_to_string(theme_root.join("index.theme")).ok()?;
    let mut directories = Vec::new();
    let mut inherits = Vec::new();
    let mut section = String::new();

    for line in content.lines() {
        let line = line.trim();
        if line.starts_with('[') {
            section = line.to_string();
            continue;
        }

        if section.eq_ignore_ascii_case("[Icon Theme]") {
            if let Some((k, v)) = line.split_once('=') {
                if k.trim() == "Directories" {
                    directories = v.split(',').map(|s| s.trim().to_string()).collect();
                } else if k.trim() == "Inherits" {
                    inherits = v.split(',').map(|s| s.trim().to_string()).collect();
                }
            }
        }
    }

    Some(ParsedIconTheme {
        directories,
        inherits,
    })
}

/// Read `gtk-icon-theme-name` from the GTK settings files.
pub fn get_gtk_icon_theme() -> Option<String> {
    let config = dirs::config_dir()?;
    ["gtk-4.0/settings.ini", "gtk-3.0/settings.ini"]
        .iter()
        .filter_map(|rel| fs::read_to_string(config.join(rel)).ok())
        .find_map(|content| {
            content.lines().find_map(|line| {
                let (k, v) = line.split_once('=')?;
                (k.trim() == "gtk-icon-theme-name").then(|| v.trim().trim_matches('"').to_string())
            })
        })
        .filter(|theme| !theme.is_empty())
}

/// Directories holding the GTK settings that name the icon theme.
pub fn get_icon_theme_settings_directories() -> Vec<PathBuf> {
    dirs::config_dir()
        .map(|config| vec![config.join("gtk-4.0"), config.join("gtk-3.0")])
        .unwrap_or_default()
}

/// Get ordered list of icon themes from system config.
pub fn get_icon_theme_order() -> Vec<String> {
    let mut themes = Vec::new();

    if let Some(theme) = get_gtk_icon_theme() {
        themes.push(theme);
    }
    if let Ok(theme) = std::env::var("CAPY_ICON_THEME") {
        themes.push(theme);
    }

    themes.push("Adwaita".to_string());
    themes.push("hicolor".to_string());

    resolve_theme_inheritance(themes)
}

fn resolve_theme_inheritance(start_themes: Vec<String>) -> Vec<String> {
    let mut result = Vec::new();
    let mut visited = HashSet::new();
    let mut queue = VecDeque::from(start_themes);
    let base_dirs = get_icon_base_directories();

    while let Some(theme) = queue.pop_front() {
        if visited.contains(&theme) {
            continue;
        }
        visited.insert(theme.clone());
        result.push(theme.clone());

        for base in &base_dirs {
            if let Some(parsed) = parse_icon_theme_index(&base.join(&theme)) {
                for parent in parsed.inherits {
                    if !visited.contains(&parent) {
                        queue.push_back(parent);
                    }
                }
                break; // Only parse first found theme instance
            }
        }
    }

    result
}
