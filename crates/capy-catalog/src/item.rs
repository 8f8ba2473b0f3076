//! Item records describing installed applications.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application category as reported by the inventory backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AppCategory {
    Internet,
    Chat,
    Music,
    Video,
    Graphics,
    Game,
    Office,
    Reading,
    Development,
    System,
    Others,
    #[default]
    Uncategorized,
}

impl AppCategory {
    /// Every real category, in header order.
    pub const ALL: [AppCategory; 11] = [
        AppCategory::Internet,
        AppCategory::Chat,
        AppCategory::Music,
        AppCategory::Video,
        AppCategory::Graphics,
        AppCategory::Game,
        AppCategory::Office,
        AppCategory::Reading,
        AppCategory::Development,
        AppCategory::System,
        AppCategory::Others,
    ];

    /// Map a backend category number. Unknown numbers are uncategorized.
    pub fn from_id(id: u32) -> Self {
        Self::ALL
            .get(id as usize)
            .copied()
            .unwrap_or(AppCategory::Uncategorized)
    }

    /// Backend category number, `None` for uncategorized.
    pub fn id(&self) -> Option<u32> {
        Self::ALL.iter().position(|c| c == self).map(|i| i as u32)
    }

    /// Human readable title.
    pub fn title(&self) -> &'static str {
        match self {
            AppCategory::Internet => "Internet",
            AppCategory::Chat => "Chat",
            AppCategory::Music => "Music",
            AppCategory::Video => "Video",
            AppCategory::Graphics => "Graphics",
            AppCategory::Game => "Game",
            AppCategory::Office => "Office",
            AppCategory::Reading => "Reading",
            AppCategory::Development => "Development",
            AppCategory::System => "System",
            AppCategory::Others => "Others",
            AppCategory::Uncategorized => "Uncategorized",
        }
    }

    /// Freedesktop icon name used for the category header.
    pub fn icon_key(&self) -> &'static str {
        match self {
            AppCategory::Internet => "applications-internet",
            AppCategory::Chat => "internet-group-chat",
            AppCategory::Music => "applications-multimedia",
            AppCategory::Video => "applications-video",
            AppCategory::Graphics => "applications-graphics",
            AppCategory::Game => "applications-games",
            AppCategory::Office => "applications-office",
            AppCategory::Reading => "accessories-dictionary",
            AppCategory::Development => "applications-development",
            AppCategory::System => "applications-system",
            AppCategory::Others | AppCategory::Uncategorized => "applications-other",
        }
    }
}

impl std::fmt::Display for AppCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title())
    }
}

/// One installed application.
///
/// Equality is by `key` only; two records describing the same app with
/// different names or counts are the same item.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ItemInfo {
    /// Stable identifier, e.g. "firefox".
    pub key: String,
    /// Display name.
    pub name: String,
    /// Launch target, usually the desktop file path.
    pub desktop: PathBuf,
    pub category: AppCategory,
    /// Theme icon name, absolute path or data URI.
    pub icon_key: String,
    /// How many times the user opened this app from the launcher.
    #[serde(default)]
    pub open_count: u64,
}

impl ItemInfo {
    pub fn new(key: impl Into<String>, name: impl Into<String>, category: AppCategory) -> Self {
        let key = key.into();
        Self {
            icon_key: key.clone(),
            key,
            name: name.into(),
            desktop: PathBuf::new(),
            category,
            open_count: 0,
        }
    }

    /// Overwrite everything but the open count with `other`.
    pub fn update_info(&mut self, other: &ItemInfo) {
        self.key = other.key.clone();
        self.name = other.name.clone();
        self.desktop = other.desktop.clone();
        self.category = other.category;
        self.icon_key = other.icon_key.clone();
    }

    /// Header record shown in the category list view.
    pub fn category_header(category: AppCategory) -> Self {
        Self {
            key: String::new(),
            name: category.title().to_string(),
            desktop: PathBuf::new(),
            category,
            icon_key: category.icon_key().to_string(),
            open_count: 0,
        }
    }

    /// Desktop file reference as a string, used as the autostart cache key.
    pub fn desktop_ref(&self) -> String {
        self.desktop.to_string_lossy().to_string()
    }
}

impl PartialEq for ItemInfo {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for ItemInfo {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_is_by_key() {
        let mut a = ItemInfo::new("firefox", "Firefox", AppCategory::Internet);
        let b = ItemInfo::new("firefox", "Firefox Nightly", AppCategory::Development);
        a.open_count = 7;
        assert_eq!(a, b);
        assert_ne!(a, ItemInfo::new("Firefox", "Firefox", AppCategory::Internet));
    }

    #[test]
    fn test_update_info_keeps_open_count() {
        let mut a = ItemInfo::new("gimp", "GIMP", AppCategory::Graphics);
        a.open_count = 3;
        let mut b = ItemInfo::new("gimp", "GNU Image Manipulation Program", AppCategory::Others);
        b.open_count = 0;
        b.icon_key = "gimp-2.10".to_string();

        a.update_info(&b);
        assert_eq!(a.name, "GNU Image Manipulation Program");
        assert_eq!(a.category, AppCategory::Others);
        assert_eq!(a.icon_key, "gimp-2.10");
        assert_eq!(a.open_count, 3);
    }

    #[test]
    fn test_category_ids() {
        assert_eq!(AppCategory::from_id(0), AppCategory::Internet);
        assert_eq!(AppCategory::from_id(10), AppCategory::Others);
        assert_eq!(AppCategory::from_id(42), AppCategory::Uncategorized);
        assert_eq!(AppCategory::Development.id(), Some(8));
        assert_eq!(AppCategory::Uncategorized.id(), None);
    }
}
