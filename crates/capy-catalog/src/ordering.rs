//! Preset and usage orderings over item records.

use crate::item::ItemInfo;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Curated default ordering, usually locale specific.
#[derive(Clone, Debug, Default)]
pub struct PresetOrder {
    /// Lowercase key -> position in the preset list.
    index: HashMap<String, usize>,
}

impl PresetOrder {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut index = HashMap::new();
        for (pos, key) in keys.into_iter().enumerate() {
            // First occurrence wins for duplicated entries.
            index.entry(key.as_ref().to_lowercase()).or_insert(pos);
        }
        Self { index }
    }

    /// Pick the preset list for `locale`, falling back to `default` when the
    /// locale has no list or an empty one.
    ///
    /// Tries the full locale name ("zh_CN") first, then the language ("zh").
    pub fn for_locale(
        by_locale: &HashMap<String, Vec<String>>,
        default: &[String],
        locale: Option<&str>,
    ) -> Self {
        let localized = locale.and_then(|locale| {
            let language = locale.split('_').next().unwrap_or(locale);
            [locale, language]
                .into_iter()
                .filter_map(|name| by_locale.get(name))
                .find(|list| !list.is_empty())
        });

        match localized {
            Some(list) => Self::new(list),
            None => Self::new(default),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Position of `key` in the preset list, case-insensitive.
    pub fn position(&self, key: &str) -> Option<usize> {
        self.index.get(&key.to_lowercase()).copied()
    }

    /// Items in the preset list go first, in list order. Everything else
    /// follows, ordered by display name and then key.
    pub fn compare(&self, a: &ItemInfo, b: &ItemInfo) -> Ordering {
        match (self.position(&a.key), self.position(&b.key)) {
            (Some(ia), Some(ib)) => ia.cmp(&ib).then_with(|| a.key.cmp(&b.key)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.name.cmp(&b.name).then_with(|| a.key.cmp(&b.key)),
        }
    }

    pub fn sort(&self, items: &mut [ItemInfo]) {
        items.sort_by(|a, b| self.compare(a, b));
    }
}

/// Stable sort by descending open count. Ties keep their current order.
pub fn sort_by_usage(items: &mut [ItemInfo]) {
    items.sort_by(|a, b| b.open_count.cmp(&a.open_count));
}

/// Locale name from the environment, e.g. "zh_CN" for `LANG=zh_CN.UTF-8`.
pub fn system_locale() -> Option<String> {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|value| !value.is_empty())
        .map(|value| normalize_locale(&value))
        .filter(|locale| locale != "C" && locale != "POSIX")
}

fn normalize_locale(value: &str) -> String {
    value
        .split(['.', '@'])
        .next()
        .unwrap_or(value)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::AppCategory;

    fn item(key: &str, name: &str, count: u64) -> ItemInfo {
        let mut info = ItemInfo::new(key, name, AppCategory::Others);
        info.open_count = count;
        info
    }

    fn keys(items: &[ItemInfo]) -> Vec<&str> {
        items.iter().map(|i| i.key.as_str()).collect()
    }

    #[test]
    fn test_usage_sort_is_stable() {
        let mut items = vec![item("a", "A", 5), item("b", "B", 5), item("c", "C", 3)];
        sort_by_usage(&mut items);
        assert_eq!(keys(&items), ["a", "b", "c"]);

        items[2].open_count = 6;
        sort_by_usage(&mut items);
        assert_eq!(keys(&items), ["c", "a", "b"]);
    }

    #[test]
    fn test_preset_members_go_first() {
        let preset = PresetOrder::new(["deepin-terminal", "Firefox"]);
        let mut items = vec![
            item("aaa", "AAA", 0),
            item("firefox", "Zeta", 0),
            item("Deepin-Terminal", "Terminal", 0),
            item("bbb", "  leading space", 0),
        ];
        preset.sort(&mut items);
        assert_eq!(keys(&items), ["Deepin-Terminal", "firefox", "bbb", "aaa"]);
    }

    #[test]
    fn test_absent_items_fall_back_to_name_then_key() {
        let preset = PresetOrder::default();
        let mut items = vec![item("z", "Same", 0), item("b", "Beta", 0), item("a", "Same", 0)];
        preset.sort(&mut items);
        assert_eq!(keys(&items), ["b", "a", "z"]);
    }

    #[test]
    fn test_locale_lookup_falls_back() {
        let mut by_locale = HashMap::new();
        by_locale.insert("zh_CN".to_string(), vec!["wechat".to_string()]);
        by_locale.insert("de".to_string(), vec!["thunderbird".to_string()]);
        by_locale.insert("fr_FR".to_string(), Vec::new());
        let default = vec!["firefox".to_string()];

        let zh = PresetOrder::for_locale(&by_locale, &default, Some("zh_CN"));
        assert_eq!(zh.position("WeChat"), Some(0));
        assert_eq!(zh.position("firefox"), None);

        let de = PresetOrder::for_locale(&by_locale, &default, Some("de_AT"));
        assert_eq!(de.position("thunderbird"), Some(0));

        let fr = PresetOrder::for_locale(&by_locale, &default, Some("fr_FR"));
        assert_eq!(fr.position("firefox"), Some(0));

        let none = PresetOrder::for_locale(&by_locale, &default, None);
        assert_eq!(none.position("firefox"), Some(0));
    }

    #[test]
    fn test_normalize_locale() {
        assert_eq!(normalize_locale("zh_CN.UTF-8"), "zh_CN");
        assert_eq!(normalize_locale("sr_RS@latin"), "sr_RS");
        assert_eq!(normalize_locale("en_US"), "en_US");
    }
}
