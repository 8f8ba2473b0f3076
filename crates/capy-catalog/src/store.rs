//! Canonical item lists: installed items, the uninstall stash and the usage
//! ordered list, plus the category index derived from them.
//!
//! Nothing here talks to the backend or the disk. Mutations report whether
//! they changed anything so the caller can persist and notify.

use crate::error::{CatalogError, Result};
use crate::item::ItemInfo;
use crate::ordering::{PresetOrder, sort_by_usage};
use crate::view::CategoryIndex;
use log::{debug, warn};
use std::collections::{HashMap, HashSet};

/// Backend item change operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemOperation {
    Created,
    Deleted,
    Updated,
}

impl ItemOperation {
    /// Parse the backend's operation name ("created", "deleted", "updated").
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "created" => Some(ItemOperation::Created),
            "deleted" => Some(ItemOperation::Deleted),
            "updated" => Some(ItemOperation::Updated),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct CatalogStore {
    /// Installed items minus stashed ones, in preset order after each rebuild.
    all_items: Vec<ItemInfo>,
    /// Items waiting for the backend to confirm an uninstall.
    stash: Vec<ItemInfo>,
    /// Usage list index each stashed item had when it was stashed.
    stash_positions: HashMap<String, usize>,
    /// Persisted list behind the "All" view. Owns the open counts.
    usage: Vec<ItemInfo>,
    index: CategoryIndex,
    preset: PresetOrder,
    /// Set once the usage list was reconciled with a real backend answer.
    seeded: bool,
}

impl CatalogStore {
    /// `usage` is the list restored from disk, possibly empty.
    pub fn new(preset: PresetOrder, usage: Vec<ItemInfo>) -> Self {
        Self {
            usage: dedup(usage),
            preset,
            ..Default::default()
        }
    }

    pub fn all_items(&self) -> &[ItemInfo] {
        &self.all_items
    }

    pub fn stash(&self) -> &[ItemInfo] {
        &self.stash
    }

    pub fn usage_list(&self) -> &[ItemInfo] {
        &self.usage
    }

    pub fn index(&self) -> &CategoryIndex {
        &self.index
    }

    pub fn find(&self, key: &str) -> Option<&ItemInfo> {
        self.all_items.iter().find(|i| i.key == key)
    }

    pub fn is_installed(&self, key: &str) -> bool {
        self.find(key).is_some()
    }

    pub fn is_stashed(&self, key: &str) -> bool {
        self.stash.iter().any(|i| i.key == key)
    }

    /// Where a stashed item sat in the usage list before it was stashed.
    pub fn stashed_position(&self, key: &str) -> Option<usize> {
        self.stash_positions.get(key).copied()
    }

    pub fn set_preset(&mut self, preset: PresetOrder) {
        self.preset = preset;
        self.rebuild();
    }

    /// Replace the installed list with a fresh backend answer.
    ///
    /// Stashed keys are filtered out, so an in-flight uninstall does not pop
    /// back into view.
    pub fn replace_all(&mut self, items: Vec<ItemInfo>) {
        let stashed: HashSet<&str> = self.stash.iter().map(|i| i.key.as_str()).collect();
        let fresh: Vec<ItemInfo> = items
            .into_iter()
            .filter(|i| !stashed.contains(i.key.as_str()))
            .collect();
        self.all_items = dedup(fresh);
        self.rebuild();

        if !self.seeded {
            sort_by_usage(&mut self.usage);
            self.seeded = true;
        }
    }

    /// Re-sort installed items, rebuild the category index and reconcile the
    /// usage list against the installed list.
    pub fn rebuild(&mut self) {
        self.preset.sort(&mut self.all_items);

        for info in &self.all_items {
            match self.usage.iter_mut().find(|u| u.key == info.key) {
                Some(used) => used.update_info(info),
                None => self.usage.push(info.clone()),
            }
        }

        let installed: HashSet<&str> = self.all_items.iter().map(|i| i.key.as_str()).collect();
        self.usage.retain(|u| installed.contains(u.key.as_str()));

        self.index = CategoryIndex::build(&self.all_items);
    }

    /// Move an installed item into the stash. False if `key` is not installed.
    pub fn stash_item(&mut self, key: &str) -> bool {
        let Some(pos) = self.all_items.iter().position(|i| i.key == key) else {
            return false;
        };

        let mut info = self.all_items.remove(pos);
        if let Some(at) = self.usage.iter().position(|u| u.key == key) {
            info.open_count = self.usage[at].open_count;
            self.stash_positions.insert(key.to_string(), at);
        }
        self.stash.push(info);

        self.rebuild();
        sort_by_usage(&mut self.usage);
        true
    }

    /// Move a stashed item back. With `position` it is also placed at that
    /// index of the usage list, otherwise it is appended.
    pub fn restore_item(&mut self, key: &str, position: Option<usize>) -> bool {
        let Some(pos) = self.stash.iter().position(|i| i.key == key) else {
            return false;
        };

        let info = self.stash.remove(pos);
        self.stash_positions.remove(key);
        if self.is_installed(key) {
            // Backend reported it again while stashed; the installed copy wins.
            warn!("Restored item '{}' is already installed", key);
            return true;
        }

        if let Some(position) = position {
            self.usage.retain(|u| u.key != key);
            let at = position.min(self.usage.len());
            self.usage.insert(at, info.clone());
        }
        self.all_items.push(info);

        self.rebuild();
        true
    }

    /// Drop a stashed item for good. False if it was not stashed.
    pub fn abandon_stashed(&mut self, key: &str) -> bool {
        let before = self.stash.len();
        self.stash.retain(|i| i.key != key);
        self.stash_positions.remove(key);
        before != self.stash.len()
    }

    /// Apply a backend change notification to the raw lists.
    ///
    /// The category index is left stale; callers schedule a `rebuild()`.
    pub fn apply_change(&mut self, operation: ItemOperation, item: &ItemInfo) -> Result<()> {
        match operation {
            ItemOperation::Created => {
                if self.is_installed(&item.key) || self.is_stashed(&item.key) {
                    return Err(CatalogError::InvariantViolation(format!(
                        "created item '{}' is already known",
                        item.key
                    )));
                }
                self.all_items.push(item.clone());
                if !self.usage.contains(item) {
                    self.usage.push(item.clone());
                }
            }
            ItemOperation::Deleted => {
                self.all_items.retain(|i| i.key != item.key);
                self.usage.retain(|i| i.key != item.key);
            }
            ItemOperation::Updated => {
                let Some(existing) = self.all_items.iter_mut().find(|i| i.key == item.key) else {
                    return Err(CatalogError::InvariantViolation(format!(
                        "updated item '{}' is not installed",
                        item.key
                    )));
                };
                existing.update_info(item);
            }
        }

        debug!("Applied {:?} for '{}'", operation, item.key);
        Ok(())
    }

    /// Count one launch of `key` and re-sort the usage list.
    pub fn record_launch(&mut self, key: &str) -> bool {
        let Some(used) = self.usage.iter_mut().find(|u| u.key == key) else {
            return false;
        };
        used.open_count += 1;
        sort_by_usage(&mut self.usage);
        true
    }

    /// Installed and stashed lists share no key.
    pub fn is_disjoint(&self) -> bool {
        !self.stash.iter().any(|s| self.is_installed(&s.key))
    }
}

/// Keep the first record per key.
fn dedup(items: Vec<ItemInfo>) -> Vec<ItemInfo> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|i| {
            let fresh = seen.insert(i.key.clone());
            if !fresh {
                warn!("Dropping duplicate item '{}'", i.key);
            }
            fresh
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::AppCategory;

    fn item(key: &str, category: AppCategory) -> ItemInfo {
        ItemInfo::new(key, key.to_uppercase(), category)
    }

    fn backend_items() -> Vec<ItemInfo> {
        vec![
            item("firefox", AppCategory::Internet),
            item("gimp", AppCategory::Graphics),
            item("thunderbird", AppCategory::Internet),
            item("vim", AppCategory::Development),
        ]
    }

    fn keys(items: &[ItemInfo]) -> Vec<&str> {
        items.iter().map(|i| i.key.as_str()).collect()
    }

    fn assert_index_complete(store: &CatalogStore) {
        let mut indexed: Vec<&str> = store.index().iter().map(|i| i.key.as_str()).collect();
        let mut all = keys(store.all_items());
        indexed.sort();
        all.sort();
        assert_eq!(indexed, all);
    }

    #[test]
    fn test_replace_all_is_idempotent() {
        let mut store = CatalogStore::new(PresetOrder::new(["vim"]), Vec::new());
        store.replace_all(backend_items());
        let index = store.index().clone();
        let usage = store.usage_list().to_vec();

        store.replace_all(backend_items());
        assert_eq!(store.index(), &index);
        assert_eq!(keys(store.usage_list()), keys(&usage));
        assert_eq!(keys(store.all_items()), ["vim", "firefox", "gimp", "thunderbird"]);
        assert_index_complete(&store);
    }

    #[test]
    fn test_persisted_usage_is_reconciled() {
        let mut old_firefox = item("firefox", AppCategory::Internet);
        old_firefox.name = "Old Name".to_string();
        old_firefox.open_count = 2;
        let mut removed = item("removed", AppCategory::Game);
        removed.open_count = 9;
        let mut vim = item("vim", AppCategory::Development);
        vim.open_count = 4;

        let mut store = CatalogStore::new(PresetOrder::default(), vec![old_firefox, removed, vim]);
        store.replace_all(backend_items());

        assert_eq!(keys(store.usage_list()), ["vim", "firefox", "gimp", "thunderbird"]);
        assert_eq!(store.usage_list()[1].name, "FIREFOX");
        assert_eq!(store.usage_list()[1].open_count, 2);
    }

    #[test]
    fn test_stash_and_restore_keep_open_count() {
        let mut store = CatalogStore::new(PresetOrder::default(), Vec::new());
        store.replace_all(backend_items());
        assert!(store.record_launch("gimp"));
        assert!(store.record_launch("gimp"));

        assert!(store.stash_item("gimp"));
        assert!(!store.is_installed("gimp"));
        assert!(store.is_stashed("gimp"));
        assert!(!store.usage_list().iter().any(|i| i.key == "gimp"));
        assert!(store.index().get(AppCategory::Graphics).is_empty());
        assert!(store.is_disjoint());

        assert!(store.restore_item("gimp", None));
        assert!(store.is_installed("gimp"));
        assert!(!store.is_stashed("gimp"));
        let gimp = store.usage_list().iter().find(|i| i.key == "gimp").unwrap();
        assert_eq!(gimp.open_count, 2);
        assert_index_complete(&store);
    }

    #[test]
    fn test_restore_at_position() {
        let mut store = CatalogStore::new(PresetOrder::default(), Vec::new());
        store.replace_all(backend_items());
        store.stash_item("firefox");

        assert!(store.restore_item("firefox", Some(1)));
        assert_eq!(store.usage_list()[1].key, "firefox");

        store.stash_item("vim");
        assert!(store.restore_item("vim", Some(100)));
        assert_eq!(store.usage_list().last().unwrap().key, "vim");
    }

    #[test]
    fn test_stash_remembers_usage_position() {
        let mut store = CatalogStore::new(PresetOrder::default(), Vec::new());
        store.replace_all(backend_items());
        store.record_launch("gimp");
        store.record_launch("gimp");
        let before: Vec<String> = store.usage_list().iter().map(|i| i.key.clone()).collect();
        let at = before.iter().position(|k| k == "gimp");

        store.stash_item("gimp");
        assert_eq!(store.stashed_position("gimp"), at);

        let position = store.stashed_position("gimp");
        assert!(store.restore_item("gimp", position));
        assert_eq!(keys(store.usage_list()), before);
        assert_eq!(store.stashed_position("gimp"), None);
    }

    #[test]
    fn test_abandon_stash() {
        let mut store = CatalogStore::new(PresetOrder::default(), Vec::new());
        store.replace_all(backend_items());
        store.stash_item("vim");

        assert!(store.abandon_stashed("vim"));
        assert!(!store.abandon_stashed("vim"));
        assert!(!store.is_installed("vim"));
        assert!(!store.is_stashed("vim"));
        assert!(!store.restore_item("vim", None));
    }

    #[test]
    fn test_stash_unknown_is_noop() {
        let mut store = CatalogStore::new(PresetOrder::default(), Vec::new());
        store.replace_all(backend_items());
        assert!(!store.stash_item("missing"));
        assert!(store.stash().is_empty());
    }

    #[test]
    fn test_reload_does_not_resurrect_stashed() {
        let mut store = CatalogStore::new(PresetOrder::default(), Vec::new());
        store.replace_all(backend_items());
        store.stash_item("gimp");

        store.replace_all(backend_items());
        assert!(!store.is_installed("gimp"));
        assert!(store.is_disjoint());
        assert_index_complete(&store);
    }

    #[test]
    fn test_apply_change() {
        let mut store = CatalogStore::new(PresetOrder::default(), Vec::new());
        store.replace_all(backend_items());

        let new = item("blender", AppCategory::Graphics);
        store.apply_change(ItemOperation::Created, &new).unwrap();
        assert!(store.is_installed("blender"));
        assert_eq!(store.usage_list().last().unwrap().key, "blender");

        let mut renamed = item("vim", AppCategory::Development);
        renamed.name = "Vi IMproved".to_string();
        store.apply_change(ItemOperation::Updated, &renamed).unwrap();
        assert_eq!(store.find("vim").unwrap().name, "Vi IMproved");

        store
            .apply_change(ItemOperation::Deleted, &item("firefox", AppCategory::Others))
            .unwrap();
        assert!(!store.is_installed("firefox"));
        assert!(!store.usage_list().iter().any(|i| i.key == "firefox"));

        store.rebuild();
        assert_index_complete(&store);
    }

    #[test]
    fn test_apply_change_rejects_invalid() {
        let mut store = CatalogStore::new(PresetOrder::default(), Vec::new());
        store.replace_all(backend_items());
        store.stash_item("gimp");

        let err = store.apply_change(ItemOperation::Updated, &item("ghost", AppCategory::Game));
        assert!(matches!(err, Err(CatalogError::InvariantViolation(_))));

        let err = store.apply_change(ItemOperation::Created, &item("gimp", AppCategory::Graphics));
        assert!(matches!(err, Err(CatalogError::InvariantViolation(_))));
        assert!(store.is_disjoint());
        assert_eq!(store.all_items().len(), 3);
    }

    #[test]
    fn test_duplicate_backend_keys_are_dropped() {
        let mut store = CatalogStore::new(PresetOrder::default(), Vec::new());
        let mut items = backend_items();
        items.push(item("vim", AppCategory::Others));
        store.replace_all(items);
        assert_eq!(store.all_items().len(), 4);
        assert_eq!(store.find("vim").unwrap().category, AppCategory::Development);
    }

    #[test]
    fn test_parse_operation() {
        assert_eq!(ItemOperation::parse("created"), Some(ItemOperation::Created));
        assert_eq!(ItemOperation::parse("updated"), Some(ItemOperation::Updated));
        assert_eq!(ItemOperation::parse("renamed"), None);
    }
}
