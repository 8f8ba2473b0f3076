//! Per-item flags that live next to the catalog: autostart state (cached on
//! disk per application version) and the newly installed set.

use crate::backend::SessionBackend;
use crate::item::ItemInfo;
use crate::persist::JsonStore;
use log::{info, warn};

const VERSION_KEY: &str = "version";

/// Autostart flags keyed by desktop file reference.
#[derive(Debug)]
pub struct AutostartCache {
    store: JsonStore,
    version: String,
}

impl AutostartCache {
    /// Entries written by another application version are discarded.
    pub fn new(mut store: JsonStore, version: &str) -> Self {
        let stored: Option<String> = store.get(VERSION_KEY);
        if stored.as_deref() != Some(version) {
            info!(
                "Autostart cache version {:?} != {}, invalidating",
                stored, version
            );
            let reset = store
                .clear()
                .and_then(|_| store.set(VERSION_KEY, &version));
            if let Err(e) = reset {
                warn!("Failed to reset autostart cache: {}", e);
            }
        }

        Self {
            store,
            version: version.to_string(),
        }
    }

    pub fn cached(&self, desktop: &str) -> Option<bool> {
        if desktop == VERSION_KEY {
            return None;
        }
        self.store.get(desktop)
    }

    /// Cached flag, or ask the session backend and remember the answer.
    /// A failed query reads as "not autostart" and is not cached.
    pub fn is_autostart(&mut self, desktop: &str, session: &dyn SessionBackend) -> bool {
        if let Some(flag) = self.cached(desktop) {
            return flag;
        }

        match session.is_autostart(desktop) {
            Ok(flag) => {
                if let Err(e) = self.store.set(desktop, &flag) {
                    warn!("Failed to cache autostart flag for {}: {}", desktop, e);
                }
                flag
            }
            Err(e) => {
                warn!("Autostart query for {} failed: {}", desktop, e);
                false
            }
        }
    }

    /// Re-query every item, e.g. after the session reported a change.
    pub fn refresh_all(&mut self, items: &[ItemInfo], session: &dyn SessionBackend) {
        let mut failed = 0;
        let version = self.version.clone();
        if let Err(e) = self.store.insert(VERSION_KEY, &version) {
            warn!("Failed to stamp autostart cache: {}", e);
        }

        for info in items {
            let desktop = info.desktop_ref();
            match session.is_autostart(&desktop) {
                Ok(flag) => {
                    if let Err(e) = self.store.insert(&desktop, &flag) {
                        warn!("Failed to cache autostart flag for {}: {}", desktop, e);
                    }
                }
                Err(_) => failed += 1,
            }
        }

        if failed > 0 {
            warn!("{} autostart queries failed during refresh", failed);
        }
        if let Err(e) = self.store.flush() {
            warn!("Failed to save autostart cache: {}", e);
        }
    }

    pub fn forget(&mut self, desktop: &str) {
        if desktop == VERSION_KEY {
            return;
        }
        if let Err(e) = self.store.remove(desktop) {
            warn!("Failed to drop autostart entry {}: {}", desktop, e);
        }
    }
}

/// Keys of installed but never launched apps, in backend order.
#[derive(Clone, Debug, Default)]
pub struct NewInstalls {
    keys: Vec<String>,
}

impl NewInstalls {
    pub fn replace(&mut self, keys: Vec<String>) {
        self.keys = keys;
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    /// True if `key` was new.
    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.keys.len();
        self.keys.retain(|k| k != key);
        before != self.keys.len()
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CatalogError, Result};
    use crate::item::AppCategory;
    use std::cell::Cell;
    use std::path::PathBuf;

    struct FakeSession {
        queries: Cell<usize>,
    }

    impl SessionBackend for FakeSession {
        fn is_autostart(&self, desktop: &str) -> Result<bool> {
            self.queries.set(self.queries.get() + 1);
            if desktop.contains("broken") {
                return Err(CatalogError::BackendUnavailable("session bus".into()));
            }
            Ok(desktop.ends_with("autostart.desktop"))
        }
    }

    fn session() -> FakeSession {
        FakeSession {
            queries: Cell::new(0),
        }
    }

    #[test]
    fn test_lookup_is_cached() {
        let session = session();
        let mut cache = AutostartCache::new(JsonStore::in_memory(), "1.0");

        assert!(cache.is_autostart("/apps/autostart.desktop", &session));
        assert!(cache.is_autostart("/apps/autostart.desktop", &session));
        assert!(!cache.is_autostart("/apps/other.desktop", &session));
        assert_eq!(session.queries.get(), 2);
    }

    #[test]
    fn test_failed_query_is_not_cached() {
        let session = session();
        let mut cache = AutostartCache::new(JsonStore::in_memory(), "1.0");

        assert!(!cache.is_autostart("/apps/broken.desktop", &session));
        assert!(!cache.is_autostart("/apps/broken.desktop", &session));
        assert_eq!(session.queries.get(), 2);
        assert_eq!(cache.cached("/apps/broken.desktop"), None);
    }

    #[test]
    fn test_version_change_invalidates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("autostart.json");
        let session = session();

        let mut cache = AutostartCache::new(JsonStore::open(&path), "1.0");
        cache.is_autostart("/apps/autostart.desktop", &session);

        let same = AutostartCache::new(JsonStore::open(&path), "1.0");
        assert_eq!(same.cached("/apps/autostart.desktop"), Some(true));

        let upgraded = AutostartCache::new(JsonStore::open(&path), "2.0");
        assert_eq!(upgraded.cached("/apps/autostart.desktop"), None);
    }

    #[test]
    fn test_refresh_all_and_forget() {
        let session = session();
        let mut cache = AutostartCache::new(JsonStore::in_memory(), "1.0");
        let mut item = ItemInfo::new("tool", "Tool", AppCategory::System);
        item.desktop = PathBuf::from("/apps/autostart.desktop");

        cache.refresh_all(&[item.clone()], &session);
        assert_eq!(cache.cached("/apps/autostart.desktop"), Some(true));

        cache.forget(&item.desktop_ref());
        assert_eq!(cache.cached("/apps/autostart.desktop"), None);
        assert_eq!(cache.cached(VERSION_KEY), None);
    }

    #[test]
    fn test_refresh_all_persists_stamp_and_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("autostart.json");
        let session = session();
        let mut item = ItemInfo::new("tool", "Tool", AppCategory::System);
        item.desktop = PathBuf::from("/apps/autostart.desktop");
        let mut broken = ItemInfo::new("broken", "Broken", AppCategory::System);
        broken.desktop = PathBuf::from("/apps/broken.desktop");

        let mut cache = AutostartCache::new(JsonStore::open(&path), "1.0");
        cache.refresh_all(&[item, broken], &session);

        let reopened = AutostartCache::new(JsonStore::open(&path), "1.0");
        assert_eq!(reopened.cached("/apps/autostart.desktop"), Some(true));
        assert_eq!(reopened.cached("/apps/broken.desktop"), None);
    }

    #[test]
    fn test_new_installs() {
        let mut new = NewInstalls::default();
        new.replace(vec!["a".into(), "b".into()]);
        assert!(new.contains("a"));
        assert!(new.remove("a"));
        assert!(!new.remove("a"));
        assert_eq!(new.keys(), ["b".to_string()]);
    }
}
