//! The launcher catalog service.
//!
//! Owns the item lists, derived views, caches and timers, and bridges backend
//! notifications into them. Everything runs on the caller's thread; timers
//! fire from `poll_timers`.

use crate::backend::{BackendEvent, IconResolver, InventoryBackend, SessionBackend};
use crate::config::CatalogConfig;
use crate::debounce::Debounce;
use crate::error::Result;
use crate::events::{CatalogEvent, EventSender};
use crate::icons::{Bitmap, IconCache};
use crate::item::ItemInfo;
use crate::ordering::PresetOrder;
use crate::persist::JsonStore;
use crate::search::{SearchSession, SearchState};
use crate::store::{CatalogStore, ItemOperation};
use crate::tracking::{AutostartCache, NewInstalls};
use crate::view::{View, ViewSource, category_headers};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::sync::broadcast::Receiver;

/// Storage key of the persisted usage ordered list.
pub const USAGE_LIST_KEY: &str = "usage_sorted_list";

/// Backends the catalog talks to.
pub struct CatalogServices {
    pub inventory: Box<dyn InventoryBackend>,
    pub session: Box<dyn SessionBackend>,
    pub icons: Box<dyn IconResolver>,
}

/// Where persisted state lives.
pub struct CatalogStorage {
    pub state: JsonStore,
    pub autostart: JsonStore,
    pub icon_dir: Option<PathBuf>,
}

impl CatalogStorage {
    /// `state.json`, `autostart.json` and `icons/` under `dir`.
    pub fn in_dir(dir: &Path, icon_cache: bool) -> Self {
        Self {
            state: JsonStore::open(dir.join("state.json")),
            autostart: JsonStore::open(dir.join("autostart.json")),
            icon_dir: icon_cache.then(|| dir.join("icons")),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            state: JsonStore::in_memory(),
            autostart: JsonStore::in_memory(),
            icon_dir: None,
        }
    }
}

pub struct AppCatalog {
    store: CatalogStore,
    search: SearchSession,
    refresh_timer: Debounce,
    icon_cache: IconCache,
    autostart: AutostartCache,
    new_installs: NewInstalls,
    headers: Vec<ItemInfo>,
    state: JsonStore,
    inventory: Box<dyn InventoryBackend>,
    session: Box<dyn SessionBackend>,
    resolver: Box<dyn IconResolver>,
    events: EventSender,
}

impl AppCatalog {
    /// Create the catalog. Nothing is fetched until `load_from_backend`.
    ///
    /// `version` stamps the autostart cache; `locale` picks the preset order.
    pub fn new(
        config: &CatalogConfig,
        services: CatalogServices,
        storage: CatalogStorage,
        version: &str,
        locale: Option<&str>,
    ) -> Self {
        let preset =
            PresetOrder::for_locale(&config.apps_order_by_locale, &config.apps_order, locale);
        let usage: Vec<ItemInfo> = storage.state.get(USAGE_LIST_KEY).unwrap_or_default();
        debug!("Restored {} usage ordered items", usage.len());

        Self {
            store: CatalogStore::new(preset, usage),
            search: SearchSession::new(config.search_delay()),
            refresh_timer: Debounce::new(config.refresh_delay()),
            icon_cache: IconCache::new(storage.icon_dir),
            autostart: AutostartCache::new(storage.autostart, version),
            new_installs: NewInstalls::default(),
            headers: category_headers(),
            state: storage.state,
            inventory: services.inventory,
            session: services.session,
            resolver: services.icons,
            events: EventSender::new(),
        }
    }

    /// Subscribe to catalog changes.
    pub fn subscribe(&self) -> Receiver<CatalogEvent> {
        self.events.subscribe()
    }

    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    // ============ Catalog store ============

    /// Fetch every item from the inventory and rebuild all views.
    ///
    /// On failure the previous catalog is kept and the error returned.
    pub fn load_from_backend(&mut self) -> Result<()> {
        let items = match self.inventory.fetch_all_items() {
            Ok(items) => items,
            Err(e) => {
                warn!("Failed to fetch items, keeping last known catalog: {}", e);
                self.events
                    .send(CatalogEvent::BackendUnavailable(e.to_string()));
                return Err(e);
            }
        };

        info!("Loaded {} items from backend", items.len());
        self.store.replace_all(items);
        self.refresh_new_installs();
        self.persist_usage();

        self.events.send(CatalogEvent::CategoryListChanged);
        self.events.send(CatalogEvent::DataChanged(View::All));
        Ok(())
    }

    /// Optimistically hide an item pending uninstall.
    pub fn stash(&mut self, key: &str) -> bool {
        if !self.store.stash_item(key) {
            debug!("Nothing to stash for '{}'", key);
            return false;
        }
        self.persist_usage();
        self.events.send(CatalogEvent::CategoryListChanged);
        true
    }

    /// Bring a stashed item back, optionally at `position` of the usage list.
    pub fn restore(&mut self, key: &str, position: Option<usize>) -> bool {
        if !self.store.restore_item(key, position) {
            debug!("Nothing to restore for '{}'", key);
            return false;
        }
        self.persist_usage();
        self.events.send(CatalogEvent::CategoryListChanged);
        true
    }

    /// Restore a stashed item where it was in the usage list.
    fn restore_in_place(&mut self, key: &str) -> bool {
        let position = self.store.stashed_position(key);
        self.restore(key, position)
    }

    /// Forget a stashed item after a confirmed uninstall.
    pub fn abandon_stash(&mut self, key: &str) -> bool {
        self.store.abandon_stashed(key)
    }

    /// Apply a backend item change and schedule the delayed refresh.
    /// Invalid changes are logged and dropped.
    pub fn apply_change(&mut self, operation: ItemOperation, item: &ItemInfo) {
        if let Err(e) = self.store.apply_change(operation, item) {
            error!("Dropping {:?} for '{}': {}", operation, item.key, e);
        }
        self.refresh_timer.schedule(Instant::now());
    }

    fn delayed_refresh(&mut self) {
        debug!("Running delayed refresh");
        self.refresh_new_installs();
        self.store.rebuild();
        self.persist_usage();

        self.events.send(CatalogEvent::CategoryListChanged);
        self.events.send(CatalogEvent::NewInstallListChanged);
        self.events.send(CatalogEvent::DataChanged(View::All));
    }

    fn refresh_new_installs(&mut self) {
        match self.inventory.fetch_new_installs() {
            Ok(keys) => self.new_installs.replace(keys),
            Err(e) => warn!("Failed to fetch new installs: {}", e),
        }
    }

    fn persist_usage(&mut self) {
        if let Err(e) = self.state.set(USAGE_LIST_KEY, &self.store.usage_list()) {
            warn!("Failed to save usage ordered list: {}", e);
        }
    }

    // ============ Presentation API ============

    /// Items backing `view`, in display order.
    pub fn apps_info_list(&self, view: View) -> &[ItemInfo] {
        match view.source() {
            ViewSource::UsageOrdered => self.store.usage_list(),
            ViewSource::SearchResults => self.search.results(),
            ViewSource::CategoryHeaders => &self.headers,
            ViewSource::CategoryBucket(category) => self.store.index().get(category),
        }
    }

    pub fn app_nums(&self, view: View) -> usize {
        self.apps_info_list(view).len()
    }

    /// Icon for `icon_key` rendered at `size`. Never fails.
    pub fn app_icon(&mut self, icon_key: &str, size: u32) -> Bitmap {
        self.icon_cache
            .resolve(self.resolver.as_ref(), icon_key, size)
    }

    pub fn category_list(&self) -> &[ItemInfo] {
        &self.headers
    }

    pub fn search_state(&self) -> &SearchState {
        self.search.state()
    }

    /// Queue a search. Only the last query of a burst reaches the backend.
    pub fn search_app(&mut self, query: &str) {
        self.search.request(query, Instant::now());
    }

    pub fn launch_app(&mut self, key: &str) {
        let Some(target) = self.store.find(key).map(|i| i.desktop.clone()) else {
            warn!("Cannot launch unknown app '{}'", key);
            return;
        };

        self.mark_launched(key);
        if self.store.record_launch(key) {
            self.persist_usage();
            self.events.send(CatalogEvent::DataChanged(View::All));
        }

        if target.as_os_str().is_empty() {
            return;
        }
        if let Err(e) = self.inventory.launch(&target) {
            warn!("Failed to launch {}: {}", target.display(), e);
        }
    }

    /// Hide the item right away and ask the backend to uninstall it.
    pub fn uninstall_app(&mut self, key: &str) {
        if let Some(desktop) = self.store.find(key).map(ItemInfo::desktop_ref) {
            self.autostart.forget(&desktop);
        }

        if !self.stash(key) {
            return;
        }

        if let Err(e) = self.inventory.request_uninstall(key) {
            warn!("Uninstall request for '{}' failed: {}", key, e);
            self.restore_in_place(key);
        }

        self.events.send(CatalogEvent::DataChanged(View::All));
        self.search.restart(Instant::now());
    }

    /// Clear the "new" badge of `key` and tell the backend.
    pub fn mark_launched(&mut self, key: &str) {
        if key.is_empty() || !self.new_installs.remove(key) {
            return;
        }
        if let Err(e) = self.inventory.mark_launched(key) {
            warn!("Failed to mark '{}' launched: {}", key, e);
        }
        self.events.send(CatalogEvent::NewInstallListChanged);
    }

    pub fn app_is_new_install(&self, key: &str) -> bool {
        self.new_installs.contains(key)
    }

    pub fn app_is_autostart(&mut self, desktop: &str) -> bool {
        self.autostart.is_autostart(desktop, self.session.as_ref())
    }

    pub fn app_is_on_desktop(&self, key: &str) -> bool {
        self.inventory.is_on_desktop(key).unwrap_or_else(|e| {
            warn!("Desktop query for {} failed: {}", key, e);
            false
        })
    }

    pub fn app_is_proxy(&self, key: &str) -> bool {
        self.inventory.use_proxy(key).unwrap_or_else(|e| {
            warn!("Proxy query for {} failed: {}", key, e);
            false
        })
    }

    pub fn app_is_scaling_enabled(&self, key: &str) -> bool {
        self.inventory
            .disable_scaling(key)
            .map(|disabled| !disabled)
            .unwrap_or_else(|e| {
                warn!("Scaling query for {} failed: {}", key, e);
                true
            })
    }

    // ============ Event bridge ============

    pub fn handle_event(&mut self, event: BackendEvent) {
        match event {
            BackendEvent::ItemChanged { operation, item } => {
                debug!("Item {:?}: {}", operation, item.key);
                self.apply_change(operation, &item);
            }
            BackendEvent::UninstallSuccess(key) => {
                info!("Uninstalled '{}'", key);
                self.abandon_stash(&key);
            }
            BackendEvent::UninstallFailed(key) => {
                warn!("Uninstall of '{}' failed, restoring", key);
                self.restore_in_place(&key);
                self.events.send(CatalogEvent::DataChanged(View::All));
            }
            BackendEvent::SearchDone(keys) => self.search_done(&keys),
            BackendEvent::NewAppLaunched(key) => self.mark_launched(&key),
            BackendEvent::IconThemeChanged => {
                info!("Icon theme changed, clearing icon cache");
                self.icon_cache.clear_memory();
                self.events.send(CatalogEvent::DataChanged(View::All));
            }
            BackendEvent::AutostartChanged => {
                self.autostart
                    .refresh_all(self.store.all_items(), self.session.as_ref());
                self.events.send(CatalogEvent::DataChanged(View::All));
            }
        }
    }

    fn search_done(&mut self, keys: &[String]) {
        self.search.complete(keys, self.store.all_items());
        let no_results = self.search.is_empty_result();
        debug!("Search finished with {} results", self.search.results().len());

        self.events.send(CatalogEvent::DataChanged(View::Search));
        self.events.send(CatalogEvent::SearchTips { no_results });
    }

    // ============ Timers ============

    /// Earliest pending timer deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.search.deadline(), self.refresh_timer.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Run whichever timers are due at `now`.
    pub fn poll_timers(&mut self, now: Instant) {
        if let Some(query) = self.search.take_due(now) {
            debug!("Dispatching search '{}'", query);
            if let Err(e) = self.inventory.search(&query) {
                warn!("Search dispatch failed: {}", e);
            }
        }

        if self.refresh_timer.fire_if_due(now) {
            self.delayed_refresh();
        }
    }
}
