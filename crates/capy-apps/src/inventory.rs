//! Installed applications, backed by XDG desktop files.

use crate::desktop_entry::{DesktopApp, parse_desktop_file};
use crate::error::AppsError;
use crate::paths::{get_application_directories, get_desktop_directory, user_application_directory};
use capy_catalog::persist::JsonStore;
use capy_catalog::{BackendEvent, CatalogError, InventoryBackend, ItemInfo, ItemOperation, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::{Mutex, RwLock};
use tokio::sync::mpsc::UnboundedSender;

const LEDGER_KEY: &str = "ledger";

/// Keys seen so far and keys installed but never launched.
#[derive(Debug, Default, Serialize, Deserialize)]
struct LedgerState {
    known: BTreeSet<String>,
    new: BTreeSet<String>,
}

struct InstallLedger {
    store: JsonStore,
    state: LedgerState,
}

impl InstallLedger {
    fn open(store: JsonStore) -> Self {
        let state = store.get(LEDGER_KEY).unwrap_or_default();
        Self { store, state }
    }

    /// Fold a fresh scan into the ledger. The very first scan only records
    /// what exists; later scans mark unseen keys as new.
    fn observe<'a>(&mut self, keys: impl Iterator<Item = &'a String>) {
        let current: BTreeSet<String> = keys.cloned().collect();
        let first_scan = self.state.known.is_empty();

        if !first_scan {
            for key in current.difference(&self.state.known) {
                info!("New install: {}", key);
                self.state.new.insert(key.clone());
            }
        }
        self.state.new.retain(|k| current.contains(k));
        self.state.known = current;
        self.save();
    }

    fn new_installs(&self) -> Vec<String> {
        self.state.new.iter().cloned().collect()
    }

    fn launched(&mut self, key: &str) -> bool {
        let removed = self.state.new.remove(key);
        if removed {
            self.save();
        }
        removed
    }

    fn forget(&mut self, key: &str) {
        self.state.known.remove(key);
        self.state.new.remove(key);
        self.save();
    }

    fn save(&mut self) {
        if let Err(e) = self.store.set(LEDGER_KEY, &self.state) {
            warn!("Failed to save install ledger: {}", e);
        }
    }
}

/// Where desktop files are read from and where uninstall and desktop
/// shortcut checks look.
#[derive(Clone, Debug)]
pub struct InventoryDirs {
    /// Application directories, highest priority first.
    pub applications: Vec<PathBuf>,
    /// Entries under this directory may be removed by uninstall.
    pub user_applications: PathBuf,
    pub desktop: PathBuf,
}

impl InventoryDirs {
    pub fn from_environment() -> Self {
        Self {
            applications: get_application_directories(),
            user_applications: user_application_directory(),
            desktop: get_desktop_directory(),
        }
    }
}

/// `InventoryBackend` over the desktop files on this machine.
pub struct DesktopInventory {
    /// Visible apps by catalog key.
    apps: RwLock<HashMap<String, DesktopApp>>,
    ledger: Mutex<InstallLedger>,
    dirs: InventoryDirs,
    events: UnboundedSender<BackendEvent>,
}

impl DesktopInventory {
    pub fn new(dirs: InventoryDirs, ledger: JsonStore, events: UnboundedSender<BackendEvent>) -> Self {
        Self {
            apps: RwLock::new(HashMap::new()),
            ledger: Mutex::new(InstallLedger::open(ledger)),
            dirs,
            events,
        }
    }

    pub fn dirs(&self) -> &InventoryDirs {
        &self.dirs
    }

    pub fn get_app(&self, key: &str) -> Option<DesktopApp> {
        self.apps.read().ok()?.get(key).cloned()
    }

    /// Rescan and report what changed since the last scan.
    pub fn rescan(&self) -> Vec<(ItemOperation, ItemInfo)> {
        let scanned = scan_desktop_files(&self.dirs.applications);
        let mut changes = Vec::new();

        let Ok(mut apps) = self.apps.write() else {
            return changes;
        };

        for (key, app) in &scanned {
            match apps.get(key) {
                None => changes.push((ItemOperation::Created, app.to_item())),
                Some(old) if old != app => changes.push((ItemOperation::Updated, app.to_item())),
                Some(_) => {}
            }
        }
        for (key, app) in apps.iter() {
            if !scanned.contains_key(key) {
                changes.push((ItemOperation::Deleted, app.to_item()));
            }
        }

        *apps = scanned;
        if let Ok(mut ledger) = self.ledger.lock() {
            ledger.observe(apps.keys());
        }

        if !changes.is_empty() {
            debug!("Rescan found {} changes", changes.len());
        }
        changes
    }

    /// Rescan and push every change to the event loop.
    pub fn rescan_and_notify(&self) {
        for (operation, item) in self.rescan() {
            self.send(BackendEvent::ItemChanged { operation, item });
        }
    }

    fn send(&self, event: BackendEvent) {
        if self.events.send(event).is_err() {
            debug!("Event loop gone, dropping backend event");
        }
    }

    fn app(&self, key: &str) -> std::result::Result<DesktopApp, AppsError> {
        self.get_app(key)
            .ok_or_else(|| AppsError::UnknownApp(key.to_string()))
    }
}

impl InventoryBackend for DesktopInventory {
    fn fetch_all_items(&self) -> Result<Vec<ItemInfo>> {
        self.rescan();
        let apps = self
            .apps
            .read()
            .map_err(|_| CatalogError::BackendUnavailable("inventory lock poisoned".into()))?;

        let mut items: Vec<ItemInfo> = apps.values().map(DesktopApp::to_item).collect();
        items.sort_by(|a, b| a.key.cmp(&b.key));
        info!("Found {} applications", items.len());
        Ok(items)
    }

    fn fetch_new_installs(&self) -> Result<Vec<String>> {
        Ok(self
            .ledger
            .lock()
            .map(|ledger| ledger.new_installs())
            .unwrap_or_default())
    }

    fn mark_launched(&self, key: &str) -> Result<()> {
        if let Ok(mut ledger) = self.ledger.lock() {
            ledger.launched(key);
        }
        Ok(())
    }

    fn request_uninstall(&self, key: &str) -> Result<()> {
        let app = self.app(key)?;
        let path = &app.desktop_file_path;

        if !path.starts_with(&self.dirs.user_applications) {
            warn!("{} is a system entry, not removing it", path.display());
            self.send(BackendEvent::UninstallFailed(key.to_string()));
            return Ok(());
        }

        match fs::remove_file(path) {
            Ok(()) => {
                info!("Removed {}", path.display());
                if let Ok(mut apps) = self.apps.write() {
                    apps.remove(key);
                }
                if let Ok(mut ledger) = self.ledger.lock() {
                    ledger.forget(key);
                }
                self.send(BackendEvent::UninstallSuccess(key.to_string()));
            }
            Err(e) => {
                warn!("Failed to remove {}: {}", path.display(), e);
                self.send(BackendEvent::UninstallFailed(key.to_string()));
            }
        }
        Ok(())
    }

    fn search(&self, query: &str) -> Result<()> {
        let keys = match self.apps.read() {
            Ok(apps) => search_apps(apps.values(), query),
            Err(_) => Vec::new(),
        };
        self.send(BackendEvent::SearchDone(keys));
        Ok(())
    }

    fn is_on_desktop(&self, key: &str) -> Result<bool> {
        Ok(self.dirs.desktop.join(format!("{key}.desktop")).exists())
    }

    fn use_proxy(&self, key: &str) -> Result<bool> {
        Ok(self.app(key)?.use_proxy)
    }

    fn disable_scaling(&self, key: &str) -> Result<bool> {
        Ok(self.app(key)?.disable_scaling)
    }

    fn launch(&self, target: &Path) -> Result<()> {
        let id = target.display().to_string();
        let app = parse_desktop_file(target).ok_or_else(|| AppsError::UnknownApp(id.clone()))?;
        let argv = exec_argv(&app.exec).map_err(|e| AppsError::BadExec(id.clone(), e))?;
        let Some((program, args)) = argv.split_first() else {
            return Err(AppsError::NoExec(id).into());
        };

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .spawn()
            .map_err(AppsError::from)?;
        info!("Launched {} (pid {})", app.name, child.id());

        // Reap the child so it does not linger as a zombie.
        std::thread::spawn(move || {
            let _ = child.wait();
        });
        Ok(())
    }
}

/// Scan application directories. The first file with a given id wins, so a
/// user entry (even a hidden one) shadows the system entry of the same name.
pub fn scan_desktop_files(dirs: &[PathBuf]) -> HashMap<String, DesktopApp> {
    let mut found: HashMap<String, DesktopApp> = HashMap::new();

    for dir in dirs {
        if !dir.exists() {
            continue;
        }

        let walker = walkdir::WalkDir::new(dir).follow_links(true).max_depth(3);
        for entry in walker.into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("desktop") {
                continue;
            }
            if let Some(app) = parse_desktop_file(path) {
                found.entry(app.key().to_string()).or_insert(app);
            }
        }
    }

    found.retain(|_, app| app.is_visible());
    found
}

/// Matching keys: name prefix matches first, then other matches, by name.
pub fn search_apps<'a>(apps: impl Iterator<Item = &'a DesktopApp>, query: &str) -> Vec<String> {
    let needle = query.trim().to_lowercase();
    let mut hits: Vec<(bool, String, String)> = apps
        .filter(|app| app.matches(&needle))
        .map(|app| {
            let name = app.name.to_lowercase();
            (!name.starts_with(&needle), name, app.key().to_string())
        })
        .collect();
    hits.sort();
    hits.into_iter().map(|(_, _, key)| key).collect()
}

/// Split an Exec line into argv with field codes removed.
pub fn exec_argv(exec: &str) -> std::result::Result<Vec<String>, String> {
    let mut cleaned = String::with_capacity(exec.len());
    let mut chars = exec.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            cleaned.push(c);
            continue;
        }
        // %% is a literal percent; every other code expands to nothing here.
        if chars.next() == Some('%') {
            cleaned.push('%');
        }
    }

    shell_words::split(&cleaned).map_err(|e| e.to_string())
}
