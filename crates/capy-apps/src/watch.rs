//! File watchers feeding backend events into the event loop.

use crate::error::Result;
use crate::icons::IconTheme;
use crate::inventory::DesktopInventory;
use capy_catalog::BackendEvent;
use log::{debug, info, warn};
use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, channel};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

/// A burst of file events is handled once it has been quiet this long.
const QUIET_PERIOD: Duration = Duration::from_millis(250);

/// Keeps the watchers alive. Dropping it stops watching.
pub struct Watchers {
    _watchers: Vec<RecommendedWatcher>,
}

impl Watchers {
    pub fn new(watchers: Vec<RecommendedWatcher>) -> Self {
        Self {
            _watchers: watchers,
        }
    }
}

/// Rescan applications whenever an application directory changes.
pub fn watch_applications(inventory: Arc<DesktopInventory>) -> Result<RecommendedWatcher> {
    let dirs = inventory.dirs().applications.clone();
    watch_paths("apps", &dirs, RecursiveMode::Recursive, move || {
        inventory.rescan_and_notify();
    })
}

/// Report autostart directory changes.
pub fn watch_autostart(
    dirs: &[PathBuf],
    events: UnboundedSender<BackendEvent>,
) -> Result<RecommendedWatcher> {
    watch_paths("autostart", dirs, RecursiveMode::NonRecursive, move || {
        let _ = events.send(BackendEvent::AutostartChanged);
    })
}

/// Re-index icons when the user's icon directories or theme settings change.
pub fn watch_icon_theme(
    theme: Arc<IconTheme>,
    dirs: &[PathBuf],
    events: UnboundedSender<BackendEvent>,
) -> Result<RecommendedWatcher> {
    watch_paths("icons", dirs, RecursiveMode::Recursive, move || {
        info!("Icon theme changed, re-indexing");
        theme.build_index();
        let _ = events.send(BackendEvent::IconThemeChanged);
    })
}

fn watch_paths(
    name: &str,
    paths: &[PathBuf],
    mode: RecursiveMode,
    on_change: impl FnMut() + Send + 'static,
) -> Result<RecommendedWatcher> {
    let (tx, rx) = channel();
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<notify::Event>| match res {
            Ok(ev) => {
                if matches!(
                    ev.kind,
                    EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
                ) {
                    let _ = tx.send(());
                }
            }
            Err(e) => warn!("watch error: {:?}", e),
        },
        Config::default(),
    )?;

    for path in paths {
        if !path.exists() {
            continue;
        }
        match watcher.watch(path, mode) {
            Ok(()) => debug!("Watching {} ({})", path.display(), name),
            Err(e) => warn!("Cannot watch {}: {}", path.display(), e),
        }
    }

    spawn_coalescer(name, rx, QUIET_PERIOD, on_change)?;
    Ok(watcher)
}

/// Run `on_change` once per burst of signals. Exits when all senders are gone.
fn spawn_coalescer(
    name: &str,
    rx: Receiver<()>,
    quiet: Duration,
    mut on_change: impl FnMut() + Send + 'static,
) -> std::io::Result<JoinHandle<()>> {
    let name = format!("capy-watch-{name}");
    thread::Builder::new().name(name.clone()).spawn(move || {
        while rx.recv().is_ok() {
            while rx.recv_timeout(quiet).is_ok() {}
            on_change();
        }
        debug!("{} stopped", name);
    })
}
