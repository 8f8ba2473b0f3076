//! Background services feeding the catalog event loop.
//!
//! Each watcher runs on its own thread and sends `BackendEvent`s into the
//! loop's channel.
//!
//! - `apps` - application directories, diffed into item changes
//! - `autostart` - XDG autostart directories
//! - `icons` - user icon directories and GTK theme settings

use capy_apps::{
    DesktopInventory, IconTheme, Watchers, get_icon_theme_settings_directories,
    get_user_icon_directories, watch_applications, watch_autostart, watch_icon_theme,
};
use capy_catalog::BackendEvent;
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// Start all file watchers. Keep the returned value alive while running.
pub fn start_all(
    inventory: Arc<DesktopInventory>,
    icons: Arc<IconTheme>,
    autostart_dirs: &[PathBuf],
    events: UnboundedSender<BackendEvent>,
) -> ServiceStatus {
    info!("Starting file watchers...");

    let apps = report("apps", watch_applications(inventory));
    let autostart = report("autostart", watch_autostart(autostart_dirs, events.clone()));

    let mut icon_dirs = get_user_icon_directories();
    icon_dirs.extend(get_icon_theme_settings_directories());
    let icons = report("icons", watch_icon_theme(icons, &icon_dirs, events));

    let watching_apps = apps.is_some();
    let watching_autostart = autostart.is_some();
    let watching_icons = icons.is_some();
    let watchers = apps.into_iter().chain(autostart).chain(icons).collect();

    ServiceStatus {
        watching_apps,
        watching_autostart,
        watching_icons,
        watchers: Watchers::new(watchers),
    }
}

fn report<T>(name: &str, result: capy_apps::Result<T>) -> Option<T> {
    result
        .map_err(|e| warn!("Cannot watch {}: {}", name, e))
        .ok()
}

/// Status of started services. Dropping it stops the watchers.
pub struct ServiceStatus {
    pub watching_apps: bool,
    pub watching_autostart: bool,
    pub watching_icons: bool,
    pub watchers: Watchers,
}
