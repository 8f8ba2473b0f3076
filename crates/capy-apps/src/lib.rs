//! capy-apps: XDG desktop backend for the CapyLauncher catalog.
//!
//! Provides:
//! - Desktop application inventory parsed from .desktop files, with a
//!   ledger of newly installed apps
//! - Icon lookup with directory scanning and theme inheritance
//! - Autostart state from the XDG autostart directories
//! - File watchers that turn directory changes into backend events

mod autostart;
mod desktop_entry;
mod error;
mod icons;
mod inventory;
mod paths;
mod watch;

pub use autostart::XdgAutostart;
pub use desktop_entry::{DesktopApp, map_categories, parse_desktop_file};
pub use error::{AppsError, Result};
pub use icons::{FALLBACK_ICON, IconTheme, perfect_icon_size};
pub use inventory::{DesktopInventory, InventoryDirs};
pub use paths::{
    get_autostart_directories, get_config_path, get_icon_theme_settings_directories,
    get_state_directory, get_user_icon_directories,
};
pub use watch::{Watchers, watch_applications, watch_autostart, watch_icon_theme};
