//! Contracts of the services the catalog depends on.
//!
//! The engine only sees these traits. Whether the other side is D-Bus, a
//! local desktop-file scanner or a test double is up to the caller.

use crate::error::Result;
use crate::item::ItemInfo;
use crate::store::ItemOperation;
use image::RgbaImage;
use std::path::Path;
use std::sync::Arc;

/// Application inventory, launching and uninstalling.
///
/// Query methods block until the answer is known. `search` only dispatches;
/// its answer arrives later as `BackendEvent::SearchDone`.
pub trait InventoryBackend {
    fn fetch_all_items(&self) -> Result<Vec<ItemInfo>>;

    /// Keys of apps installed but never launched.
    fn fetch_new_installs(&self) -> Result<Vec<String>>;

    fn mark_launched(&self, key: &str) -> Result<()>;

    /// Outcome arrives as `UninstallSuccess` or `UninstallFailed`.
    fn request_uninstall(&self, key: &str) -> Result<()>;

    fn search(&self, query: &str) -> Result<()>;

    fn is_on_desktop(&self, key: &str) -> Result<bool>;

    fn use_proxy(&self, key: &str) -> Result<bool>;

    fn disable_scaling(&self, key: &str) -> Result<bool>;

    fn launch(&self, target: &Path) -> Result<()>;
}

/// Session manager queries.
pub trait SessionBackend {
    fn is_autostart(&self, desktop: &str) -> Result<bool>;
}

impl<T: InventoryBackend + ?Sized> InventoryBackend for Arc<T> {
    fn fetch_all_items(&self) -> Result<Vec<ItemInfo>> {
        (**self).fetch_all_items()
    }

    fn fetch_new_installs(&self) -> Result<Vec<String>> {
        (**self).fetch_new_installs()
    }

    fn mark_launched(&self, key: &str) -> Result<()> {
        (**self).mark_launched(key)
    }

    fn request_uninstall(&self, key: &str) -> Result<()> {
        (**self).request_uninstall(key)
    }

    fn search(&self, query: &str) -> Result<()> {
        (**self).search(query)
    }

    fn is_on_desktop(&self, key: &str) -> Result<bool> {
        (**self).is_on_desktop(key)
    }

    fn use_proxy(&self, key: &str) -> Result<bool> {
        (**self).use_proxy(key)
    }

    fn disable_scaling(&self, key: &str) -> Result<bool> {
        (**self).disable_scaling(key)
    }

    fn launch(&self, target: &Path) -> Result<()> {
        (**self).launch(target)
    }
}

impl<T: SessionBackend + ?Sized> SessionBackend for Arc<T> {
    fn is_autostart(&self, desktop: &str) -> Result<bool> {
        (**self).is_autostart(desktop)
    }
}

/// Themed icon lookup. `None` means the theme has nothing for `icon_key`.
pub trait IconResolver {
    fn resolve_theme_icon(&self, icon_key: &str, size: u32) -> Option<RgbaImage>;
}

impl<T: IconResolver + ?Sized> IconResolver for Arc<T> {
    fn resolve_theme_icon(&self, icon_key: &str, size: u32) -> Option<RgbaImage> {
        (**self).resolve_theme_icon(icon_key, size)
    }
}

/// Notifications pushed by the backends.
#[derive(Clone, Debug)]
pub enum BackendEvent {
    ItemChanged {
        operation: ItemOperation,
        item: ItemInfo,
    },
    UninstallSuccess(String),
    UninstallFailed(String),
    /// Ordered keys matching the last dispatched query.
    SearchDone(Vec<String>),
    NewAppLaunched(String),
    IconThemeChanged,
    AutostartChanged,
}
