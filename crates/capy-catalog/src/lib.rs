//! capy-catalog: the catalog engine behind the CapyLauncher app grid.
//!
//! Provides:
//! - The installed app list, an uninstall stash and a persisted usage ordered list
//! - Preset (locale curated) and usage ordering
//! - Category views rebuilt from the installed list
//! - Debounced search and batched backend change handling
//! - Two tier icon cache (memory + disk)
//! - Autostart and newly installed flags
//!
//! Backends are plugged in through the traits in [`backend`].

pub mod backend;
pub mod catalog;
pub mod config;
pub mod debounce;
pub mod error;
pub mod events;
pub mod icons;
pub mod item;
pub mod ordering;
pub mod persist;
pub mod search;
pub mod store;
pub mod tracking;
pub mod view;

pub use backend::{BackendEvent, IconResolver, InventoryBackend, SessionBackend};
pub use catalog::{AppCatalog, CatalogServices, CatalogStorage};
pub use config::CatalogConfig;
pub use error::{CatalogError, Result};
pub use events::CatalogEvent;
pub use icons::Bitmap;
pub use item::{AppCategory, ItemInfo};
pub use search::SearchState;
pub use store::ItemOperation;
pub use view::View;
