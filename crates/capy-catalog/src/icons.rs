//! Two tier icon cache: in-process bitmaps plus a best-effort PNG cache on disk.

use crate::backend::IconResolver;
use crate::error::Result;
use image::{Rgba, RgbaImage};
use log::debug;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

/// Rendered icon, shared between views.
pub type Bitmap = Arc<RgbaImage>;

/// Same icon at different sizes are different entries.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IconCacheKey {
    pub icon_key: String,
    pub size: u32,
}

impl IconCacheKey {
    pub fn new(icon_key: &str, size: u32) -> Self {
        Self {
            icon_key: icon_key.to_string(),
            size,
        }
    }
}

pub struct IconCache {
    memory: HashMap<IconCacheKey, Bitmap>,
    disk: Option<DiskIconCache>,
}

impl IconCache {
    /// `disk_dir` enables the persisted tier.
    pub fn new(disk_dir: Option<PathBuf>) -> Self {
        Self {
            memory: HashMap::new(),
            disk: disk_dir.map(|root| DiskIconCache { root }),
        }
    }

    /// Memory, then disk, then `resolver`, then the default icon.
    /// Always returns a bitmap.
    pub fn resolve(&mut self, resolver: &dyn IconResolver, icon_key: &str, size: u32) -> Bitmap {
        let key = IconCacheKey::new(icon_key, size);

        if let Some(cached) = self.memory.get(&key) {
            return cached.clone();
        }

        if let Some(img) = self.disk.as_ref().and_then(|d| d.load(&key)) {
            let bitmap = Arc::new(img);
            self.memory.insert(key, bitmap.clone());
            return bitmap;
        }

        let img = resolver
            .resolve_theme_icon(icon_key, size)
            .unwrap_or_else(|| {
                debug!("No icon for '{}' at {}px, using default", icon_key, size);
                default_icon(size)
            });

        if let Some(disk) = &self.disk {
            if let Err(e) = disk.store(&key, &img) {
                debug!("Failed to persist icon '{}': {}", icon_key, e);
            }
        }

        let bitmap = Arc::new(img);
        self.memory.insert(key, bitmap.clone());
        bitmap
    }

    /// Drop every in-process entry. The disk tier is left alone.
    pub fn clear_memory(&mut self) {
        self.memory.clear();
    }

    pub fn memory_len(&self) -> usize {
        self.memory.len()
    }
}

struct DiskIconCache {
    root: PathBuf,
}

impl DiskIconCache {
    /// `<root>/<size>/<sha256(icon key)>.png`
    fn path_for(&self, key: &IconCacheKey) -> PathBuf {
        let digest = Sha256::digest(key.icon_key.as_bytes());
        self.root
            .join(key.size.to_string())
            .join(format!("{}.png", hex::encode(digest)))
    }

    fn load(&self, key: &IconCacheKey) -> Option<RgbaImage> {
        let path = self.path_for(key);
        if !path.exists() {
            return None;
        }
        image::open(&path).ok().map(|img| img.into_rgba8())
    }

    fn store(&self, key: &IconCacheKey, img: &RgbaImage) -> Result<()> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        img.save(&path)?;
        Ok(())
    }
}

/// Neutral square shown when nothing better is available.
pub fn default_icon(size: u32) -> RgbaImage {
    let size = size.max(1);
    RgbaImage::from_pixel(size, size, Rgba([127, 127, 127, 255]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct CountingResolver {
        calls: Cell<usize>,
        known: &'static str,
    }

    impl IconResolver for CountingResolver {
        fn resolve_theme_icon(&self, icon_key: &str, size: u32) -> Option<RgbaImage> {
            self.calls.set(self.calls.get() + 1);
            (icon_key == self.known).then(|| RgbaImage::from_pixel(size, size, Rgba([255, 0, 0, 255])))
        }
    }

    fn resolver() -> CountingResolver {
        CountingResolver {
            calls: Cell::new(0),
            known: "firefox",
        }
    }

    #[test]
    fn test_memory_tier_per_size() {
        let resolver = resolver();
        let mut cache = IconCache::new(None);

        let small = cache.resolve(&resolver, "firefox", 16);
        let again = cache.resolve(&resolver, "firefox", 16);
        let large = cache.resolve(&resolver, "firefox", 48);

        assert!(Arc::ptr_eq(&small, &again));
        assert_eq!(large.width(), 48);
        assert_eq!(resolver.calls.get(), 2);
        assert_eq!(cache.memory_len(), 2);
    }

    #[test]
    fn test_miss_falls_back_to_default() {
        let resolver = resolver();
        let mut cache = IconCache::new(None);
        let icon = cache.resolve(&resolver, "unknown-app", 32);
        assert_eq!(icon.dimensions(), (32, 32));
        assert_eq!(icon.get_pixel(0, 0), &Rgba([127, 127, 127, 255]));
    }

    #[test]
    fn test_theme_change_keeps_disk_tier() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = resolver();
        let mut cache = IconCache::new(Some(dir.path().to_path_buf()));

        cache.resolve(&resolver, "firefox", 24);
        cache.clear_memory();
        assert_eq!(cache.memory_len(), 0);

        let icon = cache.resolve(&resolver, "firefox", 24);
        assert_eq!(resolver.calls.get(), 1);
        assert_eq!(icon.get_pixel(3, 3), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_disk_paths_do_not_collide() {
        let disk = DiskIconCache {
            root: PathBuf::from("/cache"),
        };
        let a = disk.path_for(&IconCacheKey::new("app-1", 6));
        let b = disk.path_for(&IconCacheKey::new("app", 16));
        assert_ne!(a, b);
        assert!(a.starts_with("/cache/6"));
    }
}
