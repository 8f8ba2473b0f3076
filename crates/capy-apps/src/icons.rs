//! Icon theme handling and indexing.

use crate::paths::{get_icon_base_directories, get_icon_theme_order, parse_icon_theme_index};
use base64::{Engine as _, engine::general_purpose};
use capy_catalog::IconResolver;
use image::RgbaImage;
use image::imageops::FilterType;
use log::debug;
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Themed fallback used when an app's own icon is missing.
pub const FALLBACK_ICON: &str = "application-x-desktop";

const ICON_SIZES: [u32; 8] = [16, 24, 32, 48, 64, 96, 128, 256];
const ICON_EXTENSIONS: [&str; 3] = ["png", "webp", "svg"];

/// Round a requested size up to the next standard icon size.
pub fn perfect_icon_size(size: u32) -> u32 {
    ICON_SIZES
        .iter()
        .copied()
        .find(|s| size < *s)
        .unwrap_or(256)
}

#[derive(Clone, Debug)]
struct IconFile {
    size: Option<u32>,
    path: PathBuf,
}

/// Handles icon lookups across multiple themes and directories.
pub struct IconTheme {
    /// Index of icon name (lowercase, no ext) -> candidates in theme order.
    index: RwLock<HashMap<String, Vec<IconFile>>>,
    /// Fixed search roots. `None` follows the user's theme settings.
    roots: Option<Vec<PathBuf>>,
}

impl Default for IconTheme {
    fn default() -> Self {
        Self::new()
    }
}

impl IconTheme {
    pub fn new() -> Self {
        Self {
            index: RwLock::new(HashMap::new()),
            roots: None,
        }
    }

    /// Index only the given directories, in priority order.
    pub fn with_search_directories(dirs: Vec<PathBuf>) -> Self {
        Self {
            index: RwLock::new(HashMap::new()),
            roots: Some(dirs),
        }
    }

    /// Build the index of all png, webp and svg icons.
    /// This respects theme inheritance by inserting in order.
    pub fn build_index(&self) {
        let mut index: HashMap<String, Vec<IconFile>> = HashMap::new();

        let search_dirs = match &self.roots {
            Some(dirs) => dirs.clone(),
            None => get_search_directories(),
        };
        debug!("Scanning {} icon directories...", search_dirs.len());

        for dir_path in search_dirs {
            if !dir_path.exists() {
                continue;
            }

            let walker = walkdir::WalkDir::new(&dir_path)
                .follow_links(true)
                .max_depth(10);

            for entry in walker.into_iter().filter_map(|e| e.ok()) {
                if !entry.file_type().is_file() && !entry.file_type().is_symlink() {
                    continue;
                }

                let path = entry.path();
                let ext = match path.extension().and_then(|e| e.to_str()) {
                    Some(e) => e.to_lowercase(),
                    None => continue,
                };

                if !ICON_EXTENSIONS.contains(&ext.as_str()) {
                    continue;
                }

                let stem = match path.file_stem().and_then(|s| s.to_str()) {
                    Some(s) => s.to_lowercase(),
                    None => continue,
                };

                let candidates = index.entry(stem).or_default();
                if candidates.iter().all(|c| c.path != path) {
                    candidates.push(IconFile {
                        size: size_from_path(path),
                        path: path.to_path_buf(),
                    });
                }
            }
        }

        debug!("Indexed {} icon names", index.len());
        if let Ok(mut guard) = self.index.write() {
            *guard = index;
        }
    }

    /// Resolve an icon name to a file path, preferring the best size.
    pub fn lookup(&self, name: &str, size: u32) -> Option<PathBuf> {
        let index = self.index.read().ok()?;
        let name_lower = name.to_lowercase();
        let variations = [
            name_lower.clone(),
            name_lower.replace(' ', "-"),
            name_lower.replace('_', "-"),
        ];

        let candidates = variations.iter().find_map(|v| index.get(v))?;
        pick_size(candidates, size).map(|c| c.path.clone())
    }

    /// Look up by the rounded-up theme size, then scale to `size`.
    fn load_named(&self, name: &str, size: u32) -> Option<RgbaImage> {
        let path = self.lookup(name, perfect_icon_size(size))?;
        load_file(&path, size)
    }
}

impl IconResolver for IconTheme {
    fn resolve_theme_icon(&self, icon_key: &str, size: u32) -> Option<RgbaImage> {
        if icon_key.starts_with("data:image/") {
            if let Some(image) = decode_data_uri(icon_key) {
                return Some(fit(image, size));
            }
        }

        if icon_key.starts_with('/') {
            if let Some(image) = load_file(Path::new(icon_key), size) {
                return Some(image);
            }
        }

        self.load_named(icon_key, size)
            .or_else(|| self.load_named(FALLBACK_ICON, size))
    }
}

/// Decode `data:image/...;base64,<payload>`.
pub fn decode_data_uri(uri: &str) -> Option<RgbaImage> {
    let (_, payload) = uri.split_once("base64,")?;
    let bytes = general_purpose::STANDARD.decode(payload.trim()).ok()?;
    image::load_from_memory(&bytes)
        .map(|img| img.to_rgba8())
        .map_err(|e| debug!("Undecodable icon data URI: {}", e))
        .ok()
}

fn load_file(path: &Path, size: u32) -> Option<RgbaImage> {
    if is_svg(path) {
        return render_svg(path, size);
    }

    match image::open(path) {
        Ok(img) => Some(fit(img.to_rgba8(), size)),
        Err(e) => {
            debug!("Failed to load icon {}: {}", path.display(), e);
            None
        }
    }
}

/// Rasterize an SVG straight at the target size so it stays sharp.
fn render_svg(path: &Path, size: u32) -> Option<RgbaImage> {
    let data = std::fs::read(path)
        .map_err(|e| debug!("Failed to read icon {}: {}", path.display(), e))
        .ok()?;
    let tree = usvg::Tree::from_data(&data, &usvg::Options::default())
        .map_err(|e| debug!("Failed to parse svg {}: {}", path.display(), e))
        .ok()?;

    let side = size.max(1);
    let (width, height) = (tree.size().width(), tree.size().height());
    let scale = side as f32 / width.max(height);
    let mut pixmap = Pixmap::new(side, side)?;
    // Center the drawing inside the square.
    let transform = Transform::from_scale(scale, scale).post_translate(
        (side as f32 - width * scale) / 2.0,
        (side as f32 - height * scale) / 2.0,
    );
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    let mut image = RgbaImage::new(side, side);
    for (dst, src) in image.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = image::Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    Some(image)
}

/// Scale into a `size` x `size` box keeping the aspect ratio.
fn fit(image: RgbaImage, size: u32) -> RgbaImage {
    if image.width() == size && image.height() == size {
        return image;
    }
    image::DynamicImage::ImageRgba8(image)
        .resize(size, size, FilterType::Lanczos3)
        .to_rgba8()
}

/// Exact size first, then the smallest larger one, then a scalable svg,
/// then the largest smaller.
fn pick_size(candidates: &[IconFile], size: u32) -> Option<&IconFile> {
    candidates
        .iter()
        .find(|c| c.size == Some(size))
        .or_else(|| {
            candidates
                .iter()
                .filter(|c| c.size.is_some_and(|s| s > size))
                .min_by_key(|c| c.size)
        })
        .or_else(|| candidates.iter().find(|c| c.size.is_none() && is_svg(&c.path)))
        .or_else(|| candidates.iter().filter(|c| c.size.is_some()).max_by_key(|c| c.size))
        .or_else(|| candidates.first())
}

fn is_svg(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"))
}

/// Theme directories are named like `48x48/apps` or `apps/48`.
fn size_from_path(path: &Path) -> Option<u32> {
    path.components().rev().skip(1).find_map(|c| {
        let part = c.as_os_str().to_str()?;
        let part = part.split('@').next().unwrap_or(part);
        match part.split_once('x') {
            Some((w, h)) if w == h => w.parse().ok(),
            Some(_) => None,
            None => part.parse().ok(),
        }
    })
}

fn get_search_directories() -> Vec<PathBuf> {
    let mut result = Vec::new();
    let icon_dirs = get_icon_base_directories();
    let theme_order = get_icon_theme_order();

    for theme in &theme_order {
        for base_dir in &icon_dirs {
            let theme_root = base_dir.join(theme);
            if !theme_root.exists() {
                continue;
            }

            if let Some(parsed) = parse_icon_theme_index(&theme_root) {
                for relative in &parsed.directories {
                    result.push(theme_root.join(relative));
                }
            } else {
                // Fallback for directories without index.theme
                result.push(theme_root);
            }
        }
    }

    // Always search base directories (pixmaps, icons root)
    for dir in &icon_dirs {
        result.push(dir.clone());
    }

    result
}
