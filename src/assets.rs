//! Asset loading for transfer jobs.
//!
//! The engine only accepts already-resolved locations: a loader turns one location into
//! text (region maps) or decoded pixels (rasters) and never probes for alternatives.
//! Decoded assets can be memoized in an [`AssetCache`] owned by the caller.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use image::RgbaImage;
use thiserror::Error;

use crate::raster::{self, RasterError};
use crate::region_map::RegionMap;

/// Error type for asset retrieval
#[derive(Debug, Error)]
pub enum AssetLoadError {
    /// Nothing exists at the location
    #[error("asset not found: {location}")]
    NotFound { location: String },
    /// The location exists but could not be read
    #[error("failed to read '{location}': {source}")]
    Io {
        location: String,
        #[source]
        source: io::Error,
    },
    /// The bytes could not be decoded
    #[error("failed to decode '{location}': {source}")]
    Decode {
        location: String,
        #[source]
        source: RasterError,
    },
}

impl AssetLoadError {
    /// The location that failed.
    pub fn location(&self) -> &str {
        match self {
            AssetLoadError::NotFound { location }
            | AssetLoadError::Io { location, .. }
            | AssetLoadError::Decode { location, .. } => location,
        }
    }
}

/// Fetches assets by location.
///
/// Loaders are shared across threads so the inputs of a job can be fetched concurrently.
pub trait AssetLoader: Sync {
    /// Raw text of a region map resource.
    fn load_text(&self, location: &str) -> Result<String, AssetLoadError>;

    /// Decoded RGBA pixels of a raster resource.
    fn load_raster(&self, location: &str) -> Result<RgbaImage, AssetLoadError>;
}

impl<L: AssetLoader + ?Sized> AssetLoader for &L {
    fn load_text(&self, location: &str) -> Result<String, AssetLoadError> {
        (**self).load_text(location)
    }

    fn load_raster(&self, location: &str) -> Result<RgbaImage, AssetLoadError> {
        (**self).load_raster(location)
    }
}

/// Loads assets from the filesystem, relative to a root directory.
///
/// `data:` URLs are decoded in memory, so a painted frame can be handed over without
/// touching disk.
#[derive(Debug, Clone)]
pub struct FsAssetLoader {
    root: PathBuf,
}

impl FsAssetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root that relative locations are resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a location to a path. Absolute paths are returned unchanged.
    pub fn resolve(&self, location: &str) -> PathBuf {
        let path = Path::new(location);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    fn read(&self, location: &str) -> Result<Vec<u8>, AssetLoadError> {
        if raster::is_data_url(location) {
            return raster::data_url_bytes(location).map_err(|source| AssetLoadError::Decode {
                location: describe(location),
                source,
            });
        }
        std::fs::read(self.resolve(location)).map_err(|e| io_error(location, e))
    }
}

impl Default for FsAssetLoader {
    fn default() -> Self {
        Self::new(".")
    }
}

impl AssetLoader for FsAssetLoader {
    fn load_text(&self, location: &str) -> Result<String, AssetLoadError> {
        let bytes = self.read(location)?;
        String::from_utf8(bytes).map_err(|e| AssetLoadError::Io {
            location: describe(location),
            source: io::Error::new(io::ErrorKind::InvalidData, e),
        })
    }

    fn load_raster(&self, location: &str) -> Result<RgbaImage, AssetLoadError> {
        let bytes = self.read(location)?;
        raster::decode_raster(&bytes)
            .map_err(|source| AssetLoadError::Decode { location: describe(location), source })
    }
}

/// In-memory assets keyed by location.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssets {
    texts: HashMap<String, String>,
    rasters: HashMap<String, RgbaImage>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_text(&mut self, location: impl Into<String>, text: impl Into<String>) {
        self.texts.insert(location.into(), text.into());
    }

    pub fn insert_raster(&mut self, location: impl Into<String>, image: RgbaImage) {
        self.rasters.insert(location.into(), image);
    }

    /// Builder form of [`MemoryAssets::insert_text`].
    pub fn with_text(mut self, location: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert_text(location, text);
        self
    }

    /// Builder form of [`MemoryAssets::insert_raster`].
    pub fn with_raster(mut self, location: impl Into<String>, image: RgbaImage) -> Self {
        self.insert_raster(location, image);
        self
    }
}

impl AssetLoader for MemoryAssets {
    fn load_text(&self, location: &str) -> Result<String, AssetLoadError> {
        self.texts
            .get(location)
            .cloned()
            .ok_or_else(|| AssetLoadError::NotFound { location: location.to_string() })
    }

    fn load_raster(&self, location: &str) -> Result<RgbaImage, AssetLoadError> {
        self.rasters
            .get(location)
            .cloned()
            .ok_or_else(|| AssetLoadError::NotFound { location: location.to_string() })
    }
}

/// Decoded rasters and parsed region maps, keyed by location.
///
/// Owned by the caller and passed in explicitly; the engine keeps no cache of its own.
/// Entries are shared behind `Arc` so concurrent jobs can read the same asset.
#[derive(Debug, Default)]
pub struct AssetCache {
    rasters: Mutex<HashMap<String, Arc<RgbaImage>>>,
    maps: Mutex<HashMap<String, Arc<RegionMap>>>,
}

impl AssetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raster(&self, location: &str) -> Option<Arc<RgbaImage>> {
        lock(&self.rasters).get(location).cloned()
    }

    pub fn insert_raster(&self, location: &str, image: Arc<RgbaImage>) {
        lock(&self.rasters).insert(location.to_string(), image);
    }

    pub fn region_map(&self, location: &str) -> Option<Arc<RegionMap>> {
        lock(&self.maps).get(location).cloned()
    }

    pub fn insert_region_map(&self, location: &str, map: Arc<RegionMap>) {
        lock(&self.maps).insert(location.to_string(), map);
    }

    /// Number of cached entries (rasters plus maps).
    pub fn len(&self) -> usize {
        lock(&self.rasters).len() + lock(&self.maps).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry.
    pub fn clear(&self) {
        lock(&self.rasters).clear();
        lock(&self.maps).clear();
    }
}

/// Poisoning only means another job panicked mid-insert; the map itself is still usable.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn io_error(location: &str, e: io::Error) -> AssetLoadError {
    if e.kind() == io::ErrorKind::NotFound {
        AssetLoadError::NotFound { location: location.to_string() }
    } else {
        AssetLoadError::Io { location: location.to_string(), source: e }
    }
}

/// Data URLs are shortened in error messages.
fn describe(location: &str) -> String {
    const MAX: usize = 48;
    if raster::is_data_url(location) && location.len() > MAX {
        let cut = location.char_indices().nth(MAX).map(|(i, _)| i).unwrap_or(location.len());
        format!("{}...", &location[..cut])
    } else {
        location.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use tempfile::TempDir;

    #[test]
    fn test_fs_loader_reads_relative_to_root() {
        let temp = TempDir::new().expect("should create temp dir");
        std::fs::write(temp.path().join("mask_1.csv"), "0,1\n1,0\n").unwrap();
        let image = RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 4]));
        image.save(temp.path().join("pose.png")).unwrap();

        let loader = FsAssetLoader::new(temp.path());
        assert_eq!(loader.load_text("mask_1.csv").unwrap(), "0,1\n1,0\n");
        assert_eq!(loader.load_raster("pose.png").unwrap(), image);
    }

    #[test]
    fn test_fs_loader_absolute_path() {
        let temp = TempDir::new().expect("should create temp dir");
        let path = temp.path().join("abs.csv");
        std::fs::write(&path, "5").unwrap();
        let loader = FsAssetLoader::new("/nonexistent-root");
        assert_eq!(loader.load_text(path.to_str().unwrap()).unwrap(), "5");
    }

    #[test]
    fn test_fs_loader_not_found() {
        let temp = TempDir::new().expect("should create temp dir");
        let loader = FsAssetLoader::new(temp.path());
        let err = loader.load_raster("missing.png").unwrap_err();
        assert!(matches!(err, AssetLoadError::NotFound { .. }));
        assert_eq!(err.location(), "missing.png");
    }

    #[test]
    fn test_fs_loader_malformed_image() {
        let temp = TempDir::new().expect("should create temp dir");
        std::fs::write(temp.path().join("broken.png"), b"definitely not a png").unwrap();
        let loader = FsAssetLoader::new(temp.path());
        assert!(matches!(
            loader.load_raster("broken.png"),
            Err(AssetLoadError::Decode { .. })
        ));
    }

    #[test]
    fn test_fs_loader_data_url() {
        let image = RgbaImage::from_pixel(3, 1, Rgba([9, 8, 7, 255]));
        let url = raster::to_png_data_url(&image).unwrap();
        let loader = FsAssetLoader::default();
        assert_eq!(loader.load_raster(&url).unwrap(), image);

        let err = loader.load_raster("data:image/png;base64,!!!").unwrap_err();
        assert!(matches!(err, AssetLoadError::Decode { .. }));
    }

    #[test]
    fn test_fs_loader_text_data_url() {
        // "1,2\n" base64-encoded
        let loader = FsAssetLoader::default();
        assert_eq!(loader.load_text("data:text/csv;base64,MSwyCg==").unwrap(), "1,2\n");
    }

    #[test]
    fn test_memory_assets() {
        let assets = MemoryAssets::new()
            .with_text("a.csv", "1")
            .with_raster("a.png", RgbaImage::new(1, 1));
        assert_eq!(assets.load_text("a.csv").unwrap(), "1");
        assert!(assets.load_raster("a.png").is_ok());
        assert!(matches!(assets.load_text("b.csv"), Err(AssetLoadError::NotFound { .. })));
    }

    #[test]
    fn test_asset_cache() {
        let cache = AssetCache::new();
        assert!(cache.is_empty());
        cache.insert_raster("a.png", Arc::new(RgbaImage::new(1, 1)));
        cache.insert_region_map("a.csv", Arc::new(RegionMap::parse("1").unwrap()));
        assert_eq!(cache.len(), 2);
        assert!(cache.raster("a.png").is_some());
        assert!(cache.region_map("a.csv").is_some());
        assert!(cache.raster("a.csv").is_none());
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_describe_shortens_data_urls() {
        let long = format!("data:image/png;base64,{}", "A".repeat(200));
        assert!(describe(&long).len() < 60);
        assert_eq!(describe("frames/a.png"), "frames/a.png");
    }
}
