// Service traits for the OS collaborators, injected into the handler
use anyhow::{bail, Context, Result};
use std::path::{Component, Path, PathBuf};

use crate::bitmap::Bitmap;
use crate::error::WallpaperError;
use crate::model::{CropRect, PlatformInfo, WallpaperLocation};

/// The host's wallpaper service.
pub trait WallpaperService: Send + Sync {
    fn platform(&self) -> PlatformInfo;

    /// Multi-target primitive. Returns the OS's own status value.
    fn set_bitmap(
        &self,
        bitmap: &Bitmap,
        crop: Option<CropRect>,
        allow_backup: bool,
        location: WallpaperLocation,
    ) -> Result<i32>;

    /// Single-target primitive available on every version.
    fn set_bitmap_legacy(&self, bitmap: &Bitmap) -> Result<()>;

    /// Single-target primitive that takes encoded image bytes.
    fn set_stream_legacy(&self, bytes: &[u8]) -> Result<()>;
}

/// Resolves a bundled asset by its full lookup key.
pub trait AssetResolver: Send + Sync {
    fn open(&self, key: &str) -> Result<Vec<u8>>;
}

/// Assets unpacked into a directory on disk.
pub struct DirAssetResolver {
    root: PathBuf,
}

impl DirAssetResolver {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
}

impl AssetResolver for DirAssetResolver {
    /// Only plain relative keys resolve; the packaged-asset store has no way
    /// out of its root and neither does this one.
    fn open(&self, key: &str) -> Result<Vec<u8>> {
        let relative = Path::new(key);
        if let Some(component) = relative
            .components()
            .find(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            bail!("Asset key {} escapes the asset directory at {:?}", key, component);
        }
        let path = self.root.join(relative);
        std::fs::read(&path).with_context(|| format!("Failed to open asset {}", path.display()))
    }
}

/// Resolver for hosts without packaged assets.
pub struct NoAssets;

impl AssetResolver for NoAssets {
    fn open(&self, key: &str) -> Result<Vec<u8>> {
        Err(WallpaperError::Unsupported(format!("bundled asset {}", key)).into())
    }
}

/// Fallback service for platforms with no wallpaper backend.
pub struct UnsupportedWallpaperService;

impl WallpaperService for UnsupportedWallpaperService {
    fn platform(&self) -> PlatformInfo {
        PlatformInfo {
            name: std::env::consts::OS.to_string(),
            release: "unknown".to_string(),
            sdk_int: None,
        }
    }

    fn set_bitmap(
        &self,
        _bitmap: &Bitmap,
        _crop: Option<CropRect>,
        _allow_backup: bool,
        _location: WallpaperLocation,
    ) -> Result<i32> {
        Err(WallpaperError::Unsupported("setting the wallpaper".to_string()).into())
    }

    fn set_bitmap_legacy(&self, _bitmap: &Bitmap) -> Result<()> {
        Err(WallpaperError::Unsupported("setting the wallpaper".to_string()).into())
    }

    fn set_stream_legacy(&self, _bytes: &[u8]) -> Result<()> {
        Err(WallpaperError::Unsupported("setting the wallpaper".to_string()).into())
    }
}
