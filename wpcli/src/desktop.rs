use std::path::{Path, PathBuf};
#[cfg(target_os = "linux")]
use std::process::Command;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, bail, Context, Result};
use image::RgbaImage;
use log::{info, warn};
use wallpaper_manager_core::{Bitmap, CropRect, PlatformInfo, WallpaperError, WallpaperLocation, WallpaperService};

const STAGED_PREFIX: &str = "wallpaper-";

/// Desktop stand-in for Android's wallpaper service. Desktops take a file
/// path, so every bitmap is staged as a PNG first.
pub struct DesktopWallpaperService {
    staging_dir: PathBuf,
    next_id: AtomicI32,
    apply: fn(&Path) -> Result<()>,
    // staging clears older files, so a staged file must be applied before the next one lands
    apply_lock: Mutex<()>,
}

impl DesktopWallpaperService {
    pub fn new<P: AsRef<Path>>(staging_dir: P) -> Self {
        Self::with_setter(staging_dir, set_from_path)
    }

    fn with_setter<P: AsRef<Path>>(staging_dir: P, apply: fn(&Path) -> Result<()>) -> Self {
        Self {
            staging_dir: staging_dir.as_ref().to_path_buf(),
            next_id: AtomicI32::new(1),
            apply,
            apply_lock: Mutex::new(()),
        }
    }

    fn stage_and_apply(&self, stage: impl FnOnce() -> Result<PathBuf>) -> Result<()> {
        let _guard = self.apply_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let path = stage()?;
        (self.apply)(&path)
    }

    /// Writes `image` under a fresh name; some desktops ignore a path they already show.
    fn stage_png(&self, image: &RgbaImage, id: i32) -> Result<PathBuf> {
        self.clear_staged()?;
        let path = self.staging_dir.join(format!("{}{}.png", STAGED_PREFIX, id));
        image.save(&path).with_context(|| format!("Failed to stage {}", path.display()))?;
        Ok(path)
    }

    fn stage_encoded(&self, bytes: &[u8], id: i32) -> Result<PathBuf> {
        let format = image::guess_format(bytes).context("Unrecognised image stream")?;
        let ext = format.extensions_str().first().copied().unwrap_or("img");
        self.clear_staged()?;
        let path = self.staging_dir.join(format!("{}{}.{}", STAGED_PREFIX, id, ext));
        std::fs::write(&path, bytes).with_context(|| format!("Failed to stage {}", path.display()))?;
        Ok(path)
    }

    fn clear_staged(&self) -> Result<()> {
        std::fs::create_dir_all(&self.staging_dir)?;
        for entry in std::fs::read_dir(&self.staging_dir)? {
            let path = entry?.path();
            let staged = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(STAGED_PREFIX));
            if staged {
                std::fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    fn next_id(&self) -> i32 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }
}

impl WallpaperService for DesktopWallpaperService {
    fn platform(&self) -> PlatformInfo {
        PlatformInfo {
            name: platform_name().to_string(),
            release: desktop_release(),
            sdk_int: None,
        }
    }

    fn set_bitmap(
        &self,
        bitmap: &Bitmap,
        crop: Option<CropRect>,
        _allow_backup: bool,
        location: WallpaperLocation,
    ) -> Result<i32> {
        if !location.includes_home() {
            return Err(WallpaperError::Unsupported("lock screen wallpaper".to_string()).into());
        }
        if location == WallpaperLocation::Both {
            warn!("Desktop has no separate lock screen wallpaper, setting home only");
        }
        let image = match crop {
            Some(crop) => crop_to_bounds(bitmap, crop)?,
            None => bitmap.as_rgba().clone(),
        };
        let id = self.next_id();
        self.stage_and_apply(|| self.stage_png(&image, id))?;
        Ok(id)
    }

    fn set_bitmap_legacy(&self, bitmap: &Bitmap) -> Result<()> {
        let id = self.next_id();
        self.stage_and_apply(|| self.stage_png(bitmap.as_rgba(), id))
    }

    fn set_stream_legacy(&self, bytes: &[u8]) -> Result<()> {
        let id = self.next_id();
        self.stage_and_apply(|| self.stage_encoded(bytes, id))
    }
}

/// Cuts `crop` out of `bitmap`, clamped to the image. A desktop has no
/// rect-aware primitive, so this is where out-of-range rectangles end up.
pub fn crop_to_bounds(bitmap: &Bitmap, crop: CropRect) -> Result<RgbaImage> {
    let width = bitmap.width() as i64;
    let height = bitmap.height() as i64;
    let left = (crop.left as i64).clamp(0, width);
    let top = (crop.top as i64).clamp(0, height);
    let right = (crop.right as i64).clamp(left, width);
    let bottom = (crop.bottom as i64).clamp(top, height);
    if right == left || bottom == top {
        bail!("Crop {:?} leaves nothing of a {}x{} image", crop, width, height);
    }
    info!("Cropping {}x{} image to ({}, {}) - ({}, {})", width, height, left, top, right, bottom);
    let view = image::imageops::crop_imm(
        bitmap.as_rgba(),
        left as u32,
        top as u32,
        (right - left) as u32,
        (bottom - top) as u32,
    );
    Ok(view.to_image())
}

fn set_from_path(path: &Path) -> Result<()> {
    let file_loc = path.to_string_lossy();
    match wallpaper::set_from_path(&file_loc) {
        Ok(()) => {
            info!("Wallpaper set to {}", file_loc);
            Ok(())
        }
        Err(e) => {
            warn!("wallpaper crate failed for {}: {}", file_loc, e);
            set_wallpaper_fallback(path)
        }
    }
}

#[cfg(target_os = "linux")]
fn set_wallpaper_fallback(path: &Path) -> Result<()> {
    let file_loc = path.to_string_lossy();
    let desktop = session_desktop().context("No fallback wallpaper setter for this session")?;
    let status = match desktop {
        Desktop::Gnome => {
            let uri = format!("file://{}", file_loc);
            let status = Command::new("gsettings")
                .args(["set", "org.gnome.desktop.background", "picture-uri", &uri])
                .status()?;
            // older GNOME has no dark variant key
            let _ = Command::new("gsettings")
                .args(["set", "org.gnome.desktop.background", "picture-uri-dark", &uri])
                .status();
            status
        }
        Desktop::Mate => Command::new("gsettings")
            .args(["set", "org.mate.background", "picture-filename", &file_loc])
            .status()?,
        Desktop::Lxde => Command::new("pcmanfm")
            .args(["--set-wallpaper", &file_loc, "--wallpaper-mode=scaled"])
            .status()?,
        Desktop::Fbsetbg => Command::new("fbsetbg").arg(&*file_loc).status()?,
    };
    if status.success() {
        Ok(())
    } else {
        Err(anyhow!("Fallback wallpaper command for {:?} exited with {}", desktop, status))
    }
}

#[cfg(not(target_os = "linux"))]
fn set_wallpaper_fallback(path: &Path) -> Result<()> {
    Err(anyhow!("No fallback wallpaper setter for {}", path.display()))
}

/// Desktop families the Linux fallback knows a setter command for.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Desktop {
    Gnome,
    Mate,
    Lxde,
    Fbsetbg,
}

/// Maps one desktop name, as found in `XDG_CURRENT_DESKTOP` or
/// `DESKTOP_SESSION`, onto a fallback setter.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn desktop_from_name(name: &str) -> Option<Desktop> {
    let name = name.trim().to_lowercase();
    match name.as_str() {
        "mate" => Some(Desktop::Mate),
        "fluxbox" | "openbox" | "jwm" | "afterstep" => Some(Desktop::Fbsetbg),
        n if n.contains("lxde") || n.starts_with("lubuntu") => Some(Desktop::Lxde),
        n if n.contains("gnome") || n.contains("cinnamon") || n.starts_with("ubuntu") || n == "unity" => {
            Some(Desktop::Gnome)
        }
        _ => None,
    }
}

#[cfg(target_os = "linux")]
fn session_desktop() -> Option<Desktop> {
    ["XDG_CURRENT_DESKTOP", "DESKTOP_SESSION"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find_map(|value| value.split(':').find_map(desktop_from_name))
}

fn platform_name() -> &'static str {
    match std::env::consts::OS {
        "linux" => "Linux",
        "macos" => "macOS",
        "windows" => "Windows",
        other => other,
    }
}

#[cfg(target_os = "linux")]
fn desktop_release() -> String {
    std::env::var("XDG_CURRENT_DESKTOP").unwrap_or_else(|_| "unknown".to_string())
}

#[cfg(not(target_os = "linux"))]
fn desktop_release() -> String {
    std::env::consts::ARCH.to_string()
}
