use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Which screen surface receives the wallpaper.
///
/// The integer values match Android's `WallpaperManager.FLAG_SYSTEM` and
/// `FLAG_LOCK`, so they can be handed to the OS untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum WallpaperLocation {
    Home,
    Lock,
    Both,
}

impl WallpaperLocation {
    pub fn flags(self) -> i32 {
        match self {
            WallpaperLocation::Home => 1,
            WallpaperLocation::Lock => 2,
            WallpaperLocation::Both => 3,
        }
    }

    pub fn includes_home(self) -> bool {
        matches!(self, WallpaperLocation::Home | WallpaperLocation::Both)
    }
}

impl TryFrom<i32> for WallpaperLocation {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(WallpaperLocation::Home),
            2 => Ok(WallpaperLocation::Lock),
            3 => Ok(WallpaperLocation::Both),
            other => Err(format!("unknown wallpaper location {}", other)),
        }
    }
}

impl From<WallpaperLocation> for i32 {
    fn from(location: WallpaperLocation) -> Self {
        location.flags()
    }
}

impl std::str::FromStr for WallpaperLocation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "home" | "system" => Ok(WallpaperLocation::Home),
            "lock" => Ok(WallpaperLocation::Lock),
            "both" => Ok(WallpaperLocation::Both),
            other => other
                .parse::<i32>()
                .map_err(|_| format!("unknown wallpaper location '{}'", other))
                .and_then(WallpaperLocation::try_from),
        }
    }
}

impl fmt::Display for WallpaperLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WallpaperLocation::Home => "home",
            WallpaperLocation::Lock => "lock",
            WallpaperLocation::Both => "both",
        };
        f.write_str(name)
    }
}

/// Pixel-space sub-region of the source image. Passed through as given;
/// bounds are the wallpaper service's business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl CropRect {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }
}

impl std::str::FromStr for CropRect {
    type Err = String;

    /// Parses `left,top,right,bottom`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<i32> = s
            .split(',')
            .map(|p| p.trim().parse::<i32>())
            .collect::<Result<_, _>>()
            .map_err(|e| format!("invalid crop '{}': {}", s, e))?;
        match parts.as_slice() {
            [left, top, right, bottom] => Ok(CropRect::new(*left, *top, *right, *bottom)),
            _ => Err(format!("crop needs four values, got {}", parts.len())),
        }
    }
}

/// Where the image bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Absolute filesystem path supplied by the caller.
    File(PathBuf),
    /// Logical path relative to the application's bundled-asset root.
    Asset(String),
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSource::File(path) => write!(f, "file {}", path.display()),
            ImageSource::Asset(path) => write!(f, "asset {}", path),
        }
    }
}

/// One wallpaper change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WallpaperRequest {
    pub source: ImageSource,
    pub location: WallpaperLocation,
    pub crop: Option<CropRect>,
}

impl WallpaperRequest {
    pub fn new(source: ImageSource, location: WallpaperLocation) -> Self {
        Self { source, location, crop: None }
    }

    pub fn with_crop(mut self, crop: CropRect) -> Self {
        self.crop = Some(crop);
        self
    }
}

/// Integer status returned to the caller. Negative means failure; a
/// non-negative value only tells which code path ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultCode(pub i32);

impl ResultCode {
    pub const FAILURE: ResultCode = ResultCode(-1);
    pub const LEGACY_SUCCESS: ResultCode = ResultCode(1);

    pub fn is_success(self) -> bool {
        self.0 >= 0
    }
}

impl From<ResultCode> for i32 {
    fn from(code: ResultCode) -> Self {
        code.0
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Host platform identity, used for the version query and strategy choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformInfo {
    pub name: String,
    pub release: String,
    /// Android API level. `None` on platforms without one.
    pub sdk_int: Option<u32>,
}

impl PlatformInfo {
    pub fn version_string(&self) -> String {
        format!("{} {}", self.name, self.release)
    }
}
