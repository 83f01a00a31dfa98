//! Fakes shared by the unit tests.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use image::{ImageFormat, Rgba, RgbaImage};

use crate::bitmap::Bitmap;
use crate::model::{CropRect, PlatformInfo, WallpaperLocation};
use crate::services::{AssetResolver, WallpaperService};

pub fn png_bytes(width: u32, height: u32, colour: [u8; 4]) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba(colour));
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png).unwrap();
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceCall {
    SetBitmap { width: u32, height: u32, crop: Option<CropRect>, allow_backup: bool, flags: i32 },
    SetBitmapLegacy { width: u32, height: u32 },
    SetStreamLegacy { len: usize },
}

pub struct RecordingService {
    sdk_int: Option<u32>,
    fail: bool,
    calls: Mutex<Vec<ServiceCall>>,
}

impl RecordingService {
    pub const WALLPAPER_ID: i32 = 42;

    pub fn new(sdk_int: Option<u32>) -> Self {
        Self { sdk_int, fail: false, calls: Mutex::new(Vec::new()) }
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn calls(&self) -> Vec<ServiceCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: ServiceCall) -> Result<()> {
        if self.fail {
            return Err(anyhow!("IOException: wallpaper service unavailable"));
        }
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

impl WallpaperService for RecordingService {
    fn platform(&self) -> PlatformInfo {
        PlatformInfo { name: "Android".into(), release: "14".into(), sdk_int: self.sdk_int }
    }

    fn set_bitmap(
        &self,
        bitmap: &Bitmap,
        crop: Option<CropRect>,
        allow_backup: bool,
        location: WallpaperLocation,
    ) -> Result<i32> {
        self.record(ServiceCall::SetBitmap {
            width: bitmap.width(),
            height: bitmap.height(),
            crop,
            allow_backup,
            flags: location.flags(),
        })?;
        Ok(Self::WALLPAPER_ID)
    }

    fn set_bitmap_legacy(&self, bitmap: &Bitmap) -> Result<()> {
        self.record(ServiceCall::SetBitmapLegacy { width: bitmap.width(), height: bitmap.height() })
    }

    fn set_stream_legacy(&self, bytes: &[u8]) -> Result<()> {
        self.record(ServiceCall::SetStreamLegacy { len: bytes.len() })
    }
}

#[derive(Default)]
pub struct MemoryAssets {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryAssets {
    pub fn with(mut self, key: &str, bytes: Vec<u8>) -> Self {
        self.files.insert(key.to_string(), bytes);
        self
    }
}

impl AssetResolver for MemoryAssets {
    fn open(&self, key: &str) -> Result<Vec<u8>> {
        self.files.get(key).cloned().ok_or_else(|| anyhow!("no asset {}", key))
    }
}
