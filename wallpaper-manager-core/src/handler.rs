use std::error::Error;
use std::sync::Arc;

use log::{debug, error, info};

use crate::bitmap::Bitmap;
use crate::config::Config;
use crate::error::{Result, WallpaperError};
use crate::model::{ImageSource, PlatformInfo, ResultCode, WallpaperLocation, WallpaperRequest};
use crate::services::{AssetResolver, WallpaperService};

/// Which OS primitive family the handler calls, fixed for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetStrategy {
    /// `setBitmap(bitmap, rect, allowBackup, which)`; honours crop and location.
    Modern,
    /// `setBitmap(bitmap)` / `setStream(stream)`; home screen only, no crop.
    Legacy,
}

impl SetStrategy {
    pub fn select(platform: &PlatformInfo, config: &Config) -> Self {
        if config.force_legacy {
            return SetStrategy::Legacy;
        }
        match platform.sdk_int {
            Some(sdk) if sdk < config.modern_sdk_int => SetStrategy::Legacy,
            _ => SetStrategy::Modern,
        }
    }
}

/// Turns a [`WallpaperRequest`] into a wallpaper change and a [`ResultCode`].
pub struct WallpaperRequestHandler {
    service: Arc<dyn WallpaperService>,
    assets: Arc<dyn AssetResolver>,
    config: Config,
    platform: PlatformInfo,
    strategy: SetStrategy,
}

impl WallpaperRequestHandler {
    pub fn new(
        service: Arc<dyn WallpaperService>,
        assets: Arc<dyn AssetResolver>,
        config: Config,
    ) -> Self {
        let platform = service.platform();
        let strategy = SetStrategy::select(&platform, &config);
        info!(
            "Wallpaper handler on {} (sdk {:?}) using {:?} strategy",
            platform.version_string(),
            platform.sdk_int,
            strategy
        );
        Self { service, assets, config, platform, strategy }
    }

    pub fn strategy(&self) -> SetStrategy {
        self.strategy
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn platform_version(&self) -> String {
        self.platform.version_string()
    }

    /// Never fails: every error is logged and reported as [`ResultCode::FAILURE`].
    pub fn handle(&self, request: &WallpaperRequest) -> ResultCode {
        match self.try_handle(request) {
            Ok(code) => {
                info!("Wallpaper set from {} ({}), result {}", request.source, request.location, code);
                code
            }
            Err(e) => {
                error!("Failed to set wallpaper from {}: {}", request.source, e);
                let mut source = e.source();
                while let Some(cause) = source {
                    error!("  caused by: {}", cause);
                    source = cause.source();
                }
                ResultCode::FAILURE
            }
        }
    }

    fn try_handle(&self, request: &WallpaperRequest) -> Result<ResultCode> {
        match self.strategy {
            SetStrategy::Modern => {
                let bytes = self.read_source(&request.source)?;
                let bitmap = Bitmap::decode(&bytes)?;
                debug!("Decoded {}x{} bitmap, crop {:?}", bitmap.width(), bitmap.height(), request.crop);
                let code = self
                    .service
                    .set_bitmap(&bitmap, request.crop, false, request.location)
                    .map_err(WallpaperError::Service)?;
                Ok(ResultCode(code))
            }
            SetStrategy::Legacy => {
                if request.crop.is_some() || request.location != WallpaperLocation::Home {
                    debug!(
                        "Legacy wallpaper path ignores crop {:?} and location {}",
                        request.crop, request.location
                    );
                }
                match &request.source {
                    ImageSource::File(_) => {
                        let bytes = self.read_source(&request.source)?;
                        let bitmap = Bitmap::decode(&bytes)?;
                        self.service.set_bitmap_legacy(&bitmap).map_err(WallpaperError::Service)?;
                    }
                    ImageSource::Asset(_) => {
                        // handed over still encoded, the OS decodes the stream
                        let bytes = self.read_source(&request.source)?;
                        self.service.set_stream_legacy(&bytes).map_err(WallpaperError::Service)?;
                    }
                }
                Ok(ResultCode::LEGACY_SUCCESS)
            }
        }
    }

    fn read_source(&self, source: &ImageSource) -> Result<Vec<u8>> {
        match source {
            ImageSource::File(path) => std::fs::read(path).map_err(|e| WallpaperError::FileRead {
                path: path.clone(),
                source: e,
            }),
            ImageSource::Asset(asset_path) => {
                let key = self.config.asset_key(asset_path);
                self.assets
                    .open(&key)
                    .map_err(|e| WallpaperError::AssetNotFound { key, source: e.into() })
            }
        }
    }
}
