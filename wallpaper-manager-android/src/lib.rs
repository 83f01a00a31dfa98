//! Android side of the `wallpaper_manager` channel.
//!
//! On Android the handler talks to `WallpaperManager` and the packaged
//! assets over JNI. Elsewhere the crate still builds and hands out a plugin
//! whose every wallpaper request fails, so hosts can compile one code path.

use std::sync::Arc;

use anyhow::Result;
use wallpaper_manager_core::{Config, MainContext, WallpaperPlugin, WallpaperRequestHandler};

#[cfg(target_os = "android")]
mod android_assets;
#[cfg(target_os = "android")]
mod android_wallpaper;

#[cfg(target_os = "android")]
pub use android_assets::AndroidAssetResolver;
#[cfg(target_os = "android")]
pub use android_wallpaper::AndroidWallpaperService;

/// Routes `log` records to logcat under the `WallpaperManager` tag.
#[cfg(target_os = "android")]
pub fn init_logging() {
    android_logger::init_once(
        android_logger::Config::default()
            .with_max_level(log::LevelFilter::Info)
            .with_tag("WallpaperManager"),
    );
}

#[cfg(not(target_os = "android"))]
pub fn init_logging() {}

/// Builds the request handler bound to the current application context.
#[cfg(target_os = "android")]
pub fn request_handler(config: Config) -> Result<WallpaperRequestHandler> {
    let service = AndroidWallpaperService::from_ndk_context()?;
    let assets = AndroidAssetResolver::new(&service)?;
    Ok(WallpaperRequestHandler::new(Arc::new(service), Arc::new(assets), config))
}

#[cfg(not(target_os = "android"))]
pub fn request_handler(config: Config) -> Result<WallpaperRequestHandler> {
    log::warn!("Android wallpaper setting not available on this platform");
    Ok(WallpaperRequestHandler::new(
        Arc::new(wallpaper_manager_core::UnsupportedWallpaperService),
        Arc::new(wallpaper_manager_core::NoAssets),
        config,
    ))
}

/// Plugin ready to receive calls on `config.channel_name`; replies are
/// delivered through `main`.
pub fn plugin(config: Config, main: &MainContext) -> Result<WallpaperPlugin> {
    init_logging();
    let handler = request_handler(config)?;
    log::info!("Registered method channel {}", handler.config().channel_name);
    Ok(WallpaperPlugin::new(handler, main))
}
