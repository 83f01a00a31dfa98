//! Core of the `wallpaper_manager` method channel: request model, argument
//! decoding, the request handler and the background dispatch. Platform
//! backends plug in through [`WallpaperService`] and [`AssetResolver`].

pub mod bitmap;
pub mod channel;
pub mod config;
pub mod error;
pub mod handler;
pub mod model;
pub mod plugin;
pub mod services;

#[cfg(test)]
pub(crate) mod test_support;

pub use bitmap::Bitmap;
pub use channel::{Method, MethodCall, MethodResult, Request};
pub use config::{Config, MODERN_SDK_INT};
pub use error::WallpaperError;
pub use handler::{SetStrategy, WallpaperRequestHandler};
pub use model::{CropRect, ImageSource, PlatformInfo, ResultCode, WallpaperLocation, WallpaperRequest};
pub use plugin::{MainContext, WallpaperPlugin};
pub use services::{AssetResolver, DirAssetResolver, NoAssets, UnsupportedWallpaperService, WallpaperService};
