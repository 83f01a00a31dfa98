//! Method-call codec: turns framework calls into typed requests.

use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, WallpaperError};
use crate::model::{CropRect, ImageSource, WallpaperLocation, WallpaperRequest};

/// A call as it arrives from the framework: method name plus a JSON map of arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub arguments: Value,
}

impl MethodCall {
    pub fn new(method: impl Into<String>, arguments: Value) -> Self {
        Self { method: method.into(), arguments }
    }
}

/// Reply sent back to the framework.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum MethodResult {
    Success { value: Value },
    Error { code: String, message: String },
    NotImplemented,
}

impl MethodResult {
    pub const BAD_ARGS: &'static str = "BAD_ARGS";

    pub fn success(value: impl Into<Value>) -> Self {
        MethodResult::Success { value: value.into() }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        MethodResult::Error { code: code.into(), message: message.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    GetPlatformVersion,
    SetWallpaperFromFile,
    SetWallpaperFromFileWithCrop,
    SetWallpaperFromAsset,
    SetWallpaperFromAssetWithCrop,
}

impl Method {
    pub const ALL: [Method; 5] = [
        Method::GetPlatformVersion,
        Method::SetWallpaperFromFile,
        Method::SetWallpaperFromFileWithCrop,
        Method::SetWallpaperFromAsset,
        Method::SetWallpaperFromAssetWithCrop,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Method::GetPlatformVersion => "getPlatformVersion",
            Method::SetWallpaperFromFile => "setWallpaperFromFile",
            Method::SetWallpaperFromFileWithCrop => "setWallpaperFromFileWithCrop",
            Method::SetWallpaperFromAsset => "setWallpaperFromAsset",
            Method::SetWallpaperFromAssetWithCrop => "setWallpaperFromAssetWithCrop",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Method::ALL.into_iter().find(|m| m.name() == name)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileArgs {
    file_path: PathBuf,
    wallpaper_location: WallpaperLocation,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetArgs {
    asset_path: String,
    wallpaper_location: WallpaperLocation,
}

/// Typed form of a recognised [`MethodCall`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    PlatformVersion,
    SetWallpaper(WallpaperRequest),
}

impl Request {
    /// `Ok(None)` for methods this channel does not implement.
    pub fn from_call(call: &MethodCall) -> Result<Option<Request>> {
        let Some(method) = Method::from_name(&call.method) else {
            return Ok(None);
        };
        let request = match method {
            Method::GetPlatformVersion => Request::PlatformVersion,
            Method::SetWallpaperFromFile => {
                let args: FileArgs = arguments(call)?;
                Request::SetWallpaper(WallpaperRequest::new(
                    ImageSource::File(args.file_path),
                    args.wallpaper_location,
                ))
            }
            Method::SetWallpaperFromFileWithCrop => {
                let args: FileArgs = arguments(call)?;
                let crop: CropRect = arguments(call)?;
                Request::SetWallpaper(
                    WallpaperRequest::new(ImageSource::File(args.file_path), args.wallpaper_location)
                        .with_crop(crop),
                )
            }
            Method::SetWallpaperFromAsset => {
                let args: AssetArgs = arguments(call)?;
                Request::SetWallpaper(WallpaperRequest::new(
                    ImageSource::Asset(args.asset_path),
                    args.wallpaper_location,
                ))
            }
            Method::SetWallpaperFromAssetWithCrop => {
                let args: AssetArgs = arguments(call)?;
                let crop: CropRect = arguments(call)?;
                Request::SetWallpaper(
                    WallpaperRequest::new(ImageSource::Asset(args.asset_path), args.wallpaper_location)
                        .with_crop(crop),
                )
            }
        };
        Ok(Some(request))
    }
}

fn arguments<T: DeserializeOwned>(call: &MethodCall) -> Result<T> {
    T::deserialize(&call.arguments).map_err(|e| WallpaperError::BadArguments {
        method: call.method.clone(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn method_names_round_trip() {
        for method in Method::ALL {
            assert_eq!(Method::from_name(method.name()), Some(method));
        }
        assert_eq!(Method::from_name("setWallpaperFromUrl"), None);
    }

    #[test]
    fn parses_file_with_crop() {
        let call = MethodCall::new(
            "setWallpaperFromFileWithCrop",
            json!({
                "filePath": "/sdcard/Pictures/a.jpg",
                "wallpaperLocation": 2,
                "left": 0, "top": 10, "right": 1080, "bottom": 1930
            }),
        );
        let request = Request::from_call(&call).unwrap().unwrap();
        assert_eq!(
            request,
            Request::SetWallpaper(
                WallpaperRequest::new(ImageSource::File("/sdcard/Pictures/a.jpg".into()), WallpaperLocation::Lock)
                    .with_crop(CropRect::new(0, 10, 1080, 1930))
            )
        );
    }

    #[test]
    fn parses_asset_without_crop() {
        let call = MethodCall::new(
            "setWallpaperFromAsset",
            json!({ "assetPath": "assets/bg.png", "wallpaperLocation": 3 }),
        );
        let request = Request::from_call(&call).unwrap().unwrap();
        assert_eq!(
            request,
            Request::SetWallpaper(WallpaperRequest::new(
                ImageSource::Asset("assets/bg.png".into()),
                WallpaperLocation::Both
            ))
        );
    }

    #[test]
    fn platform_version_needs_no_arguments() {
        let call = MethodCall::new("getPlatformVersion", Value::Null);
        assert_eq!(Request::from_call(&call).unwrap(), Some(Request::PlatformVersion));
    }

    #[test]
    fn unknown_method_is_not_an_error() {
        let call = MethodCall::new("setLiveWallpaper", json!({}));
        assert_eq!(Request::from_call(&call).unwrap(), None);
    }

    #[test]
    fn missing_or_invalid_arguments_are_rejected() {
        let missing_crop = MethodCall::new(
            "setWallpaperFromFileWithCrop",
            json!({ "filePath": "/a.png", "wallpaperLocation": 1, "left": 0 }),
        );
        assert!(matches!(
            Request::from_call(&missing_crop),
            Err(WallpaperError::BadArguments { .. })
        ));

        let bad_location = MethodCall::new(
            "setWallpaperFromFile",
            json!({ "filePath": "/a.png", "wallpaperLocation": 7 }),
        );
        assert!(Request::from_call(&bad_location).is_err());
    }

    #[test]
    fn result_serializes_with_status_tag() {
        let json = serde_json::to_value(MethodResult::success(1)).unwrap();
        assert_eq!(json, json!({ "status": "success", "value": 1 }));
        let json = serde_json::to_value(MethodResult::NotImplemented).unwrap();
        assert_eq!(json, json!({ "status": "notImplemented" }));
    }
}
