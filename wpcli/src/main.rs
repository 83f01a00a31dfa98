use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use wallpaper_manager_core::{
    CropRect, DirAssetResolver, MainContext, Method, MethodCall, MethodResult, WallpaperLocation,
    WallpaperPlugin, WallpaperRequestHandler,
};

mod desktop;
mod settings;

use desktop::DesktopWallpaperService;

#[derive(Parser)]
#[command(name = "wpcli")]
#[command(about = "Set the desktop wallpaper through the wallpaper_manager channel")]
#[command(version)]
struct Cli {
    /// Directory that contains the bundled `flutter_assets/` tree
    #[arg(long, default_value = ".")]
    assets_dir: PathBuf,

    /// Use the legacy single-target code path
    #[arg(long)]
    legacy: bool,

    /// Print the raw channel reply as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Set the wallpaper from an image file
    File {
        path: PathBuf,
        /// home, lock, both or the raw flag value
        #[arg(long, default_value = "home")]
        location: WallpaperLocation,
        /// left,top,right,bottom in image pixels
        #[arg(long)]
        crop: Option<CropRect>,
    },
    /// Set the wallpaper from a bundled asset
    Asset {
        path: String,
        #[arg(long, default_value = "home")]
        location: WallpaperLocation,
        #[arg(long)]
        crop: Option<CropRect>,
    },
    /// Print the platform name and version
    Version,
}

fn method_call(command: &Commands) -> MethodCall {
    let with_crop = |mut args: serde_json::Value, crop: &Option<CropRect>| {
        if let Some(c) = crop {
            args["left"] = json!(c.left);
            args["top"] = json!(c.top);
            args["right"] = json!(c.right);
            args["bottom"] = json!(c.bottom);
        }
        args
    };
    match command {
        Commands::File { path, location, crop } => {
            let path = path.canonicalize().unwrap_or_else(|_| path.clone());
            let method = match crop {
                Some(_) => Method::SetWallpaperFromFileWithCrop,
                None => Method::SetWallpaperFromFile,
            };
            let args = json!({ "filePath": path, "wallpaperLocation": location });
            MethodCall::new(method.name(), with_crop(args, crop))
        }
        Commands::Asset { path, location, crop } => {
            let method = match crop {
                Some(_) => Method::SetWallpaperFromAssetWithCrop,
                None => Method::SetWallpaperFromAsset,
            };
            let args = json!({ "assetPath": path, "wallpaperLocation": location });
            MethodCall::new(method.name(), with_crop(args, crop))
        }
        Commands::Version => MethodCall::new(Method::GetPlatformVersion.name(), serde_json::Value::Null),
    }
}

/// Sends `call` and waits for its reply on this thread.
fn call_and_wait(plugin: &WallpaperPlugin, main: &MainContext, call: MethodCall) -> Result<MethodResult> {
    let (tx, rx) = mpsc::channel();
    plugin.on_method_call(call, move |result| {
        let _ = tx.send(result);
    });
    if let Ok(result) = rx.try_recv() {
        return Ok(result);
    }
    main.dispatch_next();
    rx.recv().map_err(|e| anyhow!("No reply from wallpaper plugin: {}", e))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let paths = settings::Paths::new()?;
    let mut config = settings::load_config(&paths)?;
    config.force_legacy |= cli.legacy;
    log::debug!("Using {:?} with {:?}", paths, config);

    let handler = WallpaperRequestHandler::new(
        Arc::new(DesktopWallpaperService::new(&paths.staging_dir)),
        Arc::new(DirAssetResolver::new(&cli.assets_dir)),
        config,
    );
    let main = MainContext::new();
    let plugin = WallpaperPlugin::new(handler, &main);

    let result = call_and_wait(&plugin, &main, method_call(&cli.command))?;
    if cli.json {
        println!("{}", serde_json::to_string(&result)?);
    }

    match result {
        MethodResult::Success { value } => {
            if !cli.json {
                match &value {
                    serde_json::Value::String(s) => println!("{}", s),
                    other => println!("Result code: {}", other),
                }
            }
            if value.as_i64().is_some_and(|code| code < 0) {
                std::process::exit(1);
            }
            Ok(())
        }
        MethodResult::Error { code, message } => Err(anyhow!("{}: {}", code, message)),
        MethodResult::NotImplemented => Err(anyhow!("Method not implemented")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wallpaper_manager_core::{Config, ImageSource, Request, WallpaperRequest};

    #[test]
    fn file_with_crop_uses_crop_method() {
        let call = method_call(&Commands::File {
            path: PathBuf::from("/nonexistent/bg.png"),
            location: WallpaperLocation::Both,
            crop: Some(CropRect::new(1, 2, 3, 4)),
        });
        assert_eq!(call.method, "setWallpaperFromFileWithCrop");
        assert_eq!(
            Request::from_call(&call).unwrap(),
            Some(Request::SetWallpaper(
                WallpaperRequest::new(ImageSource::File("/nonexistent/bg.png".into()), WallpaperLocation::Both)
                    .with_crop(CropRect::new(1, 2, 3, 4))
            ))
        );
    }

    #[test]
    fn asset_without_crop() {
        let call = method_call(&Commands::Asset {
            path: "images/bg.png".to_string(),
            location: WallpaperLocation::Lock,
            crop: None,
        });
        assert_eq!(call.method, "setWallpaperFromAsset");
        assert_eq!(call.arguments, json!({ "assetPath": "images/bg.png", "wallpaperLocation": 2 }));
    }

    #[test]
    fn version_replies_without_background_work() {
        let dir = tempfile::tempdir().unwrap();
        let handler = WallpaperRequestHandler::new(
            Arc::new(DesktopWallpaperService::new(dir.path())),
            Arc::new(DirAssetResolver::new(dir.path())),
            Config::default(),
        );
        let main = MainContext::new();
        let plugin = WallpaperPlugin::new(handler, &main);

        let result = call_and_wait(&plugin, &main, method_call(&Commands::Version)).unwrap();
        assert!(matches!(result, MethodResult::Success { value: serde_json::Value::String(_) }));
    }

    #[test]
    fn missing_asset_waits_for_failure_code() {
        let dir = tempfile::tempdir().unwrap();
        let handler = WallpaperRequestHandler::new(
            Arc::new(DesktopWallpaperService::new(dir.path().join("staged"))),
            Arc::new(DirAssetResolver::new(dir.path())),
            Config::default(),
        );
        let main = MainContext::new();
        let plugin = WallpaperPlugin::new(handler, &main);

        let call = method_call(&Commands::Asset {
            path: "missing.png".to_string(),
            location: WallpaperLocation::Home,
            crop: None,
        });
        assert_eq!(call_and_wait(&plugin, &main, call).unwrap(), MethodResult::success(-1));
    }
}
