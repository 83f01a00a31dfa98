use serde::{Deserialize, Serialize};

/// Android N, the first release with `setBitmap(bitmap, rect, allowBackup, which)`.
pub const MODERN_SDK_INT: u32 = 24;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory inside the packaged assets that holds the framework's assets.
    pub asset_root: String,
    /// Lowest API level that gets the multi-target bitmap primitive.
    pub modern_sdk_int: u32,
    pub channel_name: String,
    /// Pin the legacy code path regardless of the platform's API level.
    pub force_legacy: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            asset_root: "flutter_assets".to_string(),
            modern_sdk_int: MODERN_SDK_INT,
            channel_name: "wallpaper_manager".to_string(),
            force_legacy: false,
        }
    }
}

impl Config {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Lookup key of a bundled asset, e.g. `flutter_assets/images/a.png`.
    pub fn asset_key(&self, asset_path: &str) -> String {
        let root = self.asset_root.trim_end_matches('/');
        let path = asset_path.trim_start_matches('/');
        if root.is_empty() {
            path.to_string()
        } else {
            format!("{}/{}", root, path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_key_prefixes_root() {
        let config = Config::default();
        assert_eq!(config.asset_key("images/bg.png"), "flutter_assets/images/bg.png");
        assert_eq!(config.asset_key("/images/bg.png"), "flutter_assets/images/bg.png");
    }

    #[test]
    fn asset_key_with_empty_root() {
        let config = Config { asset_root: String::new(), ..Config::default() };
        assert_eq!(config.asset_key("bg.png"), "bg.png");
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = Config::from_json(r#"{ "modern_sdk_int": 30 }"#).unwrap();
        assert_eq!(config.modern_sdk_int, 30);
        assert_eq!(config.asset_root, "flutter_assets");
        assert!(!config.force_legacy);
    }
}
