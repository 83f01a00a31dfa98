use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use wallpaper_manager_core::Config;

#[derive(Debug)]
pub struct Paths {
    pub config_file: PathBuf,
    pub staging_dir: PathBuf,
}

impl Paths {
    pub fn new() -> Result<Self> {
        let proj_dirs = ProjectDirs::from("com", "mulgundkar", "wallpaper_manager")
            .context("Failed to get project directories")?;

        let config_dir = proj_dirs.config_dir().to_path_buf();
        let config_file = config_dir.join("config.json");
        let staging_dir = proj_dirs.cache_dir().join("staged");

        fs::create_dir_all(&config_dir)?;
        fs::create_dir_all(&staging_dir)?;

        Ok(Paths { config_file, staging_dir })
    }
}

/// Reads `config.json` when present, defaults otherwise.
pub fn load_config(paths: &Paths) -> Result<Config> {
    if !paths.config_file.exists() {
        return Ok(Config::default());
    }
    let content = fs::read_to_string(&paths.config_file)
        .with_context(|| format!("Failed to read {}", paths.config_file.display()))?;
    Config::from_json(&content).with_context(|| format!("Invalid config in {}", paths.config_file.display()))
}
