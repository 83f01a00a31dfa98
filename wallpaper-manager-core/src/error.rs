use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum WallpaperError {
    #[error("failed to read {}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("asset {key} not found")]
    AssetNotFound {
        key: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("failed to decode image")]
    Decode(#[from] image::ImageError),

    #[error("wallpaper service failed: {0:#}")]
    Service(anyhow::Error),

    #[error("bad arguments for {method}: {source}")]
    BadArguments {
        method: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0} is not supported on this platform")]
    Unsupported(String),
}

pub type Result<T> = std::result::Result<T, WallpaperError>;
