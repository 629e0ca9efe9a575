use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to load template image {path:?}: {source}")]
    TemplateLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to read config {path:?}: {source}")]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path:?}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("screen capture failed: {0}")]
    Capture(String),

    #[error("input injection failed: {0}")]
    Input(String),
}

pub type Result<T> = std::result::Result<T, Error>;
