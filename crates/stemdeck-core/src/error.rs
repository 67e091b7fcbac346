//! Error types for stemdeck-core

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StemdeckError>;

#[derive(Error, Debug)]
pub enum StemdeckError {
    #[error("Download failed: {0}")]
    Download(#[from] DownloadError),

    #[error("Separation failed: {0}")]
    Separate(#[from] SeparateError),

    #[error("Transcode failed: {0}")]
    Transcode(#[from] TranscodeError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Run cancelled")]
    Cancelled,
}

impl StemdeckError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, StemdeckError::Cancelled)
    }
}

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("no access token configured; set download.access_token or STEMDECK_DOWNLOAD__ACCESS_TOKEN")]
    MissingToken,

    #[error("conversion endpoint returned HTTP {0}")]
    EndpointStatus(u16),

    #[error("download timed out after {0}s")]
    TimedOut(u64),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum SeparateError {
    #[error("demucs failed with exit code {code:?}: {stderr}")]
    ToolFailed { code: Option<i32>, stderr: String },

    #[error("separation output directory not found: {0}")]
    OutputMissing(PathBuf),

    #[error("separation timed out after {0}s")]
    TimedOut(u64),

    #[error("separation cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum TranscodeError {
    #[error("FFmpeg failed with exit code: {0:?}")]
    FfmpegFailed(Option<i32>),

    #[error("FFmpeg timed out after {0}s")]
    TimedOut(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("no such track: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    LoadError(String),

    #[error("Invalid config value: {0}")]
    InvalidValue(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
