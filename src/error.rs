use std::io;
use thiserror::Error;

/// Error types for the application.
///
/// Covers:
/// - IO operations (links file, output directory, child processes)
/// - Configuration parsing
/// - Download engine failures
/// - Engine update failures

/// Represents all possible errors that can occur in the application.
///
/// # Error Categories
///
/// - IO: File system and process spawning
/// - Config: YAML configuration parsing
/// - Engine: yt-dlp reported a failure for a URL
/// - Metadata: yt-dlp metadata could not be decoded
/// - Youtube: errors raised by the `yt-dlp` crate itself
/// - Update: upgrading the engine failed
/// - Custom: Application-specific errors
#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Config error in {path}: {source}")]
    Config {
        path: String,
        source: serde_yaml::Error,
    },

    #[error("{0}")]
    Engine(String),

    #[error("Metadata error: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("Youtube error: {0}")]
    Youtube(#[from] yt_dlp::error::Error),

    #[error("Update error: {0}")]
    Update(String),

    #[error("{0}")]
    Custom(String),
}

impl From<&str> for AppError {
    fn from(error: &str) -> Self {
        AppError::Custom(error.to_string())
    }
}

impl From<String> for AppError {
    fn from(error: String) -> Self {
        AppError::Custom(error)
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
