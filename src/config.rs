use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

const DEFAULT_FFMPEG: &str = "ffmpeg";

/// Configuration management for the application.
///
/// A single `Config` is loaded at startup from a YAML file and handed by
/// reference to every stage. Every key is optional; anything missing falls
/// back to the defaults below, and a missing file means all defaults.

/// Configuration for the batch downloader.
///
/// # Examples
///
/// ```
/// use ytbatch::Config;
///
/// let config = Config::default();
/// assert_eq!(config.retries, 3);
/// assert_eq!(config.merge_format, "mp4");
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub links_file: PathBuf,
    pub output_dir: PathBuf,
    /// yt-dlp output template, relative to `output_dir`.
    pub output_template: String,
    /// Format selection expression. `None` leaves the choice to yt-dlp.
    pub video_format: Option<String>,
    pub merge_format: String,
    pub download_subtitles: bool,
    pub subtitle_langs: Vec<String>,
    pub download_thumbnail: bool,
    /// Accepted for compatibility; downloads always run one at a time.
    pub concurrent_downloads: usize,
    pub retries: u32,
    pub cookies_from_browser: Option<String>,
    pub cookies_file: Option<PathBuf>,
    pub engine: EngineConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            links_file: PathBuf::from("links.txt"),
            output_dir: PathBuf::from("downloads"),
            output_template: String::from("%(title)s.%(ext)s"),
            video_format: Some(String::from(
                "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best",
            )),
            merge_format: String::from("mp4"),
            download_subtitles: false,
            subtitle_langs: vec![String::from("pt"), String::from("en")],
            download_thumbnail: false,
            concurrent_downloads: 1,
            retries: 3,
            cookies_from_browser: None,
            cookies_file: None,
            engine: EngineConfig::default(),
        }
    }
}

/// Where the engine binaries live and how they get upgraded.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    pub binary: PathBuf,
    /// Arguments placed before the yt-dlp options, e.g. `[-m, yt_dlp]` with
    /// `binary: python3`.
    pub args: Vec<String>,
    pub ffmpeg: PathBuf,
    /// When set, yt-dlp and ffmpeg are looked up (and installed if missing) here.
    pub libraries_dir: Option<PathBuf>,
    pub python: String,
    pub update_method: UpdateMethod,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("yt-dlp"),
            args: Vec::new(),
            ffmpeg: PathBuf::from(DEFAULT_FFMPEG),
            libraries_dir: None,
            python: String::from("python3"),
            update_method: UpdateMethod::Pip,
        }
    }
}

impl EngineConfig {
    /// The yt-dlp executable to run, preferring the libraries directory.
    pub fn yt_dlp_path(&self) -> PathBuf {
        match &self.libraries_dir {
            Some(dir) => dir.join("yt-dlp"),
            None => self.binary.clone(),
        }
    }

    pub fn ffmpeg_path(&self) -> PathBuf {
        match &self.libraries_dir {
            Some(dir) => dir.join("ffmpeg"),
            None => self.ffmpeg.clone(),
        }
    }

    /// The ffmpeg yt-dlp must be pointed at, or `None` when the plain
    /// `ffmpeg` on `PATH` is meant.
    pub fn ffmpeg_location(&self) -> Option<PathBuf> {
        if self.libraries_dir.is_none() && self.ffmpeg == Path::new(DEFAULT_FFMPEG) {
            return None;
        }
        Some(self.ffmpeg_path())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateMethod {
    /// `python -m pip install --upgrade yt-dlp`
    Pip,
    /// `yt-dlp --update`
    #[serde(rename = "self")]
    SelfUpdate,
    #[serde(rename = "none")]
    Skip,
}

/// How the engine authenticates against the video host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieSource {
    File(PathBuf),
    Browser(String),
}

impl Config {
    pub const FILE_NAME: &'static str = "ytbatch.yaml";

    /// Loads the configuration from `path`, or from [`Config::FILE_NAME`] in
    /// the working directory.
    ///
    /// # Errors
    /// Returns error if the file exists but cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(Self::FILE_NAME));

        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        Self::from_yaml(&raw).map_err(|source| AppError::Config {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_yaml(raw: &str) -> std::result::Result<Self, serde_yaml::Error> {
        let value: serde_yaml::Value = serde_yaml::from_str(raw)?;
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_yaml::from_value(value)
    }

    /// The configured cookie source. An exported cookies file wins over a
    /// browser when both are set.
    pub fn cookie_source(&self) -> Option<CookieSource> {
        if let Some(file) = &self.cookies_file {
            return Some(CookieSource::File(file.clone()));
        }
        self.cookies_from_browser
            .as_ref()
            .filter(|browser| !browser.trim().is_empty())
            .map(|browser| CookieSource::Browser(browser.clone()))
    }
}
