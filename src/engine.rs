use crate::config::{Config, CookieSource, EngineConfig};
use crate::error::{AppError, Result};
use crate::terminal::Console;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument};
use yt_dlp::Youtube;

/// The external download engine, seen as two operations.
///
/// The downloader only talks to this trait, so tests can swap in a fake.
#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// Fetches title and duration without downloading anything.
    async fn fetch_metadata(&self, url: &str) -> Result<VideoInfo>;

    /// Downloads `url` into the location described by `options`.
    async fn download(&self, url: &str, options: &DownloadOptions) -> Result<()>;
}

/// The subset of yt-dlp's info JSON shown before a download.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VideoInfo {
    #[serde(default)]
    pub title: Option<String>,
    /// Seconds. yt-dlp reports integers for most sites but floats for some.
    #[serde(default)]
    pub duration: Option<f64>,
}

impl VideoInfo {
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|title| !title.is_empty())
            .unwrap_or("Unknown title")
    }

    /// `M:SS` with total minutes, or `N/A` when unknown.
    pub fn display_duration(&self) -> String {
        match self.duration {
            Some(seconds) if seconds > 0.0 => {
                let seconds = seconds as u64;
                format!("{}:{:02}", seconds / 60, seconds % 60)
            }
            _ => String::from("N/A"),
        }
    }
}

/// Per-download engine options, built from the shared [`Config`].
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadOptions {
    pub format: Option<String>,
    pub output_template: PathBuf,
    pub merge_format: String,
    pub retries: u32,
    /// Subtitle languages, when subtitles are requested.
    pub subtitles: Option<Vec<String>>,
    pub thumbnail: bool,
    pub cookies: Option<CookieSource>,
    /// ffmpeg used for merging, when it is not the one on `PATH`.
    pub ffmpeg_location: Option<PathBuf>,
}

impl DownloadOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            format: config.video_format.clone(),
            output_template: config.output_dir.join(&config.output_template),
            merge_format: config.merge_format.clone(),
            retries: config.retries,
            subtitles: config
                .download_subtitles
                .then(|| config.subtitle_langs.clone()),
            thumbnail: config.download_thumbnail,
            cookies: config.cookie_source(),
            ffmpeg_location: config.engine.ffmpeg_location(),
        }
    }

    /// The yt-dlp command line for these options, without the URL.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if let Some(format) = &self.format {
            args.push("-f".to_string());
            args.push(format.clone());
        }
        args.push("-o".to_string());
        args.push(self.output_template.to_string_lossy().into_owned());
        args.push("--merge-output-format".to_string());
        args.push(self.merge_format.clone());
        args.push("--retries".to_string());
        args.push(self.retries.to_string());

        if let Some(langs) = &self.subtitles {
            args.push("--write-subs".to_string());
            if !langs.is_empty() {
                args.push("--sub-langs".to_string());
                args.push(langs.join(","));
            }
        }
        if self.thumbnail {
            args.push("--write-thumbnail".to_string());
        }
        args.extend(cookie_args(self.cookies.as_ref()));
        if let Some(ffmpeg) = &self.ffmpeg_location {
            args.push("--ffmpeg-location".to_string());
            args.push(ffmpeg.to_string_lossy().into_owned());
        }

        args
    }
}

pub fn cookie_args(cookies: Option<&CookieSource>) -> Vec<String> {
    match cookies {
        Some(CookieSource::File(path)) => {
            vec!["--cookies".to_string(), path.to_string_lossy().into_owned()]
        }
        Some(CookieSource::Browser(browser)) => {
            vec!["--cookies-from-browser".to_string(), browser.clone()]
        }
        None => Vec::new(),
    }
}

/// Picks the message to show for a failed yt-dlp run: the last `ERROR:` line,
/// else the last non-empty stderr line, else the exit status.
pub fn failure_message(stderr: &str, code: Option<i32>) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    lines
        .iter()
        .rev()
        .find(|line| line.starts_with("ERROR:"))
        .or_else(|| lines.last())
        .map(|line| line.to_string())
        .unwrap_or_else(|| match code {
            Some(code) => format!("yt-dlp exited with status {}", code),
            None => String::from("yt-dlp was terminated by a signal"),
        })
}

/// [`MediaEngine`] backed by the yt-dlp command line program.
pub struct YtDlpEngine {
    program: PathBuf,
    base_args: Vec<String>,
    cookies: Option<CookieSource>,
}

impl YtDlpEngine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            base_args: Vec::new(),
            cookies: None,
        }
    }

    /// Arguments placed before every yt-dlp option, e.g. `-m yt_dlp` when
    /// the program is a Python interpreter.
    pub fn with_base_args(mut self, args: Vec<String>) -> Self {
        self.base_args = args;
        self
    }

    /// Cookies used for metadata requests. Downloads take theirs from
    /// [`DownloadOptions`].
    pub fn with_cookies(mut self, cookies: Option<CookieSource>) -> Self {
        self.cookies = cookies;
        self
    }

    /// Builds the engine from configuration, installing yt-dlp and ffmpeg
    /// into `engine.libraries_dir` first when they are missing there.
    ///
    /// A failed installation is reported and the configured path is used
    /// as is; downloads will then fail individually.
    pub async fn prepare(config: &Config, console: &Console) -> Self {
        let engine = &config.engine;
        if let Some(dir) = &engine.libraries_dir {
            if let Err(e) = install_binaries(dir, &config.output_dir).await {
                console.warning(&format!(
                    "Could not install yt-dlp into {}: {}",
                    dir.display(),
                    e
                ));
            }
        }

        Self::from_engine_config(engine).with_cookies(config.cookie_source())
    }

    pub fn from_engine_config(engine: &EngineConfig) -> Self {
        Self::new(engine.yt_dlp_path()).with_base_args(engine.args.clone())
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.base_args).stdin(Stdio::null());
        command
    }

    fn spawn_error(&self, e: std::io::Error) -> AppError {
        AppError::Engine(format!(
            "could not run {}: {}",
            self.program.display(),
            e
        ))
    }
}

async fn install_binaries(dir: &Path, output_dir: &Path) -> Result<()> {
    if dir.join("yt-dlp").exists() && dir.join("ffmpeg").exists() {
        return Ok(());
    }

    info!("Installing yt-dlp and ffmpeg into {}", dir.display());
    Youtube::with_new_binaries(dir.to_path_buf(), output_dir.to_path_buf()).await?;
    Ok(())
}

#[async_trait]
impl MediaEngine for YtDlpEngine {
    #[instrument(skip(self))]
    async fn fetch_metadata(&self, url: &str) -> Result<VideoInfo> {
        let mut command = self.command();
        command
            .arg("--dump-single-json")
            .arg("--no-warnings")
            .args(cookie_args(self.cookies.as_ref()))
            .arg("--")
            .arg(url);
        debug!(?command, "Fetching metadata");

        let output = command.output().await.map_err(|e| self.spawn_error(e))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::Engine(failure_message(
                &stderr,
                output.status.code(),
            )));
        }

        Ok(serde_json::from_slice(&output.stdout)?)
    }

    #[instrument(skip(self, options))]
    async fn download(&self, url: &str, options: &DownloadOptions) -> Result<()> {
        let mut command = self.command();
        command
            .args(options.to_args())
            .arg("--")
            .arg(url)
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped());
        debug!(?command, "Starting download");

        let output = command.output().await.map_err(|e| self.spawn_error(e))?;
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            debug!(stderr = %stderr, "yt-dlp diagnostics");
        }

        if output.status.success() {
            Ok(())
        } else {
            Err(AppError::Engine(failure_message(
                &stderr,
                output.status.code(),
            )))
        }
    }
}
