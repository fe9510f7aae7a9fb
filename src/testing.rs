//! In-memory stand-ins for the engine and updater.

use crate::engine::{DownloadOptions, MediaEngine, VideoInfo};
use crate::error::{AppError, Result};
use crate::updater::EngineUpdater;
use async_trait::async_trait;
use std::sync::Mutex;

#[derive(Default)]
pub struct FakeEngine {
    metadata_failures: Vec<String>,
    download_failures: Vec<String>,
    metadata_calls: Mutex<Vec<String>>,
    downloads: Mutex<Vec<(String, DownloadOptions)>>,
}

impl FakeEngine {
    pub fn failing_downloads(urls: &[&str]) -> Self {
        Self {
            download_failures: urls.iter().map(|url| url.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn failing_metadata(urls: &[&str]) -> Self {
        Self {
            metadata_failures: urls.iter().map(|url| url.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn metadata_calls(&self) -> Vec<String> {
        self.metadata_calls.lock().unwrap().clone()
    }

    /// Every URL `download` was called with, failures included.
    pub fn downloaded(&self) -> Vec<String> {
        self.downloads
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    pub fn last_options(&self) -> Option<DownloadOptions> {
        self.downloads
            .lock()
            .unwrap()
            .last()
            .map(|(_, options)| options.clone())
    }
}

#[async_trait]
impl MediaEngine for FakeEngine {
    async fn fetch_metadata(&self, url: &str) -> Result<VideoInfo> {
        self.metadata_calls.lock().unwrap().push(url.to_string());
        if self.metadata_failures.iter().any(|failing| failing == url) {
            return Err(AppError::Engine(format!("ERROR: {}: Video unavailable", url)));
        }
        Ok(VideoInfo {
            title: Some(format!("Video at {}", url)),
            duration: Some(90.0),
        })
    }

    async fn download(&self, url: &str, options: &DownloadOptions) -> Result<()> {
        self.downloads
            .lock()
            .unwrap()
            .push((url.to_string(), options.clone()));
        if self.download_failures.iter().any(|failing| failing == url) {
            return Err(AppError::Engine(format!(
                "ERROR: {}: unable to download video data",
                url
            )));
        }
        Ok(())
    }
}

/// An updater whose every step fails.
pub struct BrokenUpdater;

#[async_trait]
impl EngineUpdater for BrokenUpdater {
    async fn installed_version(&self) -> Result<Option<String>> {
        Err(AppError::Update("pip is not installed".into()))
    }

    async fn upgrade(&self) -> Result<()> {
        Err(AppError::Update("pip is not installed".into()))
    }
}
