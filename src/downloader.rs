use crate::config::Config;
use crate::engine::{DownloadOptions, MediaEngine};
use crate::error::Result;
use crate::links::LinkEntry;
use crate::progress::DownloadProgress;
use crate::terminal::{Console, Tone};
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// Runs the engine over a list of validated links, one at a time.
///
/// # Fields
/// * `engine` - The download engine, usually yt-dlp
/// * `config` - Shared settings every download is built from
/// * `console` - Where per-item progress is printed
pub struct Downloader<'a, E: MediaEngine> {
    engine: &'a E,
    config: &'a Config,
    console: &'a Console,
}

impl<'a, E: MediaEngine> Downloader<'a, E> {
    pub fn new(engine: &'a E, config: &'a Config, console: &'a Console) -> Self {
        Self {
            engine,
            config,
            console,
        }
    }

    /// Downloads every link in input order.
    ///
    /// A failure is printed, recorded and skipped; the batch never stops
    /// early. `concurrent_downloads` is not honored.
    pub async fn process_links(&self, links: &[LinkEntry]) -> DownloadProgress {
        if self.config.concurrent_downloads > 1 {
            warn!(
                concurrent_downloads = self.config.concurrent_downloads,
                "Parallel downloads are not supported, running one at a time"
            );
        }

        let total = links.len();
        let mut progress = DownloadProgress::new();

        for (index, entry) in links.iter().enumerate() {
            match self.download_link(entry, index + 1, total).await {
                Ok(title) => {
                    self.console
                        .success(&format!("Download finished: {}", title));
                    progress.record_success();
                }
                Err(e) => {
                    let error_msg = e.to_string();
                    self.console
                        .error(&format!("Failed to download {}: {}", entry.url(), error_msg));
                    progress.record_failure(entry, error_msg);
                }
            }
        }

        progress.finish();
        info!(
            successful = progress.successful(),
            failed = progress.failed(),
            "Batch finished"
        );
        progress
    }

    /// Downloads a single link, returning the title shown to the user.
    ///
    /// # Details
    /// 1. Makes sure the output directory exists
    /// 2. Fetches title and duration for the preview
    /// 3. Runs the actual download
    #[instrument(skip(self, entry), fields(line = entry.line(), url = entry.url()))]
    async fn download_link(&self, entry: &LinkEntry, index: usize, total: usize) -> Result<String> {
        ensure_output_dir(&self.config.output_dir).await?;
        let options = DownloadOptions::from_config(self.config);

        self.console.blank();
        self.console
            .line(Tone::Accent, &format!("[{}/{}] Downloading...", index, total));
        self.console
            .line(Tone::Detail, &format!("URL: {}", entry.url()));

        let info = self.engine.fetch_metadata(entry.url()).await?;
        self.console
            .line(Tone::Info, &format!("Title: {}", info.display_title()));
        self.console
            .line(Tone::Info, &format!("Duration: {}", info.display_duration()));

        self.engine.download(entry.url(), &options).await?;

        Ok(info.display_title().to_string())
    }
}

/// Creates the output directory and its parents; a no-op when it exists.
pub async fn ensure_output_dir(dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    Ok(())
}

/// `path` joined onto the working directory when relative.
pub fn absolute_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeEngine;

    fn links(urls: &[&str]) -> Vec<LinkEntry> {
        urls.iter()
            .enumerate()
            .map(|(i, url)| LinkEntry::new(i * 2 + 1, *url))
            .collect()
    }

    fn config_in(dir: &Path) -> Config {
        Config {
            output_dir: dir.join("nested").join("downloads"),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn one_failure_does_not_stop_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let engine = FakeEngine::failing_downloads(&["https://youtu.be/b"]);
        let console = Console::plain();
        let entries = links(&["https://youtu.be/a", "https://youtu.be/b", "https://youtu.be/c"]);

        let progress = Downloader::new(&engine, &config, &console)
            .process_links(&entries)
            .await;

        assert_eq!(progress.successful(), 2);
        assert_eq!(progress.failed(), 1);
        assert_eq!(progress.failed_links().collect::<Vec<_>>(), vec![&entries[1]]);
        assert_eq!(
            engine.downloaded(),
            vec!["https://youtu.be/a", "https://youtu.be/b", "https://youtu.be/c"]
        );
    }

    #[tokio::test]
    async fn metadata_failure_skips_the_download() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let engine = FakeEngine::failing_metadata(&["https://youtu.be/a"]);
        let console = Console::plain();
        let entries = links(&["https://youtu.be/a", "https://youtu.be/b"]);

        let progress = Downloader::new(&engine, &config, &console)
            .process_links(&entries)
            .await;

        assert_eq!(progress.failed(), 1);
        assert_eq!(progress.failed_links().next().unwrap().line(), 1);
        assert_eq!(engine.downloaded(), vec!["https://youtu.be/b"]);
    }

    #[tokio::test]
    async fn options_follow_the_shared_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            retries: 9,
            download_thumbnail: true,
            ..config_in(dir.path())
        };
        let engine = FakeEngine::default();
        let console = Console::plain();

        Downloader::new(&engine, &config, &console)
            .process_links(&links(&["https://youtu.be/a"]))
            .await;

        let options = engine.last_options().unwrap();
        assert_eq!(options.retries, 9);
        assert!(options.thumbnail);
        assert_eq!(
            options.output_template,
            config.output_dir.join("%(title)s.%(ext)s")
        );
    }

    #[tokio::test]
    async fn output_dir_creation_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let engine = FakeEngine::default();
        let console = Console::plain();
        let downloader = Downloader::new(&engine, &config, &console);

        let first = downloader.process_links(&links(&["https://youtu.be/a"])).await;
        let second = downloader.process_links(&links(&["https://youtu.be/a"])).await;

        assert!(config.output_dir.is_dir());
        assert_eq!(first.failed(), 0);
        assert_eq!(second.failed(), 0);
    }

    #[tokio::test]
    async fn unusable_output_dir_fails_each_item() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("taken");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let config = Config {
            output_dir: blocker.join("downloads"),
            ..Config::default()
        };
        let engine = FakeEngine::default();
        let console = Console::plain();

        let progress = Downloader::new(&engine, &config, &console)
            .process_links(&links(&["https://youtu.be/a", "https://youtu.be/b"]))
            .await;

        assert_eq!(progress.failed(), 2);
        assert!(engine.downloaded().is_empty());
    }

    #[tokio::test]
    async fn concurrency_setting_keeps_sequential_order() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            concurrent_downloads: 4,
            ..config_in(dir.path())
        };
        let engine = FakeEngine::default();
        let console = Console::plain();
        let urls = ["https://youtu.be/1", "https://youtu.be/2", "https://youtu.be/3"];

        Downloader::new(&engine, &config, &console)
            .process_links(&links(&urls))
            .await;

        assert_eq!(engine.downloaded(), urls.to_vec());
    }

    #[test]
    fn absolute_path_keeps_absolute_input() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(absolute_path(dir.path()), dir.path());
        assert!(absolute_path(Path::new("downloads")).is_absolute());
    }
}
