//! A sequential batch video downloader built on yt-dlp.
//!
//! Reads video links from a text file and hands them, one by one, to the
//! yt-dlp engine, reporting success or failure per link and a final summary.
//!
//! # Architecture
//!
//! - `Config`: settings loaded once from `ytbatch.yaml`
//! - `updater`: upgrades yt-dlp before a run
//! - `links`: reads and validates the links file
//! - `Downloader`: drives the engine over the link list
//! - `MediaEngine`: the engine seen as metadata + download operations
//! - `DownloadProgress`: success/failure tally and summary
//! - `Console`: colored or plain terminal output
//!
//! # Example
//! ```no_run
//! use ytbatch::{app, Config, Console, YtDlpEngine};
//!
//! async fn example() {
//!     let config = Config::default();
//!     let console = Console::detect();
//!     let engine = YtDlpEngine::prepare(&config, &console).await;
//!     app::run(&config, None, &engine, &console).await;
//! }
//! ```
pub mod app;
pub mod config;
pub mod downloader;
pub mod engine;
pub mod error;
pub mod links;
pub mod logging;
pub mod progress;
pub mod terminal;
pub mod updater;

#[cfg(test)]
mod testing;

// Re-export commonly used items
pub use config::Config;
pub use downloader::Downloader;
pub use engine::{MediaEngine, YtDlpEngine};
pub use error::AppError;
pub use links::LinkEntry;
pub use progress::DownloadProgress;
pub use terminal::Console;
