use crate::config::Config;
use crate::downloader::{absolute_path, ensure_output_dir, Downloader};
use crate::engine::MediaEngine;
use crate::links::load_links;
use crate::progress::DownloadProgress;
use crate::terminal::Console;
use crate::updater::{update_engine, EngineUpdater};
use tracing::info;

const STAGES: usize = 3;

/// Runs the three stages of a batch: update the engine, read the links file,
/// download every link.
///
/// # Processing Flow
/// 1. Upgrades yt-dlp when an updater is given; failure only warns
/// 2. Loads and validates the links file
/// 3. Downloads each link and prints the summary
///
/// Returns `None` when the links file has no usable link; the engine is not
/// touched in that case.
pub async fn run<E: MediaEngine>(
    config: &Config,
    updater: Option<&dyn EngineUpdater>,
    engine: &E,
    console: &Console,
) -> Option<DownloadProgress> {
    info!("Stage 1: engine update");
    console.stage(1, STAGES, "Updating yt-dlp...");
    match updater {
        Some(updater) => {
            if !update_engine(updater, console).await {
                console.warning("Continuing with the installed yt-dlp version...");
            }
        }
        None => console.info("Skipping yt-dlp update"),
    }
    console.blank();

    info!("Stage 2: reading {}", config.links_file.display());
    console.stage(2, STAGES, "Reading links file...");
    let links = load_links(&config.links_file, console);
    if links.is_empty() {
        console.error("No valid links found!");
        console.info(&format!(
            "Add video links to the file: {}",
            absolute_path(&config.links_file).display()
        ));
        console.info("One link per line. Lines starting with # are comments.");
        return None;
    }
    console.success(&format!("Found {} links to download", links.len()));
    console.blank();

    info!("Stage 3: downloading {} links", links.len());
    console.stage(3, STAGES, "Downloading videos...");
    let output_dir = absolute_path(&config.output_dir);
    match ensure_output_dir(&config.output_dir).await {
        Ok(()) => console.info(&format!("Download directory: {}", output_dir.display())),
        Err(e) => console.error(&format!(
            "Could not create {}: {}",
            output_dir.display(),
            e
        )),
    }

    let progress = Downloader::new(engine, config, console)
        .process_links(&links)
        .await;
    progress.print_summary(console, &output_dir);

    Some(progress)
}
