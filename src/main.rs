use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use ytbatch::error::Result;
use ytbatch::{app, logging, updater, Config, Console, YtDlpEngine};

/// Downloads every video listed in a links file with yt-dlp.
#[derive(Parser, Debug)]
#[command(name = "ytbatch", version, long_about = None)]
struct Args {
    /// Configuration file (YAML). Defaults to ./ytbatch.yaml when present
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Links file, one URL per line (overrides `links_file`)
    #[arg(short, long)]
    links: Option<PathBuf>,

    /// Download directory (overrides `output_dir`)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Do not try to upgrade yt-dlp before downloading
    #[arg(long)]
    skip_update: bool,

    /// Plain output without colors
    #[arg(long)]
    no_color: bool,

    /// More diagnostic logging on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(links) = &self.links {
            config.links_file = links.clone();
        }
        if let Some(output) = &self.output {
            config.output_dir = output.clone();
        }
    }
}

/// Main entry point for the application.
///
/// # Steps
/// 1. Parses the command line and initializes logging
/// 2. Loads the configuration, falling back to defaults
/// 3. Prepares the yt-dlp engine and the updater
/// 4. Runs the update, load and download stages
///
/// Only startup problems (bad config, logging setup) exit non-zero; failed
/// downloads are reported in the summary.
#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = run_application(args).await {
        eprintln!("Application error: {}", e);
        std::process::exit(1);
    }
}

async fn run_application(args: Args) -> Result<()> {
    let use_color = !args.no_color && console::colors_enabled_stderr();
    logging::init(args.verbose, use_color).map_err(|e| e.to_string())?;
    info!("Starting ytbatch...");

    let mut config = Config::load(args.config.as_deref())?;
    args.apply_overrides(&mut config);

    let console = if args.no_color {
        Console::plain()
    } else {
        Console::detect()
    };
    console.header("YouTube Video Downloader - Batch Download");

    let engine = YtDlpEngine::prepare(&config, &console).await;
    let updater = if args.skip_update {
        None
    } else {
        updater::updater_for(&config)
    };

    app::run(&config, updater.as_deref(), &engine, &console).await;

    info!("Application completed");
    Ok(())
}
