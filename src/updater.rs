use crate::config::{Config, EngineConfig, UpdateMethod};
use crate::error::{AppError, Result};
use crate::terminal::Console;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, instrument};
use yt_dlp::fetcher::deps::Libraries;
use yt_dlp::Youtube;

const PACKAGE: &str = "yt-dlp";

/// Something able to report and upgrade the installed engine version.
#[async_trait]
pub trait EngineUpdater: Send + Sync {
    /// `Ok(None)` when the engine is not installed through this channel.
    async fn installed_version(&self) -> Result<Option<String>>;

    async fn upgrade(&self) -> Result<()>;
}

/// Versions seen around an upgrade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub before: Option<String>,
    pub after: Option<String>,
}

impl UpdateOutcome {
    pub fn changed(&self) -> bool {
        self.after.is_some() && self.before != self.after
    }
}

/// Picks the updater named by `engine.update_method`.
pub fn updater_for(config: &Config) -> Option<Box<dyn EngineUpdater>> {
    match config.engine.update_method {
        UpdateMethod::Pip => Some(Box::new(PipUpdater::new(&config.engine.python))),
        UpdateMethod::SelfUpdate => Some(Box::new(SelfUpdater::new(
            &config.engine,
            config.output_dir.clone(),
        ))),
        UpdateMethod::Skip => None,
    }
}

/// Upgrades the engine and reports the result on the console.
///
/// Never fails: any error is printed and turned into `false`, and the caller
/// carries on with whatever version is installed.
pub async fn update_engine(updater: &dyn EngineUpdater, console: &Console) -> bool {
    console.info("Checking for yt-dlp updates...");

    match try_update(updater, console).await {
        Ok(outcome) => {
            let after = outcome.after.as_deref().unwrap_or("unknown");
            if outcome.changed() {
                let before = outcome.before.as_deref().unwrap_or("unknown");
                console.success(&format!("yt-dlp updated: {} → {}", before, after));
            } else {
                console.success(&format!(
                    "yt-dlp is already at the latest version: {}",
                    after
                ));
            }
            true
        }
        Err(e) => {
            console.error(&format!("Could not update yt-dlp: {}", e));
            false
        }
    }
}

async fn try_update(updater: &dyn EngineUpdater, console: &Console) -> Result<UpdateOutcome> {
    let before = updater.installed_version().await?;
    if let Some(version) = &before {
        console.info(&format!("Installed yt-dlp version: {}", version));
    }

    console.info("Updating yt-dlp to the latest version...");
    updater.upgrade().await?;

    let after = updater.installed_version().await?;
    Ok(UpdateOutcome { before, after })
}

/// Reads the `Version:` field of `pip show` output.
pub fn parse_pip_version(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .find_map(|line| line.strip_prefix("Version:"))
        .map(str::trim)
        .filter(|version| !version.is_empty())
        .map(str::to_string)
}

/// Upgrades yt-dlp through `python -m pip`.
pub struct PipUpdater {
    python: String,
}

impl PipUpdater {
    pub fn new(python: impl Into<String>) -> Self {
        Self {
            python: python.into(),
        }
    }

    async fn pip(&self, args: &[&str]) -> Result<std::process::Output> {
        let mut command = Command::new(&self.python);
        command
            .arg("-m")
            .arg("pip")
            .args(args)
            .stdin(Stdio::null());
        debug!(?command, "Running pip");

        command
            .output()
            .await
            .map_err(|e| AppError::Update(format!("could not run {}: {}", self.python, e)))
    }
}

#[async_trait]
impl EngineUpdater for PipUpdater {
    #[instrument(skip(self))]
    async fn installed_version(&self) -> Result<Option<String>> {
        let output = self.pip(&["show", PACKAGE]).await?;
        if !output.status.success() {
            return Ok(None);
        }
        Ok(parse_pip_version(&String::from_utf8_lossy(&output.stdout)))
    }

    #[instrument(skip(self))]
    async fn upgrade(&self) -> Result<()> {
        let output = self.pip(&["install", "--upgrade", PACKAGE]).await?;
        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(AppError::Update(stderr.trim().to_string()))
    }
}

/// Upgrades a standalone yt-dlp binary with its own `--update`.
pub struct SelfUpdater {
    binary: PathBuf,
    base_args: Vec<String>,
    ffmpeg: PathBuf,
    output_dir: PathBuf,
}

impl SelfUpdater {
    pub fn new(engine: &EngineConfig, output_dir: PathBuf) -> Self {
        Self {
            binary: engine.yt_dlp_path(),
            base_args: engine.args.clone(),
            ffmpeg: engine.ffmpeg_path(),
            output_dir,
        }
    }
}

#[async_trait]
impl EngineUpdater for SelfUpdater {
    async fn installed_version(&self) -> Result<Option<String>> {
        let output = Command::new(&self.binary)
            .args(&self.base_args)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .await?;
        if !output.status.success() {
            return Ok(None);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout
            .lines()
            .next()
            .map(str::trim)
            .filter(|version| !version.is_empty())
            .map(str::to_string))
    }

    async fn upgrade(&self) -> Result<()> {
        let libraries = Libraries::new(self.binary.clone(), self.ffmpeg.clone());
        let youtube = Youtube::new(libraries, self.output_dir.clone())?;
        youtube.update_downloader().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Hands out versions from a script and optionally refuses to upgrade.
    struct ScriptedUpdater {
        versions: Mutex<Vec<Option<String>>>,
        upgrade_fails: bool,
    }

    impl ScriptedUpdater {
        fn new(versions: &[Option<&str>], upgrade_fails: bool) -> Self {
            Self {
                versions: Mutex::new(
                    versions
                        .iter()
                        .rev()
                        .map(|v| v.map(str::to_string))
                        .collect(),
                ),
                upgrade_fails,
            }
        }
    }

    #[async_trait]
    impl EngineUpdater for ScriptedUpdater {
        async fn installed_version(&self) -> Result<Option<String>> {
            self.versions
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| AppError::Update("no more versions".into()))
        }

        async fn upgrade(&self) -> Result<()> {
            if self.upgrade_fails {
                Err(AppError::Update("network unreachable".into()))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn reads_version_from_pip_show() {
        let stdout = "Name: yt-dlp\nVersion: 2024.08.06\nSummary: A feature-rich command-line audio/video downloader\n";
        assert_eq!(parse_pip_version(stdout).as_deref(), Some("2024.08.06"));
        assert_eq!(parse_pip_version("Name: yt-dlp\n"), None);
        assert_eq!(parse_pip_version("Version:   \n"), None);
    }

    #[test]
    fn outcome_changes_only_with_a_new_version() {
        let outcome = |before: Option<&str>, after: Option<&str>| UpdateOutcome {
            before: before.map(str::to_string),
            after: after.map(str::to_string),
        };
        assert!(outcome(Some("1"), Some("2")).changed());
        assert!(outcome(None, Some("2")).changed());
        assert!(!outcome(Some("2"), Some("2")).changed());
        assert!(!outcome(Some("2"), None).changed());
    }

    #[tokio::test]
    async fn successful_upgrade_reports_true() {
        let updater = ScriptedUpdater::new(&[Some("2024.01.01"), Some("2024.08.06")], false);
        assert!(update_engine(&updater, &Console::plain()).await);
    }

    #[tokio::test]
    async fn failed_upgrade_reports_false() {
        let updater = ScriptedUpdater::new(&[Some("2024.01.01")], true);
        assert!(!update_engine(&updater, &Console::plain()).await);
    }

    #[tokio::test]
    async fn failed_version_query_reports_false() {
        let updater = ScriptedUpdater::new(&[], false);
        assert!(!update_engine(&updater, &Console::plain()).await);
    }

    #[tokio::test]
    async fn missing_python_is_an_update_error() {
        let updater = PipUpdater::new("definitely-not-a-python-binary");
        let err = updater.installed_version().await.unwrap_err();
        assert!(matches!(err, AppError::Update(_)));
        assert!(!update_engine(&updater, &Console::plain()).await);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn self_updater_reads_version_through_prefix_args() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("yt-dlp.sh");
        std::fs::write(
            &script,
            "[ \"$1\" = --version ] && echo 2024.08.06 || echo 'Python 3.12.1'\n",
        )
        .unwrap();
        let engine = EngineConfig {
            binary: PathBuf::from("sh"),
            args: vec![script.to_string_lossy().into_owned()],
            ..EngineConfig::default()
        };

        let updater = SelfUpdater::new(&engine, dir.path().join("downloads"));
        assert_eq!(
            updater.installed_version().await.unwrap().as_deref(),
            Some("2024.08.06")
        );
    }

    #[test]
    fn update_method_selects_updater() {
        let mut config = Config::default();
        assert!(updater_for(&config).is_some());

        config.engine.update_method = UpdateMethod::SelfUpdate;
        assert!(updater_for(&config).is_some());

        config.engine.update_method = UpdateMethod::Skip;
        assert!(updater_for(&config).is_none());
    }
}
