use crate::links::LinkEntry;
use crate::terminal::{Console, Tone};
use chrono::{DateTime, Local, TimeDelta};
use std::path::Path;

/// Tally of a batch run.
///
/// Counts successes and failures as the downloader walks the link list and
/// remembers which entries failed, in the order they were attempted. Nothing
/// is persisted; the tally is dropped once the summary is printed.
///
/// # Examples
///
/// ```
/// use ytbatch::DownloadProgress;
///
/// let mut progress = DownloadProgress::new();
/// progress.record_success();
/// assert_eq!(progress.successful(), 1);
/// assert_eq!(progress.failed(), 0);
/// ```
#[derive(Debug)]
pub struct DownloadProgress {
    pub completed: usize,
    pub start_time: DateTime<Local>,
    end_time: Option<DateTime<Local>>,
    failures: Vec<(LinkEntry, String)>, // (entry, error message)
}

impl DownloadProgress {
    pub fn new() -> Self {
        Self {
            completed: 0,
            start_time: Local::now(),
            end_time: None,
            failures: Vec::new(),
        }
    }

    pub fn record_success(&mut self) {
        self.completed += 1;
    }

    pub fn record_failure(&mut self, entry: &LinkEntry, error: String) {
        self.completed += 1;
        self.failures.push((entry.clone(), error));
    }

    /// Freezes the elapsed time.
    pub fn finish(&mut self) {
        self.end_time = Some(Local::now());
    }

    pub fn successful(&self) -> usize {
        self.completed - self.failures.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn failed_links(&self) -> impl Iterator<Item = &LinkEntry> {
        self.failures.iter().map(|(entry, _)| entry)
    }

    pub fn failure_reasons(&self) -> impl Iterator<Item = (&LinkEntry, &str)> {
        self.failures
            .iter()
            .map(|(entry, error)| (entry, error.as_str()))
    }

    /// One `(Line N: url, reason)` pair per failure, indented for the summary.
    pub fn failure_report(&self) -> Vec<(String, String)> {
        self.failure_reasons()
            .map(|(entry, reason)| {
                (
                    format!("  Line {}: {}", entry.line(), entry.url()),
                    format!("    {}", reason),
                )
            })
            .collect()
    }

    pub fn elapsed(&self) -> TimeDelta {
        self.end_time.unwrap_or_else(Local::now) - self.start_time
    }

    pub fn print_summary(&self, console: &Console, output_dir: &Path) {
        console.header("DOWNLOAD SUMMARY");
        console.line(
            Tone::Success,
            &format!("✓ Downloads finished: {}", self.successful()),
        );
        console.line(Tone::Failure, &format!("✗ Downloads failed: {}", self.failed()));
        console.line(
            Tone::Info,
            &format!("⏱ Total time: {}", format_elapsed(self.elapsed())),
        );
        console.line(
            Tone::Info,
            &format!("📁 Download folder: {}", output_dir.display()),
        );

        if self.failures.is_empty() {
            console.blank();
            return;
        }

        console.blank();
        console.line(Tone::Warning, "Failed links:");
        for (location, reason) in self.failure_report() {
            println!("{}", location);
            console.line(Tone::Detail, &reason);
        }
        console.blank();
    }
}

impl Default for DownloadProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// `H:MM:SS`, hours unbounded.
pub fn format_elapsed(elapsed: TimeDelta) -> String {
    let seconds = elapsed.num_seconds().max(0);
    format!(
        "{}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}
