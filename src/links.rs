use crate::terminal::Console;
use std::io;
use std::path::Path;

/// Hosts a line must mention to be treated as a video link.
pub const RECOGNIZED_HOSTS: [&str; 2] = ["youtube.com", "youtu.be"];

const PREVIEW_CHARS: usize = 50;

/// A validated link and the physical line it came from.
///
/// Only the loader builds these, so every entry handed to the downloader has
/// passed the host check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEntry {
    line: usize,
    url: String,
}

impl LinkEntry {
    pub(crate) fn new(line: usize, url: impl Into<String>) -> Self {
        Self {
            line,
            url: url.into(),
        }
    }

    /// 1-indexed line number in the links file.
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// A non-comment line dropped for not naming a recognized host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedLine {
    pub line: usize,
    pub preview: String,
}

#[derive(Debug, Default)]
pub struct ParsedLinks {
    pub accepted: Vec<LinkEntry>,
    pub rejected: Vec<RejectedLine>,
}

pub fn is_recognized(line: &str) -> bool {
    RECOGNIZED_HOSTS.iter().any(|host| line.contains(host))
}

/// Filters the content of a links file.
///
/// # Format
/// - One URL per line; `\n`, `\r\n` and a lone `\r` all end a line
/// - Lines are trimmed of whitespace
/// - Empty lines and lines starting with `#` are ignored
/// - Anything else must contain a recognized host
pub fn parse_links(content: &str) -> ParsedLinks {
    let mut parsed = ParsedLinks::default();
    let content = content.replace("\r\n", "\n").replace('\r', "\n");

    for (index, raw) in content.lines().enumerate() {
        let line_number = index + 1;
        let line = raw.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if is_recognized(line) {
            parsed.accepted.push(LinkEntry::new(line_number, line));
        } else {
            parsed.rejected.push(RejectedLine {
                line: line_number,
                preview: line.chars().take(PREVIEW_CHARS).collect(),
            });
        }
    }

    parsed
}

/// Reads and validates links from a text file.
///
/// A missing or unreadable file is reported on the console and yields no
/// links; the caller decides whether to stop.
pub fn load_links(path: &Path, console: &Console) -> Vec<LinkEntry> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            console.error(&format!("File not found: {}", path.display()));
            return Vec::new();
        }
        Err(e) => {
            console.error(&format!("Could not read {}: {}", path.display(), e));
            return Vec::new();
        }
    };

    let parsed = parse_links(&content);
    for rejected in &parsed.rejected {
        console.warning(&format!(
            "Line {}: ignored, not a recognized video link: {}...",
            rejected.line, rejected.preview
        ));
    }

    parsed.accepted
}
