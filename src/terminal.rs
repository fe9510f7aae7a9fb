//! Terminal output for the user-facing progress text.
//!
//! Styling is a strategy picked once at startup: [`AnsiPainter`] when the
//! terminal supports colors, [`PlainPainter`] otherwise. Both produce the same
//! text; only the escape codes differ.

use console::Style;

const HEADER_WIDTH: usize = 60;
const STAGE_WIDTH: usize = 40;

/// The role of a piece of text, mapped to a color by [`AnsiPainter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Header,
    Stage,
    Success,
    Failure,
    Info,
    Warning,
    Accent,
    Detail,
    Plain,
}

pub trait Painter: Send + Sync {
    fn paint(&self, tone: Tone, text: &str) -> String;
}

pub struct AnsiPainter;

impl Painter for AnsiPainter {
    fn paint(&self, tone: Tone, text: &str) -> String {
        let style = match tone {
            Tone::Header => Style::new().cyan().bold(),
            Tone::Stage | Tone::Warning => Style::new().yellow(),
            Tone::Success => Style::new().green(),
            Tone::Failure => Style::new().red(),
            Tone::Info => Style::new().cyan(),
            Tone::Accent => Style::new().magenta(),
            Tone::Detail => Style::new().white(),
            Tone::Plain => return text.to_string(),
        };
        style.force_styling(true).apply_to(text).to_string()
    }
}

pub struct PlainPainter;

impl Painter for PlainPainter {
    fn paint(&self, _tone: Tone, text: &str) -> String {
        text.to_string()
    }
}

pub struct Console {
    painter: Box<dyn Painter>,
}

impl Console {
    pub fn new(painter: Box<dyn Painter>) -> Self {
        Self { painter }
    }

    /// Colors when stdout is a color-capable terminal (honors `NO_COLOR` and
    /// `CLICOLOR`), plain text otherwise.
    pub fn detect() -> Self {
        if console::colors_enabled() {
            Self::new(Box::new(AnsiPainter))
        } else {
            Self::plain()
        }
    }

    pub fn plain() -> Self {
        Self::new(Box::new(PlainPainter))
    }

    pub fn paint(&self, tone: Tone, text: &str) -> String {
        self.painter.paint(tone, text)
    }

    pub fn message(&self, tone: Tone, symbol: &str, msg: &str) -> String {
        self.paint(tone, &format!("{} {}", symbol, msg))
    }

    pub fn line(&self, tone: Tone, msg: &str) {
        println!("{}", self.paint(tone, msg));
    }

    pub fn blank(&self) {
        println!();
    }

    pub fn header(&self, title: &str) {
        let rule = "=".repeat(HEADER_WIDTH);
        println!();
        self.line(Tone::Header, &rule);
        self.line(Tone::Header, &format!("   {}", title));
        self.line(Tone::Header, &rule);
    }

    pub fn stage(&self, step: usize, total: usize, title: &str) {
        self.line(Tone::Stage, &format!("[Step {}/{}] {}", step, total, title));
        println!("{}", "-".repeat(STAGE_WIDTH));
    }

    pub fn success(&self, msg: &str) {
        println!("{}", self.message(Tone::Success, "✓", msg));
    }

    pub fn error(&self, msg: &str) {
        println!("{}", self.message(Tone::Failure, "✗", msg));
    }

    pub fn info(&self, msg: &str) {
        println!("{}", self.message(Tone::Info, "ℹ", msg));
    }

    pub fn warning(&self, msg: &str) {
        println!("{}", self.message(Tone::Warning, "⚠", msg));
    }
}
