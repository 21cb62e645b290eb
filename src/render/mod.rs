/// Rendering of [`AppState`] onto an output surface.
///
/// The workflow only ever calls [`Renderer::render`]; nothing else touches
/// the terminal. Tests substitute a renderer that records what it was shown.
use std::io::Write;
use std::time::Instant;

use colored::Colorize;

use crate::validator::DisplayJson;
use crate::workflow::state::{AppState, OUTPUT_PLACEHOLDER, UploadIndicator, ValidityIndicator};

/// Draws the current state.
pub trait Renderer {
    fn render(&mut self, state: &AppState);
}

/// Renderer that draws nothing.
#[derive(Debug, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&mut self, _state: &AppState) {}
}

// ---------------------------------------------------------------------------
// Terminal renderer
// ---------------------------------------------------------------------------

/// What was last drawn, so unchanged panels are not repeated.
#[derive(Debug, Default, PartialEq)]
struct Frame {
    loading: bool,
    banner: Option<String>,
    validity: String,
    upload: String,
    output: Option<DisplayJson>,
    explanation: Option<String>,
    copy_label: &'static str,
}

impl Frame {
    fn capture(state: &AppState) -> Self {
        Self {
            loading: state.is_loading(),
            banner: state.banner().map(str::to_string),
            validity: state.validity().message(),
            upload: state.upload().message(),
            output: state.output(),
            explanation: state.explanation().map(str::to_string),
            copy_label: state.copy_label(Instant::now()),
        }
    }
}

/// Line-oriented terminal renderer.
///
/// Prints only the panels that changed since the previous frame.
pub struct TerminalRenderer<W: Write> {
    out: W,
    last: Option<Frame>,
}

impl TerminalRenderer<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out, last: None }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn draw(&mut self, frame: &Frame) -> std::io::Result<()> {
        let first = self.last.is_none();
        let prev = self.last.take().unwrap_or_default();
        let out = &mut self.out;

        if frame.loading != prev.loading {
            if frame.loading {
                writeln!(out, "{}", "⏳ Working...".yellow())?;
            } else if !first {
                writeln!(out, "{}", "done.".dimmed())?;
            }
        }

        if frame.banner != prev.banner
            && let Some(message) = &frame.banner
        {
            writeln!(out, "{}", format!("⚠️ {message}").red().bold())?;
        }

        if frame.upload != prev.upload && !frame.upload.is_empty() {
            let line = if frame.upload.starts_with('✓') {
                frame.upload.green()
            } else {
                frame.upload.red()
            };
            writeln!(out, "  {} {}", "Upload:".bold(), line)?;
        }

        if frame.validity != prev.validity && !frame.validity.is_empty() {
            let line = if frame.validity.starts_with('✓') {
                frame.validity.green()
            } else {
                frame.validity.red()
            };
            writeln!(out, "  {} {}", "Seed:".bold(), line)?;
        }

        if frame.output != prev.output || first {
            writeln!(out, "{}", "--- Configuration ---".dimmed())?;
            match &frame.output {
                None => writeln!(out, "{}", OUTPUT_PLACEHOLDER.dimmed())?,
                Some(DisplayJson::Formatted(text)) => writeln!(out, "{text}")?,
                Some(DisplayJson::Raw(text)) => writeln!(out, "{}", text.red())?,
            }
        }

        if frame.explanation != prev.explanation
            && let Some(text) = &frame.explanation
        {
            writeln!(out, "{}", "--- Explanation ---".dimmed())?;
            writeln!(out, "{text}")?;
        }

        if frame.copy_label != prev.copy_label && !first {
            writeln!(out, "  [{}]", frame.copy_label.cyan())?;
        }

        out.flush()
    }
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    fn render(&mut self, state: &AppState) {
        let frame = Frame::capture(state);
        if self.last.as_ref() == Some(&frame) {
            return;
        }
        // A broken terminal must not take the workflow down with it.
        let _ = self.draw(&frame);
        self.last = Some(frame);
    }
}

/// One-line summary of the indicators, used by `show` in the shell.
pub fn status_line(state: &AppState, now: Instant) -> String {
    let actions = state.actions();
    let flag = |on: bool, name: &str| {
        if on {
            name.to_string()
        } else {
            format!("{name}(off)")
        }
    };
    let seed = match state.validity() {
        ValidityIndicator::Neutral => "empty".to_string(),
        other => other.message(),
    };
    let upload = match state.upload() {
        UploadIndicator::None => "none".to_string(),
        other => other.message(),
    };
    format!(
        "phase={:?} seed={} upload={} actions=[{} {} {}] copy=\"{}\"",
        state.phase(),
        seed,
        upload,
        flag(actions.generate, "generate"),
        flag(actions.explain, "explain"),
        flag(actions.copy, "copy"),
        state.copy_label(now),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
