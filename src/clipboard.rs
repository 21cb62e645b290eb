//! System clipboard access.
//!
//! There is no clipboard API in the standard library, so text is piped to the
//! platform's clipboard tool: `clip` on Windows, `pbcopy` on macOS, and the
//! first of `wl-copy`, `xclip`, `xsel` that runs on Linux.

use std::io::Write;
use std::process::{Command, Stdio};

use anyhow::{Context, Result, anyhow};

/// Somewhere text can be copied to.
pub trait Clipboard {
    fn write_text(&mut self, text: &str) -> Result<()>;
}

/// The desktop clipboard via platform commands.
#[derive(Debug, Default)]
pub struct SystemClipboard;

#[cfg(target_os = "windows")]
const CLIPBOARD_COMMANDS: &[(&str, &[&str])] = &[("clip", &[])];

#[cfg(target_os = "macos")]
const CLIPBOARD_COMMANDS: &[(&str, &[&str])] = &[("pbcopy", &[])];

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const CLIPBOARD_COMMANDS: &[(&str, &[&str])] = &[
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
];

impl Clipboard for SystemClipboard {
    fn write_text(&mut self, text: &str) -> Result<()> {
        let mut last_error = None;
        for (program, args) in CLIPBOARD_COMMANDS {
            match pipe_to(program, args, text) {
                Ok(()) => return Ok(()),
                Err(e) => last_error = Some(e),
            }
        }
        Err(last_error.unwrap_or_else(|| anyhow!("no clipboard command available")))
    }
}

fn pipe_to(program: &str, args: &[&str], text: &str) -> Result<()> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("failed to start {program}"))?;

    child
        .stdin
        .take()
        .context("clipboard stdin unavailable")?
        .write_all(text.as_bytes())
        .with_context(|| format!("failed writing to {program}"))?;

    let status = child
        .wait()
        .with_context(|| format!("failed waiting for {program}"))?;
    if !status.success() {
        anyhow::bail!("{program} exited with {status}");
    }
    Ok(())
}
