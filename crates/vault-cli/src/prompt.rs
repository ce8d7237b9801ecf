//! Interactive prompt backends
//!
//! Passwords come from a `zenity --password` dialog or the terminal; the
//! token itself is always read from the terminal without echo.

use std::io::{self, BufRead, ErrorKind, Write};
use std::process::{Command, Stdio};

use tracing::debug;
use vault_core::{PromptBackend, PromptKind, PromptOutcome, SecretPrompt, VaultError};

/// Prompt implementation used by the binary
pub struct CliPrompt {
    backend: PromptBackend,
}

impl CliPrompt {
    /// `Auto` picks the dialog when a graphical session is present
    pub fn new(backend: PromptBackend) -> Self {
        let backend = match backend {
            PromptBackend::Auto if has_display() => PromptBackend::Zenity,
            PromptBackend::Auto => PromptBackend::Terminal,
            other => other,
        };
        debug!("Using {:?} password prompt", backend);
        Self { backend }
    }
}

impl SecretPrompt for CliPrompt {
    fn prompt(&mut self, kind: PromptKind, title: &str) -> vault_core::Result<PromptOutcome> {
        match (kind, self.backend) {
            (PromptKind::Password, PromptBackend::Zenity) => zenity_password(title),
            _ => terminal_secret(title),
        }
    }

    fn confirm(&mut self, question: &str) -> vault_core::Result<bool> {
        let mut stderr = io::stderr();
        write!(stderr, "{} [y/N] ", question)?;
        stderr.flush()?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(parse_confirmation(&line))
    }
}

fn has_display() -> bool {
    ["DISPLAY", "WAYLAND_DISPLAY"]
        .iter()
        .any(|var| std::env::var_os(var).is_some_and(|v| !v.is_empty()))
}

fn zenity_password(title: &str) -> vault_core::Result<PromptOutcome> {
    let output = Command::new("zenity")
        .args(["--password", "--title", title])
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => VaultError::Prompt(
                "zenity is not installed; use --prompt terminal".to_string(),
            ),
            _ => VaultError::Prompt(format!("failed to run zenity: {}", e)),
        })?;

    if !output.status.success() {
        return Ok(PromptOutcome::Cancelled);
    }

    let value = String::from_utf8(output.stdout)
        .map_err(|_| VaultError::Prompt("zenity returned non UTF-8 input".to_string()))?;
    Ok(PromptOutcome::Value(value.trim().to_string()))
}

fn terminal_secret(title: &str) -> vault_core::Result<PromptOutcome> {
    match rpassword::prompt_password(terminal_label(title)) {
        Ok(value) => Ok(PromptOutcome::Value(value)),
        Err(e) if matches!(e.kind(), ErrorKind::UnexpectedEof | ErrorKind::Interrupted) => {
            Ok(PromptOutcome::Cancelled)
        }
        Err(e) => Err(VaultError::Prompt(format!("failed to read from terminal: {}", e))),
    }
}

/// Dialog titles double as terminal labels; make sure they end in ": "
fn terminal_label(title: &str) -> String {
    let title = title.trim_end();
    if title.ends_with(':') {
        format!("{} ", title)
    } else {
        format!("{}: ", title)
    }
}

/// Only an explicit "y" or "yes" counts as consent
fn parse_confirmation(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
