//! Input capability used by the setup and unlock flows
//!
//! The core never reads from a terminal or spawns a dialog itself; callers
//! hand it a [`SecretPrompt`]. Tests use scripted implementations.

use crate::error::Result;

/// What is being asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// Hidden password entry (may be a GUI dialog)
    Password,
    /// The raw token to protect (terminal entry is fine)
    Secret,
}

/// Result of a single prompt
#[derive(PartialEq, Eq)]
pub enum PromptOutcome {
    Value(String),
    /// The user dismissed the prompt
    Cancelled,
}

impl std::fmt::Debug for PromptOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value(_) => f.write_str("Value([REDACTED])"),
            Self::Cancelled => f.write_str("Cancelled"),
        }
    }
}

/// Source of passwords, secrets and yes/no answers
pub trait SecretPrompt {
    /// Ask for a password or secret. `title` is shown to the user.
    fn prompt(&mut self, kind: PromptKind, title: &str) -> Result<PromptOutcome>;

    /// Ask a yes/no question; anything but an explicit yes is `false`
    fn confirm(&mut self, question: &str) -> Result<bool>;
}
