//! Application layer errors.
//!
//! These errors represent failures during execution — scripts, mutations,
//! templates, filesystem access, prompting. Declaration and resolution
//! failures are `DomainError` from `crate::domain` and always fire before
//! any of these can.

use std::path::PathBuf;
use thiserror::Error;

use crate::error::ErrorCategory;

/// Errors that occur while executing stages or collecting answers.
///
/// Every variant is `Clone` (sources are flattened into strings) so the
/// run report can carry the error alongside the feature outcome.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApplicationError {
    // ── Script errors ──────────────────────────────────────────────────────
    /// A script exited non-zero.
    #[error("script '{command}' exited with status {status}")]
    ScriptFailed {
        command: String,
        status: i32,
        stderr: String,
    },

    /// A script ran past its timeout and was killed.
    #[error("script '{command}' timed out after {timeout_secs}s")]
    ScriptTimeout { command: String, timeout_secs: u64 },

    /// A script could not be started at all.
    #[error("failed to spawn '{command}': {reason}")]
    ScriptSpawn { command: String, reason: String },

    // ── Mutation errors ────────────────────────────────────────────────────
    /// A codemod (or manifest merge) failed to parse or apply.
    /// Fatal to the stage — never silently absorbed.
    #[error("mutation failed at {path}: {reason}")]
    Mutation { path: PathBuf, reason: String },

    // ── Template errors ────────────────────────────────────────────────────
    /// A `{{token}}` had no binding in the answer map or stage context.
    #[error("unresolved template token '{{{{{token}}}}}' in {path}")]
    UnresolvedToken { token: String, path: PathBuf },

    /// Template source directory missing or unreadable.
    #[error("template source unreadable at {path}: {reason}")]
    TemplateSource { path: PathBuf, reason: String },

    // ── Infrastructure ─────────────────────────────────────────────────────
    /// Filesystem operation failed.
    #[error("filesystem error at {path}: {reason}")]
    Filesystem { path: PathBuf, reason: String },

    /// The prompter itself failed (terminal gone, pipe closed).
    #[error("prompt failed: {reason}")]
    PromptFailed { reason: String },

    /// The user cancelled answer collection; no answer map was produced.
    #[error("cancelled by user")]
    Cancelled,
}

impl ApplicationError {
    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::ScriptFailed {
                command, stderr, ..
            } => {
                let mut s = vec![
                    format!("Command: {command}"),
                    "Check that the tool it invokes is installed and in PATH".into(),
                ];
                if !stderr.trim().is_empty() {
                    s.push(format!("stderr: {}", stderr.trim()));
                }
                s
            }
            Self::ScriptTimeout { timeout_secs, .. } => vec![
                format!("The script exceeded the {timeout_secs}s limit"),
                "Raise the timeout with --timeout, or split the script".into(),
            ],
            Self::ScriptSpawn { reason, .. } => vec![
                format!("Spawn failure: {reason}"),
                "Check the shell is available and the working directory exists".into(),
            ],
            Self::Mutation { path, reason } => vec![
                format!("Could not edit {}: {}", path.display(), reason),
                "The file may be hand-edited into a shape the codemod cannot parse".into(),
            ],
            Self::UnresolvedToken { token, .. } => vec![
                format!("No answer or context value named '{token}'"),
                "Declare an option with that id, or add it to the stage context".into(),
            ],
            Self::TemplateSource { path, .. } => vec![
                format!("Missing or unreadable: {}", path.display()),
                "Check the feature pack's template directories".into(),
            ],
            Self::Filesystem { path, .. } => vec![
                format!("Failed to access: {}", path.display()),
                "Check that you have write permissions".into(),
            ],
            Self::PromptFailed { .. } => vec![
                "Interactive prompting failed".into(),
                "Run non-interactively with --answers <file>".into(),
            ],
            Self::Cancelled => vec![
                "Collection was cancelled".into(),
                "No features were executed".into(),
            ],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ScriptFailed { .. } | Self::ScriptTimeout { .. } | Self::ScriptSpawn { .. } => {
                ErrorCategory::Script
            }
            Self::Mutation { .. } => ErrorCategory::Mutation,
            Self::UnresolvedToken { .. } | Self::TemplateSource { .. } => ErrorCategory::Template,
            Self::Filesystem { .. } | Self::PromptFailed { .. } => ErrorCategory::Internal,
            Self::Cancelled => ErrorCategory::Cancelled,
        }
    }
}
