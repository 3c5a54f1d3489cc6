//! Comprehensive error handling for the Stagehand CLI.
//!
//! Provides structured errors with:
//! - User-friendly messages
//! - Actionable suggestions
//! - Proper error chaining
//! - Exit code mapping

use std::path::PathBuf;
use std::{error::Error as _, fmt::Write as _};

use owo_colors::OwoColorize;
use thiserror::Error;

use stagehand_core::error::EngineError;

// Re-export so callers only need `use crate::error::*`.
pub use stagehand_core::error::ErrorCategory as CoreCategory;

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// Comprehensive CLI error types.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input (validation failed).
    #[error("Invalid input: {message}")]
    InvalidInput {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The feature pack directory does not exist or has no features.
    #[error("Feature pack not found at {path}")]
    PackNotFound { path: PathBuf },

    /// The answers file could not be read or parsed.
    #[error("Invalid answers file {path}: {reason}")]
    AnswersFile { path: PathBuf, reason: String },

    // ── Config errors ──────────────────────────────────────────────────────
    /// A configuration file could not be read, parsed, or written.
    #[error("Configuration error: {message}")]
    ConfigError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // ── Core errors ────────────────────────────────────────────────────────
    /// An error propagated from the engine.
    ///
    /// Wrapped here so the CLI can attach suggestions drawn from the engine
    /// error's category without touching core internals.
    #[error("Run failed: {0}")]
    Engine(#[from] EngineError),

    /// One or more features failed during a run that produced a report.
    #[error("{failed} of {total} features failed")]
    RunFailed { failed: usize, total: usize },

    // ── System errors ──────────────────────────────────────────────────────
    /// An I/O operation failed.
    #[error("I/O error: {message}")]
    IoError {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Operation cancelled by user.
    #[error("Operation cancelled")]
    Cancelled,

    /// Feature not available (e.g., interactive mode without feature flag).
    #[error("Feature not available: {feature}")]
    FeatureNotAvailable { feature: &'static str },
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::IoError {
            message: err.to_string(),
            source: err,
        }
    }
}

impl CliError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidInput { message, .. } => vec![
                format!("Check your input: {}", message),
                "Use --help for usage information".into(),
            ],

            Self::PackNotFound { path } => vec![
                format!("No pack at '{}'", path.display()),
                "A pack directory must contain a 'features/' subdirectory".into(),
                "Pass the pack location with --pack <DIR>".into(),
            ],

            Self::AnswersFile { reason, .. } => vec![
                format!("Parse problem: {}", reason),
                "The answers file is a JSON object mapping option ids to values".into(),
                r#"Example: {"projectName": "demo", "features": ["docker"]}"#.into(),
            ],

            Self::ConfigError { message, .. } => vec![
                format!("Configuration issue: {}", message),
                "Check your config file, or pass one with --config <FILE>".into(),
            ],

            Self::Engine(engine_err) => engine_err.suggestions(),

            Self::RunFailed { .. } => vec![
                "See the report above for each failed feature and its stage".into(),
                "Completed features' changes remain on disk; fix the cause and re-run".into(),
                "Stages are idempotent, so re-running is safe".into(),
            ],

            Self::IoError { message, .. } => vec![
                format!("I/O operation failed: {}", message),
                "Check file permissions".into(),
                "Ensure the parent directory exists".into(),
            ],

            Self::Cancelled => vec![
                "Collection was cancelled".into(),
                "No changes were made".into(),
            ],

            Self::FeatureNotAvailable { feature } => vec![
                format!("The '{}' feature is not available in this build", feature),
                format!("Reinstall with: cargo install stagehand-cli --features {feature}"),
            ],
        }
    }

    /// Get the error category for styling and exit codes.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidInput { .. } => ErrorCategory::UserError,
            Self::PackNotFound { .. } => ErrorCategory::NotFound,
            Self::AnswersFile { .. } => ErrorCategory::UserError,
            Self::ConfigError { .. } => ErrorCategory::Configuration,
            Self::Engine(engine) => match engine.category() {
                CoreCategory::Graph | CoreCategory::Validation => ErrorCategory::UserError,
                CoreCategory::Configuration => ErrorCategory::Configuration,
                CoreCategory::Cancelled => ErrorCategory::UserError,
                CoreCategory::Script
                | CoreCategory::Mutation
                | CoreCategory::Template
                | CoreCategory::Internal => ErrorCategory::Internal,
            },
            Self::RunFailed { .. } => ErrorCategory::Internal,
            Self::IoError { .. } => ErrorCategory::Internal,
            Self::Cancelled => ErrorCategory::UserError,
            Self::FeatureNotAvailable { .. } => ErrorCategory::Configuration,
        }
    }

    /// Exit code to pass to the OS.
    ///
    /// | Category      | Code |
    /// |---------------|------|
    /// | User error    |  2   |
    /// | Not found     |  3   |
    /// | Configuration |  4   |
    /// | Internal      |  1   |
    pub fn exit_code(&self) -> u8 {
        match self.category() {
            ErrorCategory::UserError => 2,
            ErrorCategory::NotFound => 3,
            ErrorCategory::Configuration => 4,
            ErrorCategory::Internal => 1,
        }
    }

    /// Format the error for display with colors and suggestions.
    pub fn format_colored(&self, verbose: bool) -> String {
        let mut output = String::new();

        let _ = write!(
            output,
            "\n{} {}\n\n",
            "✗".red().bold(),
            "Error:".red().bold()
        );
        let _ = writeln!(output, "  {}", self.to_string().red());

        // Error chain (if verbose)
        if verbose {
            let mut source = self.source();
            while let Some(err) = source {
                let _ = write!(output, "\n  {} {}\n", "→".dimmed(), err.to_string().dimmed());
                source = err.source();
            }
        }

        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            let _ = write!(output, "\n{}\n", "Suggestions:".yellow().bold());
            for suggestion in suggestions {
                let _ = writeln!(output, "  {suggestion}");
            }
        }

        if !verbose {
            output.push('\n');
            let _ = writeln!(
                output,
                "{} {}",
                "\u{2139}".blue(), // ℹ
                "Use -v / --verbose for more details.".dimmed(),
            );
        }

        output
    }

    /// Plain-text version of [`Self::format_colored`] — no ANSI codes.
    pub fn format_plain(&self, verbose: bool) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "\nError: {self}");

        if verbose {
            let mut src = std::error::Error::source(self);
            while let Some(err) = src {
                let _ = writeln!(out, "  Caused by: {err}");
                src = err.source();
            }
        }

        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            out.push_str("\nSuggestions:\n");
            for s in &suggestions {
                let _ = writeln!(out, "  {s}");
            }
        }

        if !verbose {
            out.push_str("\nUse -v / --verbose for more details.\n");
        }

        out
    }

    /// Log the error using tracing.
    pub fn log(&self) {
        match self.category() {
            ErrorCategory::UserError => tracing::warn!("User error: {}", self),
            ErrorCategory::NotFound => tracing::warn!("Not found: {}", self),
            ErrorCategory::Configuration => tracing::error!("Configuration error: {}", self),
            ErrorCategory::Internal => tracing::error!("Internal error: {}", self),
        }

        if let Some(source) = self.source() {
            tracing::debug!("Caused by: {}", source);
        }
    }
}

/// Error categories for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// User input error (validation, invalid arguments).
    UserError,
    /// Resource not found.
    NotFound,
    /// Configuration error.
    Configuration,
    /// Internal/system error.
    Internal,
}

// ── IntoCli trait ─────────────────────────────────────────────────────────────

/// Extension trait to convert foreign error types into [`CliError`] at
/// call-sites with a descriptive context message.
///
/// Two concrete impls are provided:
/// - `Result<T, std::io::Error>` → `CliError::IoError`
/// - `Result<T, EngineError>`    → `CliError::Engine`
///
/// There is deliberately **no blanket impl** — it would conflict with both
/// concrete impls (rustc rejects overlapping trait implementations).
pub trait IntoCli<T> {
    /// Convert to `CliResult` attaching a human-readable context message.
    fn with_cli_context<F, S>(self, f: F) -> CliResult<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> IntoCli<T> for Result<T, std::io::Error> {
    fn with_cli_context<F, S>(self, f: F) -> CliResult<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| CliError::IoError {
            message: f().into(),
            source: e,
        })
    }
}

impl<T> IntoCli<T> for Result<T, EngineError> {
    /// The context message is ignored for engine errors because they
    /// already carry sufficient context.  The method exists only to satisfy
    /// the trait contract at mixed call-sites.
    fn with_cli_context<F, S>(self, _f: F) -> CliResult<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(CliError::Engine)
    }
}
