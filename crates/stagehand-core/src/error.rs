//! Unified error handling for Stagehand Core.
//!
//! This module provides a unified error type that wraps domain and
//! application errors, with rich context and user-actionable suggestions.

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;

/// Root error type for Stagehand Core operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    /// Declaration/resolution failures (graph, predicates, configuration).
    #[error("{0}")]
    Domain(#[from] DomainError),

    /// Execution failures (scripts, mutations, templates, filesystem).
    #[error("{0}")]
    Application(#[from] ApplicationError),

    /// Unexpected internal errors (bugs).
    #[error("internal error: {message}. This is a bug, please report it.")]
    Internal { message: String },
}

impl EngineError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Domain(e) => e.suggestions(),
            Self::Application(e) => e.suggestions(),
            Self::Internal { .. } => vec![
                "This appears to be a bug in Stagehand".into(),
                "Please report it with the full -vv output".into(),
            ],
        }
    }

    /// Get error category for display/styling purposes.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Domain(e) => match e.category() {
                crate::domain::ErrorCategory::Graph => ErrorCategory::Graph,
                crate::domain::ErrorCategory::Contract => ErrorCategory::Graph,
                crate::domain::ErrorCategory::Configuration => ErrorCategory::Configuration,
                crate::domain::ErrorCategory::Validation => ErrorCategory::Validation,
            },
            Self::Application(e) => e.category(),
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// True when the error fires before any file is touched.
    pub fn is_preflight(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Graph | ErrorCategory::Configuration | ErrorCategory::Validation
        )
    }
}

/// Error categories for UI display and exit-code mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Structural registry problems and unresolved by-name references.
    Graph,
    /// Missing required answers, malformed declarations.
    Configuration,
    /// Validator rejections.
    Validation,
    /// External process failures.
    Script,
    /// Codemod / manifest-merge failures.
    Mutation,
    /// Template instantiation failures.
    Template,
    /// User cancelled; not a failure of the engine.
    Cancelled,
    Internal,
}

/// Convenient result type alias.
pub type EngineResult<T> = Result<T, EngineError>;

/// Extension trait for adding context to foreign errors.
pub trait Context<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> EngineResult<T>;
}

impl<T, E> Context<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context(self, msg: impl Into<String>) -> EngineResult<T> {
        self.map_err(|e| EngineError::Internal {
            message: format!("{}: {}", msg.into(), e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainError;

    #[test]
    fn graph_errors_are_preflight() {
        let err: EngineError = DomainError::DependencyCycle {
            path: vec!["a".into(), "b".into(), "a".into()],
        }
        .into();
        assert!(err.is_preflight());
        assert_eq!(err.category(), ErrorCategory::Graph);
    }

    #[test]
    fn script_errors_are_not_preflight() {
        let err: EngineError = ApplicationError::ScriptFailed {
            command: "npm install".into(),
            status: 1,
            stderr: String::new(),
        }
        .into();
        assert!(!err.is_preflight());
        assert_eq!(err.category(), ErrorCategory::Script);
    }

    #[test]
    fn suggestions_are_never_empty() {
        let err: EngineError = ApplicationError::Cancelled.into();
        assert!(!err.suggestions().is_empty());
    }
}
