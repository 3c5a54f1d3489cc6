//! Domain errors: declaration and resolution failures.
//!
//! All errors are:
//! - Cloneable (for embedding in the run report)
//! - Categorizable (for CLI display and exit codes)
//! - Actionable (provide suggestions)
//!
//! Everything in this file fails *before* any file is touched — graph,
//! predicate, and configuration errors are fail-fast by construction.

use thiserror::Error;

/// Root domain error type.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ── Graph errors (structural, pre-execution) ─────────────────────────
    #[error("duplicate feature id '{id}'")]
    DuplicateFeature { id: String },

    #[error("feature '{feature}' depends on unknown feature '{dependency}'")]
    UnknownDependency { feature: String, dependency: String },

    #[error("dependency cycle: {}", path.join(" -> "))]
    DependencyCycle { path: Vec<String> },

    // ── Predicate contract violations ────────────────────────────────────
    #[error("{location} references answer key '{key}' which no option declares")]
    UndeclaredPredicateKey { key: String, location: String },

    /// A stage names a codemod the registry does not know. Rejected at
    /// preflight for the same reason undeclared predicate keys are: a
    /// by-name reference must resolve before anything runs.
    #[error("feature '{feature}' stage '{stage}' references unknown codemod '{name}'")]
    UnknownCodeMod {
        feature: String,
        stage: String,
        name: String,
    },

    // ── Configuration errors ─────────────────────────────────────────────
    #[error("required option '{option}' has no answer and no default")]
    MissingRequiredAnswer { option: String },

    /// Validator rejection. Recoverable only during collection (the form
    /// engine re-prompts); fatal anywhere else.
    #[error("invalid answer for '{option}': {message}")]
    InvalidAnswer { option: String, message: String },

    #[error("invalid declaration: {0}")]
    InvalidDeclaration(String),
}

impl DomainError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::DuplicateFeature { id } => vec![
                format!("Two features declare the id '{id}'"),
                "Feature identifiers must be unique across the registry".into(),
            ],
            Self::UnknownDependency {
                feature,
                dependency,
            } => vec![
                format!("'{feature}' lists '{dependency}' in depends_on"),
                "Check the spelling, or declare the missing feature".into(),
            ],
            Self::DependencyCycle { path } => vec![
                format!("Cycle: {}", path.join(" -> ")),
                "Remove one of the depends_on edges to break the cycle".into(),
            ],
            Self::UndeclaredPredicateKey { key, location } => vec![
                format!("{location} reads '{key}', but no option with that id exists"),
                "Declare the option, or fix the predicate key".into(),
            ],
            Self::UnknownCodeMod { name, .. } => vec![
                format!("No codemod named '{name}' is registered"),
                "Register the codemod before running, or fix the reference".into(),
            ],
            Self::MissingRequiredAnswer { option } => vec![
                format!("Option '{option}' is required but was never answered"),
                "Supply it in the answers file, or give it a default".into(),
            ],
            Self::InvalidAnswer { message, .. } => vec![
                format!("Validation failed: {message}"),
                "Correct the supplied answer and retry".into(),
            ],
            Self::InvalidDeclaration(msg) => vec![format!("Details: {msg}")],
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::DuplicateFeature { .. }
            | Self::UnknownDependency { .. }
            | Self::DependencyCycle { .. } => ErrorCategory::Graph,
            Self::UndeclaredPredicateKey { .. } | Self::UnknownCodeMod { .. } => {
                ErrorCategory::Contract
            }
            Self::MissingRequiredAnswer { .. } => ErrorCategory::Configuration,
            Self::InvalidAnswer { .. } => ErrorCategory::Validation,
            Self::InvalidDeclaration(_) => ErrorCategory::Configuration,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Cyclic or dangling feature dependencies.
    Graph,
    /// A by-name reference (predicate key, codemod) that does not resolve.
    Contract,
    /// Missing or malformed configuration input.
    Configuration,
    /// Validator rejection.
    Validation,
}
