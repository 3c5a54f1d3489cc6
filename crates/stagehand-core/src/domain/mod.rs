//! Core domain layer for Stagehand.
//!
//! This module contains pure business logic with no I/O: the feature and
//! option model, the predicate AST and its evaluator, the graph resolver,
//! and the run-report types. Filesystem, process, and prompting concerns
//! are handled via ports (traits) defined in the application layer.
//!
//! ## Hexagonal Architecture Compliance
//!
//! - **No async**: domain logic is synchronous
//! - **No I/O**: no filesystem, network, or external calls
//! - **Immutable declarations**: registry and answer map never mutate
//!   after construction
//! - **Explicit data flow**: the answer map is threaded by reference, no
//!   ambient globals

pub mod answers;
pub mod error;
pub mod feature;
pub mod graph;
pub mod options;
pub mod predicate;
pub mod report;

// Re-exports for convenience
pub use answers::{AnswerMap, AnswerValue, answers};
pub use error::{DomainError, ErrorCategory};
pub use feature::{
    DependencyKind, DependencyRequest, Feature, FeatureRegistry, ModTarget, ScriptSpec, Stage,
    TemplateCopy,
};
pub use graph::{resolve_order, validate_codemod_refs, validate_predicate_keys};
pub use options::{ConfigOption, OptionGroup, OptionKind, Validator};
pub use predicate::{CustomFn, Predicate};
pub use report::{FeatureOutcome, FeatureStatus, RunMode, RunReport};
