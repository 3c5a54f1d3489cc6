//! Stagehand Core - Hexagonal Architecture Implementation
//!
//! This crate provides the domain and application layers for the Stagehand
//! feature-orchestration engine, following hexagonal (ports and adapters)
//! architecture.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         stagehand-cli (CLI)             │
//! │     (Implements Driving Ports)          │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Application Services            │
//! │   (FormEngine, StageExecutor)           │
//! │         Orchestrates Use Cases          │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │      Application Ports (Traits)         │
//! │ (Filesystem, ProcessRunner, Prompter,   │
//! │  CodeMod)                               │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │    stagehand-adapters (Infrastructure)  │
//! │ (LocalFilesystem, LocalProcessRunner,   │
//! │  ScriptedPrompter, builtin codemods)    │
//! └─────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │        Domain Layer (Pure Logic)        │
//! │ (Feature, Predicate, AnswerMap, graph   │
//! │  resolver)  —  No I/O, No Side Effects  │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Pipeline
//!
//! 1. Build (or load) a [`domain::FeatureRegistry`].
//! 2. Collect answers with [`application::FormEngine`] — the only step
//!    that blocks on an outside actor.
//! 3. Hand registry + answers to [`application::StageExecutor`], which
//!    resolves feature order, evaluates activation predicates, and runs
//!    each active stage (dependency merge, scripts, templates, codemods).
//! 4. Inspect the [`domain::RunReport`].

// Domain layer (stable, well-defined API)
pub mod domain;

// Application layer (orchestration logic)
pub mod application;

// Unified error types
pub mod error;

// Public API - what external crates should use
pub mod prelude {
    pub use crate::application::{
        EngineOptions, FormEngine, StageExecutor,
        ports::{CodeMod, CodeModRegistry, Filesystem, ProcessRunner, Prompter},
    };
    pub use crate::domain::{
        AnswerMap, AnswerValue, ConfigOption, Feature, FeatureRegistry, FeatureStatus,
        OptionGroup, OptionKind, Predicate, RunMode, RunReport, Stage, Validator,
    };
    pub use crate::error::{EngineError, EngineResult};
}

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
