//! Infrastructure adapters for Stagehand.
//!
//! This crate implements the ports defined in
//! `stagehand-core::application::ports`. It contains all external
//! dependencies and I/O: the real filesystem, process spawning, the
//! built-in codemods, and the TOML feature-pack loader. The in-memory
//! and scripted variants exist so the whole engine can run
//! deterministically in tests.

pub mod codemods;
pub mod filesystem;
pub mod pack;
pub mod process;
pub mod prompter;

// Re-export commonly used adapters
pub use codemods::builtin_codemods;
pub use filesystem::{LocalFilesystem, MemoryFilesystem};
pub use pack::load_pack;
pub use process::{FakeProcessRunner, LocalProcessRunner};
pub use prompter::ScriptedPrompter;
