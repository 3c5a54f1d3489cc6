//! Driven (output) ports - implemented by infrastructure.
//!
//! These traits define what the application needs from external systems.
//! The `stagehand-adapters` crate provides implementations; the CLI crate
//! provides the interactive [`Prompter`].
//!
//! All ports are injectable so the whole pipeline — including script
//! execution and file mutation — runs deterministically against in-memory
//! doubles in tests.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::domain::{AnswerMap, AnswerValue, ConfigOption};
use crate::error::EngineResult;

// ── Filesystem ───────────────────────────────────────────────────────────────

/// Port for filesystem operations.
///
/// Implemented by:
/// - `stagehand_adapters::filesystem::LocalFilesystem` (production)
/// - `stagehand_adapters::filesystem::MemoryFilesystem` (testing)
pub trait Filesystem: Send + Sync {
    /// Read a file's full content as UTF-8.
    fn read_file(&self, path: &Path) -> EngineResult<String>;

    /// Write content to a file, replacing any existing content.
    fn write_file(&self, path: &Path, content: &str) -> EngineResult<()>;

    /// Check if path exists (file or directory).
    fn exists(&self, path: &Path) -> bool;

    /// Create a directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> EngineResult<()>;

    /// Every file under `root`, as paths relative to `root`, sorted.
    /// Errors if `root` does not exist or is not a directory.
    fn walk_files(&self, root: &Path) -> EngineResult<Vec<PathBuf>>;
}

// ── Process runner ───────────────────────────────────────────────────────────

/// Captured result of a finished external process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptOutput {
    /// Process exit status (0 = success).
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ScriptOutput {
    pub const fn success(&self) -> bool {
        self.status == 0
    }
}

/// Port for running external commands.
///
/// Implemented by:
/// - `stagehand_adapters::process::LocalProcessRunner` (production)
/// - `stagehand_adapters::process::FakeProcessRunner` (testing)
///
/// `run` blocks until the process exits or `timeout` elapses. A completed
/// process — whatever its exit status — is `Ok(ScriptOutput)`; spawn
/// failures and timeouts are `Err` (ScriptSpawn / ScriptTimeout).
pub trait ProcessRunner: Send + Sync {
    fn run(&self, command: &str, cwd: &Path, timeout: Duration) -> EngineResult<ScriptOutput>;
}

// ── Prompter ─────────────────────────────────────────────────────────────────

/// What the user did with one prompt.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptReply {
    Answer(AnswerValue),
    /// Re-enter the previous option group.
    Back,
    /// Abandon collection entirely; no answer map is produced.
    Cancel,
}

/// Port for interactive answer collection.
///
/// Implemented by:
/// - `stagehand_cli::prompt::InteractivePrompter` (dialoguer, production)
/// - `stagehand_adapters::prompter::ScriptedPrompter` (testing)
///
/// The form engine is the only caller; collection is the one place the
/// pipeline blocks on an outside actor.
pub trait Prompter: Send + Sync {
    /// Ask one option. `group` is the owning group's display name.
    fn prompt(&self, group: &str, option: &ConfigOption) -> EngineResult<PromptReply>;

    /// Surface a validator rejection before the option is re-asked.
    fn notify_invalid(&self, option: &ConfigOption, message: &str);
}

// ── CodeMods ─────────────────────────────────────────────────────────────────

/// Result of one codemod application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The file was rewritten.
    Changed,
    /// The edit was already present; nothing was written.
    Unchanged,
}

/// Answer-derived context handed to each codemod.
#[derive(Debug, Clone, Copy)]
pub struct ModContext<'a> {
    pub answers: &'a AnswerMap,
}

/// A single idempotent read-edit-write operation against one file.
///
/// Contract:
/// - a missing file is tolerated by synthesizing a minimal valid default
///   document, never by erroring;
/// - all unrelated existing structure/content is preserved;
/// - exactly one well-defined edit is applied;
/// - applying the mod to its own output changes nothing
///   ([`MutationOutcome::Unchanged`], byte-identical file).
///
/// A parse failure of existing content is a Mutation error — reported,
/// fatal to the stage, never absorbed.
pub trait CodeMod: Send + Sync {
    /// Registry name stages use to reference this mod.
    fn name(&self) -> &str;

    fn apply(
        &self,
        path: &Path,
        ctx: &ModContext<'_>,
        fs: &dyn Filesystem,
    ) -> EngineResult<MutationOutcome>;
}

/// Name → codemod lookup used by the stage executor.
///
/// Built once by the caller; stages reference mods by name and preflight
/// validation rejects names the registry does not know.
#[derive(Default, Clone)]
pub struct CodeModRegistry {
    mods: BTreeMap<String, Arc<dyn CodeMod>>,
}

impl CodeModRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a codemod under its own name. Later registrations replace
    /// earlier ones with the same name.
    pub fn register(&mut self, codemod: Arc<dyn CodeMod>) {
        self.mods.insert(codemod.name().to_owned(), codemod);
    }

    pub fn with(mut self, codemod: Arc<dyn CodeMod>) -> Self {
        self.register(codemod);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn CodeMod>> {
        self.mods.get(name)
    }

    /// All registered names, for preflight reference checking.
    pub fn known_names(&self) -> HashSet<String> {
        self.mods.keys().cloned().collect()
    }
}

impl std::fmt::Debug for CodeModRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.mods.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopMod;
    impl CodeMod for NoopMod {
        fn name(&self) -> &str {
            "noop"
        }
        fn apply(
            &self,
            _path: &Path,
            _ctx: &ModContext<'_>,
            _fs: &dyn Filesystem,
        ) -> EngineResult<MutationOutcome> {
            Ok(MutationOutcome::Unchanged)
        }
    }

    #[test]
    fn registry_resolves_by_name() {
        let registry = CodeModRegistry::new().with(Arc::new(NoopMod));
        assert!(registry.get("noop").is_some());
        assert!(registry.get("other").is_none());
        assert!(registry.known_names().contains("noop"));
    }

    #[test]
    fn script_output_success() {
        let ok = ScriptOutput {
            status: 0,
            stdout: String::new(),
            stderr: String::new(),
        };
        assert!(ok.success());
        assert!(!ScriptOutput { status: 2, ..ok }.success());
    }
}
