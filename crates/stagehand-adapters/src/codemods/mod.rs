//! Built-in codemods.
//!
//! Every codemod here honors the port contract: a missing target file is
//! synthesized as a minimal valid document, exactly one edit is applied,
//! unrelated content is preserved, and re-applying to the output changes
//! nothing. Unparseable existing content is a Mutation error, never
//! clobbered.

pub mod json;
pub mod text;

use std::sync::Arc;

use stagehand_core::application::ports::CodeModRegistry;

pub use json::{EnsureJsonArrayContains, InsertJsonKey};
pub use text::{AddImport, AppendLine};

/// Registry preloaded with the general-purpose built-ins that need no
/// per-pack configuration. Packs with bespoke edits register their own
/// instances on top.
pub fn builtin_codemods() -> CodeModRegistry {
    CodeModRegistry::new()
        .with(Arc::new(AppendLine::gitignore_node()))
        .with(Arc::new(EnsureJsonArrayContains::workspace_member()))
}
