//! JSON document codemods.
//!
//! Both mods parse the whole document, apply one structural edit, and
//! re-serialize with sorted keys and a trailing newline — the same
//! rendering the manifest merger uses, so repeated runs are stable.

use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

use stagehand_core::application::ApplicationError;
use stagehand_core::application::ports::{CodeMod, Filesystem, ModContext, MutationOutcome};
use stagehand_core::application::services::substitute;
use stagehand_core::error::EngineResult;

/// Set `key` to `value` inside the object at `pointer`, unless the key
/// already exists. Intermediate objects are created; an existing value is
/// never replaced.
#[derive(Debug, Clone)]
pub struct InsertJsonKey {
    name: String,
    pointer: Vec<String>,
    key: String,
    value: Value,
}

impl InsertJsonKey {
    pub fn new(
        name: impl Into<String>,
        pointer: impl IntoIterator<Item = impl Into<String>>,
        key: impl Into<String>,
        value: Value,
    ) -> Self {
        Self {
            name: name.into(),
            pointer: pointer.into_iter().map(Into::into).collect(),
            key: key.into(),
            value,
        }
    }
}

impl CodeMod for InsertJsonKey {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(
        &self,
        path: &Path,
        ctx: &ModContext<'_>,
        fs: &dyn Filesystem,
    ) -> EngineResult<MutationOutcome> {
        let original = read_or_default(fs, path)?;
        let mut root = parse_object(&original, path)?;

        let target = descend(&mut root, &self.pointer, path)?;
        if target.contains_key(&self.key) {
            return Ok(MutationOutcome::Unchanged);
        }
        target.insert(self.key.clone(), resolve(&self.value, ctx, path)?);

        write_back(fs, path, &original, root)
    }
}

/// Append `element` to the array at `pointer` unless it is already a
/// member. A missing array is created; a non-array at the pointer is a
/// Mutation error.
#[derive(Debug, Clone)]
pub struct EnsureJsonArrayContains {
    name: String,
    pointer: Vec<String>,
    element: Value,
}

impl EnsureJsonArrayContains {
    pub fn new(
        name: impl Into<String>,
        pointer: impl IntoIterator<Item = impl Into<String>>,
        element: Value,
    ) -> Self {
        Self {
            name: name.into(),
            pointer: pointer.into_iter().map(Into::into).collect(),
            element,
        }
    }

    /// Record a sub-workspace in the root manifest's `workspaces` array.
    /// The member name comes from the `workspace` answer.
    pub fn workspace_member() -> Self {
        Self::new(
            "manifest-workspace-member",
            Vec::<String>::new(),
            Value::String("{{workspace}}".into()),
        )
        .at(["workspaces"])
    }

    fn at(mut self, pointer: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.pointer = pointer.into_iter().map(Into::into).collect();
        self
    }
}

impl CodeMod for EnsureJsonArrayContains {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(
        &self,
        path: &Path,
        ctx: &ModContext<'_>,
        fs: &dyn Filesystem,
    ) -> EngineResult<MutationOutcome> {
        let original = read_or_default(fs, path)?;
        let mut root = parse_object(&original, path)?;

        let (init, last) = match self.pointer.split_last() {
            Some((last, init)) => (init.to_vec(), last.clone()),
            None => {
                return Err(ApplicationError::Mutation {
                    path: path.to_path_buf(),
                    reason: "array codemod requires a non-empty pointer".into(),
                }
                .into());
            }
        };
        let parent = descend(&mut root, &init, path)?;
        let slot = parent.entry(last.clone()).or_insert_with(|| Value::Array(Vec::new()));
        let Value::Array(items) = slot else {
            return Err(ApplicationError::Mutation {
                path: path.to_path_buf(),
                reason: format!("'{last}' is not a JSON array"),
            }
            .into());
        };

        let element = resolve(&self.element, ctx, path)?;
        if items.contains(&element) {
            return Ok(MutationOutcome::Unchanged);
        }
        items.push(element);

        write_back(fs, path, &original, root)
    }
}

// ── Shared helpers ───────────────────────────────────────────────────────────

fn read_or_default(fs: &dyn Filesystem, path: &Path) -> EngineResult<String> {
    if fs.exists(path) {
        fs.read_file(path)
    } else {
        Ok(String::new())
    }
}

fn parse_object(content: &str, path: &Path) -> EngineResult<Map<String, Value>> {
    if content.trim().is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_str(content) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ApplicationError::Mutation {
            path: path.to_path_buf(),
            reason: "document root is not a JSON object".into(),
        }
        .into()),
        Err(e) => Err(ApplicationError::Mutation {
            path: path.to_path_buf(),
            reason: format!("invalid JSON: {e}"),
        }
        .into()),
    }
}

/// Walk (creating) nested objects along `pointer`.
fn descend<'a>(
    root: &'a mut Map<String, Value>,
    pointer: &[String],
    path: &Path,
) -> EngineResult<&'a mut Map<String, Value>> {
    let mut current = root;
    for segment in pointer {
        let slot = current
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        match slot {
            Value::Object(map) => current = map,
            _ => {
                return Err(ApplicationError::Mutation {
                    path: path.to_path_buf(),
                    reason: format!("'{segment}' is not a JSON object"),
                }
                .into());
            }
        }
    }
    Ok(current)
}

/// Substitute `{{key}}` tokens in string leaves.
fn resolve(value: &Value, ctx: &ModContext<'_>, path: &Path) -> EngineResult<Value> {
    match value {
        Value::String(s) => Ok(Value::String(substitute(s, ctx.answers, &[], path)?)),
        other => Ok(other.clone()),
    }
}

fn write_back(
    fs: &dyn Filesystem,
    path: &Path,
    original: &str,
    root: Map<String, Value>,
) -> EngineResult<MutationOutcome> {
    let mut rendered = serde_json::to_string_pretty(&Value::Object(root))
        .map_err(|e| ApplicationError::Mutation {
            path: path.to_path_buf(),
            reason: format!("serialization failed: {e}"),
        })?;
    rendered.push('\n');
    if rendered == original {
        return Ok(MutationOutcome::Unchanged);
    }
    debug!(path = %path.display(), "rewriting JSON document");
    fs.write_file(path, &rendered)?;
    Ok(MutationOutcome::Changed)
}
