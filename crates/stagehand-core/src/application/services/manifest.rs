//! Additive dependency-manifest merging.
//!
//! Each workspace keeps a `manifest.json` at its root with up to three
//! dependency objects (`dependencies`, `devDependencies`,
//! `buildDependencies`). The merge only ever adds entries: an existing
//! entry's constraint is never altered, and re-running the same request is
//! byte-identical. Version resolution is the external package manager's
//! job.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::debug;

use crate::application::error::ApplicationError;
use crate::application::ports::{Filesystem, MutationOutcome};
use crate::domain::DependencyRequest;
use crate::error::EngineResult;

const MANIFEST_FILE: &str = "manifest.json";

/// Merge one dependency request into its workspace manifest.
///
/// A missing manifest is synthesized as `{}`; a manifest that exists but
/// does not parse as a JSON object is a Mutation error, never overwritten.
pub fn merge_dependencies(
    fs: &dyn Filesystem,
    project_root: &Path,
    request: &DependencyRequest,
) -> EngineResult<MutationOutcome> {
    let path = manifest_path(project_root, &request.workspace);
    let original = if fs.exists(&path) {
        fs.read_file(&path)?
    } else {
        String::new()
    };

    let mut root = parse_manifest(&original, &path)?;
    let key = request.kind.manifest_key();
    let section = root
        .entry(key.to_owned())
        .or_insert_with(|| Value::Object(Map::new()));
    let Value::Object(entries) = section else {
        return Err(ApplicationError::Mutation {
            path,
            reason: format!("'{key}' is not a JSON object"),
        }
        .into());
    };

    let constraint = request.constraint.as_deref().unwrap_or("*");
    for name in &request.names {
        if entries.contains_key(name) {
            // Already present: the recorded constraint wins, whatever it is.
            debug!(package = %name, workspace = %request.workspace, "already in manifest");
            continue;
        }
        entries.insert(name.clone(), Value::String(constraint.to_owned()));
    }

    let rendered = render(&root);
    if rendered == original {
        return Ok(MutationOutcome::Unchanged);
    }
    if let Some(parent) = path.parent() {
        fs.create_dir_all(parent)?;
    }
    fs.write_file(&path, &rendered)?;
    Ok(MutationOutcome::Changed)
}

fn manifest_path(project_root: &Path, workspace: &str) -> PathBuf {
    // "." and "" both mean the project root itself.
    match workspace {
        "" | "." => project_root.join(MANIFEST_FILE),
        other => project_root.join(other).join(MANIFEST_FILE),
    }
}

fn parse_manifest(content: &str, path: &Path) -> EngineResult<Map<String, Value>> {
    if content.trim().is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_str(content) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ApplicationError::Mutation {
            path: path.to_path_buf(),
            reason: "manifest root is not a JSON object".into(),
        }
        .into()),
        Err(e) => Err(ApplicationError::Mutation {
            path: path.to_path_buf(),
            reason: format!("invalid JSON: {e}"),
        }
        .into()),
    }
}

fn render(root: &Map<String, Value>) -> String {
    // serde_json's default map keeps keys sorted, so output is stable.
    let mut out = serde_json::to_string_pretty(&Value::Object(root.clone()))
        .unwrap_or_else(|_| "{}".into());
    out.push('\n');
    out
}
