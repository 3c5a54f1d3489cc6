//! Subcommand implementations.
//!
//! Each module exposes a single `execute` function that takes its parsed
//! arguments plus the shared [`crate::output::OutputManager`].  Shared
//! pack/answers loading helpers live here so every command reports the same
//! errors the same way.

use std::path::{Path, PathBuf};

use stagehand_core::domain::{AnswerMap, FeatureRegistry};

use crate::error::{CliError, CliResult};

pub mod completions;
pub mod list;
pub mod plan;
pub mod run;

/// Load and validate the feature pack at `path`.
///
/// A pack is a directory with a `features/` subdirectory of TOML feature
/// declarations.  Declaration errors come back as engine errors; a missing
/// directory is reported as [`CliError::PackNotFound`] so the exit code is
/// 3 rather than 2.
pub(crate) fn load_registry(path: &Path) -> CliResult<FeatureRegistry> {
    if !path.join("features").is_dir() {
        return Err(CliError::PackNotFound {
            path: path.to_path_buf(),
        });
    }
    Ok(stagehand_adapters::load_pack(path)?)
}

/// Parse an answers file: a JSON object mapping option ids to values.
pub(crate) fn load_answers(path: &PathBuf) -> CliResult<AnswerMap> {
    let content = std::fs::read_to_string(path).map_err(|e| CliError::AnswersFile {
        path: path.clone(),
        reason: e.to_string(),
    })?;
    serde_json::from_str::<AnswerMap>(&content).map_err(|e| CliError::AnswersFile {
        path: path.clone(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagehand_core::domain::AnswerValue;

    #[test]
    fn missing_pack_maps_to_not_found() {
        let err = load_registry(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, CliError::PackNotFound { .. }));
    }

    #[test]
    fn answers_file_parses_all_value_kinds() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("answers.json");
        std::fs::write(
            &path,
            r#"{"ci": true, "workers": 4, "name": "demo", "features": ["docker", "docs"]}"#,
        )
        .unwrap();
        let answers = load_answers(&path).unwrap();
        assert_eq!(answers.get("ci"), Some(&AnswerValue::Bool(true)));
        assert_eq!(answers.get("workers"), Some(&AnswerValue::Number(4)));
        assert_eq!(answers.get("name"), Some(&AnswerValue::from("demo")));
    }

    #[test]
    fn malformed_answers_file_is_a_user_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("answers.json");
        std::fs::write(&path, "not json").unwrap();
        let err = load_answers(&path).unwrap_err();
        assert!(matches!(err, CliError::AnswersFile { .. }));
        assert_eq!(err.exit_code(), 2);
    }
}
