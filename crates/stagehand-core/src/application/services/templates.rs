//! Template tree instantiation.
//!
//! Copies every file under a source directory of the feature pack into the
//! project, substituting `{{key}}` tokens in both file contents and
//! relative paths. Destination files are overwritten; templating is not
//! additive the way manifest merging is.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use crate::application::error::ApplicationError;
use crate::application::ports::Filesystem;
use crate::application::services::substitute::substitute;
use crate::domain::{AnswerMap, TemplateCopy};
use crate::error::EngineResult;

/// Instantiate one template copy. Returns the destination paths written,
/// in sorted source order.
#[instrument(skip_all, fields(source = %copy.source.display()))]
pub fn instantiate(
    fs: &dyn Filesystem,
    pack_root: &Path,
    project_root: &Path,
    copy: &TemplateCopy,
    answers: &AnswerMap,
) -> EngineResult<Vec<PathBuf>> {
    let source_root = pack_root.join(&copy.source);
    if !fs.exists(&source_root) {
        return Err(ApplicationError::TemplateSource {
            path: source_root,
            reason: "directory does not exist".into(),
        }
        .into());
    }

    let mut written = Vec::new();
    for relative in fs.walk_files(&source_root)? {
        let source_file = source_root.join(&relative);
        let raw = fs.read_file(&source_file)?;
        let content = substitute(&raw, answers, &copy.context, &source_file)?;

        // Tokens are legal in path segments too ({{projectName}}/main.ts).
        let relative_str = relative.to_string_lossy();
        let target_relative = substitute(&relative_str, answers, &copy.context, &source_file)?;
        let target = project_root.join(&copy.destination).join(target_relative);

        if let Some(parent) = target.parent() {
            fs.create_dir_all(parent)?;
        }
        debug!(target = %target.display(), "writing template file");
        fs.write_file(&target, &content)?;
        written.push(target);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::answers;
    use std::collections::BTreeMap;
    use std::sync::RwLock;

    #[derive(Default)]
    struct MapFs {
        files: RwLock<BTreeMap<PathBuf, String>>,
    }

    impl MapFs {
        fn add(&self, path: &str, content: &str) {
            self.files
                .write()
                .unwrap()
                .insert(PathBuf::from(path), content.to_owned());
        }

        fn content(&self, path: &str) -> Option<String> {
            self.files.read().unwrap().get(Path::new(path)).cloned()
        }
    }

    impl Filesystem for MapFs {
        fn read_file(&self, path: &Path) -> EngineResult<String> {
            self.files.read().unwrap().get(path).cloned().ok_or_else(|| {
                ApplicationError::Filesystem {
                    path: path.to_path_buf(),
                    reason: "not found".into(),
                }
                .into()
            })
        }

        fn write_file(&self, path: &Path, content: &str) -> EngineResult<()> {
            self.files
                .write()
                .unwrap()
                .insert(path.to_path_buf(), content.to_owned());
            Ok(())
        }

        fn exists(&self, path: &Path) -> bool {
            let files = self.files.read().unwrap();
            files.keys().any(|p| p == path || p.starts_with(path))
        }

        fn create_dir_all(&self, _path: &Path) -> EngineResult<()> {
            Ok(())
        }

        fn walk_files(&self, root: &Path) -> EngineResult<Vec<PathBuf>> {
            let files = self.files.read().unwrap();
            let mut out: Vec<PathBuf> = files
                .keys()
                .filter_map(|p| p.strip_prefix(root).ok().map(Path::to_path_buf))
                .collect();
            out.sort();
            Ok(out)
        }
    }

    #[test]
    fn copies_and_substitutes_content() {
        let fs = MapFs::default();
        fs.add("/pack/docker/Dockerfile", "FROM {{baseImage}}\n");
        let copy = TemplateCopy::new("docker", ".");
        let map = answers([("baseImage", "alpine:3")]);

        let written = instantiate(&fs, Path::new("/pack"), Path::new("/proj"), &copy, &map)
            .unwrap();
        assert_eq!(written, [PathBuf::from("/proj/Dockerfile")]);
        assert_eq!(
            fs.content("/proj/Dockerfile").unwrap(),
            "FROM alpine:3\n"
        );
    }

    #[test]
    fn substitutes_tokens_in_paths() {
        let fs = MapFs::default();
        fs.add("/pack/src/{{name}}.conf", "x = 1\n");
        let copy = TemplateCopy::new("src", "etc");
        let map = answers([("name", "web")]);

        instantiate(&fs, Path::new("/pack"), Path::new("/proj"), &copy, &map).unwrap();
        assert!(fs.content("/proj/etc/web.conf").is_some());
    }

    #[test]
    fn stage_context_overrides_answers() {
        let fs = MapFs::default();
        fs.add("/pack/t/file.txt", "{{version}}");
        let copy = TemplateCopy::new("t", ".").with_context("version", "pinned");
        let map = answers([("version", "free")]);

        instantiate(&fs, Path::new("/pack"), Path::new("/proj"), &copy, &map).unwrap();
        assert_eq!(fs.content("/proj/file.txt").unwrap(), "pinned");
    }

    #[test]
    fn overwrites_existing_destination_files() {
        let fs = MapFs::default();
        fs.add("/pack/t/file.txt", "new");
        fs.add("/proj/file.txt", "old");
        let copy = TemplateCopy::new("t", ".");

        instantiate(&fs, Path::new("/pack"), Path::new("/proj"), &copy, &AnswerMap::empty())
            .unwrap();
        assert_eq!(fs.content("/proj/file.txt").unwrap(), "new");
    }

    #[test]
    fn missing_source_is_a_template_error() {
        let fs = MapFs::default();
        let copy = TemplateCopy::new("ghost", ".");
        let err = instantiate(
            &fs,
            Path::new("/pack"),
            Path::new("/proj"),
            &copy,
            &AnswerMap::empty(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("template source unreadable"));
    }

    #[test]
    fn unresolved_token_names_the_source_file() {
        let fs = MapFs::default();
        fs.add("/pack/t/file.txt", "{{ghost}}");
        let copy = TemplateCopy::new("t", ".");
        let err = instantiate(
            &fs,
            Path::new("/pack"),
            Path::new("/proj"),
            &copy,
            &AnswerMap::empty(),
        )
        .unwrap_err();
        let text = err.to_string();
        assert!(text.contains("ghost"));
        assert!(text.contains("file.txt"));
    }
}
