//! Line-oriented text codemods.

use std::path::Path;

use tracing::debug;

use stagehand_core::application::ports::{CodeMod, Filesystem, ModContext, MutationOutcome};
use stagehand_core::application::services::substitute;
use stagehand_core::error::EngineResult;

/// Append a line to a text file unless an identical line already exists.
///
/// Useful for ignore files and env templates. `{{key}}` tokens in the
/// line are substituted from the answer map before matching, so the
/// idempotence check runs against the resolved text.
#[derive(Debug, Clone)]
pub struct AppendLine {
    name: String,
    line: String,
}

impl AppendLine {
    pub fn new(name: impl Into<String>, line: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            line: line.into(),
        }
    }

    /// Keep `node_modules/` out of version control.
    pub fn gitignore_node() -> Self {
        Self::new("gitignore-node", "node_modules/")
    }
}

impl CodeMod for AppendLine {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(
        &self,
        path: &Path,
        ctx: &ModContext<'_>,
        fs: &dyn Filesystem,
    ) -> EngineResult<MutationOutcome> {
        let line = substitute(&self.line, ctx.answers, &[], path)?;
        let existing = if fs.exists(path) {
            fs.read_file(path)?
        } else {
            String::new()
        };

        if existing.lines().any(|l| l == line) {
            return Ok(MutationOutcome::Unchanged);
        }

        let mut next = existing;
        if !next.is_empty() && !next.ends_with('\n') {
            next.push('\n');
        }
        next.push_str(&line);
        next.push('\n');
        debug!(path = %path.display(), "appending line");
        fs.write_file(path, &next)?;
        Ok(MutationOutcome::Changed)
    }
}

/// Insert an import statement after the file's leading import block.
///
/// The file is treated as lines; the statement is inserted after the last
/// contiguous leading line that starts with `import` (or `use `), so
/// grouped imports stay grouped. An identical line anywhere in the file
/// means nothing is done.
#[derive(Debug, Clone)]
pub struct AddImport {
    name: String,
    statement: String,
}

impl AddImport {
    pub fn new(name: impl Into<String>, statement: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            statement: statement.into(),
        }
    }
}

impl CodeMod for AddImport {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(
        &self,
        path: &Path,
        ctx: &ModContext<'_>,
        fs: &dyn Filesystem,
    ) -> EngineResult<MutationOutcome> {
        let statement = substitute(&self.statement, ctx.answers, &[], path)?;
        let existing = if fs.exists(path) {
            fs.read_file(path)?
        } else {
            String::new()
        };

        if existing.lines().any(|l| l.trim() == statement.trim()) {
            return Ok(MutationOutcome::Unchanged);
        }

        let lines: Vec<&str> = existing.lines().collect();
        let insert_at = lines
            .iter()
            .take_while(|l| {
                let t = l.trim_start();
                t.starts_with("import") || t.starts_with("use ")
            })
            .count();

        let mut out = Vec::with_capacity(lines.len() + 1);
        out.extend_from_slice(&lines[..insert_at]);
        out.push(statement.as_str());
        out.extend_from_slice(&lines[insert_at..]);

        let mut content = out.join("\n");
        content.push('\n');
        fs.write_file(path, &content)?;
        Ok(MutationOutcome::Changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::MemoryFilesystem;
    use stagehand_core::domain::{AnswerMap, answers};

    fn ctx(map: &AnswerMap) -> ModContext<'_> {
        ModContext { answers: map }
    }

    #[test]
    fn append_synthesizes_missing_file() {
        let fs = MemoryFilesystem::new();
        let map = AnswerMap::empty();
        let outcome = AppendLine::new("m", "dist/")
            .apply(Path::new("/p/.gitignore"), &ctx(&map), &fs)
            .unwrap();
        assert_eq!(outcome, MutationOutcome::Changed);
        assert_eq!(fs.content("/p/.gitignore").unwrap(), "dist/\n");
    }

    #[test]
    fn append_is_idempotent_byte_for_byte() {
        let fs = MemoryFilesystem::new();
        let map = AnswerMap::empty();
        let m = AppendLine::new("m", "dist/");
        m.apply(Path::new("/p/.gitignore"), &ctx(&map), &fs).unwrap();
        let first = fs.content("/p/.gitignore").unwrap();
        let outcome = m.apply(Path::new("/p/.gitignore"), &ctx(&map), &fs).unwrap();
        assert_eq!(outcome, MutationOutcome::Unchanged);
        assert_eq!(fs.content("/p/.gitignore").unwrap(), first);
    }

    #[test]
    fn append_preserves_existing_lines_and_missing_newline() {
        let fs = MemoryFilesystem::new();
        fs.seed("/p/.gitignore", "target");
        let map = AnswerMap::empty();
        AppendLine::new("m", "dist/")
            .apply(Path::new("/p/.gitignore"), &ctx(&map), &fs)
            .unwrap();
        assert_eq!(fs.content("/p/.gitignore").unwrap(), "target\ndist/\n");
    }

    #[test]
    fn append_substitutes_answer_tokens() {
        let fs = MemoryFilesystem::new();
        let map = answers([("buildDir", "out")]);
        AppendLine::new("m", "{{buildDir}}/")
            .apply(Path::new("/p/.gitignore"), &ctx(&map), &fs)
            .unwrap();
        assert_eq!(fs.content("/p/.gitignore").unwrap(), "out/\n");
    }

    #[test]
    fn add_import_goes_after_leading_imports() {
        let fs = MemoryFilesystem::new();
        fs.seed("/p/main.ts", "import a from 'a';\n\nconst x = 1;\n");
        let map = AnswerMap::empty();
        AddImport::new("m", "import b from 'b';")
            .apply(Path::new("/p/main.ts"), &ctx(&map), &fs)
            .unwrap();
        assert_eq!(
            fs.content("/p/main.ts").unwrap(),
            "import a from 'a';\nimport b from 'b';\n\nconst x = 1;\n"
        );
    }

    #[test]
    fn add_import_skips_when_present() {
        let fs = MemoryFilesystem::new();
        fs.seed("/p/main.ts", "import b from 'b';\n");
        let map = AnswerMap::empty();
        let outcome = AddImport::new("m", "import b from 'b';")
            .apply(Path::new("/p/main.ts"), &ctx(&map), &fs)
            .unwrap();
        assert_eq!(outcome, MutationOutcome::Unchanged);
    }
}
