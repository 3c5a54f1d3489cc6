//! Features, stages, and the immutable feature registry.
//!
//! A [`Feature`] is a unit of optional functionality: its dependencies on
//! other features, the options it asks about, and the [`Stage`]s it executes
//! when active. Declarations are built once at process start (in code or via
//! the adapters' pack loader) and never mutated afterwards; the
//! [`FeatureRegistry`] owns them and preserves declaration order, which
//! breaks ties during topological resolution.

use std::path::PathBuf;

use crate::domain::error::DomainError;
use crate::domain::options::ConfigOption;
use crate::domain::predicate::Predicate;

// ── Dependency requests ──────────────────────────────────────────────────────

/// Which dependency list of a workspace manifest an install targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyKind {
    Runtime,
    Dev,
    Build,
}

impl DependencyKind {
    /// The manifest object this kind merges into.
    pub const fn manifest_key(&self) -> &'static str {
        match self {
            Self::Runtime => "dependencies",
            Self::Dev => "devDependencies",
            Self::Build => "buildDependencies",
        }
    }
}

/// Request to add packages to one workspace's dependency list.
///
/// The merge is additive: an existing entry's constraint is never altered
/// or downgraded. Version resolution itself is the external package
/// manager's job; the engine only records names and constraints.
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyRequest {
    pub names: Vec<String>,
    /// Sub-workspace directory (relative to the project root) owning the
    /// manifest.
    pub workspace: String,
    pub kind: DependencyKind,
    /// Constraint recorded for newly added entries; `None` records `"*"`.
    pub constraint: Option<String>,
}

impl DependencyRequest {
    pub fn new(
        names: impl IntoIterator<Item = impl Into<String>>,
        workspace: impl Into<String>,
        kind: DependencyKind,
    ) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            workspace: workspace.into(),
            kind,
            constraint: None,
        }
    }

    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraint = Some(constraint.into());
        self
    }
}

// ── Scripts ──────────────────────────────────────────────────────────────────

/// A shell command run synchronously in a working directory relative to the
/// project root. `{{key}}` placeholders in the command are substituted from
/// the answer map before execution.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptSpec {
    pub command: String,
    pub working_dir: PathBuf,
    /// Best-effort scripts log a non-zero exit instead of failing the stage.
    pub best_effort: bool,
}

impl ScriptSpec {
    pub fn new(command: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            working_dir: working_dir.into(),
            best_effort: false,
        }
    }

    pub fn best_effort(mut self) -> Self {
        self.best_effort = true;
        self
    }
}

// ── Template copies ──────────────────────────────────────────────────────────

/// Copy every file under `source` (relative to the feature pack root) into
/// `destination` (relative to the project root), substituting `{{key}}`
/// placeholders from the answer map plus this stage-local literal context.
/// Pre-existing destination files are overwritten.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TemplateCopy {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub context: Vec<(String, String)>,
}

impl TemplateCopy {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            context: Vec::new(),
        }
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.push((key.into(), value.into()));
        self
    }
}

// ── CodeMod targets ──────────────────────────────────────────────────────────

/// One target file and the ordered codemod names to apply to it. Names are
/// resolved against the [`crate::application::ports::CodeModRegistry`] at
/// preflight.
#[derive(Debug, Clone, PartialEq)]
pub struct ModTarget {
    /// Target path relative to the project root.
    pub path: PathBuf,
    pub mods: Vec<String>,
}

impl ModTarget {
    pub fn new(
        path: impl Into<PathBuf>,
        mods: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            path: path.into(),
            mods: mods.into_iter().map(Into::into).collect(),
        }
    }
}

// ── Stage ────────────────────────────────────────────────────────────────────

/// An independently-activatable slice of a feature's execution.
///
/// Step kinds always run in this fixed order — dependency merges, then
/// scripts, then template copies, then codemods — because later steps
/// assume earlier ones completed (a codemod may edit a file a template
/// just wrote).
#[derive(Debug, Clone, Default)]
pub struct Stage {
    pub name: String,
    /// Absent predicate means always active (when the feature is).
    pub activated_by: Option<Predicate>,
    pub dependencies: Vec<DependencyRequest>,
    pub scripts: Vec<ScriptSpec>,
    pub templates: Vec<TemplateCopy>,
    pub mods: Vec<ModTarget>,
}

impl Stage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn activated_by(mut self, predicate: Predicate) -> Self {
        self.activated_by = Some(predicate);
        self
    }

    pub fn with_dependency(mut self, request: DependencyRequest) -> Self {
        self.dependencies.push(request);
        self
    }

    pub fn with_script(mut self, script: ScriptSpec) -> Self {
        self.scripts.push(script);
        self
    }

    pub fn with_template(mut self, copy: TemplateCopy) -> Self {
        self.templates.push(copy);
        self
    }

    pub fn with_mods(mut self, target: ModTarget) -> Self {
        self.mods.push(target);
        self
    }
}

// ── Feature ──────────────────────────────────────────────────────────────────

/// A unit of optional functionality.
#[derive(Debug, Clone)]
pub struct Feature {
    pub id: String,
    pub depends_on: Vec<String>,
    /// Absent predicate means always active.
    pub activated_by: Option<Predicate>,
    pub options: Vec<ConfigOption>,
    pub stages: Vec<Stage>,
}

impl Feature {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            depends_on: Vec::new(),
            activated_by: None,
            options: Vec::new(),
            stages: Vec::new(),
        }
    }

    pub fn depends_on(mut self, id: impl Into<String>) -> Self {
        self.depends_on.push(id.into());
        self
    }

    pub fn activated_by(mut self, predicate: Predicate) -> Self {
        self.activated_by = Some(predicate);
        self
    }

    pub fn with_option(mut self, option: ConfigOption) -> Self {
        self.options.push(option);
        self
    }

    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }
}

// ── FeatureRegistry ──────────────────────────────────────────────────────────

/// Process-wide immutable set of feature declarations.
///
/// Declaration order is preserved; duplicate identifiers are rejected at
/// construction so every later lookup can assume uniqueness.
#[derive(Debug, Clone, Default)]
pub struct FeatureRegistry {
    features: Vec<Feature>,
}

impl FeatureRegistry {
    pub fn new(features: Vec<Feature>) -> Result<Self, DomainError> {
        let mut seen = std::collections::BTreeSet::new();
        for feature in &features {
            if !seen.insert(feature.id.clone()) {
                return Err(DomainError::DuplicateFeature {
                    id: feature.id.clone(),
                });
            }
        }
        Ok(Self { features })
    }

    pub fn get(&self, id: &str) -> Option<&Feature> {
        self.features.iter().find(|f| f.id == id)
    }

    /// Features in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Every declared option id across all features, in declaration order.
    pub fn declared_option_ids(&self) -> Vec<&str> {
        self.features
            .iter()
            .flat_map(|f| f.options.iter().map(|o| o.id.as_str()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_preserves_declaration_order() {
        let registry = FeatureRegistry::new(vec![
            Feature::new("b"),
            Feature::new("a"),
            Feature::new("c"),
        ])
        .unwrap();
        let ids: Vec<_> = registry.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, ["b", "a", "c"]);
    }

    #[test]
    fn registry_rejects_duplicate_ids() {
        let result = FeatureRegistry::new(vec![Feature::new("x"), Feature::new("x")]);
        assert_eq!(
            result.unwrap_err(),
            DomainError::DuplicateFeature { id: "x".into() }
        );
    }

    #[test]
    fn dependency_kind_manifest_keys() {
        assert_eq!(DependencyKind::Runtime.manifest_key(), "dependencies");
        assert_eq!(DependencyKind::Dev.manifest_key(), "devDependencies");
        assert_eq!(DependencyKind::Build.manifest_key(), "buildDependencies");
    }

    #[test]
    fn declared_option_ids_flatten_in_order() {
        use crate::domain::options::ConfigOption;
        let registry = FeatureRegistry::new(vec![
            Feature::new("a").with_option(ConfigOption::text("first")),
            Feature::new("b")
                .with_option(ConfigOption::text("second"))
                .with_option(ConfigOption::text("third")),
        ])
        .unwrap();
        assert_eq!(registry.declared_option_ids(), ["first", "second", "third"]);
    }

    #[test]
    fn stage_builder_collects_steps_in_order() {
        let stage = Stage::new("install")
            .with_script(ScriptSpec::new("echo one", "."))
            .with_script(ScriptSpec::new("echo two", "."));
        assert_eq!(stage.scripts[0].command, "echo one");
        assert_eq!(stage.scripts[1].command, "echo two");
    }
}
