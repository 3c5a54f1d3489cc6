//! Filesystem-based feature-pack loader.
//!
//! Discovers and parses feature declarations from a pack directory,
//! converting them into domain [`Feature`] objects ready for the stage
//! executor.
//!
//! # Directory layout expected
//!
//! ```text
//! pack/
//! ├── features/
//! │   ├── 00-base.toml         ← one feature per file
//! │   └── 10-docker.toml
//! └── templates/
//!     └── docker/
//!         └── Dockerfile       ← referenced by stage template copies
//! ```
//!
//! Files under `features/` load in lexicographic order, which becomes the
//! registry's declaration order (and therefore the resolver's tie-break
//! order) — hence the numeric prefixes.
//!
//! # Feature file format
//!
//! ```toml
//! [feature]
//! id         = "docker"
//! depends_on = ["base"]
//!
//! [feature.activated_by]
//! type   = "includes"            # equals | includes | all | any | not
//! key    = "features"
//! member = "docker"
//!
//! [[options]]
//! id       = "baseImage"
//! prompt   = "Docker base image"
//! kind     = "text"              # text | number | boolean | single-choice | multi-choice
//! default  = "alpine:3"
//! required = false
//!
//! [[options.validators]]
//! rule = "non-empty"             # non-empty | min-length | max-length | range | one-of
//!
//! [[stages]]
//! name = "install"
//!
//! [[stages.dependencies]]
//! names     = ["express"]
//! workspace = "api"
//! kind      = "runtime"          # runtime | dev | build
//!
//! [[stages.scripts]]
//! command     = "{{pm}} install"
//! working_dir = "."
//!
//! [[stages.templates]]
//! source      = "templates/docker"
//! destination = "."
//!
//! [[stages.mods]]
//! path = ".gitignore"
//! mods = ["gitignore-node"]
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, instrument};

use stagehand_core::domain::{
    AnswerValue, ConfigOption, DependencyKind, DependencyRequest, DomainError, Feature,
    FeatureRegistry, ModTarget, OptionKind, Predicate, ScriptSpec, Stage, TemplateCopy, Validator,
};
use stagehand_core::error::EngineResult;

const FEATURES_DIR: &str = "features";

/// Load every feature declaration under `root/features/` into a registry.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn load_pack(root: &Path) -> EngineResult<FeatureRegistry> {
    let features_dir = root.join(FEATURES_DIR);
    if !features_dir.is_dir() {
        return Err(DomainError::InvalidDeclaration(format!(
            "feature pack has no '{FEATURES_DIR}/' directory at {}",
            root.display()
        ))
        .into());
    }

    let mut paths: Vec<PathBuf> = fs::read_dir(&features_dir)
        .map_err(|e| declaration_error(&features_dir, &e.to_string()))?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    paths.sort();

    let mut features = Vec::with_capacity(paths.len());
    for path in paths {
        let content =
            fs::read_to_string(&path).map_err(|e| declaration_error(&path, &e.to_string()))?;
        let file: FeatureFile =
            toml::from_str(&content).map_err(|e| declaration_error(&path, &e.to_string()))?;
        debug!(file = %path.display(), feature = %file.feature.id, "loaded feature");
        features.push(file.into_feature()?);
    }

    Ok(FeatureRegistry::new(features)?)
}

fn declaration_error(path: &Path, reason: &str) -> stagehand_core::error::EngineError {
    DomainError::InvalidDeclaration(format!("{}: {}", path.display(), reason)).into()
}

// ── File schema ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct FeatureFile {
    feature: FeatureSection,
    #[serde(default)]
    options: Vec<OptionEntry>,
    #[serde(default)]
    stages: Vec<StageEntry>,
}

#[derive(Debug, Deserialize)]
struct FeatureSection {
    id: String,
    #[serde(default)]
    depends_on: Vec<String>,
    activated_by: Option<PredicateSpec>,
}

/// Serializable subset of the predicate AST. Custom predicates only exist
/// for registries built in code.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum PredicateSpec {
    Equals { key: String, value: ValueSpec },
    Includes { key: String, member: String },
    All { of: Vec<PredicateSpec> },
    Any { of: Vec<PredicateSpec> },
    Not { inner: Box<PredicateSpec> },
}

impl PredicateSpec {
    fn into_predicate(self) -> Predicate {
        match self {
            Self::Equals { key, value } => Predicate::equals(key, value.into_answer()),
            Self::Includes { key, member } => Predicate::includes(key, member),
            Self::All { of } => {
                Predicate::all(of.into_iter().map(Self::into_predicate).collect::<Vec<_>>())
            }
            Self::Any { of } => {
                Predicate::any(of.into_iter().map(Self::into_predicate).collect::<Vec<_>>())
            }
            Self::Not { inner } => Predicate::not(inner.into_predicate()),
        }
    }
}

/// A literal answer value in TOML form.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ValueSpec {
    Bool(bool),
    Number(i64),
    Text(String),
    List(Vec<String>),
}

impl ValueSpec {
    fn into_answer(self) -> AnswerValue {
        match self {
            Self::Bool(b) => AnswerValue::Bool(b),
            Self::Number(n) => AnswerValue::Number(n),
            Self::Text(s) => AnswerValue::Text(s),
            Self::List(items) => AnswerValue::List(items),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OptionEntry {
    id: String,
    prompt: Option<String>,
    kind: String,
    #[serde(default)]
    choices: Vec<String>,
    default: Option<ValueSpec>,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    validators: Vec<ValidatorEntry>,
    #[serde(default)]
    show_if: Vec<PredicateSpec>,
}

impl OptionEntry {
    fn into_option(self) -> Result<ConfigOption, DomainError> {
        let kind = match self.kind.as_str() {
            "text" => OptionKind::Text,
            "number" => OptionKind::Number,
            "boolean" => OptionKind::Boolean,
            "single-choice" => OptionKind::SingleChoice(self.choices.clone()),
            "multi-choice" => OptionKind::MultiChoice(self.choices.clone()),
            other => {
                return Err(DomainError::InvalidDeclaration(format!(
                    "option '{}' has unknown kind '{other}'",
                    self.id
                )));
            }
        };

        let id = self.id.clone();
        let mut option = ConfigOption::new(self.id, kind);
        if let Some(prompt) = self.prompt {
            option = option.with_prompt(prompt);
        }
        if let Some(default) = self.default {
            option = option.with_default(default.into_answer());
        }
        if self.required {
            option = option.required();
        }
        for validator in self.validators {
            option = option.with_validator(validator.into_validator(&id)?);
        }
        for spec in self.show_if {
            option = option.show_if(spec.into_predicate());
        }
        Ok(option)
    }
}

#[derive(Debug, Deserialize)]
struct ValidatorEntry {
    rule: String,
    value: Option<usize>,
    min: Option<i64>,
    max: Option<i64>,
    #[serde(default)]
    allowed: Vec<String>,
}

impl ValidatorEntry {
    fn into_validator(self, option: &str) -> Result<Validator, DomainError> {
        let invalid = |msg: &str| {
            DomainError::InvalidDeclaration(format!("option '{option}' validator: {msg}"))
        };
        match self.rule.as_str() {
            "non-empty" => Ok(Validator::NonEmpty),
            "min-length" => self
                .value
                .map(Validator::MinLength)
                .ok_or_else(|| invalid("min-length needs 'value'")),
            "max-length" => self
                .value
                .map(Validator::MaxLength)
                .ok_or_else(|| invalid("max-length needs 'value'")),
            "range" => match (self.min, self.max) {
                (Some(min), Some(max)) => Ok(Validator::Range { min, max }),
                _ => Err(invalid("range needs 'min' and 'max'")),
            },
            "one-of" => {
                if self.allowed.is_empty() {
                    Err(invalid("one-of needs a non-empty 'allowed' list"))
                } else {
                    Ok(Validator::OneOf(self.allowed))
                }
            }
            other => Err(invalid(&format!("unknown rule '{other}'"))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct StageEntry {
    name: String,
    activated_by: Option<PredicateSpec>,
    #[serde(default)]
    dependencies: Vec<DependencyEntry>,
    #[serde(default)]
    scripts: Vec<ScriptEntry>,
    #[serde(default)]
    templates: Vec<TemplateEntry>,
    #[serde(default)]
    mods: Vec<ModEntry>,
}

#[derive(Debug, Deserialize)]
struct DependencyEntry {
    names: Vec<String>,
    #[serde(default = "default_workspace")]
    workspace: String,
    #[serde(default = "default_kind")]
    kind: String,
    constraint: Option<String>,
}

fn default_workspace() -> String {
    ".".into()
}

fn default_kind() -> String {
    "runtime".into()
}

#[derive(Debug, Deserialize)]
struct ScriptEntry {
    command: String,
    #[serde(default = "default_workspace")]
    working_dir: String,
    #[serde(default)]
    best_effort: bool,
}

#[derive(Debug, Deserialize)]
struct TemplateEntry {
    source: PathBuf,
    destination: PathBuf,
    #[serde(default)]
    context: std::collections::BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct ModEntry {
    path: PathBuf,
    mods: Vec<String>,
}

impl FeatureFile {
    fn into_feature(self) -> Result<Feature, DomainError> {
        let id = self.feature.id.clone();
        let mut feature = Feature::new(self.feature.id);
        for dep in self.feature.depends_on {
            feature = feature.depends_on(dep);
        }
        if let Some(spec) = self.feature.activated_by {
            feature = feature.activated_by(spec.into_predicate());
        }
        for option in self.options {
            feature = feature.with_option(option.into_option()?);
        }
        for entry in self.stages {
            feature = feature.with_stage(build_stage(&id, entry)?);
        }
        Ok(feature)
    }
}

fn build_stage(feature: &str, entry: StageEntry) -> Result<Stage, DomainError> {
    let mut stage = Stage::new(entry.name);
    if let Some(spec) = entry.activated_by {
        stage = stage.activated_by(spec.into_predicate());
    }
    for dep in entry.dependencies {
        let kind = match dep.kind.as_str() {
            "runtime" => DependencyKind::Runtime,
            "dev" => DependencyKind::Dev,
            "build" => DependencyKind::Build,
            other => {
                return Err(DomainError::InvalidDeclaration(format!(
                    "feature '{feature}': unknown dependency kind '{other}'"
                )));
            }
        };
        let mut request = DependencyRequest::new(dep.names, dep.workspace, kind);
        if let Some(constraint) = dep.constraint {
            request = request.with_constraint(constraint);
        }
        stage = stage.with_dependency(request);
    }
    for script in entry.scripts {
        let mut spec = ScriptSpec::new(script.command, script.working_dir);
        if script.best_effort {
            spec = spec.best_effort();
        }
        stage = stage.with_script(spec);
    }
    for template in entry.templates {
        let mut copy = TemplateCopy::new(template.source, template.destination);
        for (key, value) in template.context {
            copy = copy.with_context(key, value);
        }
        stage = stage.with_template(copy);
    }
    for target in entry.mods {
        stage = stage.with_mods(ModTarget::new(target.path, target.mods));
    }
    Ok(stage)
}
