//! The stage executor: preflight validation plus staged execution.
//!
//! The pipeline is strictly phased. Preflight resolves the feature order,
//! checks every predicate key and codemod reference, and finalizes the
//! answer map; only when all of that holds does execution start, so every
//! structural error fires before a single file is touched. Execution is
//! non-transactional: completed mutations stay on disk after a later
//! failure, and the run report records exactly what was and was not
//! attempted.

use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::application::error::ApplicationError;
use crate::application::ports::{
    CodeModRegistry, Filesystem, ModContext, ProcessRunner,
};
use crate::application::services::{form, manifest, substitute::substitute, templates};
use crate::domain::{
    AnswerMap, Feature, FeatureOutcome, FeatureRegistry, RunMode, RunReport, ScriptSpec, Stage,
    graph,
};
use crate::error::{EngineError, EngineResult};

/// Default wall-clock limit for one script.
pub const DEFAULT_SCRIPT_TIMEOUT: Duration = Duration::from_secs(300);

// ── Options ──────────────────────────────────────────────────────────────────

/// Caller-supplied knobs for one run.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Root of the project being scaffolded; all destinations, script
    /// working directories, and codemod targets are relative to it.
    pub project_root: PathBuf,
    /// Root of the feature pack; template sources are relative to it.
    pub pack_root: PathBuf,
    pub run_mode: RunMode,
    pub script_timeout: Duration,
}

impl EngineOptions {
    pub fn new(project_root: impl Into<PathBuf>, pack_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            pack_root: pack_root.into(),
            run_mode: RunMode::default(),
            script_timeout: DEFAULT_SCRIPT_TIMEOUT,
        }
    }

    pub fn with_mode(mut self, mode: RunMode) -> Self {
        self.run_mode = mode;
        self
    }

    pub fn with_script_timeout(mut self, timeout: Duration) -> Self {
        self.script_timeout = timeout;
        self
    }
}

// ── Executor ─────────────────────────────────────────────────────────────────

/// Runs a registry's active features against injected ports.
pub struct StageExecutor<'a> {
    fs: &'a dyn Filesystem,
    runner: &'a dyn ProcessRunner,
    mods: &'a CodeModRegistry,
}

impl<'a> StageExecutor<'a> {
    pub fn new(
        fs: &'a dyn Filesystem,
        runner: &'a dyn ProcessRunner,
        mods: &'a CodeModRegistry,
    ) -> Self {
        Self { fs, runner, mods }
    }

    /// Validate everything that can be validated without touching a file.
    ///
    /// Returns the resolver order and the finalized answer map. Any error
    /// from here is a preflight error; no side effect has occurred.
    #[instrument(skip_all, fields(features = registry.len()))]
    pub fn preflight(
        &self,
        registry: &FeatureRegistry,
        supplied: &AnswerMap,
    ) -> EngineResult<(Vec<String>, AnswerMap)> {
        let order = graph::resolve_order(registry)?;
        graph::validate_predicate_keys(registry)?;
        graph::validate_codemod_refs(registry, &self.mods.known_names())?;

        let groups = form::groups_for(registry, &order);
        let answers = form::finalize(&groups, supplied)?;
        debug!(order = ?order, "preflight passed");
        Ok((order, answers))
    }

    /// Run the full pipeline: preflight, then every active feature's active
    /// stages in resolver order.
    #[instrument(skip_all)]
    pub fn execute(
        &self,
        registry: &FeatureRegistry,
        supplied: &AnswerMap,
        options: &EngineOptions,
    ) -> EngineResult<RunReport> {
        let (order, answers) = self.preflight(registry, supplied)?;

        let mut outcomes = Vec::with_capacity(order.len());
        let mut halted = false;

        for id in &order {
            let feature = registry.get(id).ok_or_else(|| EngineError::Internal {
                message: format!("resolved order names unknown feature '{id}'"),
            })?;

            if halted {
                outcomes.push(FeatureOutcome::pending(id.clone()));
                continue;
            }

            if !is_active(feature.activated_by.as_ref(), &answers) {
                info!(feature = %id, "inactive, skipping");
                outcomes.push(FeatureOutcome::skipped(id.clone()));
                continue;
            }

            let outcome = self.run_feature(feature, &answers, options);
            if outcome.error.is_some() && options.run_mode == RunMode::FailFast {
                halted = true;
            }
            outcomes.push(outcome);
        }

        Ok(RunReport {
            outcomes,
            answers,
            mode: options.run_mode,
        })
    }

    #[instrument(skip_all, fields(feature = %feature.id))]
    fn run_feature(
        &self,
        feature: &Feature,
        answers: &AnswerMap,
        options: &EngineOptions,
    ) -> FeatureOutcome {
        info!("running");
        for (index, stage) in feature.stages.iter().enumerate() {
            if !is_active(stage.activated_by.as_ref(), answers) {
                debug!(stage = %stage.name, "stage inactive");
                continue;
            }
            if let Err(error) = self.run_stage(stage, answers, options) {
                let unattempted = feature.stages[index + 1..]
                    .iter()
                    .map(|s| s.name.clone())
                    .collect();
                warn!(stage = %stage.name, %error, "stage failed");
                return FeatureOutcome::failed(
                    feature.id.clone(),
                    error,
                    stage.name.clone(),
                    unattempted,
                );
            }
        }
        FeatureOutcome::completed(feature.id.clone())
    }

    /// One stage, step kinds in fixed order: dependency merges, scripts,
    /// template copies, codemods. Later kinds assume earlier ones ran.
    fn run_stage(
        &self,
        stage: &Stage,
        answers: &AnswerMap,
        options: &EngineOptions,
    ) -> EngineResult<()> {
        for request in &stage.dependencies {
            manifest::merge_dependencies(self.fs, &options.project_root, request)?;
        }
        for script in &stage.scripts {
            self.run_script(script, answers, options)?;
        }
        for copy in &stage.templates {
            templates::instantiate(
                self.fs,
                &options.pack_root,
                &options.project_root,
                copy,
                answers,
            )?;
        }
        for target in &stage.mods {
            let path = options.project_root.join(&target.path);
            let ctx = ModContext { answers };
            for name in &target.mods {
                // Preflight resolved every name already.
                let codemod = self.mods.get(name).ok_or_else(|| EngineError::Internal {
                    message: format!("codemod '{name}' vanished after preflight"),
                })?;
                codemod.apply(&path, &ctx, self.fs)?;
            }
        }
        Ok(())
    }

    fn run_script(
        &self,
        script: &ScriptSpec,
        answers: &AnswerMap,
        options: &EngineOptions,
    ) -> EngineResult<()> {
        let command = substitute(
            &script.command,
            answers,
            &[],
            script.working_dir.as_path(),
        )?;
        let cwd = options.project_root.join(&script.working_dir);
        debug!(command = %command, cwd = %cwd.display(), "running script");

        let output = self.runner.run(&command, &cwd, options.script_timeout)?;
        if output.success() {
            return Ok(());
        }
        if script.best_effort {
            warn!(command = %command, status = output.status, "best-effort script failed");
            return Ok(());
        }
        Err(ApplicationError::ScriptFailed {
            command,
            status: output.status,
            stderr: output.stderr,
        }
        .into())
    }
}

fn is_active(predicate: Option<&crate::domain::Predicate>, answers: &AnswerMap) -> bool {
    predicate.is_none_or(|p| p.evaluate(answers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{CodeMod, MutationOutcome, ScriptOutput};
    use crate::domain::{
        ConfigOption, DependencyKind, DependencyRequest, DomainError, FeatureStatus, ModTarget,
        Predicate, answers,
    };
    use std::collections::BTreeMap;
    use std::path::Path;
    use std::sync::{Arc, Mutex, RwLock};

    type EventLog = Arc<Mutex<Vec<String>>>;

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

        fn snapshot(&self) -> BTreeMap<PathBuf, String> {
            self.files.read().unwrap().clone()
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

    struct LogRunner {
        log: EventLog,
        failing: Option<String>,
    }

    impl ProcessRunner for LogRunner {
        fn run(&self, command: &str, _cwd: &Path, _timeout: Duration) -> EngineResult<ScriptOutput> {
            self.log.lock().unwrap().push(format!("script:{command}"));
            let status = if self.failing.as_deref() == Some(command) {
                7
            } else {
                0
            };
            Ok(ScriptOutput {
                status,
                stdout: String::new(),
                stderr: "boom".into(),
            })
        }
    }

    struct LogMod {
        log: EventLog,
    }

    impl CodeMod for LogMod {
        fn name(&self) -> &str {
            "log-mod"
        }
        fn apply(
            &self,
            path: &Path,
            _ctx: &ModContext<'_>,
            _fs: &dyn Filesystem,
        ) -> EngineResult<MutationOutcome> {
            self.log
                .lock()
                .unwrap()
                .push(format!("mod:{}", path.display()));
            Ok(MutationOutcome::Changed)
        }
    }

    struct Harness {
        fs: MapFs,
        log: EventLog,
        mods: CodeModRegistry,
        failing_command: Option<String>,
    }

    impl Harness {
        fn new() -> Self {
            let log: EventLog = Arc::default();
            let mods = CodeModRegistry::new().with(Arc::new(LogMod { log: log.clone() }));
            Self {
                fs: MapFs::default(),
                log,
                mods,
                failing_command: None,
            }
        }

        fn fail_on(mut self, command: &str) -> Self {
            self.failing_command = Some(command.to_owned());
            self
        }

        fn execute(
            &self,
            registry: &FeatureRegistry,
            supplied: &AnswerMap,
            options: &EngineOptions,
        ) -> EngineResult<RunReport> {
            let runner = LogRunner {
                log: self.log.clone(),
                failing: self.failing_command.clone(),
            };
            StageExecutor::new(&self.fs, &runner, &self.mods).execute(registry, supplied, options)
        }

        fn events(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }
    }

    fn options() -> EngineOptions {
        EngineOptions::new("/proj", "/pack")
    }

    #[test]
    fn steps_run_in_fixed_order_within_a_stage() {
        let harness = Harness::new();
        harness.fs.add("/pack/tpl/readme.md", "hello");
        let registry = FeatureRegistry::new(vec![Feature::new("base").with_stage(
            Stage::new("setup")
                .with_mods(ModTarget::new("config.json", ["log-mod"]))
                .with_script(ScriptSpec::new("echo hi", "."))
                .with_template(crate::domain::TemplateCopy::new("tpl", "."))
                .with_dependency(DependencyRequest::new(["pkg"], ".", DependencyKind::Runtime)),
        )])
        .unwrap();

        let report = harness
            .execute(&registry, &AnswerMap::empty(), &options())
            .unwrap();
        assert!(report.is_success());
        // Declaration order above is scrambled on purpose; execution order
        // is deps, scripts, templates, mods.
        assert_eq!(harness.events(), ["script:echo hi", "mod:/proj/config.json"]);
        let files = harness.fs.snapshot();
        assert!(files.contains_key(Path::new("/proj/manifest.json")));
        assert!(files.contains_key(Path::new("/proj/readme.md")));
    }

    #[test]
    fn inactive_feature_is_skipped_with_zero_side_effects() {
        let harness = Harness::new();
        let registry = FeatureRegistry::new(vec![
        Feature::new("opts").with_option(ConfigOption::boolean("useDocker").with_default(false)),
            Feature::new("docker")
                .activated_by(Predicate::equals("useDocker", true))
                .with_stage(Stage::new("setup").with_script(ScriptSpec::new("docker init", "."))),
        ])
        .unwrap();

        let report = harness
            .execute(&registry, &AnswerMap::empty(), &options())
            .unwrap();
        assert_eq!(
            report.outcome_for("docker").unwrap().status,
            FeatureStatus::Skipped
        );
        assert!(harness.events().is_empty());
        assert!(harness.fs.snapshot().is_empty());
    }

    #[test]
    fn inactive_stage_is_skipped_but_feature_completes() {
        let harness = Harness::new();
        let registry = FeatureRegistry::new(vec![
            Feature::new("opts").with_option(ConfigOption::text("mode").with_default("simple")),
            Feature::new("base")
                .with_stage(
                    Stage::new("advanced-only")
                        .activated_by(Predicate::equals("mode", "advanced"))
                        .with_script(ScriptSpec::new("never", ".")),
                )
                .with_stage(Stage::new("always").with_script(ScriptSpec::new("always", "."))),
        ])
        .unwrap();

        let report = harness
            .execute(&registry, &AnswerMap::empty(), &options())
            .unwrap();
        assert_eq!(
            report.outcome_for("base").unwrap().status,
            FeatureStatus::Completed
        );
        assert_eq!(harness.events(), ["script:always"]);
    }

    #[test]
    fn fail_fast_marks_remainder_pending() {
        let harness = Harness::new().fail_on("bad");
        let registry = FeatureRegistry::new(vec![
            Feature::new("first")
                .with_stage(Stage::new("s").with_script(ScriptSpec::new("bad", "."))),
            Feature::new("second")
                .with_stage(Stage::new("s").with_script(ScriptSpec::new("good", "."))),
        ])
        .unwrap();

        let report = harness
            .execute(&registry, &AnswerMap::empty(), &options())
            .unwrap();
        assert!(!report.is_success());
        assert_eq!(
            report.outcome_for("first").unwrap().status,
            FeatureStatus::Failed
        );
        assert_eq!(
            report.outcome_for("second").unwrap().status,
            FeatureStatus::Pending
        );
        assert_eq!(harness.events(), ["script:bad"]);
    }

    #[test]
    fn continue_mode_runs_remaining_features() {
        let harness = Harness::new().fail_on("bad");
        let registry = FeatureRegistry::new(vec![
            Feature::new("first")
                .with_stage(Stage::new("s").with_script(ScriptSpec::new("bad", "."))),
            Feature::new("second")
                .with_stage(Stage::new("s").with_script(ScriptSpec::new("good", "."))),
        ])
        .unwrap();

        let report = harness
            .execute(
                &registry,
                &AnswerMap::empty(),
                &options().with_mode(RunMode::Continue),
            )
            .unwrap();
        assert!(!report.is_success());
        assert_eq!(
            report.outcome_for("second").unwrap().status,
            FeatureStatus::Completed
        );
        assert_eq!(harness.events(), ["script:bad", "script:good"]);
    }

    #[test]
    fn failed_outcome_records_stage_and_unattempted() {
        let harness = Harness::new().fail_on("bad");
        let registry = FeatureRegistry::new(vec![Feature::new("f")
            .with_stage(Stage::new("one").with_script(ScriptSpec::new("ok", ".")))
            .with_stage(Stage::new("two").with_script(ScriptSpec::new("bad", ".")))
            .with_stage(Stage::new("three"))])
        .unwrap();

        let report = harness
            .execute(&registry, &AnswerMap::empty(), &options())
            .unwrap();
        let outcome = report.outcome_for("f").unwrap();
        assert_eq!(outcome.failed_stage.as_deref(), Some("two"));
        assert_eq!(outcome.unattempted_stages, ["three"]);
    }

    #[test]
    fn best_effort_script_failure_does_not_fail_the_stage() {
        let harness = Harness::new().fail_on("flaky");
        let registry = FeatureRegistry::new(vec![Feature::new("f").with_stage(
            Stage::new("s").with_script(ScriptSpec::new("flaky", ".").best_effort()),
        )])
        .unwrap();

        let report = harness
            .execute(&registry, &AnswerMap::empty(), &options())
            .unwrap();
        assert!(report.is_success());
    }

    #[test]
    fn script_commands_substitute_answers() {
        let harness = Harness::new();
        let registry = FeatureRegistry::new(vec![
            Feature::new("opts").with_option(ConfigOption::text("pm").with_default("npm")),
            Feature::new("f")
                .with_stage(Stage::new("s").with_script(ScriptSpec::new("{{pm}} install", "."))),
        ])
        .unwrap();

        harness
            .execute(&registry, &AnswerMap::empty(), &options())
            .unwrap();
        assert_eq!(harness.events(), ["script:npm install"]);
    }

    #[test]
    fn preflight_rejects_unknown_codemod_before_any_side_effect() {
        let harness = Harness::new();
        let registry = FeatureRegistry::new(vec![Feature::new("f").with_stage(
            Stage::new("s")
                .with_script(ScriptSpec::new("echo", "."))
                .with_mods(ModTarget::new("x.json", ["ghost-mod"])),
        )])
        .unwrap();

        let err = harness
            .execute(&registry, &AnswerMap::empty(), &options())
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(DomainError::UnknownCodeMod { .. })
        ));
        assert!(harness.events().is_empty());
    }

    #[test]
    fn missing_required_answer_fails_before_any_stage() {
        let harness = Harness::new();
        let registry = FeatureRegistry::new(vec![Feature::new("f")
            .with_option(ConfigOption::text("name").required())
            .with_stage(Stage::new("s").with_script(ScriptSpec::new("echo", ".")))])
        .unwrap();

        let err = harness
            .execute(&registry, &AnswerMap::empty(), &options())
            .unwrap_err();
        assert!(err.is_preflight());
        assert!(harness.events().is_empty());
    }

    #[test]
    fn execute_uses_finalized_answers_for_activation() {
        let harness = Harness::new();
        let registry = FeatureRegistry::new(vec![
            Feature::new("opts").with_option(ConfigOption::new(
                "features",
                crate::domain::OptionKind::MultiChoice(vec!["docker".into(), "ci".into()]),
            )),
            Feature::new("docker")
                .activated_by(Predicate::includes("features", "docker"))
                .with_stage(Stage::new("s").with_script(ScriptSpec::new("docker", "."))),
            Feature::new("ci")
                .activated_by(Predicate::includes("features", "ci"))
                .with_stage(Stage::new("s").with_script(ScriptSpec::new("ci", "."))),
        ])
        .unwrap();

        let supplied = answers([(
            "features",
            crate::domain::AnswerValue::List(vec!["docker".into()]),
        )]);
        let report = harness.execute(&registry, &supplied, &options()).unwrap();
        assert_eq!(
            report.outcome_for("docker").unwrap().status,
            FeatureStatus::Completed
        );
        assert_eq!(
            report.outcome_for("ci").unwrap().status,
            FeatureStatus::Skipped
        );
        assert_eq!(harness.events(), ["script:docker"]);
    }
}
