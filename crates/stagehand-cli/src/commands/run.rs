//! `stagehand run` — execute a feature pack against a project.

use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, info, instrument};

use stagehand_adapters::{LocalFilesystem, LocalProcessRunner, builtin_codemods};
use stagehand_core::domain::{AnswerMap, RunMode, graph};
use stagehand_core::prelude::{EngineOptions, StageExecutor};

use crate::cli::RunArgs;
use crate::config::AppConfig;
use crate::error::{CliError, CliResult};
use crate::output::OutputManager;

use super::{load_answers, load_registry};

#[instrument(skip_all, fields(project = %args.project.display()))]
pub fn execute(args: &RunArgs, config: &AppConfig, output: &OutputManager) -> CliResult<()> {
    let pack = resolve_pack(args, config)?;
    info!(pack = %pack.display(), "loading feature pack");

    let registry = load_registry(&pack)?;
    let mods = builtin_codemods();

    let supplied = match &args.answers {
        Some(path) => {
            debug!(file = %path.display(), "using answers file");
            load_answers(path)?
        }
        None => collect_interactively(&registry, output)?,
    };

    let run_mode = if args.continue_on_error || config.run.continue_on_error {
        RunMode::Continue
    } else {
        RunMode::FailFast
    };
    let timeout_secs = args.timeout.unwrap_or(config.run.script_timeout_secs);
    let options = EngineOptions::new(&args.project, &pack)
        .with_mode(run_mode)
        .with_script_timeout(Duration::from_secs(timeout_secs));

    let fs = LocalFilesystem::new();
    let runner = LocalProcessRunner::new();
    let executor = StageExecutor::new(&fs, &runner, &mods);

    output.header(&format!(
        "Running pack {} against {}",
        pack.display(),
        args.project.display()
    ))?;

    let report = executor.execute(&registry, &supplied, &options)?;
    output.report(&report)?;

    if report.is_success() {
        Ok(())
    } else {
        Err(CliError::RunFailed {
            failed: report.failed().count(),
            total: report.outcomes.len(),
        })
    }
}

/// `--pack` wins; otherwise fall back to `run.pack` from config.
fn resolve_pack(args: &RunArgs, config: &AppConfig) -> CliResult<PathBuf> {
    args.pack
        .clone()
        .or_else(|| config.run.pack.clone())
        .ok_or_else(|| CliError::InvalidInput {
            message: "no feature pack specified; pass --pack or set run.pack in config".into(),
            source: None,
        })
}

/// Walk the pack's option groups with terminal prompts.
///
/// Prompting only makes sense on a TTY; piped stdin gets an empty map and
/// lets declared defaults fill in during preflight.
#[cfg(feature = "interactive")]
fn collect_interactively(
    registry: &stagehand_core::domain::FeatureRegistry,
    output: &OutputManager,
) -> CliResult<AnswerMap> {
    use std::io::IsTerminal as _;

    use stagehand_core::application::services::{CollectionOutcome, FormEngine, groups_for};

    use crate::prompt::InteractivePrompter;

    if !std::io::stdin().is_terminal() {
        debug!("stdin is not a terminal; skipping prompts");
        return Ok(AnswerMap::empty());
    }

    let order = graph::resolve_order(registry).map_err(stagehand_core::error::EngineError::from)?;
    let groups = groups_for(registry, &order);
    if groups.is_empty() {
        return Ok(AnswerMap::empty());
    }

    output.info("Answer the prompts below (type :back to revisit a section)")?;
    let prompter = InteractivePrompter::new(output.supports_color());
    match FormEngine::new(&prompter).collect(&groups)? {
        CollectionOutcome::Complete(answers) => Ok(answers),
        CollectionOutcome::Cancelled => Err(CliError::Cancelled),
    }
}

#[cfg(not(feature = "interactive"))]
fn collect_interactively(
    registry: &stagehand_core::domain::FeatureRegistry,
    output: &OutputManager,
) -> CliResult<AnswerMap> {
    // Preflight still resolves the graph; do it here only to surface graph
    // errors before telling the user how to supply answers.
    graph::resolve_order(registry).map_err(stagehand_core::error::EngineError::from)?;
    output.info("Built without interactive prompts; supply --answers or rely on defaults")?;
    Ok(AnswerMap::empty())
}
