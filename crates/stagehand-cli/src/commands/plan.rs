//! `stagehand plan` — preview resolution and activation without touching
//! any file.
//!
//! Runs the same validations a real run performs (graph resolution,
//! predicate key checking, codemod references, answer finalization) and
//! then prints which features would run, in which order.

use tracing::instrument;

use stagehand_adapters::builtin_codemods;
use stagehand_core::application::services::{finalize, groups_for};
use stagehand_core::domain::{AnswerMap, graph};
use stagehand_core::error::EngineError;

use crate::cli::PlanArgs;
use crate::error::CliResult;
use crate::output::OutputManager;

use super::{load_answers, load_registry};

#[instrument(skip_all)]
pub fn execute(args: &PlanArgs, output: &OutputManager) -> CliResult<()> {
    let registry = load_registry(&args.pack)?;

    let order = graph::resolve_order(&registry).map_err(EngineError::from)?;
    graph::validate_predicate_keys(&registry).map_err(EngineError::from)?;
    graph::validate_codemod_refs(&registry, &builtin_codemods().known_names())
        .map_err(EngineError::from)?;

    let supplied = match &args.answers {
        Some(path) => load_answers(path)?,
        None => AnswerMap::empty(),
    };
    let groups = groups_for(&registry, &order);
    let answers = finalize(&groups, &supplied)?;

    output.header(&format!("Plan for {}", args.pack.display()))?;
    output.print("")?;

    let mut active = 0usize;
    for id in &order {
        let Some(feature) = registry.get(id) else {
            continue;
        };
        let is_active = feature
            .activated_by
            .as_ref()
            .is_none_or(|p| p.evaluate(&answers));
        if is_active {
            active += 1;
            let stages: Vec<&str> = feature.stages.iter().map(|s| s.name.as_str()).collect();
            if stages.is_empty() {
                output.success(id)?;
            } else {
                output.success(&format!("{} ({})", id, stages.join(", ")))?;
            }
        } else {
            output.print(&format!("  {id} (inactive)"))?;
        }
    }

    output.print("")?;
    output.info(&format!(
        "{active} of {} features would run; no files were touched",
        order.len()
    ))?;

    if !answers.is_empty() {
        output.print("")?;
        output.header("Answers")?;
        for (key, value) in answers.iter() {
            output.print(&format!("  {key} = {}", value.render()))?;
        }
    }

    Ok(())
}
