//! `stagehand list` — show the features a pack declares.

use serde::Serialize;
use tracing::instrument;

use crate::cli::{ListArgs, ListFormat};
use crate::error::CliResult;
use crate::output::OutputManager;

use super::load_registry;

/// JSON projection of one feature declaration.
#[derive(Serialize)]
struct FeatureRow<'a> {
    id: &'a str,
    depends_on: &'a [String],
    conditional: bool,
    options: usize,
    stages: usize,
}

#[instrument(skip_all)]
pub fn execute(args: &ListArgs, output: &OutputManager) -> CliResult<()> {
    let registry = load_registry(&args.pack)?;

    let rows: Vec<FeatureRow<'_>> = registry
        .iter()
        .map(|f| FeatureRow {
            id: &f.id,
            depends_on: &f.depends_on,
            conditional: f.activated_by.is_some(),
            options: f.options.len(),
            stages: f.stages.len(),
        })
        .collect();

    match args.format {
        ListFormat::Json => {
            let json = serde_json::to_string_pretty(&rows).map_err(|e| {
                stagehand_core::error::EngineError::Internal {
                    message: format!("serializing feature list: {e}"),
                }
            })?;
            // Machine-readable output bypasses the quiet flag and styling.
            println!("{json}");
        }
        ListFormat::List => {
            for row in &rows {
                output.print(row.id)?;
            }
        }
        ListFormat::Table => {
            output.header(&format!(
                "{:<24} {:<28} {:>7} {:>6}",
                "FEATURE", "DEPENDS ON", "OPTIONS", "STAGES"
            ))?;
            for row in &rows {
                let deps = if row.depends_on.is_empty() {
                    "-".to_owned()
                } else {
                    row.depends_on.join(", ")
                };
                let id = if row.conditional {
                    format!("{}*", row.id)
                } else {
                    row.id.to_owned()
                };
                output.print(&format!(
                    "{:<24} {:<28} {:>7} {:>6}",
                    id, deps, row.options, row.stages
                ))?;
            }
            output.print("")?;
            output.info(&format!(
                "{} features (* = conditionally activated)",
                rows.len()
            ))?;
        }
    }

    Ok(())
}
