//! Interactive answer collection with dialoguer.
//!
//! Implements the core `Prompter` port on top of terminal widgets:
//!
//! | Option kind     | Widget      |
//! |-----------------|-------------|
//! | `Text`          | Input       |
//! | `Number`        | Input (i64) |
//! | `Boolean`       | Confirm     |
//! | `SingleChoice`  | Select      |
//! | `MultiChoice`   | MultiSelect |
//!
//! Typing `:back` at a text or number prompt re-enters the previous group.
//! Esc / Ctrl-C anywhere cancels collection.

use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, MultiSelect, Select};
use owo_colors::OwoColorize;

use stagehand_core::application::ports::{PromptReply, Prompter};
use stagehand_core::domain::{AnswerValue, ConfigOption, OptionKind};
use stagehand_core::error::{EngineError, EngineResult};

/// Sentinel a user can type at free-form prompts to navigate backwards.
const BACK_SENTINEL: &str = ":back";

/// Terminal prompter backed by dialoguer.
///
/// Stateless; a fresh theme is built per prompt so the struct stays
/// `Send + Sync` without locking.
pub struct InteractivePrompter {
    use_color: bool,
}

impl InteractivePrompter {
    pub fn new(use_color: bool) -> Self {
        Self { use_color }
    }

    fn label(&self, group: &str, option: &ConfigOption) -> String {
        if self.use_color {
            format!("[{}] {}", group.cyan(), option.prompt)
        } else {
            format!("[{group}] {}", option.prompt)
        }
    }

    fn prompt_text(&self, label: &str, option: &ConfigOption) -> EngineResult<PromptReply> {
        let theme = ColorfulTheme::default();
        let mut input = Input::<String>::with_theme(&theme).with_prompt(label);
        if let Some(AnswerValue::Text(default)) = &option.default {
            input = input.default(default.clone()).show_default(true);
        }
        if !option.required {
            input = input.allow_empty(true);
        }
        let text = map_interact(input.interact_text())?;
        if text == BACK_SENTINEL {
            return Ok(PromptReply::Back);
        }
        Ok(PromptReply::Answer(AnswerValue::Text(text)))
    }

    fn prompt_number(&self, label: &str, option: &ConfigOption) -> EngineResult<PromptReply> {
        // Collected as text so `:back` stays available; parsing failures are
        // reported inline and the widget re-asks by itself.
        let theme = ColorfulTheme::default();
        let mut input = Input::<String>::with_theme(&theme)
            .with_prompt(label)
            .validate_with(|raw: &String| {
            if raw == BACK_SENTINEL || raw.trim().parse::<i64>().is_ok() {
                Ok(())
            } else {
                Err("enter a whole number")
            }
        });
        if let Some(AnswerValue::Number(default)) = &option.default {
            input = input.default(default.to_string()).show_default(true);
        }
        let text = map_interact(input.interact_text())?;
        if text == BACK_SENTINEL {
            return Ok(PromptReply::Back);
        }
        let number = text.trim().parse::<i64>().map_err(|e| EngineError::Internal {
            message: format!("validated number failed to parse: {e}"),
        })?;
        Ok(PromptReply::Answer(AnswerValue::Number(number)))
    }

    fn prompt_boolean(&self, label: &str, option: &ConfigOption) -> EngineResult<PromptReply> {
        let theme = ColorfulTheme::default();
        let mut confirm = Confirm::with_theme(&theme).with_prompt(label);
        if let Some(AnswerValue::Bool(default)) = &option.default {
            confirm = confirm.default(*default);
        }
        match map_interact_opt(confirm.interact_opt())? {
            Some(answer) => Ok(PromptReply::Answer(AnswerValue::Bool(answer))),
            None => Ok(PromptReply::Cancel),
        }
    }

    fn prompt_single(
        &self,
        label: &str,
        option: &ConfigOption,
        choices: &[String],
    ) -> EngineResult<PromptReply> {
        let theme = ColorfulTheme::default();
        let mut select = Select::with_theme(&theme).with_prompt(label).items(choices);
        if let Some(AnswerValue::Text(default)) = &option.default {
            if let Some(index) = choices.iter().position(|c| c == default) {
                select = select.default(index);
            }
        }
        match map_interact_opt(select.interact_opt())? {
            Some(index) => Ok(PromptReply::Answer(AnswerValue::Text(
                choices[index].clone(),
            ))),
            None => Ok(PromptReply::Cancel),
        }
    }

    fn prompt_multi(
        &self,
        label: &str,
        option: &ConfigOption,
        choices: &[String],
    ) -> EngineResult<PromptReply> {
        let preselected: Vec<bool> = match &option.default {
            Some(AnswerValue::List(items)) => {
                choices.iter().map(|c| items.contains(c)).collect()
            }
            _ => vec![false; choices.len()],
        };
        let selection = map_interact_opt(
            MultiSelect::with_theme(&ColorfulTheme::default())
                .with_prompt(label)
                .items(choices)
                .defaults(&preselected)
                .interact_opt(),
        )?;
        match selection {
            Some(indices) => {
                let items = indices.into_iter().map(|i| choices[i].clone()).collect();
                Ok(PromptReply::Answer(AnswerValue::List(items)))
            }
            None => Ok(PromptReply::Cancel),
        }
    }
}

impl Prompter for InteractivePrompter {
    fn prompt(&self, group: &str, option: &ConfigOption) -> EngineResult<PromptReply> {
        let label = self.label(group, option);
        match &option.kind {
            OptionKind::Text => self.prompt_text(&label, option),
            OptionKind::Number => self.prompt_number(&label, option),
            OptionKind::Boolean => self.prompt_boolean(&label, option),
            OptionKind::SingleChoice(choices) => self.prompt_single(&label, option, choices),
            OptionKind::MultiChoice(choices) => self.prompt_multi(&label, option, choices),
        }
    }

    fn notify_invalid(&self, option: &ConfigOption, message: &str) {
        if self.use_color {
            eprintln!("{} {}: {}", "\u{2717}".red().bold(), option.id, message);
        } else {
            eprintln!("\u{2717} {}: {}", option.id, message);
        }
    }
}

/// Ctrl-C surfaces as an interrupted I/O error; treat it as cancellation
/// rather than a hard failure.
fn map_interact<T>(result: dialoguer::Result<T>) -> EngineResult<T> {
    result.map_err(|e| match e {
        dialoguer::Error::IO(io_err) if io_err.kind() == std::io::ErrorKind::Interrupted => {
            stagehand_core::application::ApplicationError::Cancelled.into()
        }
        dialoguer::Error::IO(io_err) => stagehand_core::application::ApplicationError::PromptFailed {
            reason: io_err.to_string(),
        }
        .into(),
    })
}

/// Like [`map_interact`] for the `_opt` widget variants, where Esc yields
/// `Ok(None)`.
fn map_interact_opt<T>(result: dialoguer::Result<Option<T>>) -> EngineResult<Option<T>> {
    map_interact(result)
}
