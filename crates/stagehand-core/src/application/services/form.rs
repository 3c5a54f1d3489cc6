//! Form engine: the conditional question/answer collector.
//!
//! Traversal is sequential and single-threaded; waiting on the
//! [`Prompter`] is the only place the pipeline blocks on an outside actor.
//! Visibility (`show_if`) is evaluated against the answers collected *so
//! far*, and re-evaluated whenever a group is re-entered — a later answer
//! may hide an earlier, already-answered option, in which case the stale
//! answer is replaced by the option's declared default.

use std::collections::BTreeMap;

use tracing::{debug, instrument};

use crate::application::ports::{PromptReply, Prompter};
use crate::domain::{
    AnswerMap, AnswerValue, ConfigOption, DomainError, FeatureRegistry, OptionGroup,
};
use crate::error::EngineResult;

/// Terminal state of a collection pass.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionOutcome {
    /// Every group was walked; the map is complete (but not yet finalized —
    /// see [`finalize`]).
    Complete(AnswerMap),
    /// The user abandoned collection; no map was produced.
    Cancelled,
}

/// What a single group walk decided.
enum GroupStep {
    Forward,
    Back,
    Cancelled,
}

/// The interactive answer collector.
pub struct FormEngine<'a> {
    prompter: &'a dyn Prompter,
}

impl<'a> FormEngine<'a> {
    pub fn new(prompter: &'a dyn Prompter) -> Self {
        Self { prompter }
    }

    /// Walk every group in order, prompting for visible options.
    ///
    /// Back-navigation re-enters the previous group without discarding
    /// answers of unaffected groups; the re-entered group is walked in
    /// full, re-evaluating every `show_if`.
    #[instrument(skip_all, fields(groups = groups.len()))]
    pub fn collect(&self, groups: &[OptionGroup]) -> EngineResult<CollectionOutcome> {
        let mut answers: BTreeMap<String, AnswerValue> = BTreeMap::new();
        let mut index = 0usize;

        while index < groups.len() {
            match self.walk_group(&groups[index], &mut answers)? {
                GroupStep::Forward => index += 1,
                // Back from the first group stays on the first group.
                GroupStep::Back => index = index.saturating_sub(1),
                GroupStep::Cancelled => return Ok(CollectionOutcome::Cancelled),
            }
        }

        Ok(CollectionOutcome::Complete(AnswerMap::from(answers)))
    }

    fn walk_group(
        &self,
        group: &OptionGroup,
        answers: &mut BTreeMap<String, AnswerValue>,
    ) -> EngineResult<GroupStep> {
        for option in &group.options {
            let view = AnswerMap::from(answers.clone());
            if !is_visible(option, &view) {
                debug!(option = %option.id, "hidden by show_if, assigning default");
                assign_default(option, answers);
                continue;
            }

            loop {
                match self.prompter.prompt(&group.name, option)? {
                    PromptReply::Cancel => return Ok(GroupStep::Cancelled),
                    PromptReply::Back => return Ok(GroupStep::Back),
                    PromptReply::Answer(value) => match option.validate(&value) {
                        Ok(()) => {
                            answers.insert(option.id.clone(), value);
                            break;
                        }
                        Err(message) => {
                            // First failing validator's message; re-prompt,
                            // never coerce.
                            self.prompter.notify_invalid(option, &message);
                        }
                    },
                }
            }
        }
        Ok(GroupStep::Forward)
    }
}

/// Implicit `And` over the option's `show_if` list; empty list is visible.
fn is_visible(option: &ConfigOption, answers: &AnswerMap) -> bool {
    option.show_if.iter().all(|p| p.evaluate(answers))
}

fn assign_default(option: &ConfigOption, answers: &mut BTreeMap<String, AnswerValue>) {
    match &option.default {
        Some(default) => {
            answers.insert(option.id.clone(), default.clone());
        }
        // No default: the answer is absent — including any stale value a
        // previous pass accepted while the option was still visible.
        None => {
            answers.remove(&option.id);
        }
    }
}

/// One option group per feature that declares options, in the given
/// feature order (normally resolver order).
pub fn groups_for(registry: &FeatureRegistry, order: &[String]) -> Vec<OptionGroup> {
    order
        .iter()
        .filter_map(|id| registry.get(id))
        .filter(|f| !f.options.is_empty())
        .map(|f| OptionGroup::new(f.id.clone(), f.options.clone()))
        .collect()
}

/// Finalize a raw answer map against the declared options.
///
/// Walks options in order against the finalized answers so far: hidden
/// options get their declared default (supplied values for hidden options
/// are discarded); visible options take the supplied value — validated —
/// or fall back to their default. A visible required option with neither
/// is a ConfigurationError, raised before any stage of any feature runs.
pub fn finalize(groups: &[OptionGroup], supplied: &AnswerMap) -> EngineResult<AnswerMap> {
    let mut resolved: BTreeMap<String, AnswerValue> = BTreeMap::new();

    for group in groups {
        for option in &group.options {
            let view = AnswerMap::from(resolved.clone());
            if !is_visible(option, &view) {
                if let Some(default) = &option.default {
                    resolved.insert(option.id.clone(), default.clone());
                }
                continue;
            }

            match supplied.get(&option.id).or(option.default.as_ref()) {
                Some(value) => {
                    option
                        .validate(value)
                        .map_err(|message| DomainError::InvalidAnswer {
                            option: option.id.clone(),
                            message,
                        })?;
                    resolved.insert(option.id.clone(), value.clone());
                }
                None if option.required => {
                    return Err(DomainError::MissingRequiredAnswer {
                        option: option.id.clone(),
                    }
                    .into());
                }
                None => {}
            }
        }
    }

    Ok(AnswerMap::from(resolved))
}
