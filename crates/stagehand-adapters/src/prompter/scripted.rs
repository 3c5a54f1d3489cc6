//! Scripted prompter for testing the form engine end to end.

use std::sync::Mutex;

use stagehand_core::application::ports::{PromptReply, Prompter};
use stagehand_core::domain::{AnswerValue, ConfigOption};
use stagehand_core::error::EngineResult;

/// Replays a fixed sequence of replies and records what was asked.
///
/// An exhausted queue answers `Cancel`, so a test that under-provisions
/// replies fails loudly instead of hanging.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    replies: Mutex<Vec<PromptReply>>,
    prompted: Mutex<Vec<String>>,
    rejections: Mutex<Vec<(String, String)>>,
}

impl ScriptedPrompter {
    pub fn new(replies: Vec<PromptReply>) -> Self {
        Self {
            replies: Mutex::new(replies),
            ..Self::default()
        }
    }

    /// Convenience constructor from plain answer values.
    pub fn answering(values: impl IntoIterator<Item = AnswerValue>) -> Self {
        Self::new(values.into_iter().map(PromptReply::Answer).collect())
    }

    /// Option ids prompted so far, in ask order (re-asks included).
    pub fn prompted(&self) -> Vec<String> {
        self.prompted.lock().unwrap().clone()
    }

    /// Validator rejections surfaced so far, as (option id, message).
    pub fn rejections(&self) -> Vec<(String, String)> {
        self.rejections.lock().unwrap().clone()
    }
}

impl Prompter for ScriptedPrompter {
    fn prompt(&self, _group: &str, option: &ConfigOption) -> EngineResult<PromptReply> {
        self.prompted.lock().unwrap().push(option.id.clone());
        let mut replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            return Ok(PromptReply::Cancel);
        }
        Ok(replies.remove(0))
    }

    fn notify_invalid(&self, option: &ConfigOption, message: &str) {
        self.rejections
            .lock()
            .unwrap()
            .push((option.id.clone(), message.to_owned()));
    }
}
