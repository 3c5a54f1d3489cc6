//! Scripted process runner for testing.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use stagehand_core::application::ports::{ProcessRunner, ScriptOutput};
use stagehand_core::error::EngineResult;

/// One recorded invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: String,
    pub cwd: PathBuf,
}

/// Test double that returns scripted exit codes and records every call.
///
/// Commands without a scripted status succeed with empty output. Cloning
/// shares the recording.
#[derive(Debug, Clone, Default)]
pub struct FakeProcessRunner {
    statuses: Arc<Mutex<BTreeMap<String, i32>>>,
    invocations: Arc<Mutex<Vec<Invocation>>>,
}

impl FakeProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a command to exit with `status`.
    pub fn with_status(self, command: impl Into<String>, status: i32) -> Self {
        self.statuses.lock().unwrap().insert(command.into(), status);
        self
    }

    /// Every invocation so far, in call order.
    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap().clone()
    }

    /// The commands run so far, in call order.
    pub fn commands(&self) -> Vec<String> {
        self.invocations
            .lock()
            .unwrap()
            .iter()
            .map(|i| i.command.clone())
            .collect()
    }
}

impl ProcessRunner for FakeProcessRunner {
    fn run(&self, command: &str, cwd: &Path, _timeout: Duration) -> EngineResult<ScriptOutput> {
        self.invocations.lock().unwrap().push(Invocation {
            command: command.to_owned(),
            cwd: cwd.to_path_buf(),
        });
        let status = self
            .statuses
            .lock()
            .unwrap()
            .get(command)
            .copied()
            .unwrap_or(0);
        Ok(ScriptOutput {
            status,
            stdout: String::new(),
            stderr: if status == 0 {
                String::new()
            } else {
                format!("scripted failure for '{command}'")
            },
        })
    }
}
