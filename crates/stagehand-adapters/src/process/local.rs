//! Local process runner using the system shell.
//!
//! Commands run through `sh -c` so pack authors can use pipes and
//! redirection. Stdout and stderr are drained on separate threads while
//! the parent polls for exit, so a chatty script cannot deadlock on a
//! full pipe. A script that outlives its timeout is killed and reported
//! as a timeout, not as a non-zero exit.

use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, instrument};

use stagehand_core::application::ApplicationError;
use stagehand_core::application::ports::{ProcessRunner, ScriptOutput};
use stagehand_core::error::EngineResult;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Production process runner.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalProcessRunner;

impl LocalProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessRunner for LocalProcessRunner {
    #[instrument(skip(self), fields(cwd = %cwd.display()))]
    fn run(&self, command: &str, cwd: &Path, timeout: Duration) -> EngineResult<ScriptOutput> {
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ApplicationError::ScriptSpawn {
                command: command.to_owned(),
                reason: e.to_string(),
            })?;

        let stdout_handle = drain(child.stdout.take());
        let stderr_handle = drain(child.stderr.take());

        let deadline = Instant::now() + timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(ApplicationError::ScriptTimeout {
                            command: command.to_owned(),
                            timeout_secs: timeout.as_secs(),
                        }
                        .into());
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(e) => {
                    return Err(ApplicationError::ScriptSpawn {
                        command: command.to_owned(),
                        reason: format!("wait failed: {e}"),
                    }
                    .into());
                }
            }
        };

        let stdout = stdout_handle.join().unwrap_or_default();
        let stderr = stderr_handle.join().unwrap_or_default();
        let code = status.code().unwrap_or(-1);
        debug!(status = code, "script finished");
        Ok(ScriptOutput {
            status: code,
            stdout,
            stderr,
        })
    }
}

fn drain<R: Read + Send + 'static>(source: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = String::new();
        if let Some(mut reader) = source {
            let _ = reader.read_to_string(&mut buf);
        }
        buf
    })
}
