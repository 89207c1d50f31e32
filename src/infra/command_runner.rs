//! Production `CommandRunner` — async process execution with a guaranteed
//! timeout.

use std::process::{Output, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::application::ports::CommandRunner;

/// Default timeout for external commands.
pub const DEFAULT_CMD_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs commands on the tokio runtime. `kill_on_drop` guarantees the child
/// is terminated when the timeout branch drops the in-flight wait, on all
/// platforms.
pub struct TokioCommandRunner {
    timeout: Duration,
}

impl TokioCommandRunner {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for TokioCommandRunner {
    fn default() -> Self {
        Self::new(DEFAULT_CMD_TIMEOUT)
    }
}

impl CommandRunner for TokioCommandRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        self.run_with_timeout(program, args, self.timeout).await
    }

    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output> {
        let child = tokio::process::Command::new(program)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn {program}"))?;

        // wait_with_output drains stdout/stderr concurrently with the wait,
        // so a chatty child cannot deadlock on a full pipe.
        match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(output) => output.with_context(|| format!("waiting for {program}")),
            Err(_) => anyhow::bail!("{program} timed out after {}s", timeout.as_secs()),
        }
    }
}
