//! Compose-apply adapter — drives the external compose binary.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};

use crate::application::ports::{CommandRunner, ComposeApply};

/// Image pulls can be slow on cold caches; recreate waits on container
/// shutdown. Both get a generous budget.
const APPLY_TIMEOUT: Duration = Duration::from_secs(600);

/// Invokes the configured compose binary against a manifest path. The
/// binary may be multi-word (`"docker compose"`); extra words become
/// leading arguments.
pub struct ComposeCli<R> {
    runner: R,
    binary: String,
}

impl<R: CommandRunner> ComposeCli<R> {
    pub fn new(runner: R, binary: impl Into<String>) -> Self {
        Self {
            runner,
            binary: binary.into(),
        }
    }

    async fn exec(&self, manifest: &Path, operation: &[&str]) -> Result<()> {
        let manifest = manifest
            .to_str()
            .context("manifest path is not valid UTF-8")?;

        let mut words = self.binary.split_whitespace();
        let program = words.next().context("compose binary is empty")?;

        let mut args: Vec<&str> = words.collect();
        args.extend(["-f", manifest]);
        args.extend(operation);

        let output = self
            .runner
            .run_with_timeout(program, &args, APPLY_TIMEOUT)
            .await
            .with_context(|| format!("invoking {program}"))?;

        if !output.status.success() {
            bail!(
                "{program} {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim(),
            );
        }
        Ok(())
    }
}

impl<R: CommandRunner> ComposeApply for ComposeCli<R> {
    async fn pull(&self, manifest: &Path) -> Result<()> {
        self.exec(manifest, &["pull"]).await
    }

    async fn recreate(&self, manifest: &Path) -> Result<()> {
        self.exec(manifest, &["up", "-d", "--force-recreate"]).await
    }
}
