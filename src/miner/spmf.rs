use anyhow::{Context, Result, bail};
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, info};

use super::client::{MiningRequest, PatternMiner};

/// Runs the SPMF jar as a child process.
pub struct SpmfMiner {
    java: PathBuf,
    jar: PathBuf,
}

impl SpmfMiner {
    pub fn new(jar: impl Into<PathBuf>) -> Self {
        Self {
            java: PathBuf::from("java"),
            jar: jar.into(),
        }
    }

    /// Uses a specific `java` executable instead of the one on `PATH`.
    pub fn with_java(mut self, java: impl Into<PathBuf>) -> Self {
        self.java = java.into();
        self
    }

    /// `java -jar <jar> run <algorithm> <input> <output> <min_support> [extra…]`
    pub fn command(&self, request: &MiningRequest) -> Command {
        let mut command = Command::new(&self.java);
        command
            .arg("-jar")
            .arg(&self.jar)
            .arg("run")
            .arg(&request.algorithm)
            .arg(&request.input)
            .arg(&request.output)
            .arg(&request.min_support)
            .args(&request.extra_args);
        command
    }
}

impl PatternMiner for SpmfMiner {
    #[tracing::instrument(skip_all, fields(algorithm = %request.algorithm, input = %request.input.display()))]
    fn mine(&self, request: &MiningRequest) -> Result<()> {
        let mut command = self.command(request);
        debug!(?command, "Starting miner");

        let status = command
            .status()
            .with_context(|| format!("failed to start {}", self.java.display()))?;
        if !status.success() {
            bail!("miner exited with {status}");
        }

        info!(output = %request.output.display(), "Mining finished");
        Ok(())
    }
}
