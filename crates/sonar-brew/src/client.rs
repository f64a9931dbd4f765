use std::path::{Path, PathBuf};

use log::{debug, error, info, trace};
use tokio::process::Command;

use sonar_backend::BackendError;

use crate::services::{BrewService, parse_services};

/// Thin wrapper over the `brew` executable.
///
/// Every method is a single blocking process invocation; nothing is cached
/// between calls so install/running state stays correct after changes made
/// outside this process.
#[derive(Debug, Clone)]
pub struct BrewClient {
    brew: PathBuf,
}

impl BrewClient {
    #[must_use]
    pub fn new(brew: PathBuf) -> Self {
        Self { brew }
    }

    /// Locate `brew` on PATH.
    ///
    /// # Errors
    /// Fails with `ToolNotFound` when Homebrew is not installed.
    pub fn detect() -> Result<Self, BackendError> {
        which::which("brew")
            .map(Self::new)
            .map_err(|_| BackendError::ToolNotFound { tool: "brew" })
    }

    fn build_command(&self, args: &[&str]) -> Command {
        debug!("Building brew command: {} {}", self.brew.display(), args.join(" "));

        let mut cmd = Command::new(&self.brew);
        cmd.args(args);
        cmd.env("HOMEBREW_NO_AUTO_UPDATE", "1");
        cmd
    }

    async fn execute(&self, args: &[&str]) -> Result<String, BackendError> {
        info!("Executing brew command: {}", args.join(" "));

        let output = self.build_command(args).output().await?;

        debug!("brew command exit status: {:?}", output.status);
        trace!("brew stdout: {}", String::from_utf8_lossy(&output.stdout));

        if !output.stderr.is_empty() {
            trace!("brew stderr: {}", String::from_utf8_lossy(&output.stderr));
        }

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            error!("brew command failed: args={args:?}, stderr='{stderr}'");
            Err(BackendError::CommandFailed { stderr })
        }
    }

    /// Whether the formula is installed.
    ///
    /// # Errors
    /// Fails when `brew` itself cannot be invoked.
    pub async fn installed(&self, formula: &str) -> Result<bool, BackendError> {
        // `brew list --versions` exits non-zero for unknown formulae, so the
        // exit status is the answer rather than an error.
        let output = self
            .build_command(&["list", "--versions", formula])
            .output()
            .await?;

        Ok(output.status.success() && !output.stdout.is_empty())
    }

    /// # Errors
    /// Fails when the tap listing cannot be read.
    pub async fn has_tap(&self, tap: &str) -> Result<bool, BackendError> {
        let output = self.execute(&["tap"]).await?;
        Ok(output.lines().any(|line| line.trim() == tap))
    }

    /// # Errors
    /// Fails when tapping reports non-zero.
    pub async fn tap(&self, tap: &str) -> Result<(), BackendError> {
        self.execute(&["tap", tap]).await?;
        Ok(())
    }

    /// # Errors
    /// Fails when the install reports non-zero.
    pub async fn install(&self, formula: &str) -> Result<(), BackendError> {
        self.execute(&["install", formula]).await?;
        Ok(())
    }

    /// # Errors
    /// Fails when the uninstall reports non-zero.
    pub async fn uninstall(&self, formula: &str) -> Result<(), BackendError> {
        self.execute(&["uninstall", formula]).await?;
        Ok(())
    }

    /// Force-link the formula's binaries, overwriting competing links.
    ///
    /// # Errors
    /// Fails with `LinkFailed` when brew cannot swap the links.
    pub async fn link(&self, formula: &str) -> Result<(), BackendError> {
        self.execute(&["link", "--force", "--overwrite", formula])
            .await
            .map_err(|error| BackendError::link_failed(formula, error.to_string()))?;
        Ok(())
    }

    /// # Errors
    /// Fails with `LinkFailed` when brew cannot remove the links.
    pub async fn unlink(&self, formula: &str) -> Result<(), BackendError> {
        self.execute(&["unlink", formula])
            .await
            .map_err(|error| BackendError::link_failed(formula, error.to_string()))?;
        Ok(())
    }

    /// All services known to `brew services`, with their reported status.
    ///
    /// # Errors
    /// Fails when the listing cannot be run or parsed.
    pub async fn services(&self) -> Result<Vec<BrewService>, BackendError> {
        let output = self.execute(&["services", "list", "--json"]).await?;
        parse_services(&output)
    }

    /// # Errors
    /// Fails when the service cannot be started.
    pub async fn service_start(&self, formula: &str) -> Result<(), BackendError> {
        self.execute(&["services", "start", formula]).await?;
        Ok(())
    }

    /// # Errors
    /// Fails when the service cannot be stopped.
    pub async fn service_stop(&self, formula: &str) -> Result<(), BackendError> {
        self.execute(&["services", "stop", formula]).await?;
        Ok(())
    }

    /// # Errors
    /// Fails when the service cannot be restarted.
    pub async fn service_restart(&self, formula: &str) -> Result<(), BackendError> {
        self.execute(&["services", "restart", formula]).await?;
        Ok(())
    }

    /// Resolve a symlink installed by brew.
    ///
    /// # Errors
    /// Fails with `LinkFailed` when the path is missing or not a link.
    pub fn read_link(&self, path: &Path) -> Result<PathBuf, BackendError> {
        std::fs::read_link(path)
            .map_err(|error| BackendError::link_failed(path.display().to_string(), error.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::BrewClient;

    #[test]
    fn read_link_rejects_a_regular_file() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let file = temp.path().join("opensearch");
        std::fs::write(&file, "not a link").expect("write file");

        let client = BrewClient::new(PathBuf::from("brew"));
        let error = client.read_link(&file).expect_err("regular file is not a link");

        assert!(matches!(error, sonar_backend::BackendError::LinkFailed { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn read_link_resolves_symlink_targets() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let target = temp.path().join("Cellar/opensearch/2.11.1/bin/opensearch");
        std::fs::create_dir_all(target.parent().expect("parent")).expect("create target dirs");
        std::fs::write(&target, "").expect("write target");
        let link = temp.path().join("opensearch");
        std::os::unix::fs::symlink(&target, &link).expect("create symlink");

        let client = BrewClient::new(PathBuf::from("brew"));
        let resolved = client.read_link(&link).expect("symlink resolves");

        assert_eq!(resolved, target);
    }
}
