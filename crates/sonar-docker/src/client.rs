use std::path::PathBuf;

use log::{debug, error, info, trace};
use tokio::process::Command;

use sonar_backend::BackendError;

/// Thin wrapper over the `docker` executable.
#[derive(Debug, Clone)]
pub struct DockerClient {
    docker: PathBuf,
}

impl DockerClient {
    #[must_use]
    pub fn new(docker: PathBuf) -> Self {
        Self { docker }
    }

    /// Locate `docker` on PATH.
    ///
    /// # Errors
    /// Fails with `ToolNotFound` when Docker is not installed.
    pub fn detect() -> Result<Self, BackendError> {
        which::which("docker")
            .map(Self::new)
            .map_err(|_| BackendError::ToolNotFound { tool: "docker" })
    }

    fn build_command(&self, args: &[&str]) -> Command {
        debug!(
            "Building docker command: {} {}",
            self.docker.display(),
            args.join(" ")
        );

        let mut cmd = Command::new(&self.docker);
        cmd.args(args);
        cmd
    }

    async fn execute(&self, args: &[&str]) -> Result<String, BackendError> {
        info!("Executing docker command: {}", args.join(" "));

        let output = self.build_command(args).output().await?;

        debug!("docker command exit status: {:?}", output.status);
        trace!("docker stdout: {}", String::from_utf8_lossy(&output.stdout));

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            error!("docker command failed: args={args:?}, stderr='{stderr}'");
            Err(BackendError::CommandFailed { stderr })
        }
    }

    /// # Errors
    /// Fails when `docker` itself cannot be invoked.
    pub async fn image_present(&self, image: &str) -> Result<bool, BackendError> {
        // `docker image inspect` exits non-zero for unknown images; the
        // exit status is the answer rather than an error.
        let output = self
            .build_command(&["image", "inspect", image])
            .output()
            .await?;

        Ok(output.status.success())
    }

    /// # Errors
    /// Fails when the pull reports non-zero.
    pub async fn pull(&self, image: &str) -> Result<(), BackendError> {
        self.execute(&["pull", image]).await?;
        Ok(())
    }

    /// # Errors
    /// Fails when the container listing cannot be read.
    pub async fn container_exists(&self, name: &str) -> Result<bool, BackendError> {
        let output = self
            .execute(&[
                "ps",
                "-a",
                "--filter",
                &format!("name=^{name}$"),
                "--format",
                "{{.Names}}",
            ])
            .await?;

        Ok(contains_name(&output, name))
    }

    /// # Errors
    /// Fails when the container listing cannot be read.
    pub async fn container_running(&self, name: &str) -> Result<bool, BackendError> {
        let output = self
            .execute(&[
                "ps",
                "--filter",
                &format!("name=^{name}$"),
                "--format",
                "{{.Names}}",
            ])
            .await?;

        Ok(contains_name(&output, name))
    }

    /// Create and start a fresh single-node container bound to the
    /// service's well-known local port.
    ///
    /// # Errors
    /// Fails when the container cannot be created.
    pub async fn run_detached(
        &self,
        name: &str,
        image: &str,
        port: u16,
    ) -> Result<(), BackendError> {
        self.execute(&[
            "run",
            "-d",
            "--name",
            name,
            "-p",
            &format!("127.0.0.1:{port}:{port}"),
            "-e",
            "discovery.type=single-node",
            image,
        ])
        .await?;
        Ok(())
    }

    /// # Errors
    /// Fails when the container cannot be started.
    pub async fn start(&self, name: &str) -> Result<(), BackendError> {
        self.execute(&["start", name]).await?;
        Ok(())
    }

    /// # Errors
    /// Fails when the container cannot be stopped.
    pub async fn stop(&self, name: &str) -> Result<(), BackendError> {
        self.execute(&["stop", name]).await?;
        Ok(())
    }

    /// # Errors
    /// Fails when the container cannot be removed.
    pub async fn remove_container(&self, name: &str) -> Result<(), BackendError> {
        self.execute(&["rm", "-f", name]).await?;
        Ok(())
    }

    /// # Errors
    /// Fails when the image cannot be removed.
    pub async fn remove_image(&self, image: &str) -> Result<(), BackendError> {
        self.execute(&["rmi", image]).await?;
        Ok(())
    }
}

fn contains_name(output: &str, name: &str) -> bool {
    output.lines().any(|line| line.trim() == name)
}

#[cfg(test)]
mod tests {
    use super::contains_name;

    #[test]
    fn exact_name_match_only() {
        assert!(contains_name("elasticsearch7\n", "elasticsearch7"));
        assert!(!contains_name("elasticsearch7-old\n", "elasticsearch7"));
        assert!(!contains_name("", "elasticsearch7"));
    }

    #[test]
    fn matches_any_line_of_the_listing() {
        let output = "elasticsearch8\nelasticsearch7\n";
        assert!(contains_name(output, "elasticsearch7"));
        assert!(contains_name(output, "elasticsearch8"));
        assert!(!contains_name(output, "elasticsearch6"));
    }
}
