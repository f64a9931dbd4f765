use async_trait::async_trait;
use log::warn;

use sonar_backend::{BackendError, BackendKind, ServiceBackend, ServiceVersion};
use sonar_brew::{BrewBackend, BrewClient};
use sonar_docker::{DockerBackend, DockerClient};

/// Stand-in for a backend whose tool is not installed on this machine.
///
/// Queries report nothing installed or running and idempotent teardown
/// operations succeed, so `status` and `uninstall` stay usable on a machine
/// with only one of brew/docker present. Anything that would need the
/// missing tool fails with `ToolNotFound`.
struct UnavailableBackend {
    kind: BackendKind,
    tool: &'static str,
}

#[async_trait]
impl ServiceBackend for UnavailableBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn installed(&self, _service: &ServiceVersion) -> Result<bool, BackendError> {
        Ok(false)
    }

    async fn install(&self, _service: &ServiceVersion) -> Result<(), BackendError> {
        Err(BackendError::ToolNotFound { tool: self.tool })
    }

    async fn uninstall(&self, _service: &ServiceVersion) -> Result<(), BackendError> {
        Ok(())
    }

    async fn start(&self, _service: &ServiceVersion) -> Result<(), BackendError> {
        Err(BackendError::ToolNotFound { tool: self.tool })
    }

    async fn stop(&self, _service: &ServiceVersion) -> Result<(), BackendError> {
        Ok(())
    }

    async fn is_running(&self, _service: &ServiceVersion) -> Result<bool, BackendError> {
        Ok(false)
    }
}

pub fn native_backend() -> Box<dyn ServiceBackend> {
    match BrewClient::detect() {
        Ok(client) => Box::new(BrewBackend::new(client)),
        Err(error) => {
            warn!("Native backend unavailable: {error}");
            Box::new(UnavailableBackend {
                kind: BackendKind::Native,
                tool: "brew",
            })
        }
    }
}

pub fn container_backend() -> Box<dyn ServiceBackend> {
    match DockerClient::detect() {
        Ok(client) => Box::new(DockerBackend::new(client)),
        Err(error) => {
            warn!("Container backend unavailable: {error}");
            Box::new(UnavailableBackend {
                kind: BackendKind::Container,
                tool: "docker",
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use sonar_backend::{BackendError, BackendKind, ServiceBackend, VersionCatalog};

    use super::UnavailableBackend;

    #[tokio::test]
    async fn unavailable_backend_reports_nothing_and_fails_mutation() {
        let catalog = VersionCatalog::search_stack();
        let service = catalog.get("elasticsearch@7").expect("known id");
        let backend = UnavailableBackend {
            kind: BackendKind::Container,
            tool: "docker",
        };

        assert!(!backend.installed(service).await.expect("query succeeds"));
        assert!(!backend.is_running(service).await.expect("query succeeds"));
        backend.stop(service).await.expect("stop is a no-op");
        backend.uninstall(service).await.expect("uninstall is a no-op");

        let error = backend.start(service).await.expect_err("start needs docker");
        assert!(matches!(error, BackendError::ToolNotFound { tool: "docker" }));
    }
}
