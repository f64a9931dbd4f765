use async_trait::async_trait;
use log::{debug, info};

use sonar_backend::{BackendError, BackendKind, ServiceBackend, ServiceVersion};

use crate::client::DockerClient;

/// Every supported container exposes the service on this local port.
const SERVICE_PORT: u16 = 9200;

/// Container execution backend: image-based versions run under Docker.
///
/// The container name is the catalog entry's artifact, so install/running
/// checks work purely off the entry with no extra bookkeeping.
#[derive(Debug, Clone)]
pub struct DockerBackend {
    client: DockerClient,
}

impl DockerBackend {
    #[must_use]
    pub fn new(client: DockerClient) -> Self {
        Self { client }
    }
}

fn image_of(service: &ServiceVersion) -> Option<&'static str> {
    service.image
}

#[async_trait]
impl ServiceBackend for DockerBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Container
    }

    async fn installed(&self, service: &ServiceVersion) -> Result<bool, BackendError> {
        let Some(image) = image_of(service) else {
            debug!("{service} has no image, treating as not installed");
            return Ok(false);
        };

        self.client.image_present(image).await
    }

    async fn install(&self, service: &ServiceVersion) -> Result<(), BackendError> {
        let Some(image) = image_of(service) else {
            return Err(BackendError::install_failed(
                service.id,
                "catalog entry has no image",
            ));
        };

        info!("Pulling {image}");
        // Pull only; the container is created on first start.
        self.client
            .pull(image)
            .await
            .map_err(|error| BackendError::install_failed(service.artifact, error.to_string()))
    }

    async fn uninstall(&self, service: &ServiceVersion) -> Result<(), BackendError> {
        if self.client.container_exists(service.artifact).await? {
            info!("Removing container {}", service.artifact);
            self.client.remove_container(service.artifact).await?;
        }

        if let Some(image) = image_of(service)
            && self.client.image_present(image).await?
        {
            info!("Removing image {image}");
            self.client.remove_image(image).await?;
        }

        Ok(())
    }

    async fn start(&self, service: &ServiceVersion) -> Result<(), BackendError> {
        if self.client.container_running(service.artifact).await? {
            debug!("Container {} already running", service.artifact);
            return Ok(());
        }

        if self.client.container_exists(service.artifact).await? {
            info!("Starting container {}", service.artifact);
            return self.client.start(service.artifact).await;
        }

        let Some(image) = image_of(service) else {
            return Err(BackendError::install_failed(
                service.id,
                "catalog entry has no image",
            ));
        };
        info!("Creating container {} from {image}", service.artifact);
        self.client
            .run_detached(service.artifact, image, SERVICE_PORT)
            .await
    }

    async fn stop(&self, service: &ServiceVersion) -> Result<(), BackendError> {
        if !self.client.container_running(service.artifact).await? {
            debug!("Container {} already stopped", service.artifact);
            return Ok(());
        }

        info!("Stopping container {}", service.artifact);
        self.client.stop(service.artifact).await
    }

    async fn is_running(&self, service: &ServiceVersion) -> Result<bool, BackendError> {
        self.client.container_running(service.artifact).await
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use sonar_backend::{BackendKind, ServiceBackend};

    use super::{DockerBackend, DockerClient};

    #[test]
    fn backend_reports_the_container_kind() {
        let backend = DockerBackend::new(DockerClient::new(PathBuf::from("docker")));
        assert_eq!(backend.kind(), BackendKind::Container);
    }
}
