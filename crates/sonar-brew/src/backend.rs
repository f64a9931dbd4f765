use async_trait::async_trait;
use log::{debug, info};

use sonar_backend::{BackendError, BackendKind, ServiceBackend, ServiceVersion};

use crate::client::BrewClient;

/// Native execution backend: formulae installed through Homebrew and
/// supervised by `brew services`.
#[derive(Debug, Clone)]
pub struct BrewBackend {
    client: BrewClient,
}

impl BrewBackend {
    #[must_use]
    pub fn new(client: BrewClient) -> Self {
        Self { client }
    }

    #[must_use]
    pub fn client(&self) -> &BrewClient {
        &self.client
    }
}

#[async_trait]
impl ServiceBackend for BrewBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Native
    }

    async fn installed(&self, service: &ServiceVersion) -> Result<bool, BackendError> {
        self.client.installed(service.artifact).await
    }

    async fn install(&self, service: &ServiceVersion) -> Result<(), BackendError> {
        if let Some(tap) = service.tap {
            if self.client.has_tap(tap).await? {
                debug!("Tap {tap} already present");
            } else {
                info!("Tapping {tap}");
                self.client.tap(tap).await.map_err(|error| {
                    BackendError::install_failed(service.artifact, error.to_string())
                })?;
            }
        }

        self.client
            .install(service.artifact)
            .await
            .map_err(|error| BackendError::install_failed(service.artifact, error.to_string()))
    }

    async fn uninstall(&self, service: &ServiceVersion) -> Result<(), BackendError> {
        // Unlinking an already-unlinked keg is not worth failing over.
        if let Err(error) = self.client.unlink(service.artifact).await {
            debug!("Unlink of {} tolerated a failure: {error}", service.artifact);
        }
        self.client.uninstall(service.artifact).await
    }

    async fn start(&self, service: &ServiceVersion) -> Result<(), BackendError> {
        if self.is_running(service).await? {
            debug!("{} already started", service.artifact);
            return Ok(());
        }
        self.client.service_start(service.artifact).await
    }

    async fn stop(&self, service: &ServiceVersion) -> Result<(), BackendError> {
        if !self.client.installed(service.artifact).await? {
            return Ok(());
        }
        if !self.is_running(service).await? {
            debug!("{} already stopped", service.artifact);
            return Ok(());
        }
        self.client.service_stop(service.artifact).await
    }

    async fn is_running(&self, service: &ServiceVersion) -> Result<bool, BackendError> {
        let services = self.client.services().await?;
        Ok(services
            .iter()
            .any(|entry| entry.name == service.artifact && entry.is_started()))
    }

    async fn activate(&self, service: &ServiceVersion) -> Result<(), BackendError> {
        info!("Linking {}", service.artifact);
        self.client.link(service.artifact).await
    }

    async fn deactivate(&self, service: &ServiceVersion) -> Result<(), BackendError> {
        if !self.client.installed(service.artifact).await? {
            return Ok(());
        }
        info!("Unlinking {}", service.artifact);
        self.client.unlink(service.artifact).await
    }

    async fn restart(&self, service: &ServiceVersion) -> Result<(), BackendError> {
        if !self.client.installed(service.artifact).await? {
            return Ok(());
        }
        info!("Restarting {}", service.artifact);
        self.client.service_restart(service.artifact).await
    }
}
